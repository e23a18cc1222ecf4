// Company repository implementation

use super::queries::company_queries;
use crate::db::DbPool;
use crate::errors::ModelError;
use crate::models::{
    Company, CompanyDetail, CompanyFilter, CompanyListing, CompanyPatch, JobSummary, NewCompany,
};
use crate::sql::{
    sql_for_filtering, sql_for_partial_update, BindSqlValues, FieldMap, FilterDescriptor,
    FilterPayload, FilterRule, Operator, UpdatePayload,
};
use tracing::instrument;

const COMPANY_COLUMNS: &[(&str, &str)] = &[
    ("numEmployees", "num_employees"),
    ("logoUrl", "logo_url"),
];

/// Request field → column mapping for company updates
pub const COMPANY_FIELDS: FieldMap = FieldMap::new(COMPANY_COLUMNS);

const COMPANY_FILTER_RULES: &[(&str, FilterRule)] = &[
    ("name", FilterRule::new("LOWER(name)", Operator::Like)),
    ("minEmployees", FilterRule::new("num_employees", Operator::Gt)),
    ("maxEmployees", FilterRule::new("num_employees", Operator::Lt)),
];

/// Filter keys accepted by `GET /companies`
pub const COMPANY_FILTERS: FilterDescriptor = FilterDescriptor::new(COMPANY_FILTER_RULES);

/// Build the filter payload for a company search; names match case-insensitively
pub fn filter_payload(filter: &CompanyFilter) -> FilterPayload {
    FilterPayload::new()
        .with_opt("name", filter.name.as_ref().map(|name| name.to_lowercase()))
        .with_opt("minEmployees", filter.min_employees)
        .with_opt("maxEmployees", filter.max_employees)
}

pub fn update_payload(patch: &CompanyPatch) -> UpdatePayload {
    UpdatePayload::new()
        .set_opt("name", patch.name.clone())
        .set_opt("description", patch.description.clone())
        .set_opt("numEmployees", patch.num_employees)
        .set_opt("logoUrl", patch.logo_url.clone())
}

/// Repository for company-related database operations
#[derive(Clone)]
pub struct CompanyRepository {
    pool: DbPool,
}

impl CompanyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a company
    ///
    /// # Errors
    /// `ModelError::BadRequest` when the handle is taken.
    #[instrument(skip(self, company), fields(handle = %company.handle))]
    pub async fn create(&self, company: &NewCompany) -> Result<Company, ModelError> {
        let duplicate = sqlx::query_scalar::<_, String>(
            "SELECT handle FROM companies WHERE handle = $1",
        )
        .bind(&company.handle)
        .fetch_optional(self.pool.pool())
        .await?;

        if duplicate.is_some() {
            return Err(ModelError::BadRequest(format!(
                "Duplicate company: {}",
                company.handle
            )));
        }

        let sql = format!(
            r#"
            INSERT INTO companies (handle, name, description, num_employees, logo_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            company_queries::SELECT_ALL_COLUMNS
        );

        let created = sqlx::query_as::<_, Company>(&sql)
            .bind(&company.handle)
            .bind(&company.name)
            .bind(&company.description)
            .bind(company.num_employees)
            .bind(&company.logo_url)
            .fetch_one(self.pool.pool())
            .await?;

        tracing::info!(handle = %created.handle, "Company created");
        Ok(created)
    }

    /// List all companies ordered by name
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<CompanyListing>, ModelError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM companies
            LEFT JOIN jobs ON jobs.company_handle = companies.handle
            GROUP BY companies.handle
            ORDER BY companies.name
            "#,
            company_queries::SELECT_WITH_JOB_COUNT
        );

        let companies = sqlx::query_as::<_, CompanyListing>(&sql)
            .fetch_all(self.pool.pool())
            .await?;

        Ok(companies)
    }

    /// List companies matching a filter
    ///
    /// # Errors
    /// `ModelError::BadRequest` when `minEmployees` exceeds `maxEmployees`,
    /// `ModelError::SqlBuild` when the filter is empty.
    #[instrument(skip(self))]
    pub async fn find_by(&self, filter: &CompanyFilter) -> Result<Vec<CompanyListing>, ModelError> {
        if let (Some(min), Some(max)) = (filter.min_employees, filter.max_employees) {
            if min > max {
                return Err(ModelError::BadRequest(
                    "minEmployees cannot be greater than maxEmployees".to_string(),
                ));
            }
        }

        let where_clause = sql_for_filtering(&filter_payload(filter), &COMPANY_FILTERS)?;
        let sql = format!(
            r#"
            SELECT {}
            FROM companies
            LEFT JOIN jobs ON jobs.company_handle = companies.handle
            WHERE {}
            GROUP BY companies.handle
            ORDER BY companies.name
            "#,
            company_queries::SELECT_WITH_JOB_COUNT,
            where_clause.clause
        );

        let companies = sqlx::query_as::<_, CompanyListing>(&sql)
            .bind_sql_values(&where_clause.values)
            .fetch_all(self.pool.pool())
            .await?;

        Ok(companies)
    }

    /// Get a company with its jobs
    #[instrument(skip(self))]
    pub async fn get(&self, handle: &str) -> Result<CompanyDetail, ModelError> {
        let sql = format!(
            "SELECT {} FROM companies WHERE handle = $1",
            company_queries::SELECT_ALL_COLUMNS
        );

        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(handle)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("No company: {}", handle)))?;

        let jobs = sqlx::query_as::<_, JobSummary>(
            "SELECT id, title FROM jobs WHERE company_handle = $1 ORDER BY id",
        )
        .bind(handle)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Apply a partial update to a company
    ///
    /// # Errors
    /// `ModelError::SqlBuild` when the patch is empty,
    /// `ModelError::NotFound` when the company does not exist.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, handle: &str, patch: &CompanyPatch) -> Result<Company, ModelError> {
        let set_clause = sql_for_partial_update(&update_payload(patch), &COMPANY_FIELDS)?;
        let sql = format!(
            r#"
            UPDATE companies
            SET {}
            WHERE handle = {}
            RETURNING {}
            "#,
            set_clause.clause,
            set_clause.next_placeholder(),
            company_queries::SELECT_ALL_COLUMNS
        );

        let company = sqlx::query_as::<_, Company>(&sql)
            .bind_sql_values(&set_clause.values)
            .bind(handle)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("No company: {}", handle)))?;

        tracing::info!(handle = %handle, "Company updated");
        Ok(company)
    }

    /// Delete a company and, by cascade, its jobs
    #[instrument(skip(self))]
    pub async fn remove(&self, handle: &str) -> Result<(), ModelError> {
        let deleted = sqlx::query_scalar::<_, String>(
            "DELETE FROM companies WHERE handle = $1 RETURNING handle",
        )
        .bind(handle)
        .fetch_optional(self.pool.pool())
        .await?;

        if deleted.is_none() {
            return Err(ModelError::NotFound(format!("No company: {}", handle)));
        }

        tracing::info!(handle = %handle, "Company deleted");
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SqlBuildError;
    use crate::sql::SqlValue;

    #[test]
    fn test_company_filter_by_name_and_range() {
        let filter = CompanyFilter {
            name: Some("Net".to_string()),
            min_employees: Some(200),
            max_employees: Some(800),
        };

        let generated = sql_for_filtering(&filter_payload(&filter), &COMPANY_FILTERS).unwrap();

        assert_eq!(
            generated.clause,
            "LOWER(name) LIKE $1 AND num_employees > $2 AND num_employees < $3"
        );
        assert_eq!(
            generated.values,
            vec![
                SqlValue::Text("%net%".to_string()),
                SqlValue::Int(200),
                SqlValue::Int(800),
            ]
        );
    }

    #[test]
    fn test_company_filter_single_key_uses_first_placeholder() {
        let filter = CompanyFilter {
            max_employees: Some(800),
            ..Default::default()
        };

        let generated = sql_for_filtering(&filter_payload(&filter), &COMPANY_FILTERS).unwrap();
        assert_eq!(generated.clause, "num_employees < $1");
    }

    #[test]
    fn test_empty_company_filter_is_rejected() {
        let result = sql_for_filtering(&filter_payload(&CompanyFilter::default()), &COMPANY_FILTERS);
        assert_eq!(result, Err(SqlBuildError::NoFilter));
    }

    #[test]
    fn test_company_update_maps_camel_case_fields() {
        let patch = CompanyPatch {
            num_employees: Some(10),
            logo_url: Some("http://c1.img".to_string()),
            ..Default::default()
        };

        let generated = sql_for_partial_update(&update_payload(&patch), &COMPANY_FIELDS).unwrap();

        assert_eq!(generated.clause, "\"num_employees\"=$1, \"logo_url\"=$2");
        assert_eq!(generated.next_placeholder(), "$3");
    }

    #[test]
    fn test_company_update_with_name_only() {
        let patch = CompanyPatch {
            name: Some("New".to_string()),
            ..Default::default()
        };

        let generated = sql_for_partial_update(&update_payload(&patch), &COMPANY_FIELDS).unwrap();
        assert_eq!(generated.clause, "\"name\"=$1");
        assert_eq!(generated.values, vec![SqlValue::Text("New".to_string())]);
    }

    #[test]
    fn test_empty_company_patch_is_rejected() {
        let result = sql_for_partial_update(&update_payload(&CompanyPatch::default()), &COMPANY_FIELDS);
        assert_eq!(result, Err(SqlBuildError::NoData));
    }
}
