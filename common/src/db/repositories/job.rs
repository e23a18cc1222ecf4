// Job repository implementation

use super::queries::job_queries;
use crate::db::DbPool;
use crate::errors::ModelError;
use crate::models::{Job, JobFilter, JobPatch, NewJob};
use crate::sql::{
    sql_for_filtering, sql_for_partial_update, BindSqlValues, FieldMap, FilterDescriptor,
    FilterPayload, FilterRule, Operator, ResolvedFilter, SqlValue, UpdatePayload,
};
use tracing::instrument;

/// Job fields share their column names
pub const JOB_FIELDS: FieldMap = FieldMap::EMPTY;

/// `hasEquity=true` keeps jobs with positive equity; anything else keeps
/// jobs without equity, where a missing value counts as zero.
fn equity_rule(payload: &FilterPayload) -> ResolvedFilter {
    match payload.get("hasEquity") {
        Some(SqlValue::Bool(true)) => ResolvedFilter::new("equity", Operator::Gt).with_value(0.0),
        _ => ResolvedFilter::new("COALESCE(equity, 0)", Operator::In)
            .with_value(SqlValue::list([0.0])),
    }
}

const JOB_FILTER_RULES: &[(&str, FilterRule)] = &[
    ("title", FilterRule::new("LOWER(title)", Operator::Like)),
    ("minSalary", FilterRule::new("salary", Operator::Gt)),
    ("hasEquity", FilterRule::Dynamic(equity_rule)),
];

/// Filter keys accepted by `GET /jobs`
pub const JOB_FILTERS: FilterDescriptor = FilterDescriptor::new(JOB_FILTER_RULES);

/// Build the filter payload for a job search; titles match case-insensitively
pub fn filter_payload(filter: &JobFilter) -> FilterPayload {
    FilterPayload::new()
        .with_opt("title", filter.title.as_ref().map(|title| title.to_lowercase()))
        .with_opt("minSalary", filter.min_salary)
        .with_opt("hasEquity", filter.has_equity)
}

pub fn update_payload(patch: &JobPatch) -> UpdatePayload {
    UpdatePayload::new()
        .set_opt("title", patch.title.clone())
        .set_opt("salary", patch.salary)
        .set_opt("equity", patch.equity)
}

/// Repository for job-related database operations
#[derive(Clone)]
pub struct JobRepository {
    pool: DbPool,
}

impl JobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a job for an existing company
    ///
    /// # Errors
    /// `ModelError::BadRequest` when the company does not exist.
    #[instrument(skip(self, job), fields(company_handle = %job.company_handle))]
    pub async fn create(&self, job: &NewJob) -> Result<Job, ModelError> {
        let company = sqlx::query_scalar::<_, String>(
            "SELECT handle FROM companies WHERE handle = $1",
        )
        .bind(&job.company_handle)
        .fetch_optional(self.pool.pool())
        .await?;

        if company.is_none() {
            return Err(ModelError::BadRequest(format!(
                "Company Handle {} does not exist.",
                job.company_handle
            )));
        }

        let sql = format!(
            r#"
            INSERT INTO jobs (title, salary, equity, company_handle)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            job_queries::SELECT_ALL_COLUMNS
        );

        let created = sqlx::query_as::<_, Job>(&sql)
            .bind(&job.title)
            .bind(job.salary)
            .bind(job.equity)
            .bind(&job.company_handle)
            .fetch_one(self.pool.pool())
            .await?;

        tracing::info!(job_id = created.id, "Job created");
        Ok(created)
    }

    /// List all jobs ordered by title
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Job>, ModelError> {
        let sql = format!(
            "SELECT {} FROM jobs ORDER BY title, id",
            job_queries::SELECT_ALL_COLUMNS
        );

        let jobs = sqlx::query_as::<_, Job>(&sql)
            .fetch_all(self.pool.pool())
            .await?;

        Ok(jobs)
    }

    /// List jobs matching a filter
    ///
    /// # Errors
    /// `ModelError::SqlBuild` when the filter is empty.
    #[instrument(skip(self))]
    pub async fn find_by(&self, filter: &JobFilter) -> Result<Vec<Job>, ModelError> {
        let where_clause = sql_for_filtering(&filter_payload(filter), &JOB_FILTERS)?;
        let sql = format!(
            "SELECT {} FROM jobs WHERE {} ORDER BY title, id",
            job_queries::SELECT_ALL_COLUMNS,
            where_clause.clause
        );

        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind_sql_values(&where_clause.values)
            .fetch_all(self.pool.pool())
            .await?;

        Ok(jobs)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<Job, ModelError> {
        let sql = format!(
            "SELECT {} FROM jobs WHERE id = $1",
            job_queries::SELECT_ALL_COLUMNS
        );

        sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("No job ID of: {}", id)))
    }

    /// Apply a partial update to a job
    ///
    /// # Errors
    /// `ModelError::SqlBuild` when the patch is empty,
    /// `ModelError::NotFound` when the job does not exist.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i32, patch: &JobPatch) -> Result<Job, ModelError> {
        let set_clause = sql_for_partial_update(&update_payload(patch), &JOB_FIELDS)?;
        let sql = format!(
            r#"
            UPDATE jobs
            SET {}
            WHERE id = {}
            RETURNING {}
            "#,
            set_clause.clause,
            set_clause.next_placeholder(),
            job_queries::SELECT_ALL_COLUMNS
        );

        let job = sqlx::query_as::<_, Job>(&sql)
            .bind_sql_values(&set_clause.values)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("No Job Found with ID: {}", id)))?;

        tracing::info!(job_id = id, "Job updated");
        Ok(job)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: i32) -> Result<(), ModelError> {
        let deleted = sqlx::query_scalar::<_, i32>("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;

        if deleted.is_none() {
            return Err(ModelError::NotFound(format!("No Job Found with ID: {}", id)));
        }

        tracing::info!(job_id = id, "Job deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SqlBuildError;

    #[test]
    fn test_job_filter_all_keys() {
        let filter = JobFilter {
            title: Some("J".to_string()),
            min_salary: Some(400),
            has_equity: Some(true),
        };

        let generated = sql_for_filtering(&filter_payload(&filter), &JOB_FILTERS).unwrap();

        assert_eq!(
            generated.clause,
            "LOWER(title) LIKE $1 AND salary > $2 AND equity > $3"
        );
        assert_eq!(
            generated.values,
            vec![
                SqlValue::Text("%j%".to_string()),
                SqlValue::Int(400),
                SqlValue::Float(0.0),
            ]
        );
    }

    #[test]
    fn test_job_filter_without_equity() {
        let filter = JobFilter {
            has_equity: Some(false),
            ..Default::default()
        };

        let generated = sql_for_filtering(&filter_payload(&filter), &JOB_FILTERS).unwrap();

        assert_eq!(generated.clause, "COALESCE(equity, 0) = ANY($1)");
        assert_eq!(generated.values, vec![SqlValue::list([0.0])]);
    }

    #[test]
    fn test_job_filter_min_salary_only() {
        let filter = JobFilter {
            min_salary: Some(250),
            ..Default::default()
        };

        let generated = sql_for_filtering(&filter_payload(&filter), &JOB_FILTERS).unwrap();
        assert_eq!(generated.clause, "salary > $1");
        assert_eq!(generated.values, vec![SqlValue::Int(250)]);
    }

    #[test]
    fn test_empty_job_filter_is_rejected() {
        let result = sql_for_filtering(&filter_payload(&JobFilter::default()), &JOB_FILTERS);
        assert_eq!(result, Err(SqlBuildError::NoFilter));
    }

    #[test]
    fn test_job_update_keeps_column_names() {
        let patch = JobPatch {
            salary: Some(500),
            equity: Some(0.5),
            ..Default::default()
        };

        let generated = sql_for_partial_update(&update_payload(&patch), &JOB_FIELDS).unwrap();

        assert_eq!(generated.clause, "\"salary\"=$1, \"equity\"=$2");
        assert_eq!(
            generated.values,
            vec![SqlValue::Int(500), SqlValue::Float(0.5)]
        );
        assert_eq!(generated.next_placeholder(), "$3");
    }
}
