// User repository implementation

use super::queries::user_queries;
use crate::auth::{hash_password, verify_password};
use crate::db::DbPool;
use crate::errors::{AuthError, DatabaseError, ModelError};
use crate::models::{ApplicationSummary, AppliedJob, NewUser, User, UserDetail, UserPatch};
use crate::sql::{sql_for_partial_update, BindSqlValues, FieldMap, UpdatePayload};
use crate::telemetry;
use sqlx::FromRow;
use tracing::instrument;

const USER_COLUMNS: &[(&str, &str)] = &[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("isAdmin", "is_admin"),
];

/// Request field → column mapping for user updates
pub const USER_FIELDS: FieldMap = FieldMap::new(USER_COLUMNS);

/// Build the update payload for a user; `password` must already be hashed
pub fn update_payload(patch: &UserPatch, password_hash: Option<String>) -> UpdatePayload {
    UpdatePayload::new()
        .set_opt("firstName", patch.first_name.clone())
        .set_opt("lastName", patch.last_name.clone())
        .set_opt("email", patch.email.clone())
        .set_opt("isAdmin", patch.is_admin)
        .set_opt("password", password_hash)
}

#[derive(FromRow)]
struct UserCredentials {
    #[sqlx(flatten)]
    user: User,
    password: String,
}

/// Repository for user-related database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
    bcrypt_cost: u32,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Check a username and password
    ///
    /// # Errors
    /// `AuthError::InvalidCredentials` when the user is unknown or the
    /// password does not match; both cases share one message.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, ModelError> {
        let sql = format!(
            "SELECT {}, password FROM users WHERE username = $1",
            user_queries::SELECT_ALL_COLUMNS
        );

        let credentials = sqlx::query_as::<_, UserCredentials>(&sql)
            .bind(username)
            .fetch_optional(self.pool.pool())
            .await?;

        if let Some(credentials) = credentials {
            if verify_password(password, &credentials.password)? {
                return Ok(credentials.user);
            }
        }

        tracing::warn!(username = %username, "Invalid login attempt");
        Err(AuthError::InvalidCredentials.into())
    }

    /// Create a user with a hashed password
    ///
    /// # Errors
    /// `ModelError::BadRequest` when the username is taken.
    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn register(&self, new_user: &NewUser) -> Result<User, ModelError> {
        let duplicate = sqlx::query_scalar::<_, String>(
            "SELECT username FROM users WHERE username = $1",
        )
        .bind(&new_user.username)
        .fetch_optional(self.pool.pool())
        .await?;

        if duplicate.is_some() {
            return Err(ModelError::BadRequest(format!(
                "Duplicate username: {}",
                new_user.username
            )));
        }

        let password_hash = hash_password(&new_user.password, self.bcrypt_cost)?;

        let sql = format!(
            r#"
            INSERT INTO users (username, password, first_name, last_name, email, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            user_queries::SELECT_ALL_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.email)
            .bind(new_user.is_admin)
            .fetch_one(self.pool.pool())
            .await?;

        tracing::info!(username = %user.username, is_admin = user.is_admin, "User created");
        Ok(user)
    }

    /// List all users ordered by username
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<User>, ModelError> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY username",
            user_queries::SELECT_ALL_COLUMNS
        );

        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(self.pool.pool())
            .await?;

        Ok(users)
    }

    /// Get a user with the jobs they applied to
    #[instrument(skip(self))]
    pub async fn get(&self, username: &str) -> Result<UserDetail, ModelError> {
        let sql = format!(
            "SELECT {} FROM users WHERE username = $1",
            user_queries::SELECT_ALL_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("No user: {}", username)))?;

        let applications = sqlx::query_as::<_, ApplicationSummary>(
            r#"
            SELECT jobs.id, jobs.title, applications.status
            FROM applications
            JOIN jobs ON jobs.id = applications.job_id
            WHERE applications.username = $1
            ORDER BY jobs.id
            "#,
        )
        .bind(username)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(UserDetail { user, applications })
    }

    /// Apply a partial update to a user, re-hashing a new password
    ///
    /// # Errors
    /// `ModelError::SqlBuild` when the patch is empty,
    /// `ModelError::NotFound` when the user does not exist.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, username: &str, patch: &UserPatch) -> Result<User, ModelError> {
        let password_hash = match &patch.password {
            Some(password) => Some(hash_password(password, self.bcrypt_cost)?),
            None => None,
        };

        let set_clause = sql_for_partial_update(&update_payload(patch, password_hash), &USER_FIELDS)?;
        let sql = format!(
            r#"
            UPDATE users
            SET {}
            WHERE username = {}
            RETURNING {}
            "#,
            set_clause.clause,
            set_clause.next_placeholder(),
            user_queries::SELECT_ALL_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind_sql_values(&set_clause.values)
            .bind(username)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("No user: {}", username)))?;

        tracing::info!(username = %username, "User updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, username: &str) -> Result<(), ModelError> {
        let deleted = sqlx::query_scalar::<_, String>(
            "DELETE FROM users WHERE username = $1 RETURNING username",
        )
        .bind(username)
        .fetch_optional(self.pool.pool())
        .await?;

        if deleted.is_none() {
            return Err(ModelError::NotFound(format!("No user: {}", username)));
        }

        tracing::info!(username = %username, "User deleted");
        Ok(())
    }

    /// Record an application by a user for a job
    ///
    /// # Errors
    /// `ModelError::NotFound` when the job or the user does not exist,
    /// `ModelError::BadRequest` when the user already applied.
    #[instrument(skip(self))]
    pub async fn apply_to_job(&self, username: &str, job_id: i32) -> Result<AppliedJob, ModelError> {
        let job = sqlx::query_as::<_, AppliedJob>(
            "SELECT id AS job_id, company_handle FROM jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(self.pool.pool())
        .await?
        .ok_or_else(|| ModelError::NotFound(format!("No Job Found with ID: {}", job_id)))?;

        let user = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(self.pool.pool())
            .await?;

        if user.is_none() {
            return Err(ModelError::NotFound(format!("No user: {}", username)));
        }

        let inserted = sqlx::query(
            "INSERT INTO applications (username, job_id, status) VALUES ($1, $2, 'applied')",
        )
        .bind(username)
        .bind(job_id)
        .execute(self.pool.pool())
        .await;

        match inserted.map_err(DatabaseError::from) {
            Ok(_) => {}
            Err(DatabaseError::DuplicateKey(_)) => {
                return Err(ModelError::BadRequest(format!(
                    "You already applied for job {}",
                    job_id
                )));
            }
            Err(e) => return Err(e.into()),
        }

        telemetry::record_job_application();
        tracing::info!(username = %username, job_id = job_id, "Job application recorded");
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::SqlValue;

    #[test]
    fn test_user_update_maps_camel_case_fields() {
        let patch = UserPatch {
            first_name: Some("Aliya".to_string()),
            is_admin: Some(true),
            ..Default::default()
        };

        let generated = sql_for_partial_update(&update_payload(&patch, None), &USER_FIELDS).unwrap();

        assert_eq!(generated.clause, "\"first_name\"=$1, \"is_admin\"=$2");
        assert_eq!(
            generated.values,
            vec![SqlValue::Text("Aliya".to_string()), SqlValue::Bool(true)]
        );
    }

    #[test]
    fn test_user_update_uses_hashed_password() {
        let patch = UserPatch {
            password: Some("new-password".to_string()),
            ..Default::default()
        };

        let generated = sql_for_partial_update(
            &update_payload(&patch, Some("$2b$04$hash".to_string())),
            &USER_FIELDS,
        )
        .unwrap();

        assert_eq!(generated.clause, "\"password\"=$1");
        assert_eq!(
            generated.values,
            vec![SqlValue::Text("$2b$04$hash".to_string())]
        );
    }

    #[test]
    fn test_user_update_skips_missing_fields_in_numbering() {
        let patch = UserPatch {
            last_name: Some("L".to_string()),
            email: Some("new@email.com".to_string()),
            ..Default::default()
        };

        let generated = sql_for_partial_update(&update_payload(&patch, None), &USER_FIELDS).unwrap();

        assert_eq!(generated.clause, "\"last_name\"=$1, \"email\"=$2");
        assert_eq!(generated.next_placeholder(), "$3");
    }
}
