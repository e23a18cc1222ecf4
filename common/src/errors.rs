// Error handling framework

use thiserror::Error;

/// Failures raised while generating dynamic SQL fragments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlBuildError {
    /// Partial update had no provided fields
    #[error("No data")]
    NoData,

    /// Filter payload was empty
    #[error("No Data To Filter By")]
    NoFilter,
}

impl SqlBuildError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SqlBuildError::NoData => "no_data",
            SqlBuildError::NoFilter => "no_filter",
        }
    }
}

/// Authentication and authorization errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username/password")]
    InvalidCredentials,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Unauthorized")]
    NotLoggedIn,

    #[error("You are not an Admin")]
    NotAdmin,

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}

/// Validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFieldValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate key violation: {0}")]
    DuplicateKey(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),
}

/// Errors returned by the model layer (repositories)
///
/// `NotFound` and `BadRequest` carry the message shown to the client; the
/// wrapped variants are mapped by the HTTP layer.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    SqlBuild(#[from] SqlBuildError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.into())
    }
}

/// Transport-neutral error: a status code name and the client-facing message
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<SqlBuildError> for ApiError {
    fn from(err: SqlBuildError) -> Self {
        ApiError::new("BAD_REQUEST", err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::new("BAD_REQUEST", err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let code = match err {
            AuthError::HashingFailed(_) => "INTERNAL_ERROR",
            _ => "UNAUTHORIZED",
        };
        let message = match err {
            AuthError::InvalidToken(_) | AuthError::TokenExpired => "Unauthorized".to_string(),
            _ => err.to_string(),
        };
        ApiError::new(code, message)
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound(message) => ApiError::new("NOT_FOUND", message),
            ModelError::BadRequest(message) => ApiError::new("BAD_REQUEST", message),
            ModelError::SqlBuild(e) => e.into(),
            ModelError::Validation(e) => e.into(),
            ModelError::Auth(e) => e.into(),
            ModelError::Database(DatabaseError::NotFound(message)) => {
                ApiError::new("NOT_FOUND", message)
            }
            // Database internals are logged by the caller, never echoed to clients
            ModelError::Database(_) => ApiError::new("INTERNAL_ERROR", "Internal Server Error"),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateKey(db_err.message().to_string()),
                        "23503" => DatabaseError::ForeignKeyViolation(db_err.message().to_string()),
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::InvalidJson(err.to_string())
    }
}
