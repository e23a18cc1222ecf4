use crate::errors::ValidationError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

lazy_static! {
    static ref HANDLE_RE: Regex = Regex::new(r"^[a-z0-9][a-z0-9-]*$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Checks applied to request bodies before they reach the repositories
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::invalid(
            field,
            format!("length must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: Option<i32>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::invalid(field, "must be >= 0")),
        _ => Ok(()),
    }
}

fn require_equity(value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(ValidationError::invalid(
            "equity",
            "must be between 0 and 1",
        )),
        _ => Ok(()),
    }
}

fn require_email(value: &str) -> Result<(), ValidationError> {
    require_length("email", value, 6, 60)?;
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::invalid("email", "not a valid email address"));
    }
    Ok(())
}

fn require_url(field: &str, value: &str) -> Result<(), ValidationError> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ValidationError::invalid(field, "must be an http(s) URL"));
    }
    Ok(())
}

// ============================================================================
// Company Models
// ============================================================================

/// Company row as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Company row in listings, with its number of open jobs
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompanyListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub company: Company,
    pub job_count: i64,
}

/// Company with its jobs
#[derive(Debug, Clone, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl Validate for NewCompany {
    fn validate(&self) -> Result<(), ValidationError> {
        require_length("handle", &self.handle, 1, 25)?;
        if !HANDLE_RE.is_match(&self.handle) {
            return Err(ValidationError::invalid(
                "handle",
                "must be lowercase letters, digits and dashes",
            ));
        }
        require_length("name", &self.name, 1, 100)?;
        require_non_negative("numEmployees", self.num_employees)?;
        if let Some(url) = &self.logo_url {
            require_url("logoUrl", url)?;
        }
        Ok(())
    }
}

/// Partial company update; the handle cannot change
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl Validate for CompanyPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_length("name", name, 1, 100)?;
        }
        require_non_negative("numEmployees", self.num_employees)?;
        if let Some(url) = &self.logo_url {
            require_url("logoUrl", url)?;
        }
        Ok(())
    }
}

/// `GET /companies` query-string filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyFilter {
    pub name: Option<String>,
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
}

// ============================================================================
// Job Models
// ============================================================================

/// Job row as returned by the API
///
/// Equity is a NUMERIC column rendered as its decimal text, e.g. `"0.5"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<String>,
    pub company_handle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobSummary {
    pub id: i32,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

impl Validate for NewJob {
    fn validate(&self) -> Result<(), ValidationError> {
        require_length("title", &self.title, 1, 100)?;
        require_non_negative("salary", self.salary)?;
        require_equity(self.equity)?;
        require_length("companyHandle", &self.company_handle, 1, 25)
    }
}

/// Partial job update; the company cannot change
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobPatch {
    pub title: Option<String>,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
}

impl Validate for JobPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_length("title", title, 1, 100)?;
        }
        require_non_negative("salary", self.salary)?;
        require_equity(self.equity)
    }
}

/// `GET /jobs` query-string filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    pub has_equity: Option<bool>,
}

// ============================================================================
// User and Authentication Models
// ============================================================================

/// User as returned by the API; the password hash never leaves the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// User together with the jobs they applied to
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub applications: Vec<ApplicationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ApplicationSummary {
    pub id: i32,
    pub title: String,
    pub status: String,
}

/// Result of applying to a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJob {
    pub job_id: i32,
    pub company_handle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ValidationError> {
        require_length("username", &self.username, 1, 25)?;
        require_length("password", &self.password, 5, 20)?;
        require_length("firstName", &self.first_name, 1, 30)?;
        require_length("lastName", &self.last_name, 1, 30)?;
        require_email(&self.email)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(first_name) = &self.first_name {
            require_length("firstName", first_name, 1, 30)?;
        }
        if let Some(last_name) = &self.last_name {
            require_length("lastName", last_name, 1, 30)?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        if let Some(password) = &self.password {
            require_length("password", password, 5, 20)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_length("username", &self.username, 1, 25)?;
        require_length("password", &self.password, 1, 20)
    }
}

/// JWT claims issued on login and registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}
