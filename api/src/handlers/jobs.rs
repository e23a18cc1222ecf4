use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use common::models::{JobFilter, JobPatch, NewJob, Validate};
use serde_json::{json, Value};

use crate::handlers::{AppJson, ErrorResponse};
use crate::state::AppState;

/// Drop filters that do not narrow the search
///
/// `hasEquity=false` is treated as absent, so it lists every job.
fn effective_filter(filter: JobFilter) -> Option<JobFilter> {
    let filter = JobFilter {
        has_equity: filter.has_equity.filter(|has_equity| *has_equity),
        ..filter
    };

    if filter.title.is_none() && filter.min_salary.is_none() && filter.has_equity.is_none() {
        None
    } else {
        Some(filter)
    }
}

/// Create a job (admin only)
#[tracing::instrument(skip(state, body))]
pub async fn create_job(
    State(state): State<AppState>,
    AppJson(body): AppJson<NewJob>,
) -> Result<(StatusCode, Json<Value>), ErrorResponse> {
    body.validate()?;

    let job = state.jobs().create(&body).await?;

    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

/// List jobs, optionally filtered by `title`, `minSalary` and `hasEquity`
///
/// A query string that does not parse as a job filter lists all jobs.
#[tracing::instrument(skip(state, query))]
pub async fn list_jobs(
    State(state): State<AppState>,
    query: Result<Query<JobFilter>, QueryRejection>,
) -> Result<Json<Value>, ErrorResponse> {
    let repository = state.jobs();

    let filter = match query {
        Ok(Query(filter)) => effective_filter(filter),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Ignoring unparseable job filter");
            None
        }
    };

    let jobs = match filter {
        Some(filter) => repository.find_by(&filter).await?,
        None => repository.find_all().await?,
    };

    Ok(Json(json!({ "jobs": jobs })))
}

#[tracing::instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ErrorResponse> {
    let job = state.jobs().get(id).await?;

    Ok(Json(json!({ "job": job })))
}

/// Update a job (admin only); the company cannot be changed
#[tracing::instrument(skip(state, body))]
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(body): AppJson<JobPatch>,
) -> Result<Json<Value>, ErrorResponse> {
    body.validate()?;

    let job = state.jobs().update(id, &body).await?;

    Ok(Json(json!({ "job": job })))
}

/// Delete a job (admin only)
#[tracing::instrument(skip(state))]
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ErrorResponse> {
    state.jobs().remove(id).await?;

    Ok(Json(json!({ "deleted": id.to_string() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_equity_false_is_ignored() {
        let filter = JobFilter {
            has_equity: Some(false),
            ..Default::default()
        };
        assert!(effective_filter(filter).is_none());
    }

    #[test]
    fn test_has_equity_false_keeps_other_keys() {
        let filter = JobFilter {
            title: Some("j".to_string()),
            has_equity: Some(false),
            ..Default::default()
        };

        let filter = effective_filter(filter).unwrap();
        assert_eq!(filter.title.as_deref(), Some("j"));
        assert_eq!(filter.has_equity, None);
    }

    #[test]
    fn test_has_equity_true_is_kept() {
        let filter = JobFilter {
            has_equity: Some(true),
            ..Default::default()
        };
        assert_eq!(effective_filter(filter).unwrap().has_equity, Some(true));
    }
}
