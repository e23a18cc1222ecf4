use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use common::models::{CompanyFilter, CompanyPatch, NewCompany, Validate};
use serde_json::{json, Value};

use crate::handlers::{AppJson, AppQuery, ErrorResponse};
use crate::state::AppState;

/// Create a company (admin only)
#[tracing::instrument(skip(state, body))]
pub async fn create_company(
    State(state): State<AppState>,
    AppJson(body): AppJson<NewCompany>,
) -> Result<(StatusCode, Json<Value>), ErrorResponse> {
    body.validate()?;

    let company = state.companies().create(&body).await?;

    Ok((StatusCode::CREATED, Json(json!({ "company": company }))))
}

/// List companies, optionally filtered by `name`, `minEmployees` and `maxEmployees`
#[tracing::instrument(skip(state))]
pub async fn list_companies(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<CompanyFilter>,
) -> Result<Json<Value>, ErrorResponse> {
    let repository = state.companies();

    let is_empty =
        filter.name.is_none() && filter.min_employees.is_none() && filter.max_employees.is_none();
    let companies = if is_empty {
        repository.find_all().await?
    } else {
        repository.find_by(&filter).await?
    };

    Ok(Json(json!({ "companies": companies })))
}

#[tracing::instrument(skip(state))]
pub async fn get_company(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, ErrorResponse> {
    let company = state.companies().get(&handle).await?;

    Ok(Json(json!({ "company": company })))
}

/// Update a company (admin only)
#[tracing::instrument(skip(state, body))]
pub async fn update_company(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    AppJson(body): AppJson<CompanyPatch>,
) -> Result<Json<Value>, ErrorResponse> {
    body.validate()?;

    let company = state.companies().update(&handle, &body).await?;

    Ok(Json(json!({ "company": company })))
}

/// Delete a company (admin only)
#[tracing::instrument(skip(state))]
pub async fn delete_company(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, ErrorResponse> {
    state.companies().remove(&handle).await?;

    Ok(Json(json!({ "deleted": handle })))
}
