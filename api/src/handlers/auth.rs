use axum::{extract::State, http::StatusCode, Json};
use common::models::{LoginRequest, NewUser, Validate};
use serde::Serialize;

use crate::handlers::{AppJson, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Exchange a username and password for a token
#[tracing::instrument(skip(state, req))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ErrorResponse> {
    req.validate()?;

    let token = state.auth_service().login(&req).await?;

    Ok(Json(TokenResponse { token }))
}

/// Register a new, non-admin user and return a token for them
#[tracing::instrument(skip(state, req))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewUser>,
) -> Result<(StatusCode, Json<TokenResponse>), ErrorResponse> {
    req.validate()?;

    let token = state.auth_service().register(req).await?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}
