use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use common::errors::AuthError;
use common::models::{NewUser, UserClaims, UserPatch, Validate};
use serde_json::{json, Value};

use crate::handlers::{AppJson, ErrorResponse};
use crate::state::AppState;

/// Create a user, possibly an admin, and return a token for them (admin only)
#[tracing::instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(body): AppJson<NewUser>,
) -> Result<(StatusCode, Json<Value>), ErrorResponse> {
    body.validate()?;

    let user = state.users().register(&body).await?;
    let token = state.jwt.create_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user, "token": token })),
    ))
}

/// List all users (admin only)
#[tracing::instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, ErrorResponse> {
    let users = state.users().find_all().await?;

    Ok(Json(json!({ "users": users })))
}

/// Get a user with their applications (self or admin)
#[tracing::instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ErrorResponse> {
    let user = state.users().get(&username).await?;

    Ok(Json(json!({ "user": user })))
}

/// Update a user (self or admin); only admins may change `isAdmin`
#[tracing::instrument(skip(state, claims, body))]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(username): Path<String>,
    AppJson(body): AppJson<UserPatch>,
) -> Result<Json<Value>, ErrorResponse> {
    if body.is_admin.is_some() && !claims.is_admin {
        tracing::warn!(
            username = %claims.username,
            target_user = %username,
            "Non-admin user attempted to change admin flag"
        );
        return Err(AuthError::NotAdmin.into());
    }
    body.validate()?;

    let user = state.users().update(&username, &body).await?;

    Ok(Json(json!({ "user": user })))
}

/// Delete a user (self or admin)
#[tracing::instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ErrorResponse> {
    state.users().remove(&username).await?;

    Ok(Json(json!({ "deleted": username })))
}

/// Apply for a job on behalf of a user (self or admin)
#[tracing::instrument(skip(state))]
pub async fn apply_to_job(
    State(state): State<AppState>,
    Path((username, id)): Path<(String, i32)>,
) -> Result<Json<Value>, ErrorResponse> {
    let application = state.users().apply_to_job(&username, id).await?;

    Ok(Json(json!({ "applied": application.job_id })))
}
