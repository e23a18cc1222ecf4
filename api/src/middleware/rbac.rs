use std::collections::HashMap;

use axum::{
    extract::{Path, Request},
    middleware::Next,
    response::Response,
};
use common::errors::AuthError;
use common::models::UserClaims;

use crate::handlers::ErrorResponse;

fn current_user(req: &Request) -> Result<&UserClaims, ErrorResponse> {
    req.extensions()
        .get::<UserClaims>()
        .ok_or_else(|| AuthError::NotLoggedIn.into())
}

/// Reject requests without an authenticated user
pub async fn ensure_logged_in(req: Request, next: Next) -> Result<Response, ErrorResponse> {
    current_user(&req)?;
    Ok(next.run(req).await)
}

/// Reject requests unless the authenticated user is an admin
pub async fn ensure_admin(req: Request, next: Next) -> Result<Response, ErrorResponse> {
    let claims = current_user(&req)?;

    if !claims.is_admin {
        tracing::warn!(
            username = %claims.username,
            method = %req.method(),
            path = %req.uri().path(),
            "Non-admin user attempted admin operation"
        );
        return Err(AuthError::NotAdmin.into());
    }

    Ok(next.run(req).await)
}

/// Allow the user named in the `:username` path segment, or any admin
pub async fn ensure_user_or_admin(
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Result<Response, ErrorResponse> {
    let claims = current_user(&req)?;
    let is_self = params.get("username") == Some(&claims.username);

    if !is_self && !claims.is_admin {
        tracing::warn!(
            username = %claims.username,
            path = %req.uri().path(),
            "User attempted to access another user's resource"
        );
        return Err(AuthError::NotLoggedIn.into());
    }

    Ok(next.run(req).await)
}
