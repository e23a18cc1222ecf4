use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Authentication middleware that validates JWT tokens
///
/// A valid `Authorization: Bearer <token>` header stores the token's
/// `UserClaims` in the request extensions. A missing or invalid token is not
/// an error here; guards decide whether the route needs a user.
#[tracing::instrument(skip_all)]
pub async fn authenticate_jwt(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = bearer_token(req.headers()).and_then(|token| {
        state
            .jwt
            .decode_token(token)
            .map_err(|e| tracing::debug!(error = %e, "Ignoring invalid token"))
            .ok()
    });

    if let Some(claims) = claims {
        tracing::debug!(username = %claims.username, "Authenticated request");
        req.extensions_mut().insert(claims);
    }

    next.run(req).await
}

/// Extract the token from a `Bearer` (or `bearer`) authorization header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}
