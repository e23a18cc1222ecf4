use std::time::Duration;

use axum::{
    extract::Request,
    handler::Handler,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{authenticate_jwt, ensure_admin, ensure_logged_in, ensure_user_or_admin};
use crate::state::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics_handler))
        .route("/auth/token", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register));

    // Reads are public; writes need an admin
    let company_routes = Router::new()
        .route(
            "/companies",
            get(handlers::companies::list_companies)
                .post(handlers::companies::create_company.layer(from_fn(ensure_admin))),
        )
        .route(
            "/companies/:handle",
            get(handlers::companies::get_company)
                .patch(handlers::companies::update_company.layer(from_fn(ensure_admin)))
                .delete(handlers::companies::delete_company.layer(from_fn(ensure_admin))),
        );

    let job_routes = Router::new()
        .route(
            "/jobs",
            get(handlers::jobs::list_jobs)
                .post(handlers::jobs::create_job.layer(from_fn(ensure_admin))),
        )
        .route(
            "/jobs/:id",
            get(handlers::jobs::get_job)
                .patch(handlers::jobs::update_job.layer(from_fn(ensure_admin)))
                .delete(handlers::jobs::delete_job.layer(from_fn(ensure_admin))),
        );

    let admin_user_routes = Router::new()
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route_layer(from_fn(ensure_admin));

    let own_user_routes = Router::new()
        .route(
            "/users/:username",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/users/:username/jobs/:id",
            post(handlers::users::apply_to_job),
        )
        .route_layer(
            ServiceBuilder::new()
                .layer(from_fn(ensure_logged_in))
                .layer(from_fn(ensure_user_or_admin)),
        );

    Router::new()
        .merge(public_routes)
        .merge(company_routes)
        .merge(job_routes)
        .merge(admin_user_routes)
        .merge(own_user_routes)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|req: &Request| {
                        tracing::info_span!(
                            "http_request",
                            request_id = %uuid::Uuid::new_v4(),
                            method = %req.method(),
                            path = %req.uri().path(),
                        )
                    }),
                )
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(cors)
                .layer(from_fn_with_state(state.clone(), authenticate_jwt)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, StatusCode};
    use common::config::Settings;
    use common::db::DbPool;
    use common::models::User;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let settings = Settings::default();
        let db_pool = DbPool::connect_lazy(&settings.database).unwrap();
        AppState::new(db_pool, settings, None)
    }

    fn token_for(state: &AppState, username: &str, is_admin: bool) -> String {
        let user = User {
            username: username.to_string(),
            first_name: "F".to_string(),
            last_name: "L".to_string(),
            email: format!("{}@user.com", username),
            is_admin,
        };
        state.jwt.create_token(&user).unwrap()
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(state: &AppState, req: Request) -> (StatusCode, serde_json::Value) {
        let response = create_router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health_check() {
        let state = test_state();
        let response = create_router(state)
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_company_anonymous_is_unauthorized() {
        let state = test_state();
        let body = r#"{"handle":"new","name":"New","description":"DescNew"}"#;

        let (status, json) = send(&state, request(Method::POST, "/companies", None, Some(body))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "Unauthorized");
        assert_eq!(json["error"]["status"], 401);
    }

    #[tokio::test]
    async fn test_create_job_non_admin_is_unauthorized() {
        let state = test_state();
        let token = token_for(&state, "u1", false);
        let body = r#"{"title":"new","salary":10,"equity":0.2,"companyHandle":"c1"}"#;

        let (status, json) =
            send(&state, request(Method::POST, "/jobs", Some(&token), Some(body))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "You are not an Admin");
    }

    #[tokio::test]
    async fn test_invalid_token_is_treated_as_anonymous() {
        let state = test_state();

        let (status, json) = send(
            &state,
            request(Method::DELETE, "/jobs/1", Some("not-a-token"), None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_list_users_requires_admin() {
        let state = test_state();
        let token = token_for(&state, "u1", false);

        let (status, _) = send(&state, request(Method::GET, "/users", Some(&token), None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_other_user_is_unauthorized() {
        let state = test_state();
        let token = token_for(&state, "u2", false);

        let (status, _) = send(&state, request(Method::GET, "/users/u1", Some(&token), None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_apply_for_other_user_is_unauthorized() {
        let state = test_state();
        let token = token_for(&state, "u2", false);

        let (status, _) = send(
            &state,
            request(Method::POST, "/users/u1/jobs/1", Some(&token), None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_self_patch_cannot_grant_admin() {
        let state = test_state();
        let token = token_for(&state, "u1", false);

        for body in [r#"{"isAdmin":true}"#, r#"{"firstName":"U1F","isAdmin":false}"#] {
            let (status, json) = send(
                &state,
                request(Method::PATCH, "/users/u1", Some(&token), Some(body)),
            )
            .await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["error"]["message"], "You are not an Admin");
        }
    }

    #[tokio::test]
    async fn test_admin_patch_with_unknown_field_is_bad_request() {
        let state = test_state();
        let token = token_for(&state, "admin", true);
        let body = r#"{"companyHandle":"c2"}"#;

        let (status, json) = send(
            &state,
            request(Method::PATCH, "/jobs/1", Some(&token), Some(body)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["status"], 400);
    }

    #[tokio::test]
    async fn test_admin_create_job_with_bad_equity_is_bad_request() {
        let state = test_state();
        let token = token_for(&state, "admin", true);
        let body = r#"{"title":"new","salary":10,"equity":1.5,"companyHandle":"c1"}"#;

        let (status, _) =
            send(&state, request(Method::POST, "/jobs", Some(&token), Some(body))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_company_filter_with_unknown_key_is_bad_request() {
        let state = test_state();

        let (status, _) = send(
            &state,
            request(Method::GET, "/companies?nope=nope", None, None),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_with_short_password_is_bad_request() {
        let state = test_state();
        let body = r#"{"username":"new","password":"pw","firstName":"F","lastName":"L","email":"new@email.com"}"#;

        let (status, _) = send(&state, request(Method::POST, "/auth/register", None, Some(body))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let state = test_state();
        let response = create_router(state)
            .oneshot(request(Method::GET, "/metrics", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
