use axum::http::{header, HeaderValue, Method};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::api::handlers::{self as api_handlers, AppState};
use crate::api::rate_limit;

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let settings = state.settings.clone();

    // Every API route shares one per-client quota, checked before the handler
    let api_routes = Router::new()
        .route("/branches", get(api_handlers::list_branches))
        .route("/process", post(api_handlers::process_repository))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit::enforce,
        ))
        .with_state(state);

    let health_routes = Router::new().route("/health", get(api_handlers::health_check));

    // Static index page and assets
    let static_dir = settings.server.static_dir.clone();
    let static_routes = Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir));

    Router::new()
        .merge(health_routes)
        .merge(static_routes)
        .nest("/api", api_routes)
        .layer(
            // Request body size limit - prevent memory exhaustion from large payloads
            RequestBodyLimitLayer::new(settings.server.max_request_body_size),
        )
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .allow_origin(tower_http::cors::Any)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(
            // Security headers
            SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rate_limit::ClientRateLimiter;
    use crate::github::{GitHubClient, GitHubConfig};
    use crate::{Error, Settings};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let settings = Settings::default();
        let mut state = AppState::from_settings(settings).unwrap();
        // Nothing here should reach the network
        state.github = GitHubClient::new(GitHubConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..GitHubConfig::default()
        })
        .unwrap();
        state.limiter = ClientRateLimiter::per_minute(10);
        state
    }

    #[tokio::test]
    async fn test_health_route_exists() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn test_invalid_repo_url_is_bad_request() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/branches?repo_url=https%3A%2F%2Fgitlab.com%2Fa%2Fb")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["error"],
            Error::InvalidUrl("https://gitlab.com/a/b".to_string()).to_string()
        );
    }

    #[tokio::test]
    async fn test_branches_without_query_is_json_bad_request() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/api/branches").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("repo_url"));
    }

    #[tokio::test]
    async fn test_malformed_process_body_is_bad_request() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/process")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"branch": "main"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_is_not_rate_limited() {
        let app = create_router(create_test_state());

        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
