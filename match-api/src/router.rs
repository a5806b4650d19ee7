use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{
    app_state::AppState,
    auth::{USER_ID_HEADER, USER_ROLE_HEADER},
    config::ApplicationSettings,
    routes,
};

pub fn create(app_state: AppState, config: &ApplicationSettings) -> Router<()> {
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api/v1", routes::matching::router());

    let allow_origin = match config
        .cors_allowed_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::any(),
    };
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(USER_ID_HEADER),
            header::HeaderName::from_static(USER_ROLE_HEADER),
        ])
        .allow_origin(allow_origin);

    app.with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::domain::matching::{
        embedder::MockEmbedder, repository::MockCandidateRepository, MatchingConfig,
        MatchingService,
    };

    fn app() -> Router {
        let service = MatchingService::new(
            Arc::new(MockEmbedder::returning(vec![1.0, 0.0])),
            Arc::new(MockCandidateRepository::new()),
            MatchingConfig::default(),
        );
        let config = ApplicationSettings {
            port: 8080,
            host: "127.0.0.1".to_string(),
            debug: false,
            cors_allowed_origin: Some("http://localhost:5173".to_string()),
        };
        create(AppState::new(service, false), &config)
    }

    #[tokio::test]
    async fn root_is_not_routed() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_is_reachable() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn matching_routes_are_nested_under_api_v1() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/search/talents")
                    .method("POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/search/talents")
                    .method("POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
