//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...`
/// - Static presentation layer (`./static/index.html`) as the fallback for every other path
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Unknown paths get the page itself, so client-side routes load with 200.
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/calendar", get(http::http_get_calendar))
        .route("/api/v1/slots/:id/select", post(http::http_post_select))
        .route("/api/v1/language", post(http::http_post_language))
        .route("/api/v1/test", post(http::http_post_test))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use tower::ServiceExt;

    use super::*;
    use crate::calendar::UnlockPolicy;
    use crate::logic::tests::app;

    async fn call(router: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = router.oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn health_reports_lesson_count() {
        let router = build_router(Arc::new(app(UnlockPolicy::AlwaysOpen)));
        let (status, body) = call(router, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["lessons"], 24);
    }

    #[tokio::test]
    async fn select_and_test_over_http() {
        let state = Arc::new(app(UnlockPolicy::AlwaysOpen));

        let (status, body) = call(build_router(state.clone()), "POST", "/api/v1/slots/4/select", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 4);

        let (status, body) = call(
            build_router(state.clone()),
            "POST",
            "/api/v1/test",
            Some(r#"{"subject": "12345-6789"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["status"], "matched");
        assert_eq!(body["outcome"]["fullMatch"], "12345-6789");
        assert_eq!(body["outcome"]["groups"][0], "-6789");
    }

    #[tokio::test]
    async fn error_statuses() {
        let state = Arc::new(app(UnlockPolicy::AlwaysOpen));

        for uri in ["/api/v1/slots/30/select", "/api/v1/slots/-1/select", "/api/v1/slots/abc/select"] {
            let (status, body) = call(build_router(state.clone()), "POST", uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert!(body["error"].as_str().unwrap().starts_with("There is no door"), "{uri}");
        }

        let (status, _) = call(build_router(state.clone()), "POST", "/api/v1/test", Some(r#"{"subject": "x"}"#)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(build_router(state), "POST", "/api/v1/language", Some(r#"{"language": "perl"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn locked_slot_is_forbidden() {
        let state = app(UnlockPolicy::DateGated { month: 12 });
        let dec3 = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        let err = state.calendar.write().await.select_on(4, dec3).unwrap_err();

        let resp = http::error_response(err.into());
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "This door is locked! Come back on December 4th.");
    }

    #[tokio::test]
    async fn presentation_layer_is_served() {
        for uri in ["/", "/some/client/route"] {
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let resp = build_router(Arc::new(app(UnlockPolicy::AlwaysOpen))).oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            assert!(String::from_utf8_lossy(&bytes).contains("Regex Advent"), "{uri}");
        }
    }
}
