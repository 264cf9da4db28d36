use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

async fn status(State(state): State<AppState>) -> Json<Value> {
    let uptime = Utc::now() - state.started_at;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_secs": uptime.num_seconds(),
        "fallback_enabled": state.defaults.fallback_enabled,
        "llm_key_configured": state.defaults.api_key().is_some(),
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{json_body, state};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_status() {
        let app = routes(state("http://127.0.0.1:9"));
        let request = Request::builder()
            .uri("/status")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response.into_body()).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["llm_key_configured"], false);
        assert!(body["uptime_secs"].as_i64().unwrap() >= 0);
    }
}
