use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use tutor::manager::{DispatchMode, DispatchOptions};
use tutor::models::response::{Response, ResponseError};

/// Fields left out fall back to the server's configured defaults
#[derive(Debug, Default, Deserialize)]
struct DispatchRequest {
    #[serde(default)]
    query: String,
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    fallback_enabled: Option<bool>,
    #[serde(default)]
    use_web: Option<bool>,
    #[serde(default)]
    disabled_fallbacks: Option<Vec<String>>,
}

impl DispatchRequest {
    fn options(&self, defaults: &DispatchOptions) -> DispatchOptions {
        let mut options = defaults.clone();
        if let Some(key) = self.api_key.as_ref().filter(|key| !key.trim().is_empty()) {
            options.api_key = Some(key.clone());
        }
        if let Some(enabled) = self.fallback_enabled {
            options.fallback_enabled = enabled;
        }
        if let Some(use_web) = self.use_web {
            options.use_web = use_web;
        }
        if let Some(disabled) = &self.disabled_fallbacks {
            options.disabled_fallbacks = disabled.iter().cloned().collect();
        }
        options
    }
}

async fn dispatch(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> (StatusCode, Json<Response>) {
    let options = request.options(&state.defaults);
    let mode = DispatchMode::from_choice(request.agent.as_deref());
    let response = state.manager.dispatch(&request.query, &mode, &options).await;

    let status = match response.error {
        Some(ResponseError::Input) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    (status, Json(response))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/dispatch", post(dispatch))
        .with_state(state)
}
