use crate::state::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tutor::router::{Classification, Suggestion};

#[derive(Debug, Deserialize)]
struct SuggestRequest {
    query: String,
    #[serde(default = "default_top")]
    top: usize,
}

#[derive(Debug, Serialize)]
struct SuggestResponse {
    /// The agent automatic routing would pick
    intent: Classification,
    suggestions: Vec<Suggestion>,
}

fn default_top() -> usize {
    3
}

async fn suggest(
    State(state): State<AppState>,
    Json(request): Json<SuggestRequest>,
) -> Json<SuggestResponse> {
    Json(SuggestResponse {
        intent: state.manager.detect_intent(&request.query),
        suggestions: state.manager.suggest(&request.query, request.top),
    })
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/suggest", post(suggest))
        .with_state(state)
}
