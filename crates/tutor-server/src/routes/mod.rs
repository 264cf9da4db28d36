pub mod agents;
pub mod dispatch;
pub mod status;
pub mod suggest;

use crate::state::AppState;
use axum::Router;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(agents::routes(state.clone()))
        .merge(dispatch::routes(state.clone()))
        .merge(suggest::routes(state.clone()))
        .merge(status::routes(state))
}
