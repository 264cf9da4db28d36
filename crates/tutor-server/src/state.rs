use chrono::{DateTime, Utc};
use std::sync::Arc;
use tutor::manager::{AgentManager, DispatchOptions};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<AgentManager>,
    pub defaults: DispatchOptions,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(manager: AgentManager, defaults: DispatchOptions) -> Self {
        Self {
            manager: Arc::new(manager),
            defaults,
            started_at: Utc::now(),
        }
    }
}
