use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Please enter a question")]
    EmptyQuery,

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent execution failed: {0}")]
    ExecutionError(String),

    #[error("LLM fallback unavailable: {0}")]
    FallbackUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
