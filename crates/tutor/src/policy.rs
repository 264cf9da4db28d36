use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::router::Confidence;

/// Where the manager should take its final answer from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Route {
    Local,
    Llm,
}

/// The facts the fallback decision depends on, gathered after the local agent ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackInputs {
    pub fallback_enabled: bool,
    pub has_api_key: bool,
    /// The agent's name is listed in the session's disabled fallbacks
    pub agent_opted_out: bool,
    pub agent_is_llm: bool,
    /// `None` for explicitly selected agents
    pub confidence: Option<Confidence>,
    pub insufficient: bool,
    pub agent_failed: bool,
}

pub struct FallbackPolicy;

impl FallbackPolicy {
    /// Hand off to the LLM only when it is allowed, reachable, and the local answer is weak:
    /// the router was unsure, the agent gave a generic reply, or the agent failed.
    pub fn decide(inputs: &FallbackInputs) -> Route {
        let allowed = inputs.fallback_enabled
            && inputs.has_api_key
            && !inputs.agent_opted_out
            && !inputs.agent_is_llm;
        let weak = inputs.confidence == Some(Confidence::Low)
            || inputs.insufficient
            || inputs.agent_failed;

        if allowed && weak {
            Route::Llm
        } else {
            Route::Local
        }
    }
}
