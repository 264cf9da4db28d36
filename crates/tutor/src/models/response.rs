use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::Display;

/// Where the text of a [`Response`] came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResponseProvider {
    #[default]
    Local,
    Llm,
    None,
}

/// Failure classes a caller may want to surface differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResponseError {
    /// The query was empty or otherwise unusable; the user should re-enter it
    Input,
    /// An agent failed while computing its answer
    Agent,
}

/// The single result shape every agent and the manager hand back to the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub provider: ResponseProvider,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insufficient: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Response {
    fn new<S: Into<String>>(text: S, provider: ResponseProvider) -> Self {
        Response {
            text: text.into(),
            provider,
            urls: Vec::new(),
            agent: None,
            insufficient: false,
            fallback_from: None,
            fallback_reason: None,
            error: None,
            details: None,
        }
    }

    pub fn local<S: Into<String>>(text: S) -> Self {
        Self::new(text, ResponseProvider::Local)
    }

    pub fn llm<S: Into<String>>(text: S) -> Self {
        Self::new(text, ResponseProvider::Llm)
    }

    pub fn input_error<S: Into<String>>(text: S) -> Self {
        let mut response = Self::new(text, ResponseProvider::None);
        response.error = Some(ResponseError::Input);
        response
    }

    pub fn agent_error<S: Into<String>>(text: S) -> Self {
        let mut response = Self::new(text, ResponseProvider::None);
        response.error = Some(ResponseError::Agent);
        response
    }

    /// Mark this answer as a generic reply that a better source could improve on
    pub fn mark_insufficient(mut self) -> Self {
        self.insufficient = true;
        self
    }

    pub fn with_agent<S: Into<String>>(mut self, agent: S) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_url<S: Into<String>>(mut self, url: S) -> Self {
        self.urls.push(url.into());
        self
    }

    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls.extend(urls);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_fallback_from<S: Into<String>>(mut self, agent: S) -> Self {
        self.fallback_from = Some(agent.into());
        self
    }

    pub fn with_fallback_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.fallback_reason = Some(reason.into());
        self
    }

    /// An empty answer counts as insufficient even when the agent did not flag it.
    pub fn is_insufficient(&self) -> bool {
        self.insufficient || self.text.trim().is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
