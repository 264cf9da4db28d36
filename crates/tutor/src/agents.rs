pub mod ap_stem;
pub mod college_admission;
pub mod games;
pub mod highschool;
pub mod llm;
pub mod math;
pub mod mcq;
pub mod music_travel;
pub mod sat_act;

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::descriptor::AgentDescriptor;
use crate::models::response::Response;

pub use ap_stem::ApStemAgent;
pub use college_admission::CollegeAdmissionAgent;
pub use games::GamesAgent;
pub use highschool::HighSchoolAgent;
pub use llm::LlmAgent;
pub use math::MathAgent;
pub use music_travel::MusicTravelAgent;
pub use sat_act::SatActAgent;

/// A responder for one subject area
#[async_trait]
pub trait Agent: Send + Sync {
    /// Display name, also the key used for explicit selection
    fn name(&self) -> &str;

    /// Answer a single query. Rule-based agents never touch the network.
    async fn handle(&self, query: &str) -> AgentResult<Response>;
}

/// An agent together with the routing metadata that points queries at it
#[derive(Clone)]
pub struct Registration {
    pub descriptor: AgentDescriptor,
    pub agent: Arc<dyn Agent>,
}

/// Ordered set of local agents. Order is routing priority.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    entries: Vec<Registration>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: AgentDescriptor, agent: Arc<dyn Agent>) {
        self.entries.push(Registration { descriptor, agent });
    }

    /// Case-insensitive lookup by agent name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.entries
            .iter()
            .find(|entry| entry.agent.name().eq_ignore_ascii_case(name.trim()))
            .map(|entry| entry.agent.clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.agent.name().to_string())
            .collect()
    }

    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        self.entries
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The built-in subject agents with their keyword tables, in routing priority order
    pub fn with_defaults() -> AgentResult<Self> {
        let mut registry = Self::new();

        registry.register(
            descriptor(
                MathAgent::NAME,
                &[
                    "calculate", "math", "equation", "solve", "algebra", "geometry", "formula",
                    "add", "subtract", "multiply", "divide", "arithmetic", "number", "fraction",
                    "decimal", "percentage", "ratio", "proportion", "simplify", "evaluate",
                ],
                &[
                    r"\d\s*[-+*/^=%×÷]\s*[\d(a-z]",
                    r"\d[a-z]\b|\d\s*\(",
                    r"\b(sqrt|sin|cos|tan|log|ln|exp)\s*\(|[π√×÷]",
                ],
            )?,
            Arc::new(MathAgent::new()),
        );
        registry.register(
            descriptor(
                ApStemAgent::NAME,
                &[
                    "ap", "derivative", "integral", "calculus", "physics", "chemistry", "biology",
                    "statistics", "d/dx", "differentiate", "antiderivative", "integrate", "limit",
                    "kinematics", "momentum", "velocity", "acceleration", "titration", "molecular",
                    "electron", "dna", "probability", "hypothesis",
                ],
                &[r"\b(derivative|integral|antiderivative|integrate|differentiate)\b"],
            )?,
            Arc::new(ApStemAgent::new()),
        );
        registry.register(
            descriptor(
                SatActAgent::NAME,
                &["sat", "act", "practice", "score", "scoring", "test prep", "reading"],
                &[
                    r"(?m)^\s*[a-d]\s*[).:]\s*\S",
                    r"\ba\s*[).:]\s*[^\n]*\bb\s*[).:]",
                ],
            )?,
            Arc::new(SatActAgent::new()),
        );
        registry.register(
            descriptor(
                CollegeAdmissionAgent::NAME,
                &[
                    "college", "admission", "admissions", "essay", "application",
                    "extracurricular", "extracurriculars", "recommendation", "common app",
                    "personal statement", "rank",
                ],
                &[r"^\s*(essay|sample|rank)\b"],
            )?,
            Arc::new(CollegeAdmissionAgent::new()),
        );
        registry.register(
            descriptor(
                HighSchoolAgent::NAME,
                &[
                    "history", "literature", "government", "civics", "english", "homework",
                    "school", "pythagoras", "photosynthesis", "cell", "newton", "acid", "force",
                    "stoichiometry", "equilibrium", "economics", "gdp", "inflation", "supply",
                    "demand",
                ],
                &[],
            )?,
            Arc::new(HighSchoolAgent::new()),
        );
        registry.register(
            descriptor(
                MusicTravelAgent::NAME,
                &[
                    "music", "song", "melody", "chord", "scale", "tempo", "rhythm", "compose",
                    "piano", "guitar", "travel", "trip", "visa", "pack", "packing", "flight",
                    "hotel", "vacation", "passport",
                ],
                &[r"https?://"],
            )?,
            Arc::new(MusicTravelAgent::new()),
        );
        registry.register(
            descriptor(
                GamesAgent::NAME,
                &[
                    "game", "games", "play", "chess", "trivia", "puzzle", "riddle", "brainteaser",
                    "rules", "cards", "dice",
                ],
                &[],
            )?,
            Arc::new(GamesAgent::new()),
        );

        Ok(registry)
    }
}

fn descriptor(name: &str, keywords: &[&str], patterns: &[&str]) -> AgentResult<AgentDescriptor> {
    AgentDescriptor::new(name)
        .with_keywords(keywords)
        .with_patterns(patterns)
        .map_err(|e| AgentError::Internal(format!("invalid pattern for {}: {}", name, e)))
}

/// Name of the agent picked when nothing in the query matches
pub const DEFAULT_AGENT: &str = HighSchoolAgent::NAME;
