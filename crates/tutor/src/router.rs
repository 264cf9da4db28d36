use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum_macros::{Display, EnumString};
use tracing::debug;

use crate::models::descriptor::AgentDescriptor;

/// How sure the router is about its pick
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub agent: String,
    pub confidence: Confidence,
    pub score: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub agent: String,
    pub score: usize,
    pub confidence: Confidence,
}

/// Keyword and pattern router over an immutable descriptor table.
///
/// The order of the table is the tie-break priority: on equal scores the earlier
/// descriptor wins.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    descriptors: Vec<AgentDescriptor>,
    default_agent: String,
}

impl IntentRouter {
    pub fn new<S: Into<String>>(descriptors: Vec<AgentDescriptor>, default_agent: S) -> Self {
        Self {
            descriptors,
            default_agent: default_agent.into(),
        }
    }

    pub fn descriptors(&self) -> &[AgentDescriptor] {
        &self.descriptors
    }

    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }

    pub fn classify(&self, query: &str) -> Classification {
        let scores = self.scores(query);

        let mut best: Option<(usize, usize)> = None;
        for (index, &score) in scores.iter().enumerate() {
            // strict comparison keeps the earlier descriptor on ties
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        let classification = match best {
            Some((index, top)) if top > 0 => {
                let runner_up = scores
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, s)| *s)
                    .max()
                    .unwrap_or(0);
                Classification {
                    agent: self.descriptors[index].name.clone(),
                    confidence: confidence_for(top, runner_up),
                    score: top,
                }
            }
            _ => Classification {
                agent: self.default_agent.clone(),
                confidence: Confidence::Low,
                score: 0,
            },
        };

        debug!(
            agent = %classification.agent,
            confidence = %classification.confidence,
            score = classification.score,
            "classified query"
        );
        classification
    }

    /// Rank every descriptor for `query`, best first, keeping table order on ties.
    /// Each entry carries the confidence it would get if it were the pick.
    pub fn suggest(&self, query: &str, top_n: usize) -> Vec<Suggestion> {
        let scores = self.scores(query);
        let mut ranked: Vec<(usize, usize)> = scores.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        ranked
            .iter()
            .take(top_n)
            .map(|&(index, score)| {
                let best_other = scores
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, s)| *s)
                    .max()
                    .unwrap_or(0);
                Suggestion {
                    agent: self.descriptors[index].name.clone(),
                    score,
                    confidence: if score == 0 {
                        Confidence::Low
                    } else {
                        confidence_for(score, best_other)
                    },
                }
            })
            .collect()
    }

    fn scores(&self, query: &str) -> Vec<usize> {
        let lowered = query.to_lowercase();
        let normalized = normalize(&lowered);
        let tokens: HashSet<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        self.descriptors
            .iter()
            .map(|descriptor| {
                let keyword_hits = descriptor
                    .keywords
                    .iter()
                    .filter(|keyword| {
                        if keyword.chars().all(char::is_alphanumeric) {
                            tokens.contains(keyword.as_str())
                        } else {
                            normalized.contains(keyword.as_str())
                        }
                    })
                    .count();
                let pattern_hits = descriptor
                    .patterns
                    .iter()
                    .filter(|pattern| pattern.is_match(&lowered))
                    .count();
                keyword_hits + pattern_hits
            })
            .collect()
    }
}

/// Lowercase, drop punctuation other than math operators, and collapse whitespace.
pub fn normalize(query: &str) -> String {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || "+-*/^=.()%".contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn confidence_for(top: usize, runner_up: usize) -> Confidence {
    if top >= 2 && top > runner_up {
        Confidence::High
    } else if top >= 1 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}
