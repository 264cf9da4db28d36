use async_trait::async_trait;
use indoc::indoc;
use serde::Serialize;
use serde_json::json;

use super::{mcq, Agent};
use crate::errors::AgentResult;
use crate::models::response::Response;

#[derive(Debug, Clone, Copy, Serialize)]
struct PracticeItem {
    section: &'static str,
    difficulty: &'static str,
    question: &'static str,
    explanation: &'static [&'static str],
}

const PRACTICE_BANK: &[PracticeItem] = &[
    PracticeItem {
        section: "math",
        difficulty: "easy",
        question: indoc! {"
            If 3x + 5 = 20, what is x?
            A) 3
            B) 5
            C) 10
            D) 15"},
        explanation: &["Solve 3x + 5 = 20.", "3x = 15", "x = 5. Answer: B"],
    },
    PracticeItem {
        section: "math",
        difficulty: "medium",
        question: indoc! {"
            What is the value of x if 2(x - 3) = 3x + 1?
            A) -7
            B) 5
            C) -1
            D) 7"},
        explanation: &["Expand: 2x - 6 = 3x + 1.", "Rearrange: -x = 7.", "x = -7. Answer: A"],
    },
    PracticeItem {
        section: "math",
        difficulty: "hard",
        question: indoc! {"
            If f(x)=x^2-4x+3, what is the vertex of f?
            A) (2,-1)
            B) (2,1)
            C) (-2,-1)
            D) (1,-2)"},
        explanation: &[
            "Vertex x-coordinate = -b/(2a) = 4/2 = 2.",
            "f(2) = 4 - 8 + 3 = -1.",
            "Vertex is (2, -1). Answer: A",
        ],
    },
    PracticeItem {
        section: "math",
        difficulty: "geometry",
        question: indoc! {"
            In triangle ABC, angle A = 90°, AB = 3, AC = 4. What is BC?
            A) 5
            B) 6
            C) 7
            D) 4"},
        explanation: &["Right triangle with legs 3 and 4: hypotenuse = sqrt(3^2+4^2) = 5. Answer: A"],
    },
    PracticeItem {
        section: "math",
        difficulty: "probability",
        question: indoc! {"
            A bag contains 3 red and 2 blue marbles. One marble is drawn at random. What is the probability it is red?
            A) 2/5
            B) 3/5
            C) 1/2
            D) 3/2"},
        explanation: &["3 red out of 5 total gives probability 3/5. Answer: B"],
    },
    PracticeItem {
        section: "reading",
        difficulty: "easy",
        question: indoc! {"
            Passage: 'The community garden transformed a neglected lot into a vibrant hub of neighbors, plants, and small markets.' Which choice best describes the author's tone?
            A) Objective and neutral
            B) Sarcastic and bitter
            C) Optimistic and celebratory
            D) Confused and uncertain"},
        explanation: &[
            "The passage uses positive, celebratory language about transformation and community. Answer: C",
        ],
    },
];

/// SAT and ACT prep: curated practice questions, pasted multiple-choice checking,
/// and scoring guidance.
#[derive(Debug, Default, Clone)]
pub struct SatActAgent;

impl SatActAgent {
    pub const NAME: &'static str = "SAT/ACT Agent";

    pub fn new() -> Self {
        Self
    }

    /// `practice [section] [difficulty]`; unknown sections fall back to math and a missing or
    /// unknown difficulty to the first one listed for the section.
    fn practice(&self, request: &str) -> Response {
        let mut words = request.split_whitespace().skip(1).map(str::to_lowercase);
        let requested_section = words.next().unwrap_or_else(|| "math".to_string());
        let requested_difficulty = words.next();

        let section = if PRACTICE_BANK.iter().any(|item| item.section == requested_section) {
            requested_section.as_str()
        } else {
            "math"
        };
        let in_section = move || PRACTICE_BANK.iter().filter(move |item| item.section == section);
        let item = requested_difficulty
            .as_deref()
            .and_then(|difficulty| in_section().find(|item| item.difficulty == difficulty))
            .or_else(|| in_section().next());

        match item {
            Some(item) => Response::local(format!(
                "Practice ({}, {}):\n{}",
                item.section, item.difficulty, item.question
            ))
            .with_details(json!({
                "practice": item,
                "explanation_text": item.explanation.join("\n"),
            })),
            None => Response::agent_error("No practice questions are available"),
        }
    }
}

#[async_trait]
impl Agent for SatActAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, query: &str) -> AgentResult<Response> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Response::local(
                "Ask for a practice question with 'practice math' or paste an MCQ to check.",
            )
            .mark_insufficient());
        }
        let lower = q.to_lowercase();

        if lower.starts_with("practice") {
            return Ok(self.practice(q));
        }

        if let Some(response) = mcq::respond(q) {
            return Ok(response);
        }

        if lower.contains("score") || lower.contains("scoring") {
            return Ok(Response::local(
                "SAT: raw scores are converted to scaled scores, so focus on accuracy. ACT works \
                 the same way with more time pressure, so practice timing. Use official practice \
                 tests for calibration.",
            ));
        }

        Ok(Response::local(
            "Unrecognized SAT/ACT request. Try 'practice math' or paste an MCQ question.",
        )
        .mark_insufficient())
    }
}
