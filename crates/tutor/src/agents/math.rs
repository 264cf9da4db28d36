use async_trait::async_trait;
use indoc::indoc;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use super::ap_stem::ApStemAgent;
use super::{mcq, Agent};
use crate::errors::AgentResult;
use crate::math::{self, format_number, MathError, Solution};
use crate::models::response::Response;

lazy_static! {
    static ref CALCULUS: Regex =
        Regex::new(r"\b(derivative|integral|antiderivative|integrate|differentiate|diff)\b|d/dx|∫")
            .unwrap();
    static ref WORD_PROBLEM: Regex = Regex::new(
        r"\d+\s*(meters|m|feet|ft|km|miles|kg|g|lbs|seconds|sec|s|minutes|min|hours|h)\b"
    )
    .unwrap();
    static ref COMMAND: Regex = Regex::new(
        r"^(please\s+)?(what\s+is|what's|calculate|compute|evaluate|simplify|solve|find)(\s+for\s+[a-z])?\s*:?\s*"
    )
    .unwrap();
}

const WORD_PROBLEM_HINT: &str = indoc! {"
    This looks like a word problem with numeric quantities. Approach: 1) list symbols and units, \
    2) write equations, 3) check units and solve. Paste the numeric values exactly and I'll \
    help set up the equations."};

const PARSE_FAILURE: &str =
    "I couldn't parse that math expression. Try something simpler like '2+2' or '3*x+1=10'.";

/// Arithmetic, simplification, and one-variable equations. Calculus is handed to the
/// AP STEM agent, pasted multiple-choice questions to the shared matcher.
pub struct MathAgent {
    calculus: ApStemAgent,
}

impl MathAgent {
    pub const NAME: &'static str = "Math Agent";

    pub fn new() -> Self {
        Self {
            calculus: ApStemAgent::new(),
        }
    }

    fn compute(&self, query: &str) -> Response {
        let expression = strip_command(query);

        let outcome = if expression.contains('=') {
            math::solve_equation(&expression)
                .or_else(|e| match math::extract_equation(query) {
                    Some(equation) => math::solve_equation(&equation),
                    None => Err(e),
                })
                .map(|solution| render_solution(&expression, solution))
        } else {
            match math::parse(&expression) {
                Ok(parsed) => Ok(match parsed.poly.as_constant() {
                    Some(value) => Response::local(format!("Result: {}", format_number(value))),
                    None => Response::local(format!("Simplified: {}", parsed.display())),
                }),
                Err(e) => match math::find_arithmetic(query) {
                    Some((_, value)) => {
                        Ok(Response::local(format!("Result: {}", format_number(value))))
                    }
                    None => Err(e),
                },
            }
        };

        match outcome {
            Ok(response) => response,
            Err(MathError::DivisionByZero) => Response::local("Cannot divide by zero."),
            Err(MathError::Undefined(what)) => {
                Response::local(format!("{} is undefined over the real numbers.", what))
            }
            Err(MathError::Unsupported(what)) => {
                Response::local(format!("I can't handle {} yet.", what)).mark_insufficient()
            }
            Err(_) => Response::local(PARSE_FAILURE).mark_insufficient(),
        }
    }
}

impl Default for MathAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for MathAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, query: &str) -> AgentResult<Response> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Response::local(
                "Please provide a math expression or a simple equation (e.g. '2+2' or '2*x+3=7').",
            )
            .mark_insufficient());
        }
        let lower = q.to_lowercase();

        if CALCULUS.is_match(&lower) {
            return self.calculus.handle(q).await;
        }

        if let Some(response) = mcq::respond(q) {
            return Ok(response);
        }

        if WORD_PROBLEM.is_match(&lower) {
            return Ok(match math::find_arithmetic(q) {
                Some((expression, value)) => Response::local(format!(
                    "{}\n\nQuick compute: {} = {}",
                    WORD_PROBLEM_HINT,
                    expression,
                    format_number(value)
                )),
                None => Response::local(WORD_PROBLEM_HINT).mark_insufficient(),
            });
        }

        Ok(self.compute(q))
    }
}

fn strip_command(query: &str) -> String {
    let lower = query.trim().to_lowercase();
    let stripped = COMMAND.replace(&lower, "");
    stripped
        .trim_end_matches(|c: char| c == '?' || c == '.' || c == '!' || c.is_whitespace())
        .to_string()
}

fn render_solution(equation: &str, solution: Solution) -> Response {
    match solution {
        Solution::Roots { var, roots } => {
            let text = match roots.as_slice() {
                [] => format!("No real solution for {}.", var),
                [root] => format!("Solution: {} = {}", var, format_number(*root)),
                _ => format!(
                    "Solutions: {}",
                    roots
                        .iter()
                        .map(|r| format!("{} = {}", var, format_number(*r)))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            };
            Response::local(text).with_details(json!({
                "equation": equation,
                "variable": var,
                "roots": roots,
            }))
        }
        Solution::Identity(true) => Response::local("The equation is true for every value."),
        Solution::Identity(false) => Response::local("The equation has no solution."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ask(query: &str) -> Response {
        MathAgent::new().handle(query).await.unwrap()
    }

    #[tokio::test]
    async fn test_arithmetic() {
        assert_eq!(ask("2+3").await.text, "Result: 5");
        assert_eq!(ask("What is 6 × 7?").await.text, "Result: 42");
        assert_eq!(ask("(1 + 2)^2 / 4").await.text, "Result: 2.25");
    }

    #[tokio::test]
    async fn test_linear_equation() {
        let response = ask("Solve 3x + 5 = 20").await;
        assert_eq!(response.text, "Solution: x = 5");
        assert_eq!(response.details.unwrap()["roots"][0], 5.0);
    }

    #[tokio::test]
    async fn test_quadratic_equation() {
        assert_eq!(ask("x^2 - 4 = 0").await.text, "Solutions: x = -2, x = 2");
        assert_eq!(ask("x^2 + 1 = 0").await.text, "No real solution for x.");
    }

    #[tokio::test]
    async fn test_simplify() {
        assert_eq!(ask("simplify 2x + 3x - 4").await.text, "Simplified: 5x - 4");
    }

    #[tokio::test]
    async fn test_pasted_mcq() {
        let response = ask("If 3x+5=20, what is x?\nA)3\nB)5\nC)10\nD)15").await;
        assert!(response.text.contains('B'));
        assert!(!response.is_insufficient());
    }

    #[tokio::test]
    async fn test_calculus_is_delegated() {
        let response = ask("derivative of x^3 - 5x + 2").await;
        assert!(response.text.contains("3x^2 - 5"));
    }

    #[tokio::test]
    async fn test_word_problem_gets_hint_and_compute() {
        let response = ask("A car travels 120 km in 2 hours, so the speed is 120 / 2").await;
        assert!(response.text.starts_with("This looks like a word problem"));
        assert!(response.text.contains("Quick compute: 120 / 2 = 60"));
    }

    #[tokio::test]
    async fn test_division_by_zero() {
        let response = ask("5 / 0").await;
        assert_eq!(response.text, "Cannot divide by zero.");
        assert!(!response.is_insufficient());
    }

    #[tokio::test]
    async fn test_gibberish_is_insufficient() {
        let response = ask("how do I feel about numbers").await;
        assert!(response.is_insufficient());
        assert_eq!(response.text, PARSE_FAILURE);
    }

    #[tokio::test]
    async fn test_empty_query() {
        assert!(ask("   ").await.is_insufficient());
    }
}
