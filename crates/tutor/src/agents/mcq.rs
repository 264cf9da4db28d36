//! Multiple-choice questions: pull labelled options out of pasted text, work out the
//! answer from the stem, and pick the option that agrees with it.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::math::{self, format_number, Solution};
use crate::models::response::Response;
use crate::router::Confidence;

const NUMERIC_TOLERANCE: f64 = 1e-6;

lazy_static! {
    static ref LINE_OPTION: Regex =
        Regex::new(r"^([A-Za-z]|\d{1,2})\s*[).:]\s*(.+)$").unwrap();
    static ref INLINE_OPTION: Regex = Regex::new(r"([A-Z])\s*[).:]\s*([^,;\n]+)").unwrap();
    static ref THOUSANDS: Regex = Regex::new(r"(\d),(\d{3})\b").unwrap();
    static ref LEADING_NUMBER: Regex = Regex::new(r"[0-9().+\-*/^]+").unwrap();
}

const NO_OPTION_PHRASES: &[&str] = &["none of the above", "none of these", "not given", "no option"];

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    pub label: char,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultipleChoice {
    pub question: String,
    pub options: Vec<ChoiceOption>,
}

#[derive(Debug, Clone, PartialEq)]
enum OptionValue {
    Numeric(f64),
    NoneOfTheAbove,
    Text(String),
}

/// The option picked for a question and how it was reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceMatch {
    pub answer: char,
    pub value: String,
    pub confidence: Confidence,
    pub explanation: Vec<String>,
}

impl MultipleChoice {
    /// Recognise a question followed by at least two labelled options, either one per
    /// line (`A) 3`, `B. 5`, `3: 10`) or inline (`A) 3, B) 5`).
    pub fn extract(text: &str) -> Option<Self> {
        Self::extract_lines(text).or_else(|| Self::extract_inline(text))
    }

    fn extract_lines(text: &str) -> Option<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let mut first_option = None;
        let mut options = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            let Some(captures) = LINE_OPTION.captures(line) else {
                continue;
            };
            let Some(label) = option_label(&captures[1]) else {
                continue;
            };
            first_option.get_or_insert(index);
            options.push(ChoiceOption {
                label,
                text: captures[2].trim().to_string(),
            });
        }

        let first_option = first_option?;
        let question = lines[..first_option].join("\n");
        if options.len() < 2 || question.is_empty() {
            return None;
        }
        Some(MultipleChoice { question, options })
    }

    fn extract_inline(text: &str) -> Option<Self> {
        let found: Vec<_> = INLINE_OPTION.captures_iter(text).collect();
        let start = found.iter().position(|c| &c[1] == "A")?;

        let mut options = Vec::new();
        let mut expected = 'A';
        for captures in &found[start..] {
            let label = captures[1].chars().next()?;
            if label != expected {
                break;
            }
            options.push(ChoiceOption {
                label,
                text: captures[2].trim().to_string(),
            });
            expected = (expected as u8 + 1) as char;
        }

        let question_end = found[start].get(0)?.start();
        let question = text[..question_end].trim().to_string();
        if options.len() < 2 || question.is_empty() {
            return None;
        }
        Some(MultipleChoice { question, options })
    }

    /// Pick the option that matches the answer computed from the question.
    /// Returns `None` rather than guessing when nothing agrees.
    pub fn solve(&self) -> Option<ChoiceMatch> {
        let (answers, explanation) = compute_answers(&self.question)?;
        let parsed: Vec<(char, OptionValue)> = self
            .options
            .iter()
            .map(|option| (option.label, parse_option(&option.text)))
            .collect();

        for &answer in &answers {
            for (label, value) in &parsed {
                if let OptionValue::Numeric(v) = value {
                    if (v - answer).abs() < NUMERIC_TOLERANCE {
                        return Some(ChoiceMatch {
                            answer: *label,
                            value: format_number(answer),
                            confidence: Confidence::High,
                            explanation,
                        });
                    }
                }
            }
        }

        for &answer in &answers {
            let rendered = format_number(answer);
            for (label, value) in &parsed {
                if let OptionValue::Text(text) = value {
                    if text.trim().eq_ignore_ascii_case(&rendered) {
                        return Some(ChoiceMatch {
                            answer: *label,
                            value: rendered,
                            confidence: Confidence::Medium,
                            explanation,
                        });
                    }
                }
            }
        }

        None
    }
}

/// Answer a pasted multiple-choice question, or `None` when `text` is not one.
pub fn respond(text: &str) -> Option<Response> {
    let question = MultipleChoice::extract(text)?;
    let response = match question.solve() {
        Some(found) => Response::local(format!(
            "I think the answer is {} ({})",
            found.answer, found.value
        ))
        .with_details(json!({ "match": found })),
        None => Response::local(
            "I couldn't confidently match an option. Try giving a clearer numeric expression \
             or enable LLM fallback with an API key.",
        )
        .mark_insufficient(),
    };
    Some(response)
}

fn option_label(raw: &str) -> Option<char> {
    if let Ok(n) = raw.parse::<u8>() {
        return (1..=26).contains(&n).then(|| (b'A' + n - 1) as char);
    }
    raw.chars().next().map(|c| c.to_ascii_uppercase())
}

/// Candidate answers from the stem: the roots of an embedded equation, otherwise the
/// value of its longest arithmetic expression.
fn compute_answers(question: &str) -> Option<(Vec<f64>, Vec<String>)> {
    if let Some(equation) = math::extract_equation(question) {
        if let Ok(Solution::Roots { var, roots }) = math::solve_equation(&equation) {
            if !roots.is_empty() {
                let rendered: Vec<String> = roots
                    .iter()
                    .map(|r| format!("{} = {}", var, format_number(*r)))
                    .collect();
                let explanation = vec![format!("Solved {}: {}", equation, rendered.join(", "))];
                return Some((roots, explanation));
            }
        }
    }

    let (expression, value) = math::find_arithmetic(question)?;
    let explanation = vec![format!(
        "Evaluated {} = {}",
        expression,
        format_number(value)
    )];
    Some((vec![value], explanation))
}

fn parse_option(text: &str) -> OptionValue {
    let trimmed = text.trim();
    if NO_OPTION_PHRASES.contains(&trimmed.to_lowercase().as_str()) {
        return OptionValue::NoneOfTheAbove;
    }

    let candidate = match trimmed.split_once('=') {
        Some((_, right)) if trimmed.len() < 40 => right.trim(),
        _ => trimmed,
    };

    if let Some(percent) = candidate.strip_suffix('%') {
        if let Ok(value) = percent.trim().parse::<f64>() {
            return OptionValue::Numeric(value / 100.0);
        }
    }

    if let Ok(value) = math::evaluate(candidate) {
        return OptionValue::Numeric(value);
    }

    let cleaned = THOUSANDS.replace_all(candidate, "$1$2");
    if let Some(found) = LEADING_NUMBER.find(&cleaned) {
        if let Ok(value) = math::evaluate(found.as_str()) {
            return OptionValue::Numeric(value);
        }
    }

    OptionValue::Text(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_line_options() {
        let mcq = MultipleChoice::extract("If 3x+5=20, what is x?\nA)3\nB)5\nC)10\nD)15").unwrap();
        assert_eq!(mcq.question, "If 3x+5=20, what is x?");
        let labels: Vec<char> = mcq.options.iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!['A', 'B', 'C', 'D']);
        assert_eq!(mcq.options[2].text, "10");
    }

    #[test]
    fn test_numeric_labels_become_letters() {
        let mcq = MultipleChoice::extract("What is 6 * 7?\n1. 40\n2. 42\n3: 44").unwrap();
        let labels: Vec<char> = mcq.options.iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!['A', 'B', 'C']);
        assert_eq!(mcq.solve().unwrap().answer, 'B');
    }

    #[test]
    fn test_extract_inline_options() {
        let mcq = MultipleChoice::extract("What is 2 + 3? A) 4, B) 5, C) 6").unwrap();
        assert_eq!(mcq.question, "What is 2 + 3?");
        assert_eq!(mcq.options.len(), 3);
        assert_eq!(mcq.solve().unwrap().answer, 'B');
    }

    #[test]
    fn test_not_a_question() {
        assert!(MultipleChoice::extract("2 + 2").is_none());
        assert!(MultipleChoice::extract("A) only one option").is_none());
        assert!(MultipleChoice::extract("A) 1\nB) 2").is_none());
    }

    #[test]
    fn test_solves_the_embedded_equation() {
        let found = MultipleChoice::extract("If 3x+5=20, what is x?\nA)3\nB)5\nC)10\nD)15")
            .unwrap()
            .solve()
            .unwrap();
        assert_eq!(found.answer, 'B');
        assert_eq!(found.value, "5");
        assert_eq!(found.confidence, Confidence::High);
    }

    #[test]
    fn test_negative_root() {
        let text = "What is the value of x if 2(x - 3) = 3x + 1?\nA) -7\nB) 5\nC) -1\nD) 7";
        assert_eq!(MultipleChoice::extract(text).unwrap().solve().unwrap().answer, 'A');
    }

    #[test]
    fn test_option_forms() {
        assert_eq!(parse_option("x = 3"), OptionValue::Numeric(3.0));
        assert_eq!(parse_option("75%"), OptionValue::Numeric(0.75));
        assert_eq!(parse_option("3/4"), OptionValue::Numeric(0.75));
        assert_eq!(parse_option("√16"), OptionValue::Numeric(4.0));
        assert_eq!(parse_option("1,200 people"), OptionValue::Numeric(1200.0));
        assert_eq!(parse_option("None of the above"), OptionValue::NoneOfTheAbove);
        assert_eq!(
            parse_option("Objective and neutral"),
            OptionValue::Text("Objective and neutral".to_string())
        );
    }

    #[test]
    fn test_no_match_is_not_a_guess() {
        let response = respond("If 3x+5=20, what is x?\nA)3\nB)4\nC)10\nD)15").unwrap();
        assert!(response.is_insufficient());
        assert!(response.text.contains("couldn't confidently match"));
        assert!(response.details.is_none());
    }

    #[test]
    fn test_respond_reports_label_and_details() {
        let response = respond("If 3x+5=20, what is x?\nA)3\nB)5\nC)10\nD)15").unwrap();
        assert_eq!(response.text, "I think the answer is B (5)");
        let details = response.details.unwrap();
        assert_eq!(details["match"]["answer"], "B");
        assert_eq!(details["match"]["confidence"], "high");
    }
}
