//! Small exact-enough algebra engine used by the math-flavoured agents.
//!
//! Expressions are parsed into polynomials in at most one variable, which covers
//! arithmetic, simplification, linear and quadratic equations, and the derivative and
//! antiderivative of polynomials.

pub mod parser;
pub mod poly;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use parser::Parser;
use poly::Poly;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("could not parse expression: {0}")]
    Parse(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("not a polynomial: {0}")]
    NonPolynomial(String),

    #[error("more than one variable: {0}")]
    MultipleVariables(String),

    #[error("undefined value: {0}")]
    Undefined(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// A parsed expression together with the variable it is written in, if any
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub poly: Poly,
    pub var: Option<String>,
}

impl Expression {
    pub fn var_name(&self) -> &str {
        self.var.as_deref().unwrap_or("x")
    }

    pub fn display(&self) -> String {
        self.poly.display(self.var_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// Real roots for `var`, ascending; empty when there is no real solution
    Roots { var: String, roots: Vec<f64> },
    /// Both sides are constant; `true` when they agree
    Identity(bool),
}

lazy_static! {
    static ref DOUBLE_STAR: Regex = Regex::new(r"\*\*").unwrap();
    static ref ARITHMETIC_RUN: Regex =
        Regex::new(r"[0-9.(][0-9.\s+\-*/^()%]*[0-9)]").unwrap();
    static ref TRAILING_PUNCTUATION: Regex = Regex::new(r"[.,;:?!]+$").unwrap();
}

/// Rewrite typographic math into the parser's ASCII forms.
pub fn normalize(input: &str) -> String {
    let replaced = input
        .replace('\u{2212}', "-")
        .replace('\u{2013}', "-")
        .replace('\u{00d7}', "*")
        .replace('\u{22c5}', "*")
        .replace('\u{00f7}', "/")
        .replace('\u{03c0}', "pi")
        .replace('\u{221a}', "sqrt")
        .replace('\u{00b2}', "^2")
        .replace('\u{00b3}', "^3");
    DOUBLE_STAR.replace_all(&replaced, "^").to_lowercase()
}

pub fn parse(input: &str) -> Result<Expression, MathError> {
    let mut parser = Parser::new(&normalize(input), None)?;
    let poly = parser.parse()?;
    Ok(Expression {
        poly,
        var: parser.into_var(),
    })
}

/// Evaluate an expression that must not contain a variable.
pub fn evaluate(input: &str) -> Result<f64, MathError> {
    let expression = parse(input)?;
    expression.poly.as_constant().ok_or_else(|| {
        MathError::Unsupported(format!(
            "evaluating an expression in {}",
            expression.var_name()
        ))
    })
}

/// Solve `left = right` for its single variable.
pub fn solve_equation(input: &str) -> Result<Solution, MathError> {
    let normalized = normalize(input);
    let (left, right) = normalized
        .split_once('=')
        .ok_or_else(|| MathError::Parse("expected an equation with '='".to_string()))?;
    if right.contains('=') {
        return Err(MathError::Unsupported("chained equations".to_string()));
    }

    let mut left_parser = Parser::new(left, None)?;
    let left_poly = left_parser.parse()?;
    let mut right_parser = Parser::new(right, left_parser.into_var())?;
    let right_poly = right_parser.parse()?;
    let combined = &left_poly - &right_poly;

    match right_parser.into_var() {
        None => Ok(Solution::Identity(
            combined.as_constant().is_some_and(|v| v.abs() < 1e-9),
        )),
        Some(_) if combined.is_constant() => Ok(Solution::Identity(
            combined.as_constant().is_some_and(|v| v.abs() < 1e-9),
        )),
        Some(var) => Ok(Solution::Roots {
            var,
            roots: combined.real_roots()?,
        }),
    }
}

/// Pull the equation out of a sentence such as `If 3x+5=20, what is x?`.
///
/// Walks outward from the first `=` and keeps whitespace-separated tokens that look like
/// math, stopping at ordinary words and at sentence punctuation.
pub fn extract_equation(text: &str) -> Option<String> {
    let normalized = normalize(text);
    let line = normalized.lines().find(|line| line.contains('='))?;
    let (left, right) = line.split_once('=')?;

    let mut lhs = Vec::new();
    for token in left.split_whitespace().rev() {
        let cleaned = token.trim_start_matches(|c: char| "\"'".contains(c));
        if TRAILING_PUNCTUATION.is_match(cleaned) || !is_math_token(cleaned) {
            break;
        }
        lhs.push(cleaned);
    }
    lhs.reverse();

    let mut rhs = Vec::new();
    for token in right.split_whitespace() {
        let cleaned = TRAILING_PUNCTUATION.replace(token, "");
        if !is_math_token(&cleaned) {
            break;
        }
        rhs.push(cleaned.to_string());
        if cleaned.len() != token.len() {
            break;
        }
    }

    if lhs.is_empty() || rhs.is_empty() {
        return None;
    }
    Some(format!("{} = {}", lhs.join(" "), rhs.join(" ")))
}

/// The longest arithmetic-looking run in free text that evaluates to a number.
pub fn find_arithmetic(text: &str) -> Option<(String, f64)> {
    let normalized = normalize(text);
    let mut candidates: Vec<&str> = ARITHMETIC_RUN
        .find_iter(&normalized)
        .map(|m| m.as_str().trim())
        .collect();
    candidates.sort_by_key(|candidate| std::cmp::Reverse(candidate.len()));
    candidates
        .into_iter()
        .find_map(|candidate| evaluate(candidate).ok().map(|v| (candidate.to_string(), v)))
}

fn is_math_token(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    if !token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "+-*/^().%".contains(c))
    {
        return false;
    }
    let has_digit = token.chars().any(|c| c.is_ascii_digit());
    let has_operator = token.chars().any(|c| "+-*/^()%".contains(c));
    let single_letter = token.len() == 1 && token.chars().all(|c| c.is_ascii_alphabetic());
    has_digit || has_operator || single_letter
}

/// Render a float without a trailing `.0` and with at most six decimals.
pub fn format_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        let rounded = value.round();
        // avoid printing "-0"
        return format!("{}", if rounded == 0.0 { 0.0 } else { rounded });
    }
    let fixed = format!("{:.6}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Like [`format_number`] but prefers a small fraction such as `1/3` when one is exact.
/// `parenthesize` wraps fractions so they read unambiguously in front of a variable.
pub fn format_coefficient(value: f64, parenthesize: bool) -> String {
    if (value - value.round()).abs() < 1e-9 {
        return format_number(value);
    }
    for denominator in 2..=12u32 {
        let numerator = value * denominator as f64;
        if (numerator - numerator.round()).abs() < 1e-9 {
            let fraction = format!("{}/{}", numerator.round() as i64, denominator);
            return if parenthesize {
                format!("({})", fraction)
            } else {
                fraction
            };
        }
    }
    format_number(value)
}
