use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use super::Agent;
use crate::errors::AgentResult;
use crate::math::{self, poly::Poly};
use crate::models::response::Response;

lazy_static! {
    static ref DERIVATIVE: Regex =
        Regex::new(r"derivative|differentiate|\bdiff\b|d/dx").unwrap();
    static ref INTEGRAL: Regex = Regex::new(r"integral|integrate|antiderivative|∫").unwrap();
    static ref DERIVATIVE_LEAD: Regex = Regex::new(
        r"^.*?(find\s+)?(the\s+)?(derivative|differentiate|diff|d/dx)(\s+of)?\s*:?\s*"
    )
    .unwrap();
    static ref INTEGRAL_LEAD: Regex = Regex::new(
        r"^.*?(find\s+)?(the\s+)?(indefinite\s+)?(integral|integrate|antiderivative|∫)(\s+of)?\s*:?\s*"
    )
    .unwrap();
    static ref FUNCTION_LHS: Regex = Regex::new(r"^([a-z]\s*\(\s*[a-z]\s*\)|y)\s*=\s*").unwrap();
    static ref TRAILING: Regex =
        Regex::new(r"(\s*(with respect to [a-z]|w\.?r\.?t\.? [a-z]|d[a-z]))?\s*[?.!]*\s*$").unwrap();

    static ref TOPIC_TIPS: Vec<(Regex, &'static str)> = vec![
        (
            Regex::new(r"limit|fundamental theorem").unwrap(),
            "Calculus tip: For limits, check if direct substitution works; if indeterminate, try \
             factoring, the conjugate, or L'Hôpital's rule. The Fundamental Theorem connects \
             antiderivatives to definite integrals.",
        ),
        (
            Regex::new(r"stoichiometry|mole|equilibrium|titration|oxidation|reduction").unwrap(),
            "Chemistry tip: Balance the reaction first. Convert grams to moles using molar mass, \
             then use stoichiometric ratios. For equilibrium, write an ICE table and express K in \
             terms of concentrations. For titrations, identify the limiting reactant.",
        ),
        (
            Regex::new(r"kinematics|projectile|force|momentum|energy|work").unwrap(),
            "Physics tip: Draw a free-body diagram, define axes, and list knowns with units. Use \
             v = v0 + at and s = s0 + v0 t + 0.5 a t^2 for constant acceleration, and energy or \
             momentum conservation where they apply. Finish with units on the answer.",
        ),
        (
            Regex::new(r"probability|confidence interval|hypothesis test|p-value|sampling").unwrap(),
            "Statistics tip: Check conditions (random sampling, independence, sample size). A \
             confidence interval is estimate ± z*SE. For a hypothesis test state H0 and H1, compute \
             the test statistic and p-value, and compare to alpha. Interpret in context.",
        ),
        (
            Regex::new(r"array|recursion|class|object|inheritance|runtime complexity").unwrap(),
            "CS tip: For code tracing, list variable states per step. For algorithm questions write \
             clear pseudocode, then give time and space complexity in Big-O with edge cases.",
        ),
    ];
}

const SUBJECTS: &[(&str, &str)] = &[
    (
        "ap calculus",
        "AP Calculus (AB/BC): Focus on limits, derivatives, integrals, the Fundamental Theorem \
         of Calculus, and applications (optimization, related rates, area/volume). BC adds \
         parametric, polar, and series. State what is known, which theorem applies, and show \
         the algebra.",
    ),
    (
        "ap physics",
        "AP Physics (1, 2, C): Draw a clear diagram, define a coordinate system, list known \
         quantities, and identify which laws apply (Newton's laws, energy conservation, \
         kinematics, electromagnetism for 2/C). Carry units through every step.",
    ),
    (
        "ap chemistry",
        "AP Chemistry: Track moles, molar masses, and significant figures. For equilibrium write \
         the balanced reaction and an ICE table, then relate concentrations to K (Kc or Kp). For \
         titrations, follow the stoichiometry carefully.",
    ),
    (
        "ap biology",
        "AP Biology: Know the core principles (cell structure, energy flow, genetics, evolution). \
         In free response connect evidence to claims with correct terms, and practice reading \
         graphs and experimental setups.",
    ),
    (
        "ap statistics",
        "AP Statistics: Be fluent with descriptive statistics, probability rules, sampling \
         distributions, confidence intervals, and hypothesis tests. Always state hypotheses and \
         check conditions before applying a formula.",
    ),
    (
        "ap computer science",
        "AP Computer Science A: Focus on Java syntax, OOP basics, arrays, loops, recursion, and \
         tracing code. Write clear pseudocode and explain complexity when asked.",
    ),
    (
        "ap environmental",
        "AP Environmental Science: Understand ecosystems, energy flow, biogeochemical cycles, and \
         human impacts. Use data to support policy or management recommendations.",
    ),
];

const GUIDANCE: &str = "Please provide more details or paste a specific problem and I'll help \
                        with definitions, formulas, or setup.";

/// Exam-focused STEM help: symbolic derivatives and antiderivatives of polynomials,
/// subject overviews, and topic tips.
#[derive(Debug, Default, Clone)]
pub struct ApStemAgent;

impl ApStemAgent {
    pub const NAME: &'static str = "AP STEM Agent";

    pub fn new() -> Self {
        Self
    }

    fn differentiate(&self, query: &str) -> Response {
        let Some(expression) = calculus_operand(query, &DERIVATIVE_LEAD) else {
            return Response::local(
                "Please provide an expression to differentiate, e.g., 'derivative of x^2 + 3x'",
            )
            .mark_insufficient();
        };
        match math::parse(&expression) {
            Ok(parsed) => {
                let var = parsed.var_name().to_string();
                let derivative = parsed.poly.derivative();
                Response::local(format!(
                    "f({var}) = {}\nDerivative: f'({var}) = {}",
                    parsed.display(),
                    derivative.display(&var)
                ))
                .with_details(json!({
                    "function": parsed.display(),
                    "derivative": derivative.display(&var),
                }))
            }
            Err(_) => Response::local(
                "Could not solve derivative. Try a polynomial like 'derivative of x^2' or \
                 'derivative of 3x^2 + 2x'.",
            )
            .mark_insufficient(),
        }
    }

    fn integrate(&self, query: &str) -> Response {
        let Some(expression) = calculus_operand(query, &INTEGRAL_LEAD) else {
            return Response::local(
                "Please provide an expression to integrate, e.g., 'integral of x^2 + 3x'",
            )
            .mark_insufficient();
        };
        match math::parse(&expression) {
            Ok(parsed) => {
                let var = parsed.var_name().to_string();
                let antiderivative = render_antiderivative(&parsed.poly.integral(), &var);
                Response::local(format!(
                    "f({var}) = {}\nAntiderivative: F({var}) = {}",
                    parsed.display(),
                    antiderivative
                ))
                .with_details(json!({
                    "function": parsed.display(),
                    "antiderivative": antiderivative,
                }))
            }
            Err(_) => Response::local(
                "Could not solve integral. Try a polynomial like 'integral of x^2' or \
                 'integral of 4x^3 - 2'.",
            )
            .mark_insufficient(),
        }
    }
}

#[async_trait]
impl Agent for ApStemAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, query: &str) -> AgentResult<Response> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Ok(Response::local(
                "Ask an AP STEM question (Calculus, Physics, Chemistry, Biology, Statistics, \
                 Computer Science, Environmental). Give details for numerical help, or ask \
                 conceptual questions for quick tips.",
            )
            .mark_insufficient());
        }

        // "antiderivative" contains "derivative"
        if INTEGRAL.is_match(&q) {
            return Ok(self.integrate(&q));
        }
        if DERIVATIVE.is_match(&q) {
            return Ok(self.differentiate(&q));
        }

        if let Some((_, text)) = SUBJECTS.iter().find(|(key, _)| q.contains(key)) {
            return Ok(Response::local(*text));
        }

        if let Some((_, text)) = TOPIC_TIPS.iter().find(|(pattern, _)| pattern.is_match(&q)) {
            return Ok(Response::local(*text));
        }

        Ok(Response::local(GUIDANCE).mark_insufficient())
    }
}

/// The expression a calculus request is about, with the request wording removed
fn calculus_operand(query: &str, lead: &Regex) -> Option<String> {
    let rest = lead.replace(query, "");
    let rest = TRAILING.replace(&rest, "");
    let rest = FUNCTION_LHS.replace(rest.trim(), "");
    let expression = rest.trim();
    (!expression.is_empty()).then(|| expression.to_string())
}

fn render_antiderivative(poly: &Poly, var: &str) -> String {
    if poly.as_constant() == Some(0.0) {
        "C".to_string()
    } else {
        format!("{} + C", poly.display(var))
    }
}
