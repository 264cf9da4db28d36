use async_trait::async_trait;
use indoc::indoc;
use lazy_static::lazy_static;
use regex::Regex;

use super::Agent;
use crate::errors::AgentResult;
use crate::models::response::Response;

const FAQ: &[(&str, &str)] = &[
    (
        "pythagoras",
        "In a right-angled triangle, a^2 + b^2 = c^2 where c is the hypotenuse.",
    ),
    (
        "photosynthesis",
        "Photosynthesis converts sunlight into chemical energy in plants: \
         6CO2 + 6H2O -> C6H12O6 + 6O2.",
    ),
    (
        "cell",
        "Cells are the basic unit of life; eukaryotic cells have a nucleus, prokaryotic cells do not.",
    ),
    (
        "newton",
        "Newton's second law: F = m * a (force = mass × acceleration).",
    ),
    (
        "acid",
        "An acid donates H+ ions in water; a base accepts H+ ions. pH < 7 is acidic.",
    ),
];

/// Worked AP-style examples, keyed by the phrase that asks for them
const SAMPLES: &[(&str, &str)] = &[
    (
        "ap calc sample derivative",
        indoc! {"
            Question: Find the derivative of f(x)=x^3-5x+2 at x=2.
            Answer: f'(x)=3x^2-5, so f'(2)=3*(2)^2-5=12-5=7."},
    ),
    (
        "ap calc sample integral",
        indoc! {"
            Question: Compute the definite integral of x from 0 to 2.
            Answer: ∫_0^2 x dx = [x^2/2]_0^2 = (4/2)-0 = 2."},
    ),
    (
        "ap physics projectile",
        indoc! {"
            Question: A ball is thrown at 20 m/s at 30° above the horizontal. Ignore air resistance. What is the horizontal range?
            Answer: Range = (v^2 * sin(2θ))/g. Here v=20, θ=30°, sin(60°)=√3/2, so R = 400*(√3/2)/9.8 ≈ 35.35 m."},
    ),
    (
        "ap chem stoichiometry",
        indoc! {"
            Question: How many moles are in 18.0 g of H2O?
            Answer: Molar mass H2O ≈ 18.0 g/mol, so moles = 18.0 g / 18.0 g/mol = 1.0 mol."},
    ),
    (
        "ap stats ci",
        indoc! {"
            Question: Sample mean 50, sd 10, n=25. What is a 95% CI for the mean?
            Answer: SE = 10/√25 = 2. 95% CI ≈ mean ± 1.96*SE = 50 ± 3.92 → (46.08, 53.92)."},
    ),
    (
        "ap econ elasticity",
        indoc! {"
            Question: If price rises 10% and quantity demanded falls 15%, what is the price elasticity?
            Answer: Elasticity = %ΔQ / %ΔP = -15% / 10% = -1.5 (elastic)."},
    ),
];

lazy_static! {
    static ref QUICK_HITS: Vec<(Regex, &'static str)> = vec![
        (
            Regex::new(r"derivative|differentiate|deriv of|d/dx").unwrap(),
            "Derivatives: the derivative of x^n is n*x^(n-1). For trig, d/dx sin x = cos x and \
             d/dx cos x = -sin x. Ask about a specific function for step-by-step help.",
        ),
        (
            Regex::new(r"integral|integrate|antiderivative|∫").unwrap(),
            "Integrals: ∫ x^n dx = x^(n+1)/(n+1) + C for n != -1. For definite integrals, give \
             bounds like 'integral of x^2 from 0 to 2'.",
        ),
        (
            Regex::new(r"kinematics|velocity|acceleration|projectile").unwrap(),
            "Kinematics: use v = v0 + a*t, x = x0 + v0*t + 1/2*a*t^2, and v^2 = v0^2 + 2*a*(x-x0). \
             Say which variable you need and what is known.",
        ),
        (
            Regex::new(r"force|momentum|impulse|energy|work").unwrap(),
            "Physics formulas: F = m*a; momentum p = m*v; kinetic energy KE = 1/2*m*v^2; \
             work W = F*d in the direction of the force.",
        ),
        (
            Regex::new(r"stoichiometry|\bmoles?\b|molarity|mol/l").unwrap(),
            "Stoichiometry: convert grams to moles with mol = grams / molar_mass. For solutions, \
             M = moles solute / liters solution. Give an equation or amounts for numerical help.",
        ),
        (
            Regex::new(r"le chatelier|\bkeq\b|chemical equilibrium").unwrap(),
            "Chemical equilibrium: for aA + bB <-> cC + dD, Kc = [C]^c[D]^d / ([A]^a[B]^b). \
             Le Chatelier's principle: a system shifts to counteract changes in concentration, \
             pressure, or temperature.",
        ),
        (
            Regex::new(r"supply|demand|elasticity|equilibrium price|market equilibrium").unwrap(),
            "Economics basics: equilibrium is where supply equals demand. Price elasticity of \
             demand is % change in quantity over % change in price; above 1 is elastic, below 1 \
             inelastic.",
        ),
        (
            Regex::new(r"gdp|inflation|fiscal policy|monetary policy|aggregate demand|aggregate supply")
                .unwrap(),
            "Macro basics: GDP measures total output. Fiscal policy uses government spending and \
             taxes; monetary policy uses central bank tools such as interest rates. Inflation is a \
             general rise in prices, from demand-pull or cost-push causes.",
        ),
    ];
}

/// General high-school help and the catch-all for queries nothing else claims.
#[derive(Debug, Default, Clone)]
pub struct HighSchoolAgent;

impl HighSchoolAgent {
    pub const NAME: &'static str = "High School Agent";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent for HighSchoolAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, query: &str) -> AgentResult<Response> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Ok(Response::local(
                "Ask me a question related to high-school topics (math, physics, chemistry, biology, etc.).",
            )
            .mark_insufficient());
        }

        let found = FAQ
            .iter()
            .chain(SAMPLES.iter())
            .find(|(key, _)| q.contains(key))
            .map(|(_, text)| *text)
            .or_else(|| {
                QUICK_HITS
                    .iter()
                    .find(|(pattern, _)| pattern.is_match(&q))
                    .map(|(_, text)| *text)
            });

        Ok(match found {
            Some(text) => Response::local(text),
            None => Response::local(
                "Please provide more details or paste a specific problem and I'll help with \
                 definitions, formulas, or setup.",
            )
            .mark_insufficient(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ask(query: &str) -> Response {
        HighSchoolAgent::new().handle(query).await.unwrap()
    }

    #[tokio::test]
    async fn test_faq() {
        assert!(ask("What is Photosynthesis?").await.text.starts_with("Photosynthesis converts"));
        assert!(ask("explain newton's laws").await.text.contains("F = m * a"));
    }

    #[tokio::test]
    async fn test_samples() {
        let response = ask("show me an ap stats ci question").await;
        assert!(response.text.starts_with("Question: Sample mean 50"));
        assert!(response.text.contains("\nAnswer: "));
    }

    #[tokio::test]
    async fn test_quick_hits() {
        assert!(ask("what is kinetic energy").await.text.starts_with("Physics formulas"));
        assert!(ask("what causes inflation").await.text.starts_with("Macro basics"));
        assert!(ask("le chatelier").await.text.starts_with("Chemical equilibrium"));
    }

    #[tokio::test]
    async fn test_unknown_is_insufficient() {
        let response = ask("who won the game last night").await;
        assert!(response.is_insufficient());
        assert!(!response.text.is_empty());
    }
}
