use async_trait::async_trait;
use indoc::indoc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::json;

use super::Agent;
use crate::errors::{AgentError, AgentResult};
use crate::math::format_number;
use crate::models::response::Response;

lazy_static! {
    static ref INITIATIVE: Regex = Regex::new(r"(?i)project|initiative|founded|started").unwrap();
    static ref ESSAY_LEAD: Regex = Regex::new(r"(?i)^essay(\s+(tips|outline|help))?\s*(for|on|about)?\s*:?\s*").unwrap();
}

const ESSAY_TIPS: &[&str] = &[
    "Start with a vivid scene or moment.",
    "Show, don't tell: use specific examples.",
    "Keep your voice authentic and reflective.",
    "Answer the prompt directly; avoid unrelated tangents.",
    "Have a teacher or mentor review for clarity and grammar.",
];

const ESSAY_OUTLINE: &[&str] = &[
    "Hook: Open with a vivid, specific moment relevant to the prompt.",
    "Context: Briefly explain the situation, people involved, and your role.",
    "Challenge/Action: Describe what you did and why it mattered.",
    "Reflection: Explain what you learned and how you changed.",
    "Conclusion: Tie the learning back to your future goals or fit for college.",
];

const SAMPLE_MESSAGES: &[(&str, &str)] = &[
    (
        "teacher_recommendation_request",
        indoc! {"
            Subject: Recommendation Request

            Dear [Teacher Name],

            I hope you are well. I'm applying to colleges and would be honored if you could write a recommendation for me. The deadline is [date]. I can provide my résumé and a summary of my activities. Thank you for considering this request.

            Sincerely,
            [Your Name]"},
    ),
    (
        "college_visit_email",
        indoc! {"
            Subject: Prospective Student Visit Request

            Dear Admissions Office,

            I am a prospective applicant interested in visiting campus and meeting with a counselor. Are there available tour dates in [month]? Thank you.

            Sincerely,
            [Your Name]"},
    ),
];

const USAGE: &str = "Unrecognized college admission request. Try 'essay tips', 'sample messages', \
                     'rank: name|hours|lead|regional; ...' or 'resume: activity|role|impact|quantity; ...'";

/// One extracurricular as written in a `rank:` request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub name: String,
    pub hours_per_week: f64,
    pub leadership: bool,
    pub regional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedActivity {
    #[serde(flatten)]
    pub activity: Activity,
    pub score: f64,
}

impl Activity {
    /// Leadership +40, two points per weekly hour capped at 30, regional reach +10,
    /// and +10 when the name describes something the student started.
    pub fn score(&self) -> f64 {
        let mut score = 0.0;
        if self.leadership {
            score += 40.0;
        }
        // NaN and negative hours count as none
        score += (self.hours_per_week * 2.0).max(0.0).min(30.0);
        if self.regional {
            score += 10.0;
        }
        if INITIATIVE.is_match(&self.name) {
            score += 10.0;
        }
        score
    }
}

/// Highest impact first; equal scores keep their input order.
pub fn rank_activities(activities: Vec<Activity>) -> Vec<RankedActivity> {
    let mut ranked: Vec<RankedActivity> = activities
        .into_iter()
        .map(|activity| RankedActivity {
            score: activity.score(),
            activity,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Essays, activity ranking, résumé bullets, and message templates for applicants.
#[derive(Debug, Default, Clone)]
pub struct CollegeAdmissionAgent;

impl CollegeAdmissionAgent {
    pub const NAME: &'static str = "College Admission Agent";

    pub fn new() -> Self {
        Self
    }

    fn essay(&self, query: &str) -> Response {
        let prompt = ESSAY_LEAD.replace(query, "").trim().to_string();
        let mut text = String::from("Essay tips:\n");
        for tip in ESSAY_TIPS {
            text.push_str(&format!("- {}\n", tip));
        }
        if prompt.is_empty() {
            text.push_str("\nOutline:\n");
        } else {
            text.push_str(&format!("\nOutline for \"{}\":\n", prompt));
        }
        let outline: Vec<String> = ESSAY_OUTLINE
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect();
        text.push_str(&outline.join("\n"));

        Response::local(text).with_details(json!({
            "tips": ESSAY_TIPS,
            "outline": ESSAY_OUTLINE,
            "prompt": (!prompt.is_empty()).then_some(prompt),
        }))
    }

    fn samples(&self) -> Response {
        let text = SAMPLE_MESSAGES
            .iter()
            .map(|(_, message)| *message)
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        let messages: serde_json::Map<String, serde_json::Value> = SAMPLE_MESSAGES
            .iter()
            .map(|(key, message)| (key.to_string(), json!(message)))
            .collect();
        Response::local(format!("Sample messages and templates:\n\n{}", text))
            .with_details(json!({ "messages": messages }))
    }

    fn rank(&self, query: &str) -> AgentResult<Response> {
        let activities = request_entries(query)
            .map(parse_activity)
            .collect::<AgentResult<Vec<_>>>()?;
        if activities.is_empty() {
            return Ok(Response::local(
                "List activities as 'rank: name|hours|lead|regional; ...', e.g. \
                 'rank: Robotics club|6|yes|no; Food bank project|3|no|yes'.",
            )
            .mark_insufficient());
        }

        let ranked = rank_activities(activities);
        let lines: Vec<String> = ranked
            .iter()
            .enumerate()
            .map(|(i, item)| {
                format!(
                    "{}. {} (score {})",
                    i + 1,
                    item.activity.name,
                    format_number(item.score)
                )
            })
            .collect();
        Ok(
            Response::local(format!("Ranked extracurriculars:\n{}", lines.join("\n")))
                .with_details(json!({ "ranked": ranked })),
        )
    }

    fn resume(&self, query: &str) -> Response {
        let bullets: Vec<String> = request_entries(query).map(resume_bullet).collect();
        if bullets.is_empty() {
            return Response::local(
                "List activities as 'resume: activity|role|impact|quantity; ...' and I'll turn \
                 them into résumé bullets.",
            )
            .mark_insufficient();
        }
        let text = bullets
            .iter()
            .map(|b| format!("- {}", b))
            .collect::<Vec<_>>()
            .join("\n");
        Response::local(format!("Résumé bullets:\n{}", text))
            .with_details(json!({ "bullets": bullets }))
    }
}

#[async_trait]
impl Agent for CollegeAdmissionAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, query: &str) -> AgentResult<Response> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Response::local(
                "Ask for 'essay tips', 'rank: name|hours|lead|regional; ...', or 'sample messages'.",
            )
            .mark_insufficient());
        }
        let lower = q.to_lowercase();

        if lower.starts_with("essay") {
            Ok(self.essay(q))
        } else if lower.starts_with("sample") {
            Ok(self.samples())
        } else if lower.starts_with("rank") {
            self.rank(q)
        } else if lower.starts_with("resume") || lower.starts_with("résumé") {
            Ok(self.resume(q))
        } else {
            Ok(Response::local(USAGE).mark_insufficient())
        }
    }
}

/// The `;`-separated entries after the first `:` of a list request
fn request_entries(query: &str) -> impl Iterator<Item = &str> {
    let body = query.split_once(':').map_or("", |(_, rest)| rest);
    body.split(';').map(str::trim).filter(|entry| !entry.is_empty())
}

fn is_yes(field: Option<&str>) -> bool {
    matches!(
        field.map(|f| f.trim().to_lowercase()).as_deref(),
        Some("1" | "yes" | "y" | "true")
    )
}

fn parse_activity(entry: &str) -> AgentResult<Activity> {
    let mut fields = entry.split('|');
    let name = fields.next().unwrap_or_default().trim().to_string();
    let hours_per_week = match fields.next().map(str::trim) {
        None | Some("") => 0.0,
        Some(hours) => hours
            .parse::<f64>()
            .ok()
            .filter(|h| h.is_finite() && *h >= 0.0)
            .ok_or_else(|| {
                AgentError::InvalidInput(format!(
                    "hours for '{}' must be a non-negative number, got '{}'",
                    name, hours
                ))
            })?,
    };
    Ok(Activity {
        name,
        hours_per_week,
        leadership: is_yes(fields.next()),
        regional: is_yes(fields.next()),
    })
}

fn resume_bullet(entry: &str) -> String {
    let fields: Vec<&str> = entry.split('|').map(str::trim).collect();
    let field = |i: usize| fields.get(i).copied().unwrap_or_default();
    let (name, role, impact, quantity) = (field(0), field(1), field(2), field(3));

    let mut bullet = if role.is_empty() {
        name.to_string()
    } else {
        format!("{} at {}", role, name)
    };
    if !impact.is_empty() {
        bullet.push_str(&format!(": {}", impact));
    }
    if !quantity.is_empty() {
        bullet.push_str(&format!(" ({})", quantity));
    }
    bullet
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ask(query: &str) -> AgentResult<Response> {
        CollegeAdmissionAgent::new().handle(query).await
    }

    #[test]
    fn test_activity_score() {
        let activity = Activity {
            name: "Founded coding club".to_string(),
            hours_per_week: 20.0,
            leadership: true,
            regional: true,
        };
        // hours contribute at most 30
        assert_eq!(activity.score(), 90.0);

        let quiet = Activity {
            name: "Chess".to_string(),
            hours_per_week: 2.5,
            leadership: false,
            regional: false,
        };
        assert_eq!(quiet.score(), 5.0);
    }

    #[tokio::test]
    async fn test_rank_orders_by_score() {
        let response = ask("rank: Chess club|2|no|no; Robotics project|6|yes|no; Food bank|10|no|yes")
            .await
            .unwrap();
        assert_eq!(
            response.text,
            "Ranked extracurriculars:\n1. Robotics project (score 62)\n2. Food bank (score 30)\n3. Chess club (score 4)"
        );
        let ranked = &response.details.unwrap()["ranked"];
        assert_eq!(ranked[0]["name"], "Robotics project");
        assert_eq!(ranked[0]["leadership"], true);
        assert_eq!(ranked[2]["score"], 4.0);
    }

    #[tokio::test]
    async fn test_rank_rejects_bad_hours() {
        let err = ask("rank: Debate|lots|yes|no").await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput(ref msg) if msg.contains("Debate")));

        for query in ["rank: x|-50|yes|no", "rank: x|nan|yes|no", "rank: x|inf|no|no"] {
            let err = ask(query).await.unwrap_err();
            assert!(matches!(err, AgentError::InvalidInput(ref msg) if msg.contains("non-negative")));
        }
    }

    #[test]
    fn test_score_ignores_impossible_hours() {
        let activity = |hours_per_week| Activity {
            name: "Debate".to_string(),
            hours_per_week,
            leadership: true,
            regional: false,
        };
        assert_eq!(activity(-50.0).score(), 40.0);
        assert_eq!(activity(f64::NAN).score(), 40.0);
    }

    #[tokio::test]
    async fn test_rank_without_entries_is_insufficient() {
        assert!(ask("rank my activities").await.unwrap().is_insufficient());
    }

    #[tokio::test]
    async fn test_essay_outline_uses_prompt() {
        let response = ask("essay tips: a challenge you overcame").await.unwrap();
        assert!(response.text.starts_with("Essay tips:\n- Start with a vivid scene"));
        assert!(response.text.contains("Outline for \"a challenge you overcame\":\n1. Hook:"));
        let details = response.details.unwrap();
        assert_eq!(details["tips"].as_array().unwrap().len(), 5);
        assert_eq!(details["prompt"], "a challenge you overcame");
    }

    #[tokio::test]
    async fn test_samples() {
        let response = ask("sample messages").await.unwrap();
        assert!(response.text.contains("Subject: Recommendation Request"));
        assert!(response.text.contains("Subject: Prospective Student Visit Request"));
        assert!(response.details.unwrap()["messages"]["college_visit_email"]
            .as_str()
            .unwrap()
            .contains("[month]"));
    }

    #[tokio::test]
    async fn test_resume_bullets() {
        let response = ask("resume: Food bank|Volunteer lead|organized weekend drives|200 families")
            .await
            .unwrap();
        assert_eq!(
            response.text,
            "Résumé bullets:\n- Volunteer lead at Food bank: organized weekend drives (200 families)"
        );
    }

    #[tokio::test]
    async fn test_unrecognized_is_insufficient() {
        let response = ask("which colleges should I apply to").await.unwrap();
        assert!(response.is_insufficient());
        assert_eq!(response.text, USAGE);
    }
}
