use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::Agent;
use crate::errors::AgentResult;
use crate::models::response::Response;

lazy_static! {
    static ref URL: Regex = Regex::new(r#"https?://[^\s)"'<>]+"#).unwrap();
}

const MUSIC_FAQ: &[(&str, &str)] = &[
    (
        "scale",
        "A major scale follows the pattern W-W-H-W-W-W-H (W=whole step, H=half step).",
    ),
    (
        "chord",
        "A major triad uses the 1st, 3rd, and 5th notes of the major scale. E.g., C-E-G for C major.",
    ),
    (
        "tempo",
        "Tempo is measured in BPM (beats per minute). Typical pop is 100-130 BPM.",
    ),
];

const TRAVEL_TIPS: &[(&[&str], &str)] = &[
    (
        &["visa", "passport", "entry"],
        "Visa requirements vary by country. Check the embassy site for your destination and \
         allow time for processing.",
    ),
    (
        &["pack", "packing", "luggage"],
        "Make a packing list split into clothes, documents, electronics, and medications. \
         Roll clothes to save space and keep copies of important documents.",
    ),
    (
        &["safety", "safe", "health"],
        "Check local advisories, keep copies of prescriptions, and confirm vaccination \
         requirements for your destination.",
    ),
];

const GENERAL_TRAVEL_TIP: &str =
    "Use offline maps and save key addresses and local emergency contacts in advance.";

/// Basic music theory, songwriting, and travel tips. Media links in the query are handed
/// back for the front-end to play.
#[derive(Debug, Default, Clone)]
pub struct MusicTravelAgent;

impl MusicTravelAgent {
    pub const NAME: &'static str = "Music & Travel Agent";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent for MusicTravelAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, query: &str) -> AgentResult<Response> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Response::local(
                "Ask me a music or travel question, e.g. 'What is a major scale?' or 'Travel tips for Paris?'.",
            )
            .mark_insufficient());
        }

        let urls: Vec<String> = URL
            .find_iter(q)
            .filter_map(|m| Url::parse(m.as_str()).ok())
            .map(String::from)
            .collect();
        if !urls.is_empty() {
            return Ok(Response::local("Playing provided URL").with_urls(urls));
        }

        let lower = q.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has_word = |candidates: &[&str]| candidates.iter().any(|c| words.contains(c));

        if let Some((_, text)) = MUSIC_FAQ.iter().find(|(key, _)| lower.contains(key)) {
            return Ok(Response::local(*text));
        }

        if let Some((_, text)) = TRAVEL_TIPS.iter().find(|(keys, _)| has_word(keys)) {
            return Ok(Response::local(*text));
        }
        if has_word(&["travel", "trip", "vacation", "flight", "hotel"]) {
            return Ok(Response::local(GENERAL_TRAVEL_TIP));
        }

        if has_word(&["song", "compose", "melody", "songwriting"]) {
            return Ok(Response::local(
                "Start with a short motif (2-4 notes) and repeat it with small variations. \
                 Think about rhythm and contour.",
            ));
        }

        Ok(Response::local(
            "I can answer basic music-theory questions (scales, chords, tempo) and give short \
             travel tips. Ask something specific.",
        )
        .mark_insufficient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::ResponseProvider;

    async fn ask(query: &str) -> Response {
        MusicTravelAgent::new().handle(query).await.unwrap()
    }

    #[tokio::test]
    async fn test_url_passthrough() {
        let response = ask("play https://www.youtube.com/watch?v=abc123 please").await;
        assert_eq!(response.text, "Playing provided URL");
        assert_eq!(response.urls, vec!["https://www.youtube.com/watch?v=abc123"]);
        assert_eq!(response.provider, ResponseProvider::Local);
    }

    #[tokio::test]
    async fn test_music_faq() {
        assert!(ask("What is a major scale?").await.text.contains("W-W-H-W-W-W-H"));
        assert!(ask("how do I write a melody").await.text.starts_with("Start with a short motif"));
    }

    #[tokio::test]
    async fn test_travel_tips_are_deterministic() {
        let first = ask("travel tips for Paris").await;
        let second = ask("travel tips for Paris").await;
        assert_eq!(first, second);
        assert_eq!(first.text, GENERAL_TRAVEL_TIP);
        assert!(ask("do I need a visa for Japan").await.text.starts_with("Visa requirements"));
        assert!(ask("packing list for a trip").await.text.starts_with("Make a packing list"));
    }

    #[tokio::test]
    async fn test_unrelated_is_insufficient() {
        assert!(ask("what's for dinner").await.is_insufficient());
    }
}
