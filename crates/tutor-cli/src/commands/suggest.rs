use anyhow::Result;

use crate::settings::CliSettings;
use tutor::router::Suggestion;

pub fn handle_suggest(query: &str, top: usize, settings: CliSettings) -> Result<()> {
    let manager = settings.build_manager()?;
    let suggestions = manager.suggest(query, top);
    if suggestions.is_empty() {
        println!("No agent matched that question.");
    } else {
        println!("{}", format_suggestions(&suggestions));
    }
    Ok(())
}

fn format_suggestions(suggestions: &[Suggestion]) -> String {
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}. {} ({}, score {})",
                i + 1,
                s.agent,
                s.confidence,
                s.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor::router::Confidence;

    #[test]
    fn test_format_suggestions() {
        let suggestions = vec![
            Suggestion {
                agent: "Math Agent".to_string(),
                score: 3,
                confidence: Confidence::High,
            },
            Suggestion {
                agent: "AP STEM Agent".to_string(),
                score: 1,
                confidence: Confidence::Low,
            },
        ];
        assert_eq!(
            format_suggestions(&suggestions),
            "1. Math Agent (high, score 3)\n2. AP STEM Agent (low, score 1)"
        );
    }
}
