use async_trait::async_trait;

use super::Agent;
use crate::errors::AgentResult;
use crate::models::response::Response;

const RULES: &[(&str, &str)] = &[
    (
        "chess",
        "Chess: each side moves one piece per turn; the goal is to checkmate the opposing king. \
         Pawns move forward and capture diagonally, knights jump in an L, bishops move \
         diagonally, rooks in straight lines, and the queen does both.",
    ),
    (
        "poker",
        "Poker (Texas Hold'em): each player gets two private cards and shares five community \
         cards. Bet across four rounds; the best five-card hand or the last player standing \
         wins the pot.",
    ),
    (
        "monopoly",
        "Monopoly: roll two dice to move, buy the properties you land on, and collect rent from \
         other players. Build houses once you own a full color set; the last player not \
         bankrupt wins.",
    ),
];

/// Game suggestions, short rule summaries, and a brainteaser for study breaks.
#[derive(Debug, Default, Clone)]
pub struct GamesAgent;

impl GamesAgent {
    pub const NAME: &'static str = "Games Agent";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent for GamesAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, query: &str) -> AgentResult<Response> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Ok(Response::local(
                "Ask for game suggestions, rules, or a short puzzle (e.g., 'suggest a party game' \
                 or 'give me a brainteaser').",
            )
            .mark_insufficient());
        }

        if q.contains("suggest") || q.contains("recommend") {
            return Ok(Response::local(
                "Try: '20 Questions' (verbal), 'Codenames' (team word game), or 'Set' (pattern \
                 recognition). For quick puzzles try a KenKen or a short logic riddle.",
            ));
        }

        if q.contains("rules") {
            return Ok(match RULES.iter().find(|(game, _)| q.contains(game)) {
                Some((_, summary)) => Response::local(*summary),
                None => Response::local(
                    "Ask which game's rules you want, e.g. chess, poker, or monopoly, and I'll \
                     give a concise summary.",
                ),
            });
        }

        if q.contains("puzzle") || q.contains("brainteaser") || q.contains("riddle") {
            return Ok(Response::local(
                "Brainteaser: I have keys but no locks. I have space but no room. You can enter \
                 but can't go outside. What am I? (Answer: a keyboard)",
            ));
        }

        Ok(Response::local(
            "I can suggest games for groups, give short rule summaries, or provide small puzzles. \
             What do you want?",
        )
        .mark_insufficient())
    }
}
