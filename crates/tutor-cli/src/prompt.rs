use anyhow::Result;
use tutor::models::response::Response;

pub mod cliclack;

pub trait Prompt {
    fn render(&mut self, response: &Response);
    /// A line of session chrome rather than an answer
    fn notice(&mut self, text: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn close(&self);
    fn tutor_ready(&self) {
        println!("\n");
        println!("Tutor is ready! Ask a question, or type /? for commands.");
        println!("\n");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // the message, or the argument of a session command
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Message,
    Exit,
    SelectAgent,
    ListAgents,
    Fallback,
    Web,
}

pub enum Theme {
    Light,
    Dark,
}

pub const HELP: &str = "\
Commands:
/exit - Exit the session
/agent <name|auto> - Talk to one agent, or go back to automatic routing
/agents - List the agents
/fallback on|off - Let the LLM answer when the local answer is weak
/web on|off - Add web-search context to LLM answers
/m - Switch to multiline input mode
/s - Switch to singleline input mode
/t - Toggle Light/Dark theme
/? - Display this help message";

impl Input {
    fn command(input_type: InputType, content: Option<String>) -> Self {
        Input {
            input_type,
            content,
        }
    }

    /// Session commands understood by every prompt. Display-only commands such as
    /// `/m` or `/t` are left to the prompt and come back as messages.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (head, rest) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, Some(rest.trim().to_string())),
            None => (text, None),
        };
        let rest = rest.filter(|r| !r.is_empty());

        match head.to_lowercase().as_str() {
            "/exit" | "/quit" => Self::command(InputType::Exit, None),
            "/agent" => Self::command(
                InputType::SelectAgent,
                Some(rest.unwrap_or_else(|| "auto".to_string())),
            ),
            "/agents" => Self::command(InputType::ListAgents, None),
            "/fallback" => Self::command(InputType::Fallback, rest),
            "/web" => Self::command(InputType::Web, rest),
            _ if text.is_empty() => Self::command(InputType::AskAgain, None),
            _ => Self::command(InputType::Message, Some(text.to_string())),
        }
    }
}

/// `on`/`off` style switches; `None` for anything else
pub fn parse_switch(value: Option<&str>) -> Option<bool> {
    match value?.trim().to_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Some(true),
        "off" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}
