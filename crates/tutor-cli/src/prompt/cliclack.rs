use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::{input, spinner};
use console::style;
use rand::seq::SliceRandom;
use tutor::models::response::{Response, ResponseProvider};

use super::{Input, InputType, Prompt, Theme, HELP};

const THINKING: &[&str] = &[
    "Thinking",
    "Checking my notes",
    "Working it out",
    "Looking that up",
    "Sharpening pencils",
];

pub struct CliclackPrompt {
    spinner: cliclack::ProgressBar,
    input_mode: InputMode,
    theme: Theme,
}

enum InputMode {
    Singleline,
    Multiline,
}

impl CliclackPrompt {
    pub fn new() -> Self {
        CliclackPrompt {
            spinner: spinner(),
            input_mode: InputMode::Singleline,
            theme: Theme::Dark,
        }
    }

    fn bat_theme(&self) -> &'static str {
        match self.theme {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }
}

fn print(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if printed.is_err() {
        println!("{}", content);
    }
}

/// Answer text, then any links, then a dim line saying who answered
pub fn render_response(response: &Response, theme: &str) {
    if response.is_error() {
        println!("{}", style(&response.text).red());
    } else {
        print(&response.text, theme);
        println!();
    }

    for url in &response.urls {
        println!("  {}", style(url).cyan().underlined());
    }

    println!("{}", style(footer(response)).dim());
    if let Some(reason) = &response.fallback_reason {
        println!(
            "{}",
            style(format!("LLM unavailable ({}), showing the local answer.", reason)).yellow()
        );
    }
}

fn footer(response: &Response) -> String {
    let agent = response.agent.as_deref().unwrap_or("no agent");
    let mut footer = format!("[{} | {}]", agent, response.provider);
    if response.provider == ResponseProvider::Llm {
        if let Some(from) = &response.fallback_from {
            footer.push_str(&format!(" answered in place of {}", from));
        }
    }
    footer
}

impl Prompt for CliclackPrompt {
    fn render(&mut self, response: &Response) {
        render_response(response, self.bat_theme());
        println!();
        let _ = io::stdout().flush();
    }

    fn notice(&mut self, text: &str) {
        println!("{}", style(text).dim());
    }

    fn show_busy(&mut self) {
        let message = THINKING
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Thinking");
        self.spinner = spinner();
        self.spinner.start(format!("{}...", message));
    }

    fn hide_busy(&mut self) {
        self.spinner.stop("");
    }

    fn get_input(&mut self) -> Result<Input> {
        let mut input = input("Tutor:          [Help: /?]").placeholder("");
        match self.input_mode {
            InputMode::Multiline => input = input.multiline(),
            InputMode::Singleline => (),
        }
        let message_text: String = input.interact()?;
        let message_text = message_text.trim();

        if message_text.eq_ignore_ascii_case("/m") {
            self.input_mode = InputMode::Multiline;
            return self.get_input();
        } else if message_text.eq_ignore_ascii_case("/s") {
            self.input_mode = InputMode::Singleline;
            return self.get_input();
        } else if message_text.eq_ignore_ascii_case("/t") {
            self.theme = match self.theme {
                Theme::Light => {
                    println!("Switching to Dark theme");
                    Theme::Dark
                }
                Theme::Dark => {
                    println!("Switching to Light theme");
                    Theme::Light
                }
            };
            return self.get_input();
        } else if message_text.eq_ignore_ascii_case("/?") {
            println!("{}", HELP);
            return Ok(Input {
                input_type: InputType::AskAgain,
                content: None,
            });
        }

        Ok(Input::parse(message_text))
    }

    fn close(&self) {
        // No cleanup required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer() {
        let local = Response::local("Result: 4").with_agent("Math Agent");
        assert_eq!(footer(&local), "[Math Agent | local]");

        let llm = Response::llm("An answer")
            .with_agent("LLM Agent")
            .with_fallback_from("High School Agent");
        assert_eq!(
            footer(&llm),
            "[LLM Agent | llm] answered in place of High School Agent"
        );

        assert_eq!(footer(&Response::input_error("Please enter a question")), "[no agent | none]");
    }
}
