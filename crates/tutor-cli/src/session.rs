use anyhow::Result;
use std::path::PathBuf;
use tracing::warn;

use crate::prompt::{parse_switch, InputType, Prompt};
use session_file::{append_entry, read_entries, TranscriptEntry};
use tutor::manager::{AgentManager, DispatchMode, DispatchOptions};
use tutor::models::response::Response;

pub mod session_file;

pub struct Session<'a> {
    manager: AgentManager,
    prompt: Box<dyn Prompt + 'a>,
    mode: DispatchMode,
    options: DispatchOptions,
    session_file: PathBuf,
}

impl<'a> Session<'a> {
    pub fn new(
        manager: AgentManager,
        prompt: Box<dyn Prompt + 'a>,
        mode: DispatchMode,
        options: DispatchOptions,
        session_file: PathBuf,
    ) -> Self {
        Session {
            manager,
            prompt,
            mode,
            options,
            session_file,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        self.setup_session();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = input.content {
                        self.ask(&content).await;
                    }
                }
                InputType::SelectAgent => self.select_agent(input.content.as_deref()),
                InputType::ListAgents => {
                    let listing = self.manager.list_agents().join("\n");
                    self.prompt.notice(&listing);
                }
                InputType::Fallback => match parse_switch(input.content.as_deref()) {
                    Some(on) => {
                        self.options.fallback_enabled = on;
                        self.prompt
                            .notice(&format!("LLM fallback {}", if on { "on" } else { "off" }));
                    }
                    None => self.prompt.notice("Usage: /fallback on|off"),
                },
                InputType::Web => match parse_switch(input.content.as_deref()) {
                    Some(on) => {
                        self.options.use_web = on;
                        self.prompt
                            .notice(&format!("Web search {}", if on { "on" } else { "off" }));
                    }
                    None => self.prompt.notice("Usage: /web on|off"),
                },
                InputType::AskAgain => continue,
                InputType::Exit => break,
            }
        }

        self.close_session();
        Ok(())
    }

    async fn ask(&mut self, query: &str) {
        self.prompt.show_busy();
        let response = tokio::select! {
            response = self.manager.dispatch(query, &self.mode, &self.options) => Some(response),
            _ = tokio::signal::ctrl_c() => None,
        };
        self.prompt.hide_busy();

        let Some(response) = response else {
            self.prompt.notice("Interrupted. The question was dropped.");
            return;
        };
        self.prompt.render(&response);
        self.record(query, response);
    }

    fn record(&self, query: &str, response: Response) {
        let entry = TranscriptEntry::new(&mode_label(&self.mode), query, response);
        if let Err(e) = append_entry(&self.session_file, &entry) {
            warn!(error = %e, "failed to record session entry");
        }
    }

    fn select_agent(&mut self, choice: Option<&str>) {
        let mode = DispatchMode::from_choice(choice);
        if let DispatchMode::Explicit(name) = &mode {
            let known = self.manager.list_agents().iter().any(|agent| {
                agent.eq_ignore_ascii_case(name)
                    || agent
                        .strip_suffix(" Agent")
                        .is_some_and(|short| short.eq_ignore_ascii_case(name))
            });
            if !known {
                self.prompt.notice(&format!(
                    "Unknown agent: {}. Type /agents to see the list.",
                    name
                ));
                return;
            }
        }
        self.prompt
            .notice(&format!("Now talking to {}", mode_label(&mode)));
        self.mode = mode;
    }

    fn setup_session(&mut self) {
        match read_entries(&self.session_file) {
            Ok(entries) if !entries.is_empty() => self.prompt.notice(&format!(
                "Resuming session with {} earlier questions. Recording to {}",
                entries.len(),
                self.session_file.display()
            )),
            Ok(_) => self.prompt.notice(&format!(
                "Starting session. Recording to {}",
                self.session_file.display()
            )),
            Err(e) => {
                warn!(error = %e, "could not read the existing session file");
                self.prompt.notice(&format!(
                    "Starting session. Recording to {}",
                    self.session_file.display()
                ));
            }
        }
        if self.options.api_key().is_none() && self.options.fallback_enabled {
            self.prompt
                .notice("No API key set, so only the local agents will answer.");
        }
        self.prompt.tutor_ready();
    }

    fn close_session(&mut self) {
        self.prompt.notice(&format!(
            "Closing session. Recorded to {}",
            self.session_file.display()
        ));
        self.prompt.close();
    }
}

pub fn mode_label(mode: &DispatchMode) -> String {
    match mode {
        DispatchMode::Auto => "auto".to_string(),
        DispatchMode::Explicit(name) => name.clone(),
    }
}
