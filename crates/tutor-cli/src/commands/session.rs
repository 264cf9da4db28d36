use anyhow::Result;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::prompt::cliclack::CliclackPrompt;
use crate::session::session_file::{ensure_session_dir, session_path};
use crate::session::Session;
use crate::settings::CliSettings;
use tutor::manager::DispatchMode;

pub fn build_session(
    session_name: Option<String>,
    agent: Option<String>,
    settings: CliSettings,
) -> Result<Session<'static>> {
    let session_dir = ensure_session_dir()?;
    let session_name = session_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(random_session_name);
    let session_file = session_path(&session_dir, &session_name);

    let manager = settings.build_manager()?;
    let mode = DispatchMode::from_choice(agent.as_deref());
    let prompt = CliclackPrompt::new();

    Ok(Session::new(
        manager,
        Box::new(prompt),
        mode,
        settings.options,
        session_file,
    ))
}

fn random_session_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
