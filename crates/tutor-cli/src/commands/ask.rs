use anyhow::{bail, Result};

use crate::prompt::cliclack::render_response;
use crate::settings::CliSettings;
use tutor::manager::DispatchMode;
use tutor::models::response::ResponseError;

pub async fn handle_ask(
    query: &str,
    agent: Option<&str>,
    json: bool,
    settings: CliSettings,
) -> Result<()> {
    let manager = settings.build_manager()?;
    let mode = DispatchMode::from_choice(agent);
    let response = manager.dispatch(query, &mode, &settings.options).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        render_response(&response, "zenburn");
    }

    match response.error {
        Some(ResponseError::Input) => bail!("{}", response.text),
        _ => Ok(()),
    }
}
