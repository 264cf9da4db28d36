use anyhow::Result;
use cliclack::{confirm, password};

/// Offers to take a key for the LLM agent. The key is returned to the caller and never written anywhere.
pub fn ask_for_api_key() -> Result<Option<String>> {
    let wants_key = confirm("No OPENAI_API_KEY found. Enter a key to enable LLM answers?")
        .initial_value(false)
        .interact()?;
    if !wants_key {
        return Ok(None);
    }

    let key: String = password("OpenAI API key").mask('▪').interact()?;
    let key = key.trim().to_string();
    Ok((!key.is_empty()).then_some(key))
}
