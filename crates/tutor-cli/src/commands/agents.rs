use anyhow::Result;
use console::style;

use crate::settings::CliSettings;

pub fn handle_agents(settings: CliSettings) -> Result<()> {
    let manager = settings.build_manager()?;
    println!("{}", format_agents(&manager.list_agents()));
    Ok(())
}

/// Numbered in routing priority order
fn format_agents(names: &[String]) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{:>2}. {}", i + 1, style(name).bold()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_agents() {
        console::set_colors_enabled(false);
        let names = vec!["Math Agent".to_string(), "LLM Agent".to_string()];
        assert_eq!(format_agents(&names), " 1. Math Agent\n 2. LLM Agent");
    }
}
