use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tutor::models::response::Response;

/// One exchange of a session, written as a single JSON line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub timestamp: DateTime<Utc>,
    /// The agent the user picked, or `auto`
    pub mode: String,
    pub query: String,
    pub response: Response,
}

impl TranscriptEntry {
    pub fn new(mode: &str, query: &str, response: Response) -> Self {
        Self {
            timestamp: Utc::now(),
            mode: mode.to_string(),
            query: query.to_string(),
            response,
        }
    }
}

pub fn ensure_session_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let config_dir = home_dir.join(".config").join("tutor").join("sessions");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn session_path(session_dir: &Path, name: &str) -> PathBuf {
    session_dir.join(format!("{}.jsonl", name))
}

/// Appends so an interrupted session keeps everything recorded so far
pub fn append_entry(session_file: &Path, entry: &TranscriptEntry) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(session_file)
        .with_context(|| format!("Failed to open session file {}", session_file.display()))?;
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    file.write_all(line.as_bytes())?;
    Ok(())
}

pub fn read_entries(session_file: &Path) -> Result<Vec<TranscriptEntry>> {
    if !session_file.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(fs::File::open(session_file)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_read() -> Result<()> {
        let dir = tempdir()?;
        let path = session_path(dir.path(), "algebra");
        assert!(read_entries(&path)?.is_empty());

        let first = TranscriptEntry::new(
            "auto",
            "2+2",
            Response::local("Result: 4").with_agent("Math Agent"),
        );
        let second = TranscriptEntry::new(
            "LLM Agent",
            "why is the sky blue",
            Response::llm("Rayleigh scattering.").with_url("https://example.org/sky"),
        );
        append_entry(&path, &first)?;
        append_entry(&path, &second)?;

        let entries = read_entries(&path)?;
        assert_eq!(entries, vec![first, second]);
        assert_eq!(fs::read_to_string(&path)?.lines().count(), 2);
        Ok(())
    }

    #[test]
    fn test_blank_lines_are_skipped() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("gaps.jsonl");
        let entry = TranscriptEntry::new("auto", "hi", Response::local("hello"));
        fs::write(&path, format!("\n{}\n\n", serde_json::to_string(&entry)?))?;
        assert_eq!(read_entries(&path)?.len(), 1);
        Ok(())
    }
}
