use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands {
    pub mod agents;
    pub mod ask;
    pub mod session;
    pub mod suggest;
    pub mod version;
}
mod inputs;
mod prompt;
mod session;
mod settings;

use commands::agents::handle_agents;
use commands::ask::handle_ask;
use commands::session::build_session;
use commands::suggest::handle_suggest;
use commands::version::print_version;
use settings::CliSettings;

#[derive(Parser)]
#[command(author, about, long_about = None)]
pub struct Cli {
    #[arg(short = 'v', long = "version")]
    version: bool,

    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Options shared by every command that dispatches queries
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// OpenAI API key (can also be set via OPENAI_API_KEY). Held in memory only.
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Chat model used for the LLM agent
    #[arg(long, global = true)]
    model: Option<String>,

    /// OpenAI-compatible host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Never hand weak local answers to the LLM
    #[arg(long, global = true)]
    no_fallback: bool,

    /// Agents whose answers are never replaced by the LLM (repeatable)
    #[arg(long = "disable-fallback", global = true, value_name = "AGENT")]
    disabled_fallbacks: Vec<String>,

    /// Add web-search context to LLM answers
    #[arg(long, global = true)]
    web: bool,

    /// Comma-separated search backends in priority order (duckduckgo, serpapi)
    #[arg(long, global = true, value_delimiter = ',')]
    search: Vec<String>,

    /// Seconds to wait for the LLM before answering locally
    #[arg(long, global = true)]
    llm_timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Start or resume an interactive tutoring session
    #[command(about = "Start or resume an interactive tutoring session")]
    Session {
        /// Name for this session; a random one is generated when omitted
        #[arg(short, long)]
        name: Option<String>,

        /// Agent to talk to instead of automatic routing
        #[arg(short, long)]
        agent: Option<String>,
    },

    /// Answer a single question and exit
    Ask {
        /// Agent to use instead of automatic routing
        #[arg(short, long)]
        agent: Option<String>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,

        /// The question
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// List the available agents in routing order
    Agents,

    /// Show which agents would handle a question
    Suggest {
        /// How many agents to show
        #[arg(short = 'n', long, default_value_t = 3)]
        top: usize,

        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // chat output stays on stdout; diagnostics go to stderr and default to warnings
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.version {
        print_version();
        return Ok(());
    }

    match cli.command {
        Some(Command::Session { name, agent }) => {
            let settings = CliSettings::resolve(&cli.settings, true)?;
            let mut session = build_session(name, agent, settings)?;
            session.start().await?;
        }
        Some(Command::Ask { agent, json, query }) => {
            let settings = CliSettings::resolve(&cli.settings, false)?;
            handle_ask(&query.join(" "), agent.as_deref(), json, settings).await?;
        }
        Some(Command::Agents) => {
            let settings = CliSettings::resolve(&cli.settings, false)?;
            handle_agents(settings)?;
        }
        Some(Command::Suggest { top, query }) => {
            let settings = CliSettings::resolve(&cli.settings, false)?;
            handle_suggest(&query.join(" "), top, settings)?;
        }
        Some(Command::Version) => print_version(),
        None => {
            println!("No command provided - Run 'tutor help' to see available commands.");
        }
    }
    Ok(())
}
