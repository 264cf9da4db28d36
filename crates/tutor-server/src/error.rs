use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Invalid server address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// `llm.api_key` becomes `TUTOR_LLM__API_KEY`
pub fn to_env_var(field_path: &str) -> String {
    format!("TUTOR_{}", field_path.replace('.', "__").to_uppercase())
}
