use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorklogError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{source_name} credentials not configured. Run 'worklog setup' first.")]
    Credentials { source_name: &'static str },

    #[error("{source_name}: {message}")]
    Source {
        source_name: &'static str,
        message: String,
    },

    #[error("Invalid date: {0}")]
    Date(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Schema build error: {0}")]
    Schema(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WorklogError>;
