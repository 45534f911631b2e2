use crate::llm::LlmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlChatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("SQL rejected by {guard}: {reason}")]
    Rejected { guard: String, reason: String },
}

impl From<tokio_postgres::Error> for SqlChatError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db) => SqlChatError::Execution(format!("{} ({})", db.message(), db.code().code())),
            None => SqlChatError::Execution(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SqlChatError>;
