use thiserror::Error;

/// Main error type for Arbordoc operations
#[derive(Error, Debug)]
pub enum ArbordocError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metadata serialization error: {0}")]
    Metadata(#[from] serde_yaml::Error),

    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Prompt template error: {0}")]
    Prompt(String),

    #[error("Analysis backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, ArbordocError>;
