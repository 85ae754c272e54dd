use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid search query: {0}")]
    Query(String),

    #[error("Literature search failed: {0:#}")]
    Search(anyhow::Error),

    #[error("The digest does not contain any article summaries")]
    EmptyDigest,

    #[error("Template error: {0}")]
    Template(String),

    #[error("Mail delivery error: {0}")]
    Mail(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Security error: {0}")]
    SecurityError(String),
}

pub type Result<T> = std::result::Result<T, WatchError>;
