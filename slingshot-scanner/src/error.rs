use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures that abort a crawl before or at its boundaries.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Failure recorded on a single node. Terminates expansion of that node
/// only; the crawl continues.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NodeError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("invalid body: {0}")]
    Parse(String),

    #[error("download failed: {0}")]
    Download(String),
}
