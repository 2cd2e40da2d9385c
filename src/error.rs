use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A font file that was explicitly configured could not be used.
    #[error("font '{}' unusable: {reason}", path.display())]
    Font { path: PathBuf, reason: String },

    #[error("page {index} does not exist (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-side problem: the request cannot be served as sent.
    #[error("{0}")]
    InvalidRequest(String),

    /// The chat-completions API answered with a structured error.
    #[error("OpenAI API Error: {message}")]
    Upstream { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
