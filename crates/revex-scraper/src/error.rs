use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a [`PageSession`](crate::page::PageSession) backend.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no element matched selector \"{selector}\"")]
    ElementNotFound { selector: String },

    #[error("interaction not supported by this session: {interaction}")]
    InteractionUnsupported { interaction: String },

    #[error("invalid URL \"{url}\": {reason}")]
    BadUrl { url: String, reason: String },
}

/// Failures raised by the durable session store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures raised by the extraction driver and its satellites.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("No reviews found on this page")]
    NoReviews,

    #[error("Extraction already in progress")]
    AlreadyRunning,

    #[error("No reviews to export")]
    NothingToExport,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("selector chain \"{chain}\" has no valid candidates")]
    SelectorChain { chain: String },
}
