use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EsgError {
    #[error("Cannot read document {path}: {reason}")]
    DocumentAccess { path: String, reason: String },

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Cannot write results to {path:?}: {source}")]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EsgError>;
