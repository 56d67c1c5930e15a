use std::path::PathBuf;
use thiserror::Error;

use crate::literal::LiteralError;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not create target directory {}: {source}", path.display())]
    TargetDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not extract data from listing document: {0}")]
    IndexExtraction(String),

    #[error("no script containing the reader bootstrap found on {url}")]
    ScriptNotFound { url: String },

    #[error("no embedded data literal found on {url}")]
    DataLiteralNotFound { url: String },

    #[error("embedded data on {url} has no `{field}` field")]
    MissingField { url: String, field: String },

    #[error("Parse error: {0}")]
    Literal(#[from] LiteralError),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
