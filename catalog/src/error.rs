use thiserror::Error;

/// A single rejected item from a `_bulk` request
#[derive(Debug, Clone, PartialEq)]
pub struct BulkFailure {
    pub id: String,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search service returned {status} ({error_type}): {reason}")]
    Api {
        status: u16,
        error_type: String,
        reason: String,
    },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Bulk request failed for {} document(s)", .failed.len())]
    Bulk { failed: Vec<BulkFailure> },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Status code reported by the search service, if the failure came from it
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::IndexNotFound(_) => Some(404),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
