//! Error types for repack

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// repack errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid type locator {0:?} (expected <path>#<TypeName>)")]
    LocatorParse(String),

    #[error("failed to load {locator}: {reason}")]
    SchemaLoad { locator: String, reason: String },

    #[error("recursive schema: {}", chain.join(" -> "))]
    RecursiveSchema { chain: Vec<String> },

    #[error("schema nesting exceeds max depth {max_depth} at {path}")]
    DepthExceeded { max_depth: usize, path: String },

    #[error("{side} has {count} leaves (limit {limit})")]
    TooManyLeaves {
        side: &'static str,
        count: usize,
        limit: usize,
    },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn load(locator: impl ToString, reason: impl ToString) -> Self {
        Error::SchemaLoad {
            locator: locator.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
