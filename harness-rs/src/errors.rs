//! Error types for dtest core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("Duplicate upgrade path: {0}")]
    DuplicateUpgradePath(String),

    #[error("No local source reference configured for upgrade to {0}")]
    MissingLocalRef(String),

    #[error("Duplicate generated suite: {0}")]
    DuplicateSuite(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Cluster error: {0}")]
    Cluster(String),

    #[error("Jolokia error: {0}")]
    Jolokia(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Regex error: {0}")]
    RegexError(String),
}

impl From<regex::Error> for HarnessError {
    fn from(err: regex::Error) -> Self {
        HarnessError::RegexError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
