// src/error.rs

//! Error types for reduced transaction set construction

use thiserror::Error;

/// Errors raised while building a reduced transaction set
#[derive(Debug, Error)]
pub enum Error {
    /// A dependency expression does not follow the `name [op version]` grammar
    #[error("Malformed dependency expression '{expression}': {reason}")]
    MalformedDependency { expression: String, reason: String },

    /// A required input file or directory is absent
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// More than one file matches a role that admits exactly one
    #[error("Ambiguous input: {0}")]
    AmbiguousInput(String),

    /// Repository metadata or package header could not be read
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// On-disk repodata cache failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Invalid configuration value or file
    #[error("Configuration error: {0}")]
    Config(String),

    /// No package in the universe satisfies a requirement
    #[error("Nothing provides '{requirement}' needed by {package}")]
    Unresolvable { package: String, requirement: String },

    /// The same key was submitted twice to an orderer
    #[error("Duplicate transaction key: {0}")]
    DuplicateKey(String),

    /// Transaction ordering failed or was driven out of sequence
    #[error("Ordering error: {0}")]
    Ordering(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(expression: &str, reason: impl Into<String>) -> Self {
        Self::MalformedDependency {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for reduced transaction set operations
pub type Result<T> = std::result::Result<T, Error>;
