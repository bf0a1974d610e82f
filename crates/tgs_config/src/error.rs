//! Error types for the config module.

use std::path::PathBuf;
use thiserror::Error;

use crate::validator::ValidationReport;

/// Result type alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Project not initialized: {0} not found")]
    NotFound(PathBuf),

    #[error("Project already initialized at path: {0}")]
    AlreadyExists(PathBuf),

    #[error("Malformed document {location}: {message}")]
    Structural { location: String, message: String },

    #[error("Configuration validation failed with {} error(s)", .0.errors.len())]
    Invalid(ValidationReport),

    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Invalid stack file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The validation report carried by an `Invalid` error, if any.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Invalid(report) => Some(report),
            _ => None,
        }
    }
}
