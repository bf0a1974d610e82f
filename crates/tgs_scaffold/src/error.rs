//! Error types for tree generation.

use std::path::PathBuf;

use thiserror::Error;

use tgs_config::ConfigError;
use tgs_graph::GraphError;
use tgs_naming::NamingError;

/// Result type alias for scaffold operations.
pub type ScaffoldResult<T> = Result<T, ScaffoldError>;

/// Errors that can occur while generating the tree or pipeline.
#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Component '{component}' is not defined in stack '{stack}'")]
    UnknownComponent { stack: String, component: String },

    #[error("Generation cancelled")]
    Cancelled,

    #[error("Invalid provider schema {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ScaffoldError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
