//! Error types for graph building.

use thiserror::Error;

use tgs_config::{NotationError, UnitId};

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while building the dependency graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Circular dependency detected: {}", format_path(.path))]
    Cycle { path: Vec<UnitId> },

    #[error("Invalid dependency of component '{component}': {source}")]
    Notation {
        component: String,
        #[source]
        source: NotationError,
    },

    #[error("Unit not in graph: {0}")]
    UnknownUnit(UnitId),
}

fn format_path(path: &[UnitId]) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(" → ")
}
