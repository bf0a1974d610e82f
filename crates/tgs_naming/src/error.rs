//! Error types for naming.

use thiserror::Error;

/// Result type alias for naming operations.
pub type NamingResult<T> = Result<T, NamingError>;

/// Errors that can occur while computing a resource name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("Name for component '{component}' ({resource_type}) is empty after sanitizing '{raw}'")]
    Empty {
        component: String,
        resource_type: String,
        raw: String,
    },

    #[error("Unknown naming token '{{{token}}}' in format '{format}'")]
    UnknownToken { token: String, format: String },
}
