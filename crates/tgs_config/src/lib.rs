//! # tgs_config
//!
//! Topology and stack configuration for tgs: the typed document model, the
//! dependency notation parser/resolver and the collecting validator.
//!
//! ## Documents
//!
//! - `.tgs/config.yaml` - project name, subscriptions, environments, naming
//! - `.tgs/stacks/<name>.yaml` - components and their regional placement
//!
//! ## Example
//!
//! ```rust,no_run
//! use tgs_config::{ConfigLoader, ProjectLayout};
//!
//! let layout = ProjectLayout::open(".").unwrap();
//! match ConfigLoader::from_project(&layout) {
//!     Ok(loaded) => println!("{} stack(s)", loaded.stacks.len()),
//!     Err(e) => {
//!         if let Some(report) = e.report() {
//!             for error in &report.errors {
//!                 eprintln!("Error: {}", error);
//!             }
//!         }
//!     }
//! }
//! ```

pub mod error;
pub mod loader;
pub mod models;
pub mod notation;
pub mod project;
pub mod validator;
pub mod writer;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, LoadedConfig, RawDocuments};
pub use models::*;
pub use notation::{DependencyPattern, NotationError, Resolution, ResolveContext, Segment};
pub use project::ProjectLayout;
pub use validator::{ConfigValidator, ValidationIssue, ValidationReport};
pub use writer::ConfigWriter;
