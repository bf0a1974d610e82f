//! # tgs_naming
//!
//! Deterministic resource names and directory paths for tgs.
//!
//! A name is produced by picking a format (component override, then
//! resource-type override, then the global default), substituting the
//! `{project}`, `{region}`, `{env}`, `{type}`, `{component}` and `{app}`
//! tokens, and running the resource type's sanitizer over the result.
//!
//! ## Example
//!
//! ```rust
//! use tgs_config::NamingConfig;
//! use tgs_naming::{NamingContext, NamingEngine};
//!
//! let engine = NamingEngine::new(&NamingConfig::default());
//! let ctx = NamingContext {
//!     project: "CUSTTP",
//!     region: "eastus",
//!     environment: "dev",
//!     component: "webapp",
//!     app: Some("api"),
//!     resource_type: "azurerm_linux_web_app",
//! };
//!
//! let name = engine.name_with_format(&ctx, "{project}-{region}{env}-{app}").unwrap();
//! assert_eq!(name, "CUSTTP-ed-api");
//! ```

pub mod abbreviations;
pub mod engine;
pub mod error;
pub mod paths;
pub mod sanitize;

pub use abbreviations::{AbbreviationTable, DEFAULT_FALLBACK_LENGTH};
pub use engine::{NamingContext, NamingEngine, DEFAULT_FORMAT};
pub use error::{NamingError, NamingResult};
pub use sanitize::sanitize;
