//! # tgs_scaffold
//!
//! Materializes a validated topology into a Terragrunt tree and Azure DevOps
//! pipelines.
//!
//! ## Generated layout
//!
//! ```text
//! .infra/
//! ├── root.hcl
//! ├── _components/<stack>/<component>/{component.hcl, main.tf, ...}
//! └── <subscription>/
//!     ├── subscription.hcl
//!     └── <region>/
//!         ├── region.hcl
//!         └── <environment>/
//!             ├── environment.hcl
//!             └── <component>[/<app>]/terragrunt.hcl
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use tgs_config::{ConfigLoader, ProjectLayout};
//! use tgs_scaffold::Generator;
//!
//! let layout = ProjectLayout::open(".").unwrap();
//! let loaded = ConfigLoader::from_project(&layout).unwrap();
//!
//! let report = Generator::new(layout.output_dir())
//!     .generate(&loaded.topology, &loaded.stacks)
//!     .unwrap();
//! println!("{} unit(s)", report.units);
//! ```

pub mod error;
pub mod generator;
pub mod pipeline;
pub mod schema;
pub mod templates;
pub mod writer;

pub use error::{ScaffoldError, ScaffoldResult};
pub use generator::{dependency_labels, reserved_inputs, GenerationReport, Generator, UNIT_FILE};
pub use pipeline::{PipelineGenerator, DEPLOY_TEMPLATE};
pub use schema::{NoSchema, ProviderSchemaFile, ResourceSchema, SchemaAttribute, SchemaCache, SchemaSource};
pub use writer::{FileAction, FileRecord, TreeWriter, WriteMode};
