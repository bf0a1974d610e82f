//! # tgs_graph
//!
//! Dependency graph over the deployable units of a stack.
//!
//! Each `(region, component, app)` unit becomes a node; each resolved
//! dependency becomes an edge from the dependent to its dependency. The graph
//! rejects cycles, orders units deterministically and assigns every unit a
//! deployment stage (the longest dependency chain ending at it).

pub mod diagram;
pub mod error;
pub mod graph;
pub mod pipeline;

pub use diagram::render_mermaid;
pub use error::{GraphError, GraphResult};
pub use graph::{DependencyEdge, DependencyGraph};
pub use pipeline::{order_for_pipeline, Stage};
