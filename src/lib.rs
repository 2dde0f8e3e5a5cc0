//! # flowview - Read-only Snapshots of Stored Flows
//!
//! **flowview** resolves a flow (a named, versioned computation graph) stored by an
//! orchestration backend and reconstructs it as an immutable [`FlowView`]: the
//! record's metadata, its deserialized [`FlowGraph`] and its typed
//! [`StorageDescriptor`].
//!
//! ## Core Workflow
//!
//! Every lookup runs the same pipeline:
//!
//! 1.  **Build a Query**: [`QueryDescription`] turns the lookup intent (by id, by
//!     graph structure, by name and project) into a typed filter, an ordering and
//!     out-of-band variables.
//! 2.  **Execute**: a caller-supplied [`Transport`] runs the query. No retries, no caching.
//! 3.  **Disambiguate**: zero matches is an error, and so is more than one unless the
//!     caller asked for the most recently updated flow.
//! 4.  **Deserialize**: the record's graph and storage are decoded; a record that
//!     does not decode is reported as a bad response, never returned half-built.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowview::prelude::*;
//! use serde_json::{json, Value};
//!
//! // A transport posts `query.to_graphql()` to the backend and returns the body.
//! struct Backend;
//!
//! impl Transport for Backend {
//!     fn execute(&self, query: &QueryDescription) -> std::result::Result<Value, TransportError> {
//!         let request = query.to_graphql();
//!         println!("{}", request.query);
//!         Ok(json!({ "data": { "flow": [] } }))
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let backend = Backend;
//!
//!     let view = FlowView::resolve_by_name(
//!         &backend,
//!         "nightly-etl",
//!         &ProjectFilter::named("data"),
//!         true, // take the most recently updated match
//!     )?;
//!
//!     println!("{}", view);
//!     for node in view.graph().topological_order()? {
//!         println!("  {} ({})", node.id, node.operation_type);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod graph;
pub mod lookup;
pub mod prelude;
pub mod query;
pub mod storage;
pub mod transport;
pub mod view;

pub use graph::FlowGraph;
pub use query::{ProjectFilter, QueryDescription};
pub use storage::StorageDescriptor;
pub use transport::Transport;
pub use view::FlowView;
