//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the flowview crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowview::prelude::*;
//!
//! # fn run_example(transport: &dyn Transport) -> Result<()> {
//! let view = FlowView::resolve_by_id(transport, "5b1c2d3e-0000-4000-8000-000000000001")?;
//! println!("{} is stored in {}", view.name(), view.storage());
//! # Ok(())
//! # }
//! ```

// Lookup entry points
pub use crate::lookup::{Disambiguation, query_for_flow, query_for_flows};
pub use crate::view::FlowView;

// Query construction
pub use crate::query::{Direction, OrderBy, Predicate, ProjectFilter, QueryDescription};
pub use crate::transport::Transport;

// Deserialized sub-objects
pub use crate::graph::{FlowGraph, GraphEdge, GraphNode};
pub use crate::storage::{StorageBackend, StorageDescriptor};

// Error types
pub use crate::error::{GraphError, ResponseError, StorageError, TransportError, ViewError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
