use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The computation graph of a flow: named operations and the data
/// dependencies between them.
///
/// This is the deserialized form of a flow's `serialized_graph`. It can be
/// explored (see the topology helpers), but it carries no runnable code.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowGraph {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

/// A single operation in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub operation_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

/// A dependency between two nodes; `source` runs before `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    /// The keyword under which the target receives the source's output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub mapped: bool,
}

impl FlowGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Decodes and validates a serialized graph.
    ///
    /// Fails if the object does not match the graph schema, if a node id is
    /// repeated, if an edge points at a missing node, or if the edges form a cycle.
    pub fn from_serialized(raw: &Map<String, Value>) -> Result<Self, GraphError> {
        let graph: FlowGraph = serde_json::from_value(Value::Object(raw.clone()))
            .map_err(|e| GraphError::InvalidFormat(e.to_string()))?;
        graph.validate()?;
        Ok(graph)
    }

    /// Produces the canonical serialized form used for storage and structural matching.
    pub fn to_serialized(&self) -> Result<Map<String, Value>, GraphError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(GraphError::InvalidFormat(format!(
                "graph serialized to a non-object value: {}",
                other
            ))),
            Err(e) => Err(GraphError::InvalidFormat(e.to_string())),
        }
    }
}
