//! Common test utilities: fixture graphs, flow records and in-memory transports.
use flowview::prelude::*;
use serde_json::{Value, json};
use std::sync::Mutex;

/// Creates a small, valid graph.
///
/// Shape: `extract -> transform -> load`
#[allow(dead_code)]
pub fn create_simple_graph() -> FlowGraph {
    FlowGraph {
        name: "nightly-etl".to_string(),
        nodes: vec![
            GraphNode {
                id: "extract".to_string(),
                operation_type: "http_get".to_string(),
                parameters: json!({ "url": "https://example.com/data.csv" })
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            },
            GraphNode {
                id: "transform".to_string(),
                operation_type: "map_rows".to_string(),
                parameters: Default::default(),
            },
            GraphNode {
                id: "load".to_string(),
                operation_type: "sql_insert".to_string(),
                parameters: Default::default(),
            },
        ],
        edges: vec![
            GraphEdge {
                source: "extract".to_string(),
                target: "transform".to_string(),
                key: Some("rows".to_string()),
                mapped: false,
            },
            GraphEdge {
                source: "transform".to_string(),
                target: "load".to_string(),
                key: Some("rows".to_string()),
                mapped: true,
            },
        ],
    }
}

/// Creates a diamond-shaped graph: `a -> (b, c) -> d`.
#[allow(dead_code)]
pub fn create_diamond_graph() -> FlowGraph {
    let node = |id: &str| GraphNode {
        id: id.to_string(),
        operation_type: "noop".to_string(),
        parameters: Default::default(),
    };
    let edge = |source: &str, target: &str| GraphEdge {
        source: source.to_string(),
        target: target.to_string(),
        key: None,
        mapped: false,
    };
    FlowGraph {
        name: "diamond".to_string(),
        nodes: vec![node("a"), node("b"), node("c"), node("d")],
        edges: vec![
            edge("a", "b"),
            edge("a", "c"),
            edge("b", "d"),
            edge("c", "d"),
        ],
    }
}

#[allow(dead_code)]
pub fn local_storage() -> Value {
    json!({
        "type": "Local",
        "directory": "/srv/flows",
        "stored_as_script": false,
        "flows": { "nightly-etl": "/srv/flows/nightly-etl.bin" },
        "secrets": [],
        "__version__": "0.15.0"
    })
}

/// Builds a flow record the way the backend returns it, plus `updated_at`.
#[allow(dead_code)]
pub fn create_flow_record(
    id: &str,
    name: &str,
    project: Option<&str>,
    archived: bool,
    updated_at: &str,
) -> Value {
    let serialized_graph = create_simple_graph()
        .to_serialized()
        .expect("fixture graph serializes");
    json!({
        "id": id,
        "name": name,
        "project": project.map(|p| json!({ "name": p })).unwrap_or(json!({ "name": null })),
        "archived": archived,
        "settings": { "heartbeat_enabled": true },
        "run_config": { "type": "UniversalRun", "labels": ["etl"] },
        "serialized_graph": serialized_graph,
        "backend_version": "0.15.4",
        "storage": local_storage(),
        "updated_at": updated_at,
    })
}

/// An in-memory backend: filters and orders its records the way the real
/// backend would, and remembers every query it received.
#[allow(dead_code)]
pub struct FakeBackend {
    records: Vec<Value>,
    pub queries: Mutex<Vec<QueryDescription>>,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().expect("query log poisoned").len()
    }

    pub fn last_query(&self) -> QueryDescription {
        self.queries
            .lock()
            .expect("query log poisoned")
            .last()
            .cloned()
            .expect("no query was executed")
    }
}

impl Transport for FakeBackend {
    fn execute(&self, query: &QueryDescription) -> std::result::Result<Value, TransportError> {
        self.queries
            .lock()
            .expect("query log poisoned")
            .push(query.clone());

        let mut flows: Vec<Value> = self
            .records
            .iter()
            .filter(|r| query.predicate.matches(r, &query.variables))
            .cloned()
            .collect();
        if let Some(order) = &query.order_by {
            flows.sort_by(|a, b| order.compare(a, b));
        }
        Ok(json!({ "data": { "flow": flows } }))
    }
}

/// Returns the same response to every query, ignoring the filter.
#[allow(dead_code)]
pub struct CannedTransport(pub Value);

impl Transport for CannedTransport {
    fn execute(&self, _query: &QueryDescription) -> std::result::Result<Value, TransportError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug)]
#[allow(dead_code)]
pub struct ConnectionRefused;

impl std::fmt::Display for ConnectionRefused {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connection refused")
    }
}

impl std::error::Error for ConnectionRefused {}

/// Fails every query.
#[allow(dead_code)]
pub struct FailingTransport;

impl Transport for FailingTransport {
    fn execute(&self, _query: &QueryDescription) -> std::result::Result<Value, TransportError> {
        Err(Box::new(ConnectionRefused))
    }
}
