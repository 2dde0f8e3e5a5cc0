use thiserror::Error;

/// Error returned by a [`Transport`](crate::transport::Transport) implementation.
///
/// The lookup path never inspects or rewraps it; it reaches the caller as-is
/// through [`ViewError::Transport`].
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while resolving a flow view.
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No flows found while querying for flows where {filter}")]
    NotFound { filter: String },

    #[error(
        "Found {count} flows while querying for flows where {filter}. Narrow the lookup (e.g. provide a project) or resolve the most recently updated flow"
    )]
    AmbiguousResult { filter: String, count: usize },

    #[error(transparent)]
    Transport(TransportError),

    #[error("Received bad response from the backend: {0}")]
    BadResponse(#[from] ResponseError),
}

/// The transport succeeded, but what came back does not honor the backend contract.
#[derive(Error, Debug, Clone)]
pub enum ResponseError {
    #[error("response has no flow list while querying for flows where {filter}")]
    MissingData { filter: String },

    #[error("backend reported errors: {0}")]
    BackendErrors(String),

    #[error("invalid flow record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised by the computation graph model when decoding a serialized graph.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Failed to decode serialized graph: {0}")]
    InvalidFormat(String),

    #[error("Node '{0}' is defined more than once")]
    DuplicateNode(String),

    #[error(
        "Node '{missing_node_id}' not found, which is required by a connection from node '{source_node_id}'"
    )]
    NodeNotFound {
        missing_node_id: String,
        source_node_id: String,
    },

    #[error("Graph contains a cycle through node '{0}'")]
    CycleDetected(String),
}

/// Errors raised while decoding a raw storage record.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("Storage record is missing its 'type' discriminator")]
    MissingDiscriminator,

    #[error("Unknown storage type '{0}'")]
    UnknownKind(String),

    #[error("Invalid '{kind}' storage record: {message}")]
    InvalidDescriptor { kind: String, message: String },
}
