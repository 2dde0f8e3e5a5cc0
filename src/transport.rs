use crate::error::TransportError;
use crate::query::QueryDescription;
use serde_json::Value;
use std::sync::Arc;

/// Executes flow queries against the backend.
///
/// Implementations own the connection, authentication and any timeouts. The
/// returned value is the raw response body, e.g. `{"data": {"flow": [...]}}`.
/// Real clients usually post [`QueryDescription::to_graphql`].
pub trait Transport: Send + Sync {
    fn execute(&self, query: &QueryDescription) -> Result<Value, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, query: &QueryDescription) -> Result<Value, TransportError> {
        (**self).execute(query)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, query: &QueryDescription) -> Result<Value, TransportError> {
        (**self).execute(query)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, query: &QueryDescription) -> Result<Value, TransportError> {
        (**self).execute(query)
    }
}
