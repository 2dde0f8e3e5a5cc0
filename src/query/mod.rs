//! Translation of a lookup intent into a backend query.
//!
//! Each lookup mode produces a [`QueryDescription`]: a typed filter, an optional
//! ordering and the out-of-band variables the filter references. Structured
//! values (a serialized graph) always travel as variables, never inlined.

use crate::error::ViewError;
use crate::graph::FlowGraph;
use serde_json::{Map, Value};

pub mod predicate;
pub mod render;

pub use predicate::*;
pub use render::*;

/// Name of the variable that carries a serialized graph in a structural lookup.
pub const GRAPH_VARIABLE: &str = "serialized_graph";

/// Field used to find the most recently updated flow.
pub const UPDATED_AT: &str = "updated_at";

/// Which projects a name lookup searches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProjectFilter {
    /// Search across all projects.
    #[default]
    Any,
    /// Only flows that explicitly belong to no project.
    Unassigned,
    /// Only flows in the named project.
    Named(String),
}

impl ProjectFilter {
    pub fn named(name: impl Into<String>) -> Self {
        ProjectFilter::Named(name.into())
    }

    fn predicate(&self) -> Option<Predicate> {
        match self {
            ProjectFilter::Any => None,
            ProjectFilter::Unassigned => {
                Some(Predicate::related("project", Predicate::is_null("name")))
            }
            ProjectFilter::Named(name) => Some(Predicate::related(
                "project",
                Predicate::eq("name", name.as_str()),
            )),
        }
    }
}

/// A single flow query: filter, ordering and out-of-band variables.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescription {
    pub predicate: Predicate,
    pub order_by: Option<OrderBy>,
    pub variables: Map<String, Value>,
}

impl QueryDescription {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            order_by: None,
            variables: Map::new(),
        }
    }

    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Declares a structured variable.
    ///
    /// Only JSON objects are accepted; scalars belong inline in the predicate.
    pub fn with_variable(mut self, name: &str, value: Value) -> Result<Self, ViewError> {
        if !is_variable_name(name) {
            return Err(ViewError::InvalidInput(format!(
                "'{}' is not a valid variable name",
                name
            )));
        }
        if !value.is_object() {
            return Err(ViewError::InvalidInput(format!(
                "Passed variable '{}' is of type {}, expected an object. Other types are not supported.",
                name,
                json_type_name(&value)
            )));
        }
        self.variables.insert(name.to_string(), value);
        Ok(self)
    }

    /// Checks that the predicate and the declared variables agree.
    pub fn validate(&self) -> Result<(), ViewError> {
        let referenced = self.predicate.variables();
        if let Some(missing) = referenced
            .iter()
            .find(|name| !self.variables.contains_key(**name))
        {
            return Err(ViewError::InvalidInput(format!(
                "Filter references undeclared variable '${}'",
                missing
            )));
        }
        if let Some(unused) = self
            .variables
            .keys()
            .find(|name| !referenced.contains(name.as_str()))
        {
            return Err(ViewError::InvalidInput(format!(
                "Variable '{}' is declared but never used by the filter",
                unused
            )));
        }
        Ok(())
    }

    /// Whether the first result of this query is the most recently updated match.
    pub fn orders_most_recent_first(&self) -> bool {
        matches!(
            &self.order_by,
            Some(OrderBy { field, direction: Direction::Desc }) if field == UPDATED_AT
        )
    }

    /// Lookup by flow id.
    pub fn by_id(flow_id: &str) -> Result<Self, ViewError> {
        validate_flow_id(flow_id)?;
        Ok(Self::new(Predicate::eq("id", flow_id)))
    }

    /// Lookup by structural equality with `graph`'s serialized form.
    pub fn by_definition(graph: &FlowGraph, allow_archived: bool) -> Result<Self, ViewError> {
        let serialized = graph
            .to_serialized()
            .map_err(|e| ViewError::InvalidInput(e.to_string()))?;

        let mut predicate = Predicate::eq_variable("serialized_graph", GRAPH_VARIABLE);
        if !allow_archived {
            predicate = predicate.and(Predicate::eq("archived", false));
        }
        Self::new(predicate).with_variable(GRAPH_VARIABLE, Value::Object(serialized))
    }

    /// Lookup of unarchived flows by name, newest first.
    pub fn by_name(flow_name: &str, project: &ProjectFilter) -> Self {
        let mut predicate = Predicate::eq("name", flow_name).and(Predicate::eq("archived", false));
        if let Some(project_predicate) = project.predicate() {
            predicate = predicate.and(project_predicate);
        }
        Self::new(predicate).with_order(OrderBy::desc(UPDATED_AT))
    }
}

fn validate_flow_id(flow_id: &str) -> Result<(), ViewError> {
    if flow_id.is_empty() {
        return Err(ViewError::InvalidInput(
            "Flow id must not be empty".to_string(),
        ));
    }
    if flow_id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ViewError::InvalidInput(format!(
            "Unexpected flow id {:?}: identifiers cannot contain whitespace or control characters",
            flow_id
        )));
    }
    Ok(())
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
