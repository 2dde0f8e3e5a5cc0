use super::QueryDescription;
use super::predicate::{Operand, OrderBy, Predicate};
use itertools::Itertools;
use serde_json::{Map, Value};

/// Fields requested for every flow record.
pub const FLOW_FIELDS: &[&str] = &[
    "id",
    "settings",
    "run_config",
    "serialized_graph",
    "name",
    "archived",
    "project { name }",
    "backend_version",
    "storage",
];

/// Backend type of out-of-band structured variables.
pub const VARIABLE_TYPE: &str = "jsonb";

/// A query document plus the variables it declares, ready to be posted to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: Map<String, Value>,
}

impl QueryDescription {
    /// Renders the query document that selects flows matching this description.
    pub fn to_graphql(&self) -> GraphQlRequest {
        let header = if self.variables.is_empty() {
            "query".to_string()
        } else {
            format!(
                "query({})",
                self.variables
                    .keys()
                    .map(|name| format!("${}: {}", name, VARIABLE_TYPE))
                    .join(", ")
            )
        };

        let mut arguments = vec![format!("where: {}", render_predicate(&self.predicate))];
        if let Some(order) = &self.order_by {
            arguments.push(format!("order_by: {}", render_order(order)));
        }

        let fields = FLOW_FIELDS
            .iter()
            .map(|field| format!("    {}", field))
            .join("\n");
        let query = format!(
            "{} {{\n  flow({}) {{\n{}\n  }}\n}}",
            header,
            arguments.join(", "),
            fields
        );

        GraphQlRequest {
            query,
            variables: self.variables.clone(),
        }
    }
}

/// Renders a predicate in the backend's `where` argument syntax.
pub fn render_predicate(predicate: &Predicate) -> String {
    format!(
        "{{{}}}",
        entries(predicate)
            .into_iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .join(", ")
    )
}

pub fn render_order(order: &OrderBy) -> String {
    format!("{{{}: {}}}", order.field, order.direction)
}

fn entries(predicate: &Predicate) -> Vec<(String, String)> {
    match predicate {
        Predicate::Eq { field, value } => {
            let rendered = match value {
                Operand::Literal(v) => render_literal(v),
                Operand::Variable(name) => format!("${}", name),
            };
            vec![(field.clone(), format!("{{_eq: {}}}", rendered))]
        }
        Predicate::IsNull { field, is_null } => {
            vec![(field.clone(), format!("{{_is_null: {}}}", is_null))]
        }
        Predicate::Related {
            relation,
            predicate,
        } => vec![(relation.clone(), render_predicate(predicate))],
        Predicate::And(terms) => {
            let merged: Vec<(String, String)> = terms.iter().flat_map(entries).collect();
            if merged.iter().map(|(key, _)| key).all_unique() {
                merged
            } else {
                // Repeated keys cannot share one object; fall back to an explicit conjunction.
                let parts = terms.iter().map(render_predicate).join(", ");
                vec![("_and".to_string(), format!("[{}]", parts))]
            }
        }
    }
}

/// Renders a JSON value as a GraphQL input literal (object keys unquoted).
fn render_literal(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("[{}]", items.iter().map(render_literal).join(", ")),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", k, render_literal(v)))
                .join(", ")
        ),
        // Null, booleans, numbers and strings share JSON's spelling.
        other => other.to_string(),
    }
}
