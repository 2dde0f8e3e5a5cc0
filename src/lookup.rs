//! Query execution and the uniqueness policy applied to its results.

use crate::error::{ResponseError, ViewError};
use crate::query::{Predicate, QueryDescription};
use crate::transport::Transport;
use itertools::Itertools;
use serde_json::Value;
use tracing::{debug, warn};

/// What to do when a query matches more than one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disambiguation {
    /// More than one match is an error.
    #[default]
    RequireUnique,
    /// Take the first match; the query must order the most recently updated flow first.
    MostRecent,
}

/// Selects at most one record from `records` under `policy`.
///
/// Returns `Ok(None)` for an empty list. `filter` is only used to describe
/// the query in an [`ViewError::AmbiguousResult`].
pub fn disambiguate<'a>(
    records: &'a [Value],
    filter: &Predicate,
    policy: Disambiguation,
) -> Result<Option<&'a Value>, ViewError> {
    match (records, policy) {
        ([], _) => Ok(None),
        ([single], _) => Ok(Some(single)),
        (many, Disambiguation::RequireUnique) => Err(ViewError::AmbiguousResult {
            filter: filter.to_string(),
            count: many.len(),
        }),
        (many, Disambiguation::MostRecent) => {
            warn!(
                count = many.len(),
                filter = %filter,
                "multiple flows matched; using the most recently updated one"
            );
            Ok(many.first())
        }
    }
}

/// Runs `query` and returns every matching flow record.
///
/// An empty result is [`ViewError::NotFound`] when `error_on_empty` is set,
/// and an empty list otherwise.
pub fn query_for_flows<T: Transport + ?Sized>(
    transport: &T,
    query: &QueryDescription,
    error_on_empty: bool,
) -> Result<Vec<Value>, ViewError> {
    query.validate()?;
    debug!(filter = %query.predicate, variables = query.variables.len(), "querying for flows");

    let response = transport.execute(query).map_err(ViewError::Transport)?;
    let flows = extract_flows(response, &query.predicate)?;
    debug!(count = flows.len(), "flow query returned");

    if flows.is_empty() && error_on_empty {
        return Err(ViewError::NotFound {
            filter: query.predicate.to_string(),
        });
    }
    Ok(flows)
}

/// Runs `query` and returns exactly one flow record, applying `policy` when
/// several match.
pub fn query_for_flow<T: Transport + ?Sized>(
    transport: &T,
    query: &QueryDescription,
    policy: Disambiguation,
) -> Result<Value, ViewError> {
    if policy == Disambiguation::MostRecent && !query.orders_most_recent_first() {
        return Err(ViewError::InvalidInput(
            "Resolving the most recent flow requires newest-first ordering".to_string(),
        ));
    }

    let flows = query_for_flows(transport, query, true)?;
    disambiguate(&flows, &query.predicate, policy)?
        .cloned()
        .ok_or_else(|| ViewError::NotFound {
            filter: query.predicate.to_string(),
        })
}

fn extract_flows(mut response: Value, filter: &Predicate) -> Result<Vec<Value>, ResponseError> {
    if let Some(errors) = response
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
    {
        let messages = errors
            .iter()
            .map(|e| match e.get("message").and_then(Value::as_str) {
                Some(message) => message.to_string(),
                None => e.to_string(),
            })
            .join("; ");
        return Err(ResponseError::BackendErrors(messages));
    }

    match response.pointer_mut("/data/flow").map(Value::take) {
        Some(Value::Array(flows)) => Ok(flows),
        _ => Err(ResponseError::MissingData {
            filter: filter.to_string(),
        }),
    }
}
