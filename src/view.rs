use crate::error::{ResponseError, ViewError};
use crate::graph::FlowGraph;
use crate::lookup::{self, Disambiguation};
use crate::query::{ProjectFilter, QueryDescription};
use crate::storage::StorageDescriptor;
use crate::transport::Transport;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// An immutable view of a flow as stored by the backend at the time of the lookup.
///
/// The deserialized [`FlowGraph`] can be explored, but it is not loaded from
/// storage, so nothing in it is runnable. Perform a new lookup to observe
/// later changes.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowView {
    id: String,
    name: String,
    project_name: Option<String>,
    archived: bool,
    settings: Map<String, Value>,
    run_config: Map<String, Value>,
    serialized_graph: Map<String, Value>,
    graph: FlowGraph,
    storage: StorageDescriptor,
    backend_version: String,
}

/// The raw shape of a flow record, as requested by the flow query.
///
/// Every requested field except `project` must be present; `required` fields
/// may still be `null`. An absent or `null` project means "no project".
#[derive(Deserialize)]
struct FlowRecord {
    id: String,
    name: String,
    #[serde(default)]
    project: Option<ProjectRecord>,
    archived: bool,
    #[serde(deserialize_with = "required")]
    settings: Option<Map<String, Value>>,
    #[serde(deserialize_with = "required")]
    run_config: Option<Map<String, Value>>,
    serialized_graph: Map<String, Value>,
    backend_version: String,
    storage: Value,
}

#[derive(Deserialize)]
struct ProjectRecord {
    #[serde(default)]
    name: Option<String>,
}

/// Decodes a nullable field without letting serde treat its absence as `null`.
fn required<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

impl FlowView {
    /// Builds a view from a single flow record, e.g. one returned by
    /// [`lookup::query_for_flows`].
    ///
    /// Decodes the serialized graph and the storage record; any failure is a
    /// [`ViewError::BadResponse`].
    pub fn from_flow_data(record: Value) -> Result<Self, ViewError> {
        let record: FlowRecord = serde_json::from_value(record)
            .map_err(|e| ResponseError::InvalidRecord(e.to_string()))?;
        if record.id.is_empty() {
            let message = "flow id is empty".to_string();
            return Err(ResponseError::InvalidRecord(message).into());
        }

        let graph =
            FlowGraph::from_serialized(&record.serialized_graph).map_err(ResponseError::from)?;
        let storage = StorageDescriptor::from_raw(&record.storage).map_err(ResponseError::from)?;

        Ok(Self {
            id: record.id,
            name: record.name,
            project_name: record.project.and_then(|p| p.name),
            archived: record.archived,
            settings: record.settings.unwrap_or_default(),
            run_config: record.run_config.unwrap_or_default(),
            serialized_graph: record.serialized_graph,
            graph,
            storage,
            backend_version: record.backend_version,
        })
    }

    /// Looks up a flow by its id.
    pub fn resolve_by_id<T: Transport + ?Sized>(
        transport: &T,
        flow_id: &str,
    ) -> Result<Self, ViewError> {
        let query = QueryDescription::by_id(flow_id)?;
        let record = lookup::query_for_flow(transport, &query, Disambiguation::RequireUnique)?;
        Self::from_flow_data(record)
    }

    /// Looks up the flow whose stored graph is structurally equal to `graph`.
    ///
    /// Archived flows are excluded unless `allow_archived` is set, since an
    /// archived copy of the same graph would otherwise make the match ambiguous.
    pub fn resolve_by_definition<T: Transport + ?Sized>(
        transport: &T,
        graph: &FlowGraph,
        allow_archived: bool,
    ) -> Result<Self, ViewError> {
        let query = QueryDescription::by_definition(graph, allow_archived)?;
        let record = lookup::query_for_flow(transport, &query, Disambiguation::RequireUnique)?;
        let view = Self::from_flow_data(record)?;
        if !allow_archived {
            view.ensure_unarchived()?;
        }
        Ok(view)
    }

    /// Looks up an unarchived flow by name.
    ///
    /// Flow names are only unique per project. If several flows match, the
    /// lookup fails unless `resolve_most_recent` is set, in which case the most
    /// recently updated flow is returned.
    pub fn resolve_by_name<T: Transport + ?Sized>(
        transport: &T,
        flow_name: &str,
        project: &ProjectFilter,
        resolve_most_recent: bool,
    ) -> Result<Self, ViewError> {
        let query = QueryDescription::by_name(flow_name, project);
        let policy = if resolve_most_recent {
            Disambiguation::MostRecent
        } else {
            Disambiguation::RequireUnique
        };
        let record = lookup::query_for_flow(transport, &query, policy)?;
        let view = Self::from_flow_data(record)?;
        view.ensure_unarchived()?;
        debug!(flow_id = %view.id, name = %view.name, "resolved flow by name");
        Ok(view)
    }

    fn ensure_unarchived(&self) -> Result<(), ViewError> {
        if self.archived {
            return Err(ResponseError::InvalidRecord(format!(
                "flow '{}' is archived, but the query excluded archived flows",
                self.id
            ))
            .into());
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning project's name; `None` if the flow belongs to no project.
    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn archived(&self) -> bool {
        self.archived
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    pub fn run_config(&self) -> &Map<String, Value> {
        &self.run_config
    }

    pub fn serialized_graph(&self) -> &Map<String, Value> {
        &self.serialized_graph
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn storage(&self) -> &StorageDescriptor {
        &self.storage
    }

    /// Version of the backend schema that produced the record.
    pub fn backend_version(&self) -> &str {
        &self.backend_version
    }
}

impl fmt::Display for FlowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FlowView(id={:?}, name={:?}, project_name={:?}, storage_type={})",
            self.id,
            self.name,
            self.project_name,
            self.storage.kind()
        )
    }
}
