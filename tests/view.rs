//! End-to-end tests for the three lookup entry points and record decoding.
mod common;
use common::*;
use flowview::prelude::*;
use serde_json::json;

fn backend() -> FakeBackend {
    FakeBackend::new(vec![
        create_flow_record("flow-1", "nightly-etl", Some("data"), false, "2024-01-01"),
        create_flow_record("flow-2", "nightly-etl", Some("ops"), false, "2024-03-01"),
        create_flow_record("flow-3", "nightly-etl", None, false, "2024-02-01"),
        create_flow_record("flow-4", "hourly-sync", Some("data"), true, "2024-04-01"),
    ])
}

#[test]
fn test_resolve_by_id_returns_matching_view() {
    let backend = backend();
    let view = FlowView::resolve_by_id(&backend, "flow-2").expect("flow exists");

    assert_eq!(view.id(), "flow-2");
    assert_eq!(view.name(), "nightly-etl");
    assert_eq!(view.project_name(), Some("ops"));
    assert!(!view.archived());
    assert_eq!(view.backend_version(), "0.15.4");
    assert_eq!(view.settings()["heartbeat_enabled"], json!(true));
    assert_eq!(view.run_config()["type"], json!("UniversalRun"));
    assert_eq!(view.graph(), &create_simple_graph());
    assert_eq!(view.storage().kind(), "Local");
    assert_eq!(
        view.storage().flow_location("nightly-etl"),
        Some("/srv/flows/nightly-etl.bin")
    );
}

#[test]
fn test_resolve_by_id_not_found() {
    let backend = backend();
    match FlowView::resolve_by_id(&backend, "flow-404") {
        Err(ViewError::NotFound { filter }) => assert!(filter.contains("flow-404")),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_resolve_by_id_invalid_input_skips_transport() {
    let backend = backend();
    assert!(matches!(
        FlowView::resolve_by_id(&backend, ""),
        Err(ViewError::InvalidInput(_))
    ));
    assert_eq!(backend.query_count(), 0);
}

#[test]
fn test_resolve_by_name_ambiguous_without_most_recent() {
    let backend = backend();
    match FlowView::resolve_by_name(&backend, "nightly-etl", &ProjectFilter::Any, false) {
        Err(ViewError::AmbiguousResult { count, filter }) => {
            assert_eq!(count, 3);
            assert!(filter.contains("nightly-etl"));
        }
        other => panic!("Expected AmbiguousResult, got {:?}", other),
    }
}

#[test]
fn test_resolve_by_name_most_recent_picks_latest_update() {
    let backend = backend();
    let view = FlowView::resolve_by_name(&backend, "nightly-etl", &ProjectFilter::Any, true)
        .expect("most recent flow resolves");
    assert_eq!(view.id(), "flow-2");
}

#[test]
fn test_resolve_by_name_with_project() {
    let backend = backend();

    let data = ProjectFilter::named("data");
    let in_data = FlowView::resolve_by_name(&backend, "nightly-etl", &data, false).unwrap();
    assert_eq!(in_data.id(), "flow-1");

    let none = ProjectFilter::Unassigned;
    let unassigned = FlowView::resolve_by_name(&backend, "nightly-etl", &none, false).unwrap();
    assert_eq!(unassigned.id(), "flow-3");
    assert_eq!(unassigned.project_name(), None);
}

#[test]
fn test_resolve_by_name_ignores_archived_flows() {
    let backend = backend();
    assert!(matches!(
        FlowView::resolve_by_name(&backend, "hourly-sync", &ProjectFilter::Any, true),
        Err(ViewError::NotFound { .. })
    ));
}

#[test]
fn test_resolve_by_definition_respects_archived_flag() {
    let mut graph = create_simple_graph();
    graph.name = "hourly-sync".to_string();
    let serialized = graph.to_serialized().unwrap();

    let mut record = create_flow_record("flow-9", "hourly-sync", None, true, "2024-05-01");
    record["serialized_graph"] = serde_json::Value::Object(serialized);
    let backend = FakeBackend::new(vec![record]);

    assert!(matches!(
        FlowView::resolve_by_definition(&backend, &graph, false),
        Err(ViewError::NotFound { .. })
    ));

    let view = FlowView::resolve_by_definition(&backend, &graph, true).unwrap();
    assert_eq!(view.id(), "flow-9");
    assert!(view.archived());
    assert_eq!(view.graph(), &graph);

    let last = backend.last_query();
    assert!(last.variables.contains_key("serialized_graph"));
}

#[test]
fn test_resolve_by_definition_rejects_archived_record_from_backend() {
    // A backend that ignores the archived filter must not leak an archived flow.
    let record = create_flow_record("flow-9", "nightly-etl", None, true, "2024-05-01");
    let transport = CannedTransport(json!({ "data": { "flow": [record] } }));

    match FlowView::resolve_by_definition(&transport, &create_simple_graph(), false) {
        Err(ViewError::BadResponse(ResponseError::InvalidRecord(message))) => {
            assert!(message.contains("archived"));
        }
        other => panic!("Expected BadResponse, got {:?}", other),
    }
}

#[test]
fn test_unknown_storage_type_is_bad_response() {
    let mut record = create_flow_record("flow-1", "nightly-etl", None, false, "2024-01-01");
    record["storage"] = json!({ "type": "FloppyDisk", "drive": "A:" });

    match FlowView::from_flow_data(record) {
        Err(ViewError::BadResponse(ResponseError::Storage(StorageError::UnknownKind(kind)))) => {
            assert_eq!(kind, "FloppyDisk");
        }
        other => panic!("Expected BadResponse(Storage), got {:?}", other),
    }
}

#[test]
fn test_broken_graph_is_bad_response() {
    let mut record = create_flow_record("flow-1", "nightly-etl", None, false, "2024-01-01");
    record["serialized_graph"]["edges"] = json!([{ "source": "extract", "target": "ghost" }]);

    match FlowView::from_flow_data(record) {
        Err(ViewError::BadResponse(ResponseError::Graph(err))) => {
            assert!(matches!(err, GraphError::NodeNotFound { .. }));
            assert!(err.to_string().starts_with("Node 'ghost' not found"));
        }
        other => panic!("Expected BadResponse(Graph), got {:?}", other),
    }
}

#[test]
fn test_missing_fields_are_bad_response() {
    let mut record = create_flow_record("flow-1", "nightly-etl", None, false, "2024-01-01");
    record.as_object_mut().unwrap().remove("backend_version");
    assert!(matches!(
        FlowView::from_flow_data(record),
        Err(ViewError::BadResponse(ResponseError::InvalidRecord(_)))
    ));

    let mut record = create_flow_record("", "nightly-etl", None, false, "2024-01-01");
    record["run_config"] = json!(null);
    assert!(matches!(
        FlowView::from_flow_data(record),
        Err(ViewError::BadResponse(ResponseError::InvalidRecord(_)))
    ));
}

#[test]
fn test_absent_nullable_fields_are_bad_response() {
    for field in ["settings", "run_config"] {
        let mut record = create_flow_record("flow-1", "nightly-etl", None, false, "2024-01-01");
        record.as_object_mut().unwrap().remove(field);
        match FlowView::from_flow_data(record) {
            Err(ViewError::BadResponse(ResponseError::InvalidRecord(message))) => {
                assert!(message.contains(field), "{}", message);
            }
            other => panic!("Expected BadResponse for {}, got {:?}", field, other),
        }
    }
}

#[test]
fn test_absent_project_means_no_project() {
    let mut record = create_flow_record("flow-1", "nightly-etl", Some("data"), false, "2024-01-01");
    record.as_object_mut().unwrap().remove("project");

    let view = FlowView::from_flow_data(record).unwrap();
    assert_eq!(view.project_name(), None);
}

#[test]
fn test_from_flow_data_normalizes_optional_fields() {
    let mut record = create_flow_record("flow-1", "nightly-etl", None, false, "2024-01-01");
    record["project"] = json!(null);
    record["settings"] = json!(null);
    record["run_config"] = json!(null);

    let view = FlowView::from_flow_data(record).unwrap();
    assert_eq!(view.project_name(), None);
    assert!(view.settings().is_empty());
    assert!(view.run_config().is_empty());
    assert_eq!(
        view.to_string(),
        r#"FlowView(id="flow-1", name="nightly-etl", project_name=None, storage_type=Local)"#
    );
}

#[test]
fn test_views_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FlowView>();

    let view = FlowView::resolve_by_id(&backend(), "flow-1").unwrap();
    let shared = std::sync::Arc::new(view);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let view = std::sync::Arc::clone(&shared);
            std::thread::spawn(move || view.graph().topological_order().unwrap().len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}
