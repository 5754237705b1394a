#![allow(clippy::unwrap_used, clippy::expect_used)]

use docstore_core::core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use docstore_core::errors::DocStoreError;
use docstore_core::logging_facility::test_capture::init_test_capture;
use docstore_core::{log_op_end, log_op_error, log_op_start};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, collection = "log_start_col");

    let events = capture.events_for_collection("log_start_col");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].op.as_deref(), Some(op_name));
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
}

#[test]
fn test_log_op_end_macro_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42u64);

    let events = capture.events();
    let end_events: Vec<_> = events
        .iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(
        end_events[0].fields.get("duration_ms"),
        Some(&"42".to_string())
    );
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = DocStoreError::DocumentNotFound {
        collection: "log_error_col".to_string(),
        key: "k".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10u64);

    let events = capture.events();
    let error_events: Vec<_> = events
        .iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();

    assert_eq!(error_events.len(), 1, "Should have exactly one error event");
    assert_eq!(
        error_events[0].fields.get("err_code"),
        Some(&"ERR_NOT_FOUND".to_string())
    );
}

#[test]
fn test_start_and_end_pair_for_one_operation() {
    let capture = init_test_capture();
    let op_name = "test_boundary_pair_unique_4";

    log_op_start!(op_name, collection = "pair_col", key = "k1");
    log_op_end!(op_name, duration_ms = 1u64, collection = "pair_col", key = "k1");

    let events = capture.events_for_collection("pair_col");
    let kinds: Vec<_> = events.iter().filter_map(|e| e.event.clone()).collect();
    assert_eq!(kinds, vec![EVENT_START.to_string(), EVENT_END.to_string()]);
    assert!(events.iter().all(|e| e.key.as_deref() == Some("k1")));
}
