//! Structured log events emitted by a cycle.

mod common;

use common::*;
use idmigrate_core::core_types::schema::{FIELD_ERR_CODE, FIELD_ORGANIZATION_ID, FIELD_RECORD_COUNT};
use idmigrate_core::logging_facility::test_capture::init_test_capture;
use idmigrate_engine::run_migration_cycle;

#[tokio::test]
async fn test_cycle_emits_canonical_events_without_secrets() {
    let capture = init_test_capture();

    let log = event_log();
    let source = FakeSource::new(&log).with_users(1).with_organization("org_1", 1);
    let sink = MemorySink::new(&log);
    let runner = RecordingRunner::new(&log).failing_for("org_1");

    let mut config = test_config();
    config.cycle.halt_on_error = false;
    run_migration_cycle(&config, &source, &sink, &runner)
        .await
        .unwrap();

    capture.assert_event_exists("migration_cycle", "start");
    capture.assert_event_exists("migration_cycle", "end");
    capture.assert_event_exists("fetch_users", "end");
    capture.assert_event_exists("run_procedure", "start");

    let fetched = capture.find("fetch_memberships", "end");
    assert!(fetched
        .iter()
        .any(|e| e.field(FIELD_ORGANIZATION_ID) == Some("org_1")
            && e.field(FIELD_RECORD_COUNT) == Some("1")));

    let failures = capture.find("migrate_organization", "end_error");
    assert!(!failures.is_empty());
    assert_eq!(failures[0].field(FIELD_ERR_CODE), Some("ERR_PROCEDURE_FAILED"));

    for event in capture.events() {
        for value in event.fields.values() {
            assert!(
                !value.contains("sk_test_destination") && !value.contains("sk_test_source"),
                "secret leaked into log event {:?}",
                event
            );
        }
    }
}
