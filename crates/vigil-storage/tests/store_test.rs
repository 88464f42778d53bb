//! ViolationStore end to end: file databases, dashboard, retention, schedules.

use rusqlite::Connection;
use vigil_core::types::{fingerprint, RuleScheduleEntry, Severity, Violation, ViolationSource};
use vigil_storage::connection::pragmas::verify_wal_mode;
use vigil_storage::migrations::{current_version, run_migrations, LATEST_VERSION};
use vigil_storage::queries::{history, rule_checks, violations};
use vigil_storage::retention::cleanup_old_data;
use vigil_storage::{CheckStatus, ViolationStatus, ViolationStore};

fn v(file: &str, line: u32, source: ViolationSource) -> Violation {
    Violation::new(file, line, format!("code {line}"), Severity::Warn, source)
}

#[test]
fn migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
    assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
}

#[test]
fn empty_database_dashboard_is_zeroed() {
    let store = ViolationStore::open_in_memory(100).unwrap();
    let data = store.get_dashboard_data(10).unwrap();
    assert_eq!(data.total_active, 0);
    assert_eq!(data.total_resolved, 0);
    assert_eq!(data.files_affected, 0);
    assert!(data.by_severity.is_empty());
    assert!(data.top_files.is_empty());
    assert!(data.recent_checks.is_empty());
    assert!(data.last_check.is_none());
}

#[test]
fn dashboard_reflects_a_clean_cycle() {
    let store = ViolationStore::open_in_memory(100).unwrap();
    let batch = vec![
        v("a.ts", 1, ViolationSource::TypeAnalyzer),
        v("a.ts", 2, ViolationSource::TypeAnalyzer),
        v("b.ts", 1, ViolationSource::LintAnalyzer),
    ];

    let check = store.begin_check("*", "*").unwrap();
    let outcome = store.store_violations(&batch).unwrap();
    store
        .record_violation_deltas(check, &outcome.fingerprints)
        .unwrap();
    store
        .complete_check(check, CheckStatus::Completed, 3, 42)
        .unwrap();

    let data = store.get_dashboard_data(10).unwrap();
    assert_eq!(data.total_active, 3);
    assert_eq!(data.files_affected, 2);
    assert_eq!(data.by_source["type-analyzer"], 2);
    assert_eq!(data.by_source["lint-analyzer"], 1);
    assert_eq!(data.by_severity["warn"], 3);
    assert_eq!(data.top_files[0].file, "a.ts");
    assert_eq!(data.top_files[0].count, 2);
    assert_eq!(data.recent_checks[0].added, 3);
    let last = data.last_check.unwrap();
    assert_eq!(last.id, check);
    assert_eq!(last.violations_found, 3);

    // Serializable for the display collaborator.
    let json = serde_json::to_value(store.get_dashboard_data(5).unwrap()).unwrap();
    assert_eq!(json["total_active"], 3);
}

#[test]
fn file_backed_store_persists_across_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("vigil.db");
    let record = v("a.ts", 7, ViolationSource::Custom);
    let fp = fingerprint(&record);

    {
        let store = ViolationStore::open(&path, 10).unwrap();
        store.store_violations(&[record]).unwrap();
        assert!(store.database().with_writer(verify_wal_mode).unwrap());
    }

    let store = ViolationStore::open(&path, 10).unwrap();
    let row = store.get_violation(&fp).unwrap().unwrap();
    assert_eq!(row.status, ViolationStatus::Active);
    assert_eq!(store.active_violations().unwrap().len(), 1);
}

#[test]
fn retention_never_purges_active_violations() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    let day = 86_400;

    let old_active = v("a.ts", 1, ViolationSource::Custom);
    let old_resolved = v("a.ts", 2, ViolationSource::Custom);
    let fresh_resolved = v("a.ts", 3, ViolationSource::Custom);
    violations::store_violations(
        &conn,
        &[old_active.clone(), old_resolved.clone(), fresh_resolved.clone()],
        100,
        0,
    )
    .unwrap();
    violations::resolve_violations(&conn, &[fingerprint(&old_resolved)], day).unwrap();
    violations::resolve_violations(&conn, &[fingerprint(&fresh_resolved)], 95 * day).unwrap();
    history::record_violation_deltas(&conn, 1, &[fingerprint(&old_active)], day).unwrap();
    history::record_violation_deltas(&conn, 2, &[fingerprint(&old_active)], 95 * day).unwrap();
    let old_check = rule_checks::insert_check_start(&conn, "*", "*", day).unwrap();
    rule_checks::update_check_complete(&conn, old_check, CheckStatus::Completed, day, 1, 10)
        .unwrap();

    let report = cleanup_old_data(&conn, 30, 100 * day).unwrap();
    assert_eq!(report.deleted_from("violations"), 1);
    assert_eq!(report.deleted_from("violation_history"), 1);
    assert_eq!(report.deleted_from("rule_checks"), 1);
    assert_eq!(report.total_deleted, 3);

    let active = violations::get_violation(&conn, &fingerprint(&old_active))
        .unwrap()
        .unwrap();
    assert_eq!(active.status, ViolationStatus::Active);
    assert!(violations::get_violation(&conn, &fingerprint(&fresh_resolved))
        .unwrap()
        .is_some());
}

#[test]
fn schedules_round_trip_and_update_in_place() {
    let store = ViolationStore::open_in_memory(100).unwrap();
    let mut a = RuleScheduleEntry::new("no-unused-vars", "eslint");
    let b = RuleScheduleEntry::new("prefer-const", "eslint");
    store.save_schedules(&[a.clone(), b.clone()]).unwrap();

    a.zero_streak = 4;
    a.last_checked_cycle = Some(9);
    store.save_schedules(&[a.clone()]).unwrap();

    let loaded = store.load_schedules("eslint").unwrap();
    assert_eq!(loaded, vec![a, b]);
    assert!(store.load_schedules("other").unwrap().is_empty());
}

#[test]
fn rule_check_log_records_per_rule_checks() {
    let store = ViolationStore::open_in_memory(100).unwrap();
    store.record_rule_check("prefer-const", "eslint", 2, 150).unwrap();
    store.record_rule_check("no-unused-vars", "eslint", 0, 90).unwrap();

    let rows = store.recent_rule_checks(10).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].rule_id, "no-unused-vars");
    assert_eq!(rows[0].status, CheckStatus::Completed);
    assert_eq!(rows[1].violations_found, 2);
}
