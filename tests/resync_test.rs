use serde_json::json;
use tradesharp::{
    CellValue, DeclaredType, FilterOp, Journal, JournalConfig, Row, RowId, SyncMode, TableState,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn seed_state() -> TableState {
    serde_json::from_value(json!({
        "fields": {
            "col_p": "object",
            "col_rr": "float64",
            "col_v_Profit": "float64"
        },
        "data": {
            "r1": {"col_p": "EURUSD", "col_rr": 2.0, "col_v_Profit": 100.0},
            "r2": {"col_p": "GBPUSD", "col_rr": 0.5, "col_v_Profit": -40.0},
            "r3": {"col_p": "EURUSD", "col_rr": 3.0, "col_v_Profit": 80.0}
        }
    }))
    .unwrap()
}

#[test]
fn row_edit_replays_unaffected_filters_against_new_data() {
    init_tracing();
    let mut journal = Journal::new(JournalConfig::default());
    let ledger_id = journal
        .create_ledger("acct", "user-1", seed_state())
        .unwrap();
    let version_id = journal.create_version(&ledger_id, "EUR only").unwrap();
    journal
        .add_filter(
            &version_id,
            "col_p",
            FilterOp::In,
            vec![CellValue::from("EURUSD")],
        )
        .unwrap();

    // Edit a row the filter does not reference a column of; the version must
    // reflect the ledger's new data with the filter applied, not the
    // pre-edit state.
    let mut row = Row::new();
    row.insert("col_p".to_string(), CellValue::from("EURUSD"));
    row.insert("col_rr".to_string(), CellValue::Num(2.0));
    row.insert("col_v_Profit".to_string(), CellValue::Num(250.0));
    journal
        .update_row(&ledger_id, &RowId::from("r1"), row)
        .unwrap();

    let version = journal.version(&version_id).unwrap();
    assert_eq!(version.state.data.len(), 2);
    assert_eq!(
        version.state.data["r1"]["col_v_Profit"],
        CellValue::Num(250.0)
    );
    assert!(!version.state.data.contains_key("r2"));
}

#[test]
fn deleting_a_filtered_column_drops_that_filter_everywhere() {
    init_tracing();
    let mut journal = Journal::new(JournalConfig::default());
    let ledger_id = journal
        .create_ledger("acct", "user-1", seed_state())
        .unwrap();

    let v1 = journal.create_version(&ledger_id, "rr and pair").unwrap();
    journal
        .add_filter(&v1, "col_rr", FilterOp::Gt, vec![CellValue::Num(1.0)])
        .unwrap();
    journal
        .add_filter(&v1, "col_p", FilterOp::In, vec![CellValue::from("EURUSD")])
        .unwrap();

    let v2 = journal.create_version(&ledger_id, "rr only").unwrap();
    journal
        .add_filter(&v2, "col_rr", FilterOp::Lt, vec![CellValue::Num(1.0)])
        .unwrap();

    journal.delete_column(&ledger_id, "col_rr").unwrap();

    let v1 = journal.version(&v1).unwrap();
    assert_eq!(v1.filters.len(), 1);
    assert_eq!(v1.filters[0].column, "col_p");
    // Remaining filter still applies: r1 and r3 are EURUSD.
    assert_eq!(v1.state.data.len(), 2);
    assert!(!v1.state.fields.contains_key("col_rr"));

    let v2 = journal.version(&v2).unwrap();
    assert!(v2.filters.is_empty());
    assert_eq!(v2.state.data.len(), 3);
}

#[test]
fn retype_clears_every_chain() {
    let mut journal = Journal::new(JournalConfig::default());
    let ledger_id = journal
        .create_ledger("acct", "user-1", seed_state())
        .unwrap();
    let version_id = journal.create_version(&ledger_id, "narrow").unwrap();
    journal
        .add_filter(
            &version_id,
            "col_p",
            FilterOp::In,
            vec![CellValue::from("EURUSD")],
        )
        .unwrap();

    journal
        .retype_column(&ledger_id, "col_rr", DeclaredType::Object)
        .unwrap();

    let version = journal.version(&version_id).unwrap();
    assert!(version.filters.is_empty());
    assert_eq!(version.state.data.len(), 3);
    assert_eq!(version.state.fields["col_rr"], "object");
}

#[test]
fn rejected_filter_leaves_version_untouched() {
    init_tracing();
    let mut journal = Journal::new(JournalConfig::default());
    let ledger_id = journal
        .create_ledger("acct", "user-1", seed_state())
        .unwrap();
    let version_id = journal.create_version(&ledger_id, "guarded").unwrap();
    let before = journal.version(&version_id).unwrap().state.clone();

    let err = journal.add_filter(
        &version_id,
        "col_rr",
        FilterOp::Gt,
        vec![CellValue::from("not a number")],
    );
    assert!(err.is_err());

    let version = journal.version(&version_id).unwrap();
    assert!(version.filters.is_empty());
    assert_eq!(version.state, before);
}

#[test]
fn manual_resync_reports_every_version() {
    let mut journal = Journal::new(JournalConfig::default());
    let ledger_id = journal
        .create_ledger("acct", "user-1", seed_state())
        .unwrap();
    let a = journal.create_version(&ledger_id, "a").unwrap();
    journal
        .add_filter(&a, "col_rr", FilterOp::Gt, vec![CellValue::Num(1.0)])
        .unwrap();
    journal.create_version(&ledger_id, "b").unwrap();

    let report = journal.resync(&ledger_id, SyncMode::DataOnly).unwrap();
    // Default version plus the two created above.
    assert_eq!(report.len(), 3);
    assert!(report.iter().all(|entry| entry.is_ok()));

    let a = journal.version(&a).unwrap();
    assert_eq!(a.state.data.len(), 2);
}
