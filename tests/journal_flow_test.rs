//! End-to-end walk through the journal API: ingest a ledger, carve a
//! version, mutate rows and columns, and read every derived view.

use serde_json::json;
use tradesharp::{
    CellValue, DeclaredType, FilterOp, Journal, JournalConfig, OpenCondition, OpenOp, Row, RowId,
    TableState,
};

fn seed_state() -> TableState {
    serde_json::from_value(json!({
        "fields": {
            "col_p": "object",
            "col_d": "object",
            "col_c": "float64",
            "col_d_Open Time": "datetime64[ns, UTC]",
            "col_v_Profit": "float64"
        },
        "data": {
            "t1": {"col_p": "EURUSD", "col_d": "Long", "col_c": 1.085,
                   "col_d_Open Time": "2024-05-02T10:00:00Z", "col_v_Profit": 100.0},
            "t2": {"col_p": "GBPUSD", "col_d": "Short", "col_c": 1.27,
                   "col_d_Open Time": "2024-05-10T14:00:00Z", "col_v_Profit": -40.0},
            "t3": {"col_p": "EURUSD", "col_d": "Short", "col_c": null,
                   "col_d_Open Time": "2024-05-20T09:00:00Z", "col_v_Profit": null}
        }
    }))
    .unwrap()
}

#[test]
fn full_lifecycle() {
    let mut journal = Journal::new(JournalConfig::default());
    let ledger_id = journal
        .create_ledger("demo account", "user-1", seed_state())
        .unwrap();

    // Ingestion normalizes: required columns exist on every row.
    let ledger = journal.ledger(&ledger_id).unwrap();
    assert!(ledger.state.fields.contains_key("note"));
    assert!(ledger.state.fields.contains_key("imgs"));
    assert_eq!(ledger.state.data["t1"]["note"], CellValue::Str(String::new()));

    // Carve a EURUSD-only version.
    let version_id = journal.create_version(&ledger_id, "Majors").unwrap();
    let filter_id = journal
        .add_filter(
            &version_id,
            "col_p",
            FilterOp::In,
            vec![CellValue::from("EURUSD")],
        )
        .unwrap();
    assert_eq!(journal.version(&version_id).unwrap().state.data.len(), 2);

    // A ledger row edit flows through to the version.
    let mut row = journal.ledger(&ledger_id).unwrap().state.data["t3"].clone();
    row.insert("col_v_Profit".to_string(), CellValue::Num(60.0));
    journal.update_row(&ledger_id, &RowId::from("t3"), row).unwrap();

    let stats = journal.statistics(&version_id).unwrap();
    let profit = &stats["col_v_Profit"];
    assert_eq!(profit.count, 2);
    assert_eq!(profit.total, 160.0);
    assert_eq!(profit.wins, 2);

    // Removing the filter re-derives the full ledger view.
    journal.remove_filter(&version_id, &filter_id).unwrap();
    assert_eq!(journal.version(&version_id).unwrap().state.data.len(), 3);

    // Open positions: a null close price marks a trade still running.
    journal
        .set_open_condition(
            &ledger_id,
            Some(OpenCondition {
                column: "col_c".to_string(),
                operation: OpenOp::Empty,
                value: CellValue::Null,
            }),
        )
        .unwrap();
    let open = journal.open_positions(&version_id).unwrap();
    assert_eq!(open.data.len(), 1);
    assert!(open.data.contains_key("t3"));

    // Equity projection over the date axis.
    let projection = journal
        .equity_projection(&version_id, Some("col_d_Open Time"))
        .unwrap();
    assert_eq!(projection.active_metric, "col_d_Open Time");
    assert_eq!(
        projection.series["Profit"],
        vec![Some(10_100.0), Some(10_060.0), Some(10_120.0)]
    );

    // Schema mutations.
    journal
        .add_column(&ledger_id, "col_m_Session", DeclaredType::Object)
        .unwrap();
    assert!(journal
        .version(&version_id)
        .unwrap()
        .state
        .fields
        .contains_key("col_m_Session"));

    let distribution = journal
        .outcome_distribution(&version_id, "col_v_Profit")
        .unwrap();
    assert_eq!(distribution.wins, 2);
    assert_eq!(distribution.losses, 1);

    let weekdays = journal.weekday_distribution(&version_id).unwrap();
    // 05/02 Thu, 05/10 Fri, 05/20 Mon.
    assert_eq!(weekdays["Profit"]["Thursday"], Some(100.0));
    assert_eq!(weekdays["Profit"]["Friday"], Some(-40.0));
    assert_eq!(weekdays["Profit"]["Monday"], Some(60.0));
    assert_eq!(weekdays["Profit"]["Tuesday"], Some(0.0));

    let cumulative = journal.cumulative_results(&version_id).unwrap();
    assert_eq!(
        cumulative["col_v_Profit"],
        vec![Some(100.0), Some(60.0), Some(120.0)]
    );

    // New rows arrive blank and show up everywhere.
    let new_row = journal.add_row(&ledger_id).unwrap();
    assert!(journal
        .version(&version_id)
        .unwrap()
        .state
        .data
        .contains_key(new_row.as_str()));

    journal.delete_row(&ledger_id, &new_row).unwrap();
    journal.delete_ledger(&ledger_id).unwrap();
    assert!(journal.version(&version_id).is_err());
}
