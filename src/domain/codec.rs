//! Codec between the persisted row-keyed state and the in-memory [`Table`].
//!
//! The persisted form is untyped JSON, so a column that is entirely null or
//! empty carries no trace of its type; decoding therefore reparses every
//! column declared as a date under the table's schema rather than sniffing
//! cell contents. Encoding is the exact inverse and is round-trip safe.

use crate::domain::column::{DeclaredType, FieldDecl, REQUIRED_COLUMNS};
use crate::domain::table::{Row, RowId, Table, TableState};
use crate::domain::value::CellValue;
use crate::error::LedgerError;
use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;

/// Row-id assignment on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Keep existing row ids (the normal case).
    Preserve,
    /// Assign fresh random ids, used when duplicating a ledger or version.
    Fresh,
}

/// Decode a persisted state into a typed table.
///
/// Fails with [`LedgerError`] if a row references an undeclared column or a
/// date cell does not parse; malformed rows are never silently dropped.
pub fn decode(state: &TableState) -> Result<Table, LedgerError> {
    let mut fields: IndexMap<String, FieldDecl> = IndexMap::with_capacity(state.fields.len() + 2);
    for (name, declared) in &state.fields {
        fields.insert(name.clone(), FieldDecl::new(name, DeclaredType::parse(declared)?));
    }
    for required in REQUIRED_COLUMNS {
        fields
            .entry(required.to_string())
            .or_insert_with(|| FieldDecl::new(required, DeclaredType::Object));
    }

    let mut rows: IndexMap<RowId, Row> = IndexMap::with_capacity(state.data.len());
    for (row_id, raw) in &state.data {
        let mut row = Row::with_capacity(raw.len() + 2);
        for (column, cell) in raw {
            let decl = fields
                .get(column)
                .ok_or_else(|| LedgerError::UndeclaredColumn {
                    row_id: row_id.clone(),
                    column: column.clone(),
                })?;
            let cell = if decl.declared == DeclaredType::DateTime {
                reparse_date(cell, row_id, column)?
            } else {
                cell.clone()
            };
            row.insert(column.clone(), cell);
        }
        for required in REQUIRED_COLUMNS {
            row.entry(required.to_string())
                .or_insert_with(|| CellValue::Str(String::new()));
        }
        rows.insert(RowId(row_id.clone()), row);
    }

    Ok(Table { fields, rows })
}

/// Encode a table back into its persisted shape.
pub fn encode(table: &Table, policy: IdPolicy) -> TableState {
    let fields = table
        .fields
        .iter()
        .map(|(name, decl)| (name.clone(), decl.declared.as_str().to_string()))
        .collect();
    let data = table
        .rows
        .iter()
        .map(|(id, row)| {
            let id = match policy {
                IdPolicy::Preserve => id.as_str().to_string(),
                IdPolicy::Fresh => RowId::generate().0,
            };
            let row = row
                .iter()
                .map(|(column, cell)| (column.clone(), flatten_cell(cell)))
                .collect();
            (id, row)
        })
        .collect();
    TableState { fields, data }
}

fn flatten_cell(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::DateTime(t) => CellValue::Str(t.to_rfc3339()),
        other => other.clone(),
    }
}

fn reparse_date(cell: &CellValue, row_id: &str, column: &str) -> Result<CellValue, LedgerError> {
    match cell {
        CellValue::Null => Ok(CellValue::Null),
        CellValue::Str(s) if s.is_empty() => Ok(CellValue::Null),
        CellValue::Str(s) => parse_timestamp(s)
            .map(CellValue::DateTime)
            .ok_or_else(|| LedgerError::BadDate {
                row_id: row_id.to_string(),
                column: column.to_string(),
                value: s.clone(),
            }),
        CellValue::DateTime(t) => Ok(CellValue::DateTime(*t)),
        other => Err(LedgerError::BadDate {
            row_id: row_id.to_string(),
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    // Fallback for states persisted without an offset.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> TableState {
        serde_json::from_value(json!({
            "fields": {
                "col_p": "object",
                "col_v_Profit": "float64",
                "col_d_Open Time": "datetime64[ns, UTC]"
            },
            "data": {
                "a1": {
                    "col_p": "EURUSD",
                    "col_v_Profit": 120.5,
                    "col_d_Open Time": "2024-05-01T10:30:00+00:00"
                },
                "b2": {
                    "col_p": "GBPUSD",
                    "col_v_Profit": null,
                    "col_d_Open Time": null
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_reparses_declared_dates() {
        let table = decode(&state()).unwrap();
        let cell = table.rows[&RowId::from("a1")]["col_d_Open Time"].clone();
        let t = cell.as_datetime().unwrap();
        assert_eq!(t.to_rfc3339(), "2024-05-01T10:30:00+00:00");
    }

    #[test]
    fn test_decode_defaults_required_columns() {
        let table = decode(&state()).unwrap();
        assert!(table.fields.contains_key("note"));
        assert!(table.fields.contains_key("imgs"));
        let row = &table.rows[&RowId::from("b2")];
        assert_eq!(row["note"], CellValue::Str(String::new()));
    }

    #[test]
    fn test_decode_rejects_undeclared_column() {
        let mut s = state();
        s.data
            .get_mut("a1")
            .unwrap()
            .insert("col_m_Ghost".to_string(), CellValue::Num(1.0));
        match decode(&s) {
            Err(LedgerError::UndeclaredColumn { row_id, column }) => {
                assert_eq!(row_id, "a1");
                assert_eq!(column, "col_m_Ghost");
            }
            other => panic!("expected UndeclaredColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_bad_date() {
        let mut s = state();
        s.data
            .get_mut("a1")
            .unwrap()
            .insert("col_d_Open Time".to_string(), CellValue::Str("yesterday".to_string()));
        assert!(matches!(decode(&s), Err(LedgerError::BadDate { .. })));
    }

    #[test]
    fn test_encode_round_trip_preserves_ids() {
        let s = state();
        let table = decode(&s).unwrap();
        let encoded = encode(&table, IdPolicy::Preserve);
        let reparsed = decode(&encoded).unwrap();
        assert_eq!(reparsed, table);
        assert_eq!(
            encoded.data.keys().collect::<Vec<_>>(),
            s.data.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_encode_fresh_assigns_new_ids() {
        let table = decode(&state()).unwrap();
        let encoded = encode(&table, IdPolicy::Fresh);
        assert_eq!(encoded.data.len(), 2);
        for id in encoded.data.keys() {
            assert!(!["a1", "b2"].contains(&id.as_str()));
        }
    }
}
