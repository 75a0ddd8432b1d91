//! In-memory tabular representation of a ledger or version state.

use crate::domain::column::{ColumnKind, FieldDecl, ResultKind};
use crate::domain::value::CellValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Opaque stable row identifier.
///
/// Rows are keyed by id, never by position, so add/update/delete of one row
/// can never shift or collide with edits to unrelated rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(pub String);

impl RowId {
    pub fn generate() -> RowId {
        RowId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> RowId {
        RowId(s.to_string())
    }
}

/// One trade record: column name -> cell. Missing keys read as null.
pub type Row = IndexMap<String, CellValue>;

/// Persisted shape of a table, shared by ledgers and version states.
///
/// `fields` maps column name to its declared type string; `data` maps row id
/// to a row of plain JSON scalars. The codec converts between this and
/// [`Table`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableState {
    pub fields: IndexMap<String, String>,
    pub data: IndexMap<String, Row>,
}

/// Decoded, schema-resolved table. Insertion order of `rows` is row order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub fields: IndexMap<String, FieldDecl>,
    pub rows: IndexMap<RowId, Row>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Same schema, no rows.
    pub fn empty_like(&self) -> Table {
        Table {
            fields: self.fields.clone(),
            rows: IndexMap::new(),
        }
    }

    pub fn field(&self, column: &str) -> Option<&FieldDecl> {
        self.fields.get(column)
    }

    /// Cell for `column` in each row, in row order; missing keys yield null.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> {
        self.rows
            .values()
            .map(move |row| row.get(column).unwrap_or(&CellValue::Null))
    }

    /// Numeric series for `column` in row order, nulls preserved.
    pub fn numeric_series(&self, column: &str) -> Vec<Option<f64>> {
        self.column_values(column).map(CellValue::as_f64).collect()
    }

    /// Result columns in schema order, with their units.
    pub fn result_columns(&self) -> Vec<(&str, ResultKind)> {
        self.fields
            .iter()
            .filter_map(|(name, decl)| decl.kind.result_kind().map(|kind| (name.as_str(), kind)))
            .collect()
    }

    /// Date columns in schema order.
    pub fn date_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, decl)| decl.kind == ColumnKind::Date)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// New table keeping the rows for which `keep` returns true.
    pub fn retain_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&RowId, &Row) -> bool,
    {
        Table {
            fields: self.fields.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(id, row)| keep(id, row))
                .map(|(id, row)| (id.clone(), row.clone()))
                .collect(),
        }
    }

    /// New table with rows reordered by `key`, ascending; rows without a key
    /// sort after rows with one. The sort is stable.
    pub fn sorted_by<K, F>(&self, mut key: F) -> Table
    where
        K: Ord,
        F: FnMut(&Row) -> Option<K>,
    {
        let mut rows: Vec<(RowId, Row)> = self
            .rows
            .iter()
            .map(|(id, row)| (id.clone(), row.clone()))
            .collect();
        rows.sort_by(|(_, a), (_, b)| match (key(a), key(b)) {
            (Some(ka), Some(kb)) => ka.cmp(&kb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Table {
            fields: self.fields.clone(),
            rows: rows.into_iter().collect(),
        }
    }
}
