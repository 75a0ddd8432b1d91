//! Open-position evaluation: a single ledger-level condition with its own
//! operation vocabulary (case B), applied to a version's materialized table.

use crate::domain::{CellValue, DeclaredType, OpenCondition, OpenOp, Row, Table};
use crate::error::FilterError;
use chrono::{DateTime, NaiveDate, Utc};

/// Return the rows the condition marks as still open.
///
/// A ledger with no condition configured yields an empty table, not an
/// error. An operation incompatible with the column's declared type, or an
/// unparseable operand, propagates as [`FilterError`] with the offending
/// operation, column, and value in the message.
pub fn evaluate_open_positions(
    table: &Table,
    condition: Option<&OpenCondition>,
) -> Result<Table, FilterError> {
    let Some(condition) = condition else {
        return Ok(table.empty_like());
    };

    let decl = *table
        .field(&condition.column)
        .ok_or_else(|| FilterError::UnknownColumn(condition.column.clone()))?;

    match condition.operation {
        OpenOp::Empty => Ok(table.retain_rows(|_, row| cell(row, &condition.column).is_empty())),
        OpenOp::NotEmpty => {
            Ok(table.retain_rows(|_, row| !cell(row, &condition.column).is_empty()))
        }
        OpenOp::Equal | OpenOp::NotEqual if decl.declared.is_numeric() => {
            let target = numeric_operand(condition)?;
            let keep_equal = condition.operation == OpenOp::Equal;
            Ok(table.retain_rows(|_, row| {
                let hit = cell(row, &condition.column).as_f64() == Some(target);
                hit == keep_equal
            }))
        }
        OpenOp::Equal | OpenOp::NotEqual if decl.declared == DeclaredType::Object => {
            let target = condition.value.to_string();
            let keep_equal = condition.operation == OpenOp::Equal;
            Ok(table.retain_rows(|_, row| {
                let hit = cell(row, &condition.column).as_str() == Some(target.as_str());
                hit == keep_equal
            }))
        }
        OpenOp::Higher | OpenOp::Lower if decl.declared.is_numeric() => {
            let target = numeric_operand(condition)?;
            let keep_higher = condition.operation == OpenOp::Higher;
            Ok(table.retain_rows(|_, row| {
                cell(row, &condition.column)
                    .as_f64()
                    .map(|v| if keep_higher { v > target } else { v < target })
                    .unwrap_or(false)
            }))
        }
        OpenOp::Before | OpenOp::After if decl.declared == DeclaredType::DateTime => {
            let target = date_operand(condition)?;
            let keep_before = condition.operation == OpenOp::Before;
            Ok(table.retain_rows(|_, row| {
                cell(row, &condition.column)
                    .as_datetime()
                    .map(|t| if keep_before { t < target } else { t > target })
                    .unwrap_or(false)
            }))
        }
        _ => {
            let err = FilterError::Unsupported {
                op: condition.operation.to_string(),
                column: condition.column.clone(),
                value: condition.value.to_string(),
            };
            tracing::warn!(error = %err, "open-position condition rejected");
            Err(err)
        }
    }
}

fn cell<'a>(row: &'a Row, column: &str) -> &'a CellValue {
    row.get(column).unwrap_or(&CellValue::Null)
}

fn numeric_operand(condition: &OpenCondition) -> Result<f64, FilterError> {
    condition
        .value
        .as_f64()
        .or_else(|| condition.value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| FilterError::BadOperand {
            column: condition.column.clone(),
            value: condition.value.to_string(),
            reason: "expected a number".to_string(),
        })
}

fn date_operand(condition: &OpenCondition) -> Result<DateTime<Utc>, FilterError> {
    let s = condition
        .value
        .as_str()
        .ok_or_else(|| FilterError::BadOperand {
            column: condition.column.clone(),
            value: condition.value.to_string(),
            reason: "expected a MM/DD/YYYY date".to_string(),
        })?;
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| FilterError::BadOperand {
            column: condition.column.clone(),
            value: s.to_string(),
            reason: "expected a MM/DD/YYYY date".to_string(),
        })
}
