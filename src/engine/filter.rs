//! Filter evaluation: single predicates and ordered chains (case A
//! vocabulary). Pure functions of (table, filter); no hidden state.

use crate::domain::{CellValue, ColumnKind, DeclaredType, FieldDecl, Filter, FilterOp, Table};
use crate::error::FilterError;
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Apply an ordered filter chain, each filter narrowing the output of the
/// previous one (intersection semantics). The empty chain is the identity.
///
/// Must stay a strict left-to-right fold: each filter depends on its
/// predecessor's output.
pub fn apply_chain(table: &Table, chain: &[Filter]) -> Result<Table, FilterError> {
    let mut current = table.clone();
    for filter in chain {
        current = apply_filter(&current, filter)?;
    }
    Ok(current)
}

/// Apply a single filter, returning the kept subset in row order.
pub fn apply_filter(table: &Table, filter: &Filter) -> Result<Table, FilterError> {
    let decl = *table
        .field(&filter.column)
        .ok_or_else(|| FilterError::UnknownColumn(filter.column.clone()))?;

    match filter.operation {
        FilterOp::In | FilterOp::Nin => apply_membership(table, filter, decl),
        FilterOp::Date => apply_date_range(table, filter, decl),
        FilterOp::Gt | FilterOp::Lt | FilterOp::Eq | FilterOp::Ne => {
            apply_comparison(table, filter, decl)
        }
    }
}

fn apply_membership(table: &Table, filter: &Filter, decl: FieldDecl) -> Result<Table, FilterError> {
    let negate = filter.operation == FilterOp::Nin;

    // Boolean columns with a single operand compare the parsed literal by
    // equality rather than list membership.
    if decl.declared == DeclaredType::Bool && filter.values.len() == 1 {
        let target = truthy(&filter.values[0]);
        return Ok(table.retain_rows(|_, row| {
            let hit = cell(row, &filter.column).as_bool() == Some(target);
            hit != negate
        }));
    }

    // The direction column matches case-insensitively on the full string.
    if decl.kind == ColumnKind::Direction {
        return Ok(table.retain_rows(|_, row| {
            let hit = cell(row, &filter.column)
                .as_str()
                .map(|s| {
                    filter
                        .values
                        .iter()
                        .any(|v| v.as_str().is_some_and(|op| op.eq_ignore_ascii_case(s)))
                })
                .unwrap_or(false);
            hit != negate
        }));
    }

    Ok(table.retain_rows(|_, row| {
        let hit = filter
            .values
            .iter()
            .any(|operand| cell_equals(cell(row, &filter.column), operand));
        hit != negate
    }))
}

fn apply_date_range(table: &Table, filter: &Filter, decl: FieldDecl) -> Result<Table, FilterError> {
    if decl.declared != DeclaredType::DateTime {
        return Err(unsupported(filter));
    }
    let (from, to) = match (filter.values.first(), filter.values.get(1)) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(FilterError::MissingOperand {
                op: filter.operation.to_string(),
                column: filter.column.clone(),
            })
        }
    };
    let from = operand_day(&filter.column, from)?;
    // `to` is end-of-day inclusive: the range is [from, to + 1 day).
    let to_exclusive = operand_day(&filter.column, to)? + Duration::days(1);

    Ok(table.retain_rows(|_, row| {
        cell(row, &filter.column)
            .as_datetime()
            .map(|t| t >= from && t < to_exclusive)
            .unwrap_or(false)
    }))
}

fn apply_comparison(table: &Table, filter: &Filter, decl: FieldDecl) -> Result<Table, FilterError> {
    let operand = filter
        .values
        .first()
        .ok_or_else(|| FilterError::MissingOperand {
            op: filter.operation.to_string(),
            column: filter.column.clone(),
        })?;
    let op = filter.operation;

    match decl.declared {
        DeclaredType::Float | DeclaredType::Int => {
            let target = operand_num(&filter.column, operand)?;
            Ok(table.retain_rows(|_, row| {
                compare(op, cell(row, &filter.column).as_f64(), target)
            }))
        }
        DeclaredType::DateTime => {
            let target = operand_day(&filter.column, operand)?;
            Ok(table.retain_rows(|_, row| {
                compare(op, cell(row, &filter.column).as_datetime(), target)
            }))
        }
        DeclaredType::Object => {
            let target = operand.to_string();
            Ok(table.retain_rows(|_, row| {
                compare(
                    op,
                    cell(row, &filter.column).as_str().map(str::to_string),
                    target.clone(),
                )
            }))
        }
        DeclaredType::Bool => {
            let target = truthy(operand);
            match op {
                FilterOp::Eq => Ok(table.retain_rows(|_, row| {
                    cell(row, &filter.column).as_bool() == Some(target)
                })),
                FilterOp::Ne => Ok(table.retain_rows(|_, row| {
                    cell(row, &filter.column).as_bool() != Some(target)
                })),
                _ => Err(unsupported(filter)),
            }
        }
    }
}

/// Comparison with null semantics inherited from the source system: a null
/// cell fails every comparison except `ne`, whose complement keeps it.
fn compare<T: PartialOrd + PartialEq>(op: FilterOp, cell: Option<T>, target: T) -> bool {
    match (op, cell) {
        (FilterOp::Ne, None) => true,
        (_, None) => false,
        (FilterOp::Gt, Some(v)) => v > target,
        (FilterOp::Lt, Some(v)) => v < target,
        (FilterOp::Eq, Some(v)) => v == target,
        (FilterOp::Ne, Some(v)) => v != target,
        _ => false,
    }
}

fn cell<'a>(row: &'a crate::domain::Row, column: &str) -> &'a CellValue {
    row.get(column).unwrap_or(&CellValue::Null)
}

/// Membership equality with numeric coercion for operands carried as text.
fn cell_equals(cell: &CellValue, operand: &CellValue) -> bool {
    match (cell, operand) {
        (CellValue::Num(a), CellValue::Num(b)) => a == b,
        (CellValue::Num(a), CellValue::Str(s)) => s.parse::<f64>().is_ok_and(|b| *a == b),
        (CellValue::Str(a), CellValue::Str(b)) => a == b,
        (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
        (CellValue::Bool(a), CellValue::Str(s)) => *a == (s == "true"),
        (CellValue::DateTime(a), CellValue::Str(s)) => {
            DateTime::parse_from_rfc3339(s).is_ok_and(|b| *a == b.with_timezone(&Utc))
        }
        _ => false,
    }
}

fn truthy(operand: &CellValue) -> bool {
    match operand {
        CellValue::Bool(b) => *b,
        CellValue::Str(s) => s == "true",
        _ => false,
    }
}

fn operand_num(column: &str, operand: &CellValue) -> Result<f64, FilterError> {
    operand
        .as_f64()
        .or_else(|| operand.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| FilterError::BadOperand {
            column: column.to_string(),
            value: operand.to_string(),
            reason: "expected a number".to_string(),
        })
}

/// Calendar-date operand (`MM/DD/YYYY`) resolved to UTC midnight.
fn operand_day(column: &str, operand: &CellValue) -> Result<DateTime<Utc>, FilterError> {
    let s = operand.as_str().ok_or_else(|| FilterError::BadOperand {
        column: column.to_string(),
        value: operand.to_string(),
        reason: "expected a MM/DD/YYYY date".to_string(),
    })?;
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| FilterError::BadOperand {
            column: column.to_string(),
            value: s.to_string(),
            reason: "expected a MM/DD/YYYY date".to_string(),
        })
}

fn unsupported(filter: &Filter) -> FilterError {
    let rendered: Vec<String> = filter.values.iter().map(|v| v.to_string()).collect();
    FilterError::Unsupported {
        op: filter.operation.to_string(),
        column: filter.column.clone(),
        value: rendered.join(", "),
    }
}
