//! Equity-curve simulation and outcome distribution, consumed by the
//! charting/report collaborators.

use crate::domain::{display_name, ColumnKind, ResultKind, Table};
use crate::engine::stats::round_to;
use crate::error::StatsError;
use indexmap::IndexMap;
use serde::Serialize;

/// X axis used by [`project_equity`]: trade order, or a date column.
pub const TRADE_NUMBER_AXIS: &str = "default";

/// Simulated equity curves, one per result column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityProjection {
    /// Equity points per result column (display label), `None` where the
    /// row's result is null; equity does not advance on a null.
    pub series: IndexMap<String, Vec<Option<f64>>>,
    /// Trade numbers, or the chosen date column's values.
    pub x_labels: Vec<String>,
    /// The date column actually used, or [`TRADE_NUMBER_AXIS`].
    pub active_metric: String,
}

/// Win/break-even/loss counts for one result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutcomeDistribution {
    pub wins: usize,
    #[serde(rename = "breakEvens")]
    pub break_evens: usize,
    pub losses: usize,
}

/// Simulate equity sequentially over each result column.
///
/// Rows run in table order, or sorted by `date_col` when one is requested
/// and valid (falling back to the first date column, then to trade order).
/// Value results add absolutely, percentage results compound, risk-multiple
/// results compound at 1% risk per unit.
pub fn project_equity(
    table: &Table,
    result_columns: &[String],
    date_col: Option<&str>,
    starting_balance: f64,
) -> Result<EquityProjection, StatsError> {
    if result_columns.is_empty() {
        return Err(StatsError::NoUsableColumns);
    }
    let kinds: Vec<ResultKind> = result_columns
        .iter()
        .map(|name| {
            table
                .field(name)
                .ok_or_else(|| StatsError::UnknownColumn(name.clone()))?
                .kind
                .result_kind()
                .ok_or_else(|| StatsError::NotAResultColumn(name.clone()))
        })
        .collect::<Result<_, _>>()?;

    let axis = resolve_date_axis(table, date_col);
    let ordered = match &axis {
        Some(column) => table.sorted_by(|row| row.get(column).and_then(|c| c.as_datetime())),
        None => table.clone(),
    };

    let mut series = IndexMap::new();
    for (name, kind) in result_columns.iter().zip(kinds) {
        let mut equity = starting_balance;
        let points = ordered
            .numeric_series(name)
            .into_iter()
            .map(|value| {
                value.map(|v| {
                    equity = step_equity(equity, v, kind);
                    round_to(equity, 3)
                })
            })
            .collect();
        series.insert(display_name(name), points);
    }

    let x_labels = match &axis {
        Some(column) => ordered
            .column_values(column)
            .map(|cell| cell.to_string())
            .collect(),
        None => (1..=ordered.len()).map(|n| n.to_string()).collect(),
    };

    Ok(EquityProjection {
        series,
        x_labels,
        active_metric: axis.unwrap_or_else(|| TRADE_NUMBER_AXIS.to_string()),
    })
}

fn step_equity(equity: f64, value: f64, kind: ResultKind) -> f64 {
    match kind {
        ResultKind::Value => equity + value,
        ResultKind::Percent => equity + equity * value,
        ResultKind::RiskMultiple => equity + equity * 0.01 * value,
    }
}

fn resolve_date_axis(table: &Table, requested: Option<&str>) -> Option<String> {
    match requested {
        Some(TRADE_NUMBER_AXIS) => None,
        Some(column)
            if table
                .field(column)
                .is_some_and(|decl| decl.kind == ColumnKind::Date) =>
        {
            Some(column.to_string())
        }
        _ => table.date_columns().first().map(|c| c.to_string()),
    }
}

/// Count wins, break-evens, and losses for one result column. Null results
/// count toward none of the three.
pub fn outcome_distribution(
    table: &Table,
    result_col: &str,
) -> Result<OutcomeDistribution, StatsError> {
    let decl = table
        .field(result_col)
        .ok_or_else(|| StatsError::UnknownColumn(result_col.to_string()))?;
    if !decl.kind.is_result() {
        return Err(StatsError::NotAResultColumn(result_col.to_string()));
    }
    let values: Vec<f64> = table
        .numeric_series(result_col)
        .into_iter()
        .flatten()
        .collect();
    Ok(OutcomeDistribution {
        wins: values.iter().filter(|v| **v > 0.0).count(),
        break_evens: values.iter().filter(|v| **v == 0.0).count(),
        losses: values.iter().filter(|v| **v < 0.0).count(),
    })
}
