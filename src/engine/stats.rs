//! Performance statistics over materialized version tables.
//!
//! Per-column aggregates, month-bucketed calendar statistics with timezone
//! adjustment, weekday distribution, and raw/cumulative result series.
//!
//! Percentage-kind result columns store fractions (0.01 = 1%). They are
//! scaled x100 exactly once, at the calendar-statistics boundary via
//! [`scale_result`]; the per-column aggregates operate on raw stored values.

use crate::domain::{display_name, ColumnKind, ResultKind, Table};
use crate::error::StatsError;
use chrono::{Datelike, Duration, Weekday};
use indexmap::IndexMap;
use serde::Serialize;

/// Round half away from zero to `dp` decimal places.
pub(crate) fn round_to(v: f64, dp: u32) -> f64 {
    let factor = 10f64.powi(dp as i32);
    (v * factor).round() / factor
}

/// Percentage change of `current` against `previous`, 0 when there is no
/// previous value to compare against.
pub(crate) fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous != 0.0 {
        round_to(100.0 * (current - previous) / previous.abs(), 2)
    } else {
        0.0
    }
}

/// Scale a stored result value for display/statistics that use percentage
/// semantics. The single place the x100 rule lives.
pub(crate) fn scale_result(value: f64, kind: ResultKind) -> f64 {
    match kind {
        ResultKind::Percent => value * 100.0,
        _ => value,
    }
}

/// Aggregate record for one result column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub count: usize,
    pub total: f64,
    pub mean: Option<f64>,
    pub wins: usize,
    pub losses: usize,
    #[serde(rename = "breakEven")]
    pub break_even: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub expectancy: f64,
    pub max_consec_loss: usize,
    pub max_win: Option<f64>,
    pub profit_factor: f64,
    pub drawdown: Option<f64>,
}

/// Compute [`ColumnStatistics`] for every result column of the table.
pub fn compute_statistics(table: &Table) -> IndexMap<String, ColumnStatistics> {
    table
        .result_columns()
        .into_iter()
        .map(|(name, _)| {
            let series = table.numeric_series(name);
            (name.to_string(), compute_column_statistics(&series))
        })
        .collect()
}

/// Aggregate one numeric series in row order. Nulls count toward nothing and
/// do not break a consecutive-loss run.
pub fn compute_column_statistics(series: &[Option<f64>]) -> ColumnStatistics {
    let values: Vec<f64> = series.iter().flatten().copied().collect();
    let count = values.len();

    let wins = values.iter().filter(|v| **v > 0.0).count();
    let losses = values.iter().filter(|v| **v < 0.0).count();
    let break_even = values.iter().filter(|v| **v == 0.0).count();

    let sum: f64 = values.iter().sum();
    let sum_wins: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let sum_losses: f64 = values.iter().filter(|v| **v < 0.0).sum();

    let mean = (count > 0).then(|| round_to(sum / count as f64, 3));
    let avg_win = if wins > 0 {
        round_to(sum_wins / wins as f64, 3)
    } else {
        0.0
    };
    let avg_loss = if losses > 0 {
        round_to(sum_losses / losses as f64, 3)
    } else {
        0.0
    };

    let win_rate = if count > 0 {
        round_to(wins as f64 / count as f64 * 100.0, 4)
    } else {
        0.0
    };
    let expectancy = round_to(
        (win_rate / 100.0) * avg_win - (1.0 - win_rate / 100.0) * avg_loss.abs(),
        2,
    );

    let profit_factor = if sum_losses == 0.0 {
        round_to(sum_wins, 2)
    } else {
        round_to(sum_wins / sum_losses.abs(), 2)
    };

    let max_win = values
        .iter()
        .copied()
        .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |m| m.max(v))))
        .map(|m| round_to(m, 2));

    ColumnStatistics {
        count,
        total: round_to(sum, 3),
        mean,
        wins,
        losses,
        break_even,
        win_rate,
        avg_win,
        avg_loss,
        expectancy,
        max_consec_loss: max_consecutive_losses(&values),
        max_win,
        profit_factor,
        drawdown: max_drawdown(&values),
    }
}

/// Longest run of strictly negative values.
fn max_consecutive_losses(values: &[f64]) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for v in values {
        if *v < 0.0 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

/// Most negative distance between the running cumulative sum and its
/// peak-to-date. `None` when the series holds no values.
fn max_drawdown(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut cumsum = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst = f64::INFINITY;
    for v in values {
        cumsum += v;
        peak = peak.max(cumsum);
        worst = worst.min(cumsum - peak);
    }
    Some(round_to(worst, 3))
}

/// One month's bucket of calendar metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthMetrics {
    pub total_trades: usize,
    pub net_pnl: f64,
    pub average_profit: Option<f64>,
    pub max_win: Option<f64>,
    pub max_loss: f64,
    pub wins: usize,
    pub losses: usize,
    #[serde(rename = "breakEvens")]
    pub break_evens: usize,
    pub profit_factor: f64,
}

/// Month-over-month percentage change for each calendar metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthDeltas {
    pub total_trades: f64,
    pub net_pnl: f64,
    pub average_profit: f64,
    pub max_win: f64,
    pub max_loss: f64,
    pub wins: f64,
    pub losses: f64,
    #[serde(rename = "breakEvens")]
    pub break_evens: f64,
    pub profit_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarStats {
    pub current: MonthMetrics,
    pub previous: MonthDeltas,
}

/// Calendar statistics for the (month, year) bucket of `date_col`, with the
/// timezone offset (minutes) subtracted from each timestamp before
/// bucketing. Fails with a structured error when the target bucket is empty
/// or a requested column is missing.
pub fn compute_calendar_statistics(
    table: &Table,
    date_col: &str,
    metric_col: &str,
    month: u32,
    year: i32,
    tz_offset_minutes: i64,
) -> Result<CalendarStats, StatsError> {
    let date_decl = table
        .field(date_col)
        .ok_or_else(|| StatsError::UnknownColumn(date_col.to_string()))?;
    if date_decl.kind != ColumnKind::Date {
        return Err(StatsError::NotADateColumn(date_col.to_string()));
    }
    let metric_decl = table
        .field(metric_col)
        .ok_or_else(|| StatsError::UnknownColumn(metric_col.to_string()))?;
    let result_kind = metric_decl
        .kind
        .result_kind()
        .ok_or_else(|| StatsError::NotAResultColumn(metric_col.to_string()))?;

    let offset = Duration::minutes(tz_offset_minutes);
    let mut current = Vec::new();
    let mut previous = Vec::new();

    let (prev_month, prev_year) = if month > 1 {
        (month - 1, year)
    } else {
        (12, year - 1)
    };

    for row in table.rows.values() {
        let Some(t) = row.get(date_col).and_then(|c| c.as_datetime()) else {
            continue;
        };
        let adjusted = t - offset;
        let value = row
            .get(metric_col)
            .and_then(|c| c.as_f64())
            .map(|v| scale_result(v, result_kind));
        if adjusted.month() == month && adjusted.year() == year {
            current.push(value);
        } else if adjusted.month() == prev_month && adjusted.year() == prev_year {
            previous.push(value);
        }
    }

    if current.is_empty() {
        return Err(StatsError::EmptyBucket);
    }

    let decimals = if result_kind == ResultKind::Percent { 4 } else { 2 };
    let current = month_metrics(&current, decimals);
    let deltas = match previous.is_empty() {
        true => current.deltas_from(None),
        false => current.deltas_from(Some(&month_metrics(&previous, decimals))),
    };

    Ok(CalendarStats {
        current,
        previous: deltas,
    })
}

fn month_metrics(series: &[Option<f64>], decimals: u32) -> MonthMetrics {
    let values: Vec<f64> = series.iter().flatten().copied().collect();

    let wins = values.iter().filter(|v| **v > 0.0).count();
    let losses = values.iter().filter(|v| **v < 0.0).count();
    let break_evens = values.iter().filter(|v| **v == 0.0).count();
    let sum_wins: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let sum_losses: f64 = values.iter().filter(|v| **v < 0.0).sum();

    let max_win = values
        .iter()
        .copied()
        .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |m| m.max(v))))
        .map(|m| round_to(m, decimals));
    let max_loss = values
        .iter()
        .copied()
        .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |m| m.min(v))))
        .map_or(0.0, |m| round_to(m, decimals));

    let profit_factor = if sum_losses == 0.0 {
        round_to(sum_wins, 2)
    } else {
        round_to(sum_wins / sum_losses.abs(), 2)
    };

    MonthMetrics {
        total_trades: series.len(),
        net_pnl: round_to(values.iter().sum(), 2),
        average_profit: (!values.is_empty())
            .then(|| round_to(values.iter().sum::<f64>() / values.len() as f64, decimals)),
        max_win,
        max_loss,
        wins,
        losses,
        break_evens,
        profit_factor,
    }
}

impl MonthMetrics {
    fn deltas_from(&self, previous: Option<&MonthMetrics>) -> MonthDeltas {
        let prev = |f: fn(&MonthMetrics) -> f64| previous.map(f).unwrap_or(0.0);
        MonthDeltas {
            total_trades: percentage_change(
                self.total_trades as f64,
                prev(|m| m.total_trades as f64),
            ),
            net_pnl: percentage_change(self.net_pnl, prev(|m| m.net_pnl)),
            average_profit: percentage_change(
                self.average_profit.unwrap_or(0.0),
                prev(|m| m.average_profit.unwrap_or(0.0)),
            ),
            max_win: percentage_change(
                self.max_win.unwrap_or(0.0),
                prev(|m| m.max_win.unwrap_or(0.0)),
            ),
            max_loss: percentage_change(self.max_loss, prev(|m| m.max_loss)),
            wins: percentage_change(self.wins as f64, prev(|m| m.wins as f64)),
            losses: percentage_change(self.losses as f64, prev(|m| m.losses as f64)),
            break_evens: percentage_change(self.break_evens as f64, prev(|m| m.break_evens as f64)),
            profit_factor: percentage_change(self.profit_factor, prev(|m| m.profit_factor)),
        }
    }
}

/// Mean of each result column grouped by weekday of the first date column.
///
/// `Some(0.0)` for a weekday with no trades, `None` for a weekday whose
/// trades all have null results. Keyed by display name.
pub fn weekday_distribution(
    table: &Table,
) -> Result<IndexMap<String, IndexMap<&'static str, Option<f64>>>, StatsError> {
    const WEEKDAYS: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];

    let date_col = table
        .date_columns()
        .first()
        .copied()
        .ok_or(StatsError::NoUsableColumns)?
        .to_string();
    let result_columns = table.result_columns();
    if result_columns.is_empty() {
        return Err(StatsError::NoUsableColumns);
    }

    let mut response = IndexMap::new();
    for (column, _) in result_columns {
        // (non-null sum, non-null count, row count) per weekday.
        let mut buckets: IndexMap<&'static str, (f64, usize, usize)> =
            WEEKDAYS.iter().map(|d| (*d, (0.0, 0, 0))).collect();
        for row in table.rows.values() {
            let Some(t) = row.get(&date_col).and_then(|c| c.as_datetime()) else {
                continue;
            };
            if let Some(bucket) = buckets.get_mut(weekday_name(t.weekday())) {
                bucket.2 += 1;
                if let Some(v) = row.get(column).and_then(|c| c.as_f64()) {
                    bucket.0 += v;
                    bucket.1 += 1;
                }
            }
        }
        let means = buckets
            .into_iter()
            .map(|(day, (sum, non_null, rows))| {
                let mean = if rows == 0 {
                    Some(0.0)
                } else if non_null == 0 {
                    None
                } else {
                    Some(round_to(sum / non_null as f64, 3))
                };
                (day, mean)
            })
            .collect();
        response.insert(display_name(column), means);
    }
    Ok(response)
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Raw per-row result series, nulls preserved as `None` points.
pub fn net_results(table: &Table) -> Result<IndexMap<String, Vec<Option<f64>>>, StatsError> {
    let result_columns = table.result_columns();
    if result_columns.is_empty() {
        return Err(StatsError::NoUsableColumns);
    }
    Ok(result_columns
        .into_iter()
        .map(|(name, _)| (name.to_string(), table.numeric_series(name)))
        .collect())
}

/// Running cumulative result series; a null row contributes a `None` point
/// without advancing the accumulator.
pub fn cumulative_results(table: &Table) -> Result<IndexMap<String, Vec<Option<f64>>>, StatsError> {
    let raw = net_results(table)?;
    Ok(raw
        .into_iter()
        .map(|(name, series)| {
            let mut acc = 0.0;
            let cumulative = series
                .into_iter()
                .map(|point| {
                    point.map(|v| {
                        acc += v;
                        acc
                    })
                })
                .collect();
            (name, cumulative)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known_series() -> Vec<Option<f64>> {
        vec![
            Some(100.0),
            Some(-50.0),
            Some(200.0),
            Some(-150.0),
            None,
            Some(-20.0),
            Some(-30.0),
            Some(50.0),
        ]
    }

    #[test]
    fn test_known_vector() {
        let stats = compute_column_statistics(&known_series());
        assert_eq!(stats.count, 7);
        assert_eq!(stats.wins, 3);
        assert_eq!(stats.losses, 4);
        assert_eq!(stats.break_even, 0);
        assert_eq!(stats.win_rate, 42.8571);
        // The null between -150 and -20 does not break the run.
        assert_eq!(stats.max_consec_loss, 3);
        assert_eq!(stats.max_win, Some(200.0));
    }

    #[test]
    fn test_totals_and_averages() {
        let stats = compute_column_statistics(&known_series());
        assert_eq!(stats.total, 100.0);
        assert_eq!(stats.mean, Some(round_to(100.0 / 7.0, 3)));
        assert_eq!(stats.avg_win, round_to(350.0 / 3.0, 3));
        assert_eq!(stats.avg_loss, -62.5);
    }

    #[test]
    fn test_expectancy() {
        let stats = compute_column_statistics(&known_series());
        let p = 42.8571 / 100.0;
        let expected = round_to(p * round_to(350.0 / 3.0, 3) - (1.0 - p) * 62.5, 2);
        assert_eq!(stats.expectancy, expected);
    }

    #[test]
    fn test_profit_factor_zero_loss_guard() {
        let stats = compute_column_statistics(&[Some(10.0), Some(5.0), Some(0.0)]);
        assert_eq!(stats.profit_factor, 15.0);
        assert_eq!(stats.drawdown, Some(0.0));
    }

    #[test]
    fn test_drawdown() {
        // cumsum: 100, 50, 250, 100, 80, 50, 100; peak-relative min = -200.
        let stats = compute_column_statistics(&known_series());
        assert_eq!(stats.drawdown, Some(-200.0));
    }

    #[test]
    fn test_empty_series() {
        let stats = compute_column_statistics(&[None, None]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.max_win, None);
        assert_eq!(stats.drawdown, None);
        assert_eq!(stats.profit_factor, 0.0);
    }

    #[test]
    fn test_percentage_change() {
        assert_eq!(percentage_change(150.0, 100.0), 50.0);
        assert_eq!(percentage_change(50.0, -100.0), 150.0);
        assert_eq!(percentage_change(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_scale_result_only_touches_percent() {
        assert_eq!(scale_result(0.05, ResultKind::Percent), 5.0);
        assert_eq!(scale_result(0.05, ResultKind::Value), 0.05);
        assert_eq!(scale_result(0.05, ResultKind::RiskMultiple), 0.05);
    }
}
