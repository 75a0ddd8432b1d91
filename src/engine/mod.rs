//! Pure computation engines for ledger-consistency and statistics logic.
//!
//! Everything here is a side-effect-free transform over [`Table`] snapshots:
//! filter evaluation, version resync, performance statistics, open-position
//! evaluation, and equity/distribution projections.
//!
//! [`Table`]: crate::domain::Table

pub mod filter;
pub mod open_positions;
pub mod projections;
pub mod stats;
pub mod sync;

pub use filter::{apply_chain, apply_filter};
pub use open_positions::evaluate_open_positions;
pub use projections::{
    outcome_distribution, project_equity, EquityProjection, OutcomeDistribution,
    TRADE_NUMBER_AXIS,
};
pub use stats::{
    compute_calendar_statistics, compute_column_statistics, compute_statistics,
    cumulative_results, net_results, weekday_distribution, CalendarStats, ColumnStatistics,
    MonthDeltas, MonthMetrics,
};
pub use sync::{resync_versions, SyncMode, VersionSync};
