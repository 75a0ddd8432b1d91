//! Version consistency and statistics engine for a trading-journal backend.
//!
//! Users upload trade ledgers and carve them into derived filtered views
//! ("versions"). This crate keeps every version consistent with its parent
//! ledger under mutation by replaying an ordered filter chain, and computes
//! performance statistics, calendar aggregates, open-position subsets, and
//! equity projections from the materialized row sets.
//!
//! Everything is synchronous and in-memory; routing, persistence, and
//! ingestion live in the surrounding service.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod journal;

pub use config::{ConfigError, JournalConfig};
pub use domain::{
    decode, encode, CellValue, ColumnKind, DeclaredType, FieldDecl, Filter, FilterOp, IdPolicy,
    Ledger, LedgerId, OpenCondition, OpenOp, ResultKind, Row, RowId, Table, TableState, Version,
    VersionId,
};
pub use engine::{
    apply_chain, apply_filter, compute_calendar_statistics, compute_column_statistics,
    compute_statistics, evaluate_open_positions, outcome_distribution, project_equity,
    resync_versions, CalendarStats, ColumnStatistics, EquityProjection, OutcomeDistribution,
    SyncMode, VersionSync,
};
pub use error::{FilterError, JournalError, LedgerError, StatsError, SyncError};
pub use journal::Journal;
