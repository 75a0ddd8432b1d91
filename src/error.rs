use thiserror::Error;

/// Errors raised while decoding a persisted ledger state.
///
/// These are fatal for the surrounding operation: a row that references an
/// undeclared column or a date cell that fails to parse means the persisted
/// state and its schema have drifted apart, and nothing downstream can be
/// trusted.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("row `{row_id}` references column `{column}` which is not declared in fields")]
    UndeclaredColumn { row_id: String, column: String },
    #[error("row `{row_id}` column `{column}`: `{value}` is not a valid timestamp")]
    BadDate {
        row_id: String,
        column: String,
        value: String,
    },
    #[error("unknown declared type `{0}`")]
    UnknownDeclaredType(String),
}

/// Errors raised while evaluating a filter or an open-position condition.
///
/// Propagated to the immediate caller; during a resync they are isolated
/// per version so sibling versions still succeed.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("column `{0}` does not exist in this table")]
    UnknownColumn(String),
    #[error("operation `{op}` is not supported for column `{column}` (value `{value}`)")]
    Unsupported {
        op: String,
        column: String,
        value: String,
    },
    #[error("operation `{op}` on column `{column}` is missing an operand")]
    MissingOperand { op: String, column: String },
    #[error("could not parse operand `{value}` for column `{column}`: {reason}")]
    BadOperand {
        column: String,
        value: String,
        reason: String,
    },
}

/// A filter chain that failed to replay during a version resync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("filter `{name}` failed during resync: {source}")]
    Filter {
        name: String,
        #[source]
        source: FilterError,
    },
}

/// Errors raised by the statistics engine.
///
/// An empty calendar bucket is a structured "no data" outcome, not a crash;
/// the caller decides how to present it.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("no data available for the specified month and year")]
    EmptyBucket,
    #[error("column `{0}` does not exist in this version")]
    UnknownColumn(String),
    #[error("column `{0}` is not a date column")]
    NotADateColumn(String),
    #[error("column `{0}` is not a result column")]
    NotAResultColumn(String),
    #[error("no date or result columns found in this table")]
    NoUsableColumns,
}

/// Top-level error for journal store operations.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("ledger `{0}` not found")]
    LedgerNotFound(String),
    #[error("version `{0}` not found")]
    VersionNotFound(String),
    #[error("filter `{0}` not found")]
    FilterNotFound(String),
    #[error("row `{0}` not found")]
    RowNotFound(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Stats(#[from] StatsError),
}
