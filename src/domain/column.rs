//! Column naming convention and declared types.
//!
//! The persisted schema encodes column roles as a name convention
//! (`col_m_*`, `col_d_*`, `col_v_*`/`col_p_*`/`col_r_*` plus fixed
//! singletons). The codec resolves each name into a [`ColumnKind`] once at
//! decode time; nothing downstream re-derives roles from string prefixes.

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};

/// Names that must exist on every row, defaulted to empty when absent.
pub const REQUIRED_COLUMNS: [&str; 2] = ["note", "imgs"];

/// Unit of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    /// Absolute profit/loss value (`col_v_*`).
    Value,
    /// Fractional return, 0.01 = 1% (`col_p_*`).
    Percent,
    /// Multiple of risked amount (`col_r_*`).
    RiskMultiple,
}

/// Role of a column, resolved from the persisted name convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// User-defined scalar, numeric or categorical (`col_m_*`).
    Metric,
    /// Timezone-aware timestamp (`col_d_*`).
    Date,
    /// Trade outcome in one of three units.
    Result(ResultKind),
    /// Instrument symbol (`col_p`).
    Pair,
    /// Open price (`col_o`).
    OpenPrice,
    /// Close price (`col_c`).
    ClosePrice,
    /// Stop loss (`col_sl`).
    StopLoss,
    /// Take profit (`col_tp`).
    TakeProfit,
    /// Risk/reward ratio (`col_rr`).
    RiskReward,
    /// "Long"/"Short" (`col_d`).
    Direction,
    /// Chart timeframe (`col_t`).
    Timeframe,
    /// Broker ticket number (`#`).
    TradeNumber,
    /// Free-text note.
    Note,
    /// Image reference list.
    Images,
    /// Anything outside the convention; filterable, excluded from statistics.
    Other,
}

impl ColumnKind {
    pub fn resolve(name: &str) -> ColumnKind {
        match name {
            "col_p" => ColumnKind::Pair,
            "col_o" => ColumnKind::OpenPrice,
            "col_c" => ColumnKind::ClosePrice,
            "col_sl" => ColumnKind::StopLoss,
            "col_tp" => ColumnKind::TakeProfit,
            "col_rr" => ColumnKind::RiskReward,
            "col_d" => ColumnKind::Direction,
            "col_t" => ColumnKind::Timeframe,
            "#" => ColumnKind::TradeNumber,
            "note" => ColumnKind::Note,
            "imgs" => ColumnKind::Images,
            _ if name.starts_with("col_m_") => ColumnKind::Metric,
            _ if name.starts_with("col_d_") => ColumnKind::Date,
            _ if name.starts_with("col_v_") => ColumnKind::Result(ResultKind::Value),
            _ if name.starts_with("col_p_") => ColumnKind::Result(ResultKind::Percent),
            _ if name.starts_with("col_r_") => ColumnKind::Result(ResultKind::RiskMultiple),
            _ => ColumnKind::Other,
        }
    }

    pub fn is_result(&self) -> bool {
        matches!(self, ColumnKind::Result(_))
    }

    pub fn result_kind(&self) -> Option<ResultKind> {
        match self {
            ColumnKind::Result(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Human-readable name for a column, stripping the convention prefix.
pub fn display_name(name: &str) -> String {
    match ColumnKind::resolve(name) {
        ColumnKind::Metric | ColumnKind::Date | ColumnKind::Result(_) => name[6..].to_string(),
        ColumnKind::Pair => "Pair".to_string(),
        ColumnKind::OpenPrice => "Open".to_string(),
        ColumnKind::ClosePrice => "Close".to_string(),
        ColumnKind::StopLoss => "Stop Loss".to_string(),
        ColumnKind::TakeProfit => "Take Profit".to_string(),
        ColumnKind::RiskReward => "Risk Reward".to_string(),
        ColumnKind::Direction => "Direction".to_string(),
        ColumnKind::Timeframe => "Timeframe".to_string(),
        ColumnKind::TradeNumber => "Trade Number".to_string(),
        _ => name.to_string(),
    }
}

/// Declared storage type of a column, as persisted by the ingestion layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeclaredType {
    Object,
    Float,
    Int,
    Bool,
    DateTime,
}

impl DeclaredType {
    pub fn parse(s: &str) -> Result<DeclaredType, LedgerError> {
        match s {
            "object" | "string" => Ok(DeclaredType::Object),
            "float64" => Ok(DeclaredType::Float),
            "int64" => Ok(DeclaredType::Int),
            "bool" => Ok(DeclaredType::Bool),
            s if s.starts_with("datetime64") => Ok(DeclaredType::DateTime),
            other => Err(LedgerError::UnknownDeclaredType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclaredType::Object => "object",
            DeclaredType::Float => "float64",
            DeclaredType::Int => "int64",
            DeclaredType::Bool => "bool",
            DeclaredType::DateTime => "datetime64[ns, UTC]",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DeclaredType::Float | DeclaredType::Int)
    }
}

impl TryFrom<String> for DeclaredType {
    type Error = LedgerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DeclaredType::parse(&s)
    }
}

impl From<DeclaredType> for String {
    fn from(t: DeclaredType) -> String {
        t.as_str().to_string()
    }
}

/// Schema entry for one column: declared type plus resolved role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub declared: DeclaredType,
    pub kind: ColumnKind,
}

impl FieldDecl {
    pub fn new(name: &str, declared: DeclaredType) -> FieldDecl {
        FieldDecl {
            declared,
            kind: ColumnKind::resolve(name),
        }
    }
}
