//! Ledger (document) and version (setup) entities.

use crate::domain::filter::{Filter, OpenCondition};
use crate::domain::table::TableState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerId(pub String);

impl LedgerId {
    pub fn generate() -> LedgerId {
        LedgerId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LedgerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(pub String);

impl VersionId {
    pub fn generate() -> VersionId {
        VersionId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account metadata attached to a ledger. Carried as plain data; nothing in
/// the engine reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balance: f64,
    pub currency: String,
}

/// The authoritative trade record set for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub id: LedgerId,
    pub name: String,
    pub author: String,
    pub state: TableState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_condition: Option<OpenCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountInfo>,
    pub date_created: DateTime<Utc>,
}

impl Ledger {
    pub fn new(name: &str, author: &str, state: TableState) -> Ledger {
        Ledger {
            id: LedgerId::generate(),
            name: name.to_string(),
            author: author.to_string(),
            state,
            open_condition: None,
            account: None,
            date_created: Utc::now(),
        }
    }
}

/// A named, independently filterable view derived from a ledger.
///
/// `state` is the materialized result of replaying `filters` over the
/// parent's current rows; the journal re-materializes it synchronously after
/// every mutation that can affect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub name: String,
    pub ledger_id: LedgerId,
    pub default: bool,
    pub notes: String,
    pub filters: Vec<Filter>,
    pub state: TableState,
    pub date_created: DateTime<Utc>,
}

impl Version {
    pub fn new(name: &str, ledger_id: &LedgerId, default: bool, state: TableState) -> Version {
        Version {
            id: VersionId::generate(),
            name: name.to_string(),
            ledger_id: ledger_id.clone(),
            default,
            notes: String::new(),
            filters: Vec::new(),
            state,
            date_created: Utc::now(),
        }
    }
}
