//! Version resync: re-materialize every derived view after a ledger
//! mutation.
//!
//! Best effort across versions by contract: each version is processed
//! independently and one version's filter failure never aborts its siblings.

use crate::domain::{encode, IdPolicy, Table, Version, VersionId};
use crate::engine::filter::apply_filter;
use crate::error::SyncError;

/// What part of each version's state the resync replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Row-level ledger edit: replace `data`, keep `fields`.
    DataOnly,
    /// Ledger schema edit: replace both `data` and `fields`.
    WithFields,
    /// Structurally disruptive edit (e.g. column retype): drop every
    /// version's filter chain and materialize the full ledger state.
    ClearFilters,
}

/// Per-version outcome of one resync pass.
#[derive(Debug)]
pub struct VersionSync {
    pub version_id: VersionId,
    /// Names of filters dropped because their column left the schema.
    pub dropped_filters: Vec<String>,
    pub result: Result<(), SyncError>,
}

impl VersionSync {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Replay every version's filter chain against the ledger's current table.
///
/// Filters referencing a column that no longer exists are dropped from the
/// chain and reported, not raised: schema drift is an expected consequence
/// of ledger evolution. A version whose surviving chain still fails keeps
/// its previous state and is reported as failed.
pub fn resync_versions(
    ledger: &Table,
    versions: &mut [&mut Version],
    mode: SyncMode,
) -> Vec<VersionSync> {
    versions
        .iter_mut()
        .map(|version| resync_one(ledger, version, mode))
        .collect()
}

fn resync_one(ledger: &Table, version: &mut Version, mode: SyncMode) -> VersionSync {
    let mut dropped = Vec::new();

    if mode == SyncMode::ClearFilters {
        version.filters.clear();
    } else {
        version.filters.retain(|filter| {
            if ledger.fields.contains_key(&filter.column) {
                true
            } else {
                tracing::warn!(
                    version = %version.id,
                    filter = %filter.name,
                    column = %filter.column,
                    "dropping filter, its column left the ledger schema"
                );
                dropped.push(filter.name.clone());
                false
            }
        });
    }

    let mut filtered = ledger.clone();
    for filter in &version.filters {
        match apply_filter(&filtered, filter) {
            Ok(next) => filtered = next,
            Err(source) => {
                tracing::warn!(
                    version = %version.id,
                    filter = %filter.name,
                    error = %source,
                    "resync failed for version, state left untouched"
                );
                return VersionSync {
                    version_id: version.id.clone(),
                    dropped_filters: dropped,
                    result: Err(SyncError::Filter {
                        name: filter.name.clone(),
                        source,
                    }),
                };
            }
        }
    }

    let new_state = encode(&filtered, IdPolicy::Preserve);
    match mode {
        SyncMode::DataOnly => version.state.data = new_state.data,
        SyncMode::WithFields | SyncMode::ClearFilters => version.state = new_state,
    }

    VersionSync {
        version_id: version.id.clone(),
        dropped_filters: dropped,
        result: Ok(()),
    }
}
