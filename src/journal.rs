//! In-memory journal store: ledgers, their versions, and the wiring that
//! keeps every version's materialized state consistent with its parent.
//!
//! Every ledger mutation is followed synchronously, in the same call, by a
//! resync of all dependent versions. There is no queue and no background
//! worker; after a mutating method returns, the versions it touched are
//! consistent with the ledger state at the start of the call.

use crate::config::JournalConfig;
use crate::domain::{
    decode, encode, CellValue, DeclaredType, Filter, FilterOp, IdPolicy, Ledger, LedgerId,
    OpenCondition, Row, RowId, Table, TableState, Version, VersionId,
};
use crate::engine::{
    apply_chain, compute_calendar_statistics, compute_statistics, cumulative_results,
    evaluate_open_positions, outcome_distribution, project_equity, resync_versions,
    weekday_distribution, CalendarStats, ColumnStatistics, EquityProjection,
    OutcomeDistribution, SyncMode, VersionSync,
};
use crate::error::JournalError;
use indexmap::IndexMap;

pub struct Journal {
    config: JournalConfig,
    ledgers: IndexMap<LedgerId, Ledger>,
    versions: IndexMap<VersionId, Version>,
}

impl Journal {
    pub fn new(config: JournalConfig) -> Journal {
        Journal {
            config,
            ledgers: IndexMap::new(),
            versions: IndexMap::new(),
        }
    }

    // ---- ledger lifecycle ------------------------------------------------

    /// Register a ledger produced by ingestion. Validates and normalizes the
    /// state (required columns, date reparse) and creates the default
    /// version with an empty chain and the ledger's initial state.
    pub fn create_ledger(
        &mut self,
        name: &str,
        author: &str,
        state: TableState,
    ) -> Result<LedgerId, JournalError> {
        let table = decode(&state)?;
        let state = encode(&table, IdPolicy::Preserve);

        let ledger = Ledger::new(name, author, state.clone());
        let id = ledger.id.clone();
        let default_version =
            Version::new(&self.config.default_version_name, &id, true, state);
        self.ledgers.insert(id.clone(), ledger);
        self.versions
            .insert(default_version.id.clone(), default_version);
        Ok(id)
    }

    /// Copy a ledger under a new name with freshly generated row ids.
    pub fn duplicate_ledger(
        &mut self,
        ledger_id: &LedgerId,
        name: &str,
    ) -> Result<LedgerId, JournalError> {
        let source = self.ledger(ledger_id)?;
        let author = source.author.clone();
        let table = decode(&source.state)?;
        let state = encode(&table, IdPolicy::Fresh);
        self.create_ledger(name, &author, state)
    }

    /// Delete a ledger and cascade to all of its versions.
    pub fn delete_ledger(&mut self, ledger_id: &LedgerId) -> Result<(), JournalError> {
        self.ledger(ledger_id)?;
        self.ledgers.shift_remove(ledger_id);
        self.versions.retain(|_, v| v.ledger_id != *ledger_id);
        Ok(())
    }

    pub fn ledger(&self, ledger_id: &LedgerId) -> Result<&Ledger, JournalError> {
        self.ledgers
            .get(ledger_id)
            .ok_or_else(|| JournalError::LedgerNotFound(ledger_id.to_string()))
    }

    pub fn set_open_condition(
        &mut self,
        ledger_id: &LedgerId,
        condition: Option<OpenCondition>,
    ) -> Result<(), JournalError> {
        self.ledger_mut(ledger_id)?.open_condition = condition;
        Ok(())
    }

    // ---- version lifecycle -----------------------------------------------

    /// Create a version by cloning the ledger's current state, with an empty
    /// filter chain.
    pub fn create_version(
        &mut self,
        ledger_id: &LedgerId,
        name: &str,
    ) -> Result<VersionId, JournalError> {
        let state = self.ledger(ledger_id)?.state.clone();
        let version = Version::new(name, ledger_id, false, state);
        let id = version.id.clone();
        self.versions.insert(id.clone(), version);
        Ok(id)
    }

    pub fn version(&self, version_id: &VersionId) -> Result<&Version, JournalError> {
        self.versions
            .get(version_id)
            .ok_or_else(|| JournalError::VersionNotFound(version_id.to_string()))
    }

    pub fn versions_of(&self, ledger_id: &LedgerId) -> Vec<&Version> {
        self.versions
            .values()
            .filter(|v| v.ledger_id == *ledger_id)
            .collect()
    }

    /// Mark a version as the default for its ledger, clearing the flag on
    /// every sibling.
    pub fn set_default_version(&mut self, version_id: &VersionId) -> Result<(), JournalError> {
        let ledger_id = self.version(version_id)?.ledger_id.clone();
        for version in self.versions.values_mut() {
            if version.ledger_id == ledger_id {
                version.default = version.id == *version_id;
            }
        }
        Ok(())
    }

    pub fn set_version_notes(
        &mut self,
        version_id: &VersionId,
        notes: &str,
    ) -> Result<(), JournalError> {
        self.version_mut(version_id)?.notes = notes.to_string();
        Ok(())
    }

    // ---- filter chain mutation -------------------------------------------

    /// Append a filter to a version's chain, immediately narrowing its
    /// materialized state. Returns the new filter's id.
    pub fn add_filter(
        &mut self,
        version_id: &VersionId,
        column: &str,
        operation: FilterOp,
        values: Vec<CellValue>,
    ) -> Result<String, JournalError> {
        let filter = Filter::new(column, operation, values);
        let table = decode(&self.version(version_id)?.state)?;
        let filtered = crate::engine::apply_filter(&table, &filter)?;
        let data = encode(&filtered, IdPolicy::Preserve).data;

        let version = self.version_mut(version_id)?;
        version.state.data = data;
        let id = filter.id.clone();
        version.filters.push(filter);
        Ok(id)
    }

    /// Remove a filter from a version's chain and re-materialize the state
    /// from the parent ledger with the remaining filters.
    pub fn remove_filter(
        &mut self,
        version_id: &VersionId,
        filter_id: &str,
    ) -> Result<(), JournalError> {
        let ledger_id = self.version(version_id)?.ledger_id.clone();
        let ledger_table = decode(&self.ledger(&ledger_id)?.state)?;

        let version = self.version_mut(version_id)?;
        let before = version.filters.len();
        version.filters.retain(|f| f.id != filter_id);
        if version.filters.len() == before {
            return Err(JournalError::FilterNotFound(filter_id.to_string()));
        }
        let remaining = version.filters.clone();

        let filtered = apply_chain(&ledger_table, &remaining)?;
        self.version_mut(version_id)?.state.data = encode(&filtered, IdPolicy::Preserve).data;
        Ok(())
    }

    // ---- ledger mutations (each followed by a synchronous resync) --------

    /// Append an empty row (required columns only) and resync.
    pub fn add_row(&mut self, ledger_id: &LedgerId) -> Result<RowId, JournalError> {
        let row_id = RowId::generate();
        let mut row = Row::new();
        row.insert("note".to_string(), CellValue::Str(String::new()));
        row.insert("imgs".to_string(), CellValue::Str(String::new()));
        self.ledger_mut(ledger_id)?
            .state
            .data
            .insert(row_id.as_str().to_string(), row);
        self.resync(ledger_id, SyncMode::DataOnly)?;
        Ok(row_id)
    }

    /// Replace a row's cells and resync.
    pub fn update_row(
        &mut self,
        ledger_id: &LedgerId,
        row_id: &RowId,
        row: Row,
    ) -> Result<(), JournalError> {
        let ledger = self.ledger_mut(ledger_id)?;
        if !ledger.state.data.contains_key(row_id.as_str()) {
            return Err(JournalError::RowNotFound(row_id.to_string()));
        }
        for column in row.keys() {
            if !ledger.state.fields.contains_key(column) {
                return Err(crate::error::LedgerError::UndeclaredColumn {
                    row_id: row_id.to_string(),
                    column: column.clone(),
                }
                .into());
            }
        }
        ledger.state.data.insert(row_id.as_str().to_string(), row);
        self.resync(ledger_id, SyncMode::DataOnly)?;
        Ok(())
    }

    /// Delete a row and resync.
    pub fn delete_row(
        &mut self,
        ledger_id: &LedgerId,
        row_id: &RowId,
    ) -> Result<(), JournalError> {
        let removed = self
            .ledger_mut(ledger_id)?
            .state
            .data
            .shift_remove(row_id.as_str());
        if removed.is_none() {
            return Err(JournalError::RowNotFound(row_id.to_string()));
        }
        self.resync(ledger_id, SyncMode::DataOnly)?;
        Ok(())
    }

    /// Declare a new column and resync with replaced fields. Existing rows
    /// read as null until edited.
    pub fn add_column(
        &mut self,
        ledger_id: &LedgerId,
        name: &str,
        declared: DeclaredType,
    ) -> Result<(), JournalError> {
        self.ledger_mut(ledger_id)?
            .state
            .fields
            .insert(name.to_string(), declared.as_str().to_string());
        self.resync(ledger_id, SyncMode::WithFields)?;
        Ok(())
    }

    /// Drop a column from the schema and every row, then resync; filters
    /// referencing it are dropped per version during the resync.
    pub fn delete_column(&mut self, ledger_id: &LedgerId, name: &str) -> Result<(), JournalError> {
        let ledger = self.ledger_mut(ledger_id)?;
        ledger.state.fields.shift_remove(name);
        for row in ledger.state.data.values_mut() {
            row.shift_remove(name);
        }
        self.resync(ledger_id, SyncMode::WithFields)?;
        Ok(())
    }

    /// Change a column's declared type. Prior filters were written against
    /// the old type, so every version's chain is cleared.
    pub fn retype_column(
        &mut self,
        ledger_id: &LedgerId,
        name: &str,
        declared: DeclaredType,
    ) -> Result<(), JournalError> {
        self.ledger_mut(ledger_id)?
            .state
            .fields
            .insert(name.to_string(), declared.as_str().to_string());
        self.resync(ledger_id, SyncMode::ClearFilters)?;
        Ok(())
    }

    /// Replay every version of the ledger against its current state.
    /// Per-version failures are reported in the result list, never raised.
    pub fn resync(
        &mut self,
        ledger_id: &LedgerId,
        mode: SyncMode,
    ) -> Result<Vec<VersionSync>, JournalError> {
        let table = decode(&self.ledger(ledger_id)?.state)?;
        let mut versions: Vec<&mut Version> = self
            .versions
            .values_mut()
            .filter(|v| v.ledger_id == *ledger_id)
            .collect();
        Ok(resync_versions(&table, &mut versions, mode))
    }

    // ---- read-side queries -----------------------------------------------

    pub fn statistics(
        &self,
        version_id: &VersionId,
    ) -> Result<IndexMap<String, ColumnStatistics>, JournalError> {
        Ok(compute_statistics(&self.version_table(version_id)?))
    }

    pub fn calendar_statistics(
        &self,
        version_id: &VersionId,
        date_col: &str,
        metric_col: &str,
        month: u32,
        year: i32,
        tz_offset_minutes: i64,
    ) -> Result<CalendarStats, JournalError> {
        let table = self.version_table(version_id)?;
        Ok(compute_calendar_statistics(
            &table,
            date_col,
            metric_col,
            month,
            year,
            tz_offset_minutes,
        )?)
    }

    /// Rows of the version currently open according to the ledger's open
    /// condition; empty when no condition is configured.
    pub fn open_positions(&self, version_id: &VersionId) -> Result<TableState, JournalError> {
        let version = self.version(version_id)?;
        let ledger = self.ledger(&version.ledger_id)?;
        let table = decode(&version.state)?;
        let open = evaluate_open_positions(&table, ledger.open_condition.as_ref())?;
        Ok(encode(&open, IdPolicy::Preserve))
    }

    pub fn equity_projection(
        &self,
        version_id: &VersionId,
        date_col: Option<&str>,
    ) -> Result<EquityProjection, JournalError> {
        let table = self.version_table(version_id)?;
        let result_columns: Vec<String> = table
            .result_columns()
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect();
        Ok(project_equity(
            &table,
            &result_columns,
            date_col,
            self.config.starting_balance,
        )?)
    }

    pub fn outcome_distribution(
        &self,
        version_id: &VersionId,
        result_col: &str,
    ) -> Result<OutcomeDistribution, JournalError> {
        Ok(outcome_distribution(
            &self.version_table(version_id)?,
            result_col,
        )?)
    }

    pub fn weekday_distribution(
        &self,
        version_id: &VersionId,
    ) -> Result<IndexMap<String, IndexMap<&'static str, Option<f64>>>, JournalError> {
        Ok(weekday_distribution(&self.version_table(version_id)?)?)
    }

    pub fn cumulative_results(
        &self,
        version_id: &VersionId,
    ) -> Result<IndexMap<String, Vec<Option<f64>>>, JournalError> {
        Ok(cumulative_results(&self.version_table(version_id)?)?)
    }

    fn version_table(&self, version_id: &VersionId) -> Result<Table, JournalError> {
        Ok(decode(&self.version(version_id)?.state)?)
    }

    fn ledger_mut(&mut self, ledger_id: &LedgerId) -> Result<&mut Ledger, JournalError> {
        self.ledgers
            .get_mut(ledger_id)
            .ok_or_else(|| JournalError::LedgerNotFound(ledger_id.to_string()))
    }

    fn version_mut(&mut self, version_id: &VersionId) -> Result<&mut Version, JournalError> {
        self.versions
            .get_mut(version_id)
            .ok_or_else(|| JournalError::VersionNotFound(version_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seed_state() -> TableState {
        serde_json::from_value(json!({
            "fields": {"col_p": "object", "col_v_Profit": "float64"},
            "data": {
                "r1": {"col_p": "EURUSD", "col_v_Profit": 100.0},
                "r2": {"col_p": "GBPUSD", "col_v_Profit": -40.0}
            }
        }))
        .unwrap()
    }

    fn journal_with_ledger() -> (Journal, LedgerId) {
        let mut journal = Journal::new(JournalConfig::default());
        let id = journal
            .create_ledger("demo+broker", "user-1", seed_state())
            .unwrap();
        (journal, id)
    }

    #[test]
    fn test_create_ledger_seeds_default_version() {
        let (journal, ledger_id) = journal_with_ledger();
        let versions = journal.versions_of(&ledger_id);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].name, "Default");
        assert!(versions[0].default);
        assert!(versions[0].filters.is_empty());
        assert_eq!(versions[0].state, journal.ledger(&ledger_id).unwrap().state);
    }

    #[test]
    fn test_default_flag_is_exclusive() {
        let (mut journal, ledger_id) = journal_with_ledger();
        let second = journal.create_version(&ledger_id, "Scalps").unwrap();
        journal.set_default_version(&second).unwrap();

        let defaults: Vec<bool> = journal
            .versions_of(&ledger_id)
            .iter()
            .map(|v| v.default)
            .collect();
        assert_eq!(defaults.iter().filter(|d| **d).count(), 1);
        assert!(journal.version(&second).unwrap().default);
    }

    #[test]
    fn test_delete_ledger_cascades() {
        let (mut journal, ledger_id) = journal_with_ledger();
        let version_id = journal.create_version(&ledger_id, "extra").unwrap();
        journal.delete_ledger(&ledger_id).unwrap();
        assert!(journal.ledger(&ledger_id).is_err());
        assert!(journal.version(&version_id).is_err());
    }

    #[test]
    fn test_duplicate_ledger_gets_fresh_row_ids() {
        let (mut journal, ledger_id) = journal_with_ledger();
        let copy_id = journal.duplicate_ledger(&ledger_id, "copy").unwrap();
        let copy = journal.ledger(&copy_id).unwrap();
        assert_eq!(copy.state.data.len(), 2);
        assert!(!copy.state.data.contains_key("r1"));
    }

    #[test]
    fn test_update_row_rejects_undeclared_column() {
        let (mut journal, ledger_id) = journal_with_ledger();
        let mut row = Row::new();
        row.insert("col_m_Ghost".to_string(), CellValue::Num(1.0));
        let err = journal.update_row(&ledger_id, &RowId::from("r1"), row);
        assert!(matches!(err, Err(JournalError::Ledger(_))));
    }
}
