//! Domain types for the version-consistency and statistics engine.
//!
//! This module provides:
//! - Dynamically typed cells and row-keyed tables
//! - The column naming convention resolved into a closed [`ColumnKind`]
//! - The persisted-state codec with declared-type date reparsing
//! - Filter, open-condition, ledger, and version entities

pub mod codec;
pub mod column;
pub mod filter;
pub mod ledger;
pub mod table;
pub mod value;

pub use codec::{decode, encode, IdPolicy};
pub use column::{display_name, ColumnKind, DeclaredType, FieldDecl, ResultKind, REQUIRED_COLUMNS};
pub use filter::{Filter, FilterOp, OpenCondition, OpenOp};
pub use ledger::{AccountInfo, Ledger, LedgerId, Version, VersionId};
pub use table::{Row, RowId, Table, TableState};
pub use value::CellValue;
