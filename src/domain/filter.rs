//! Filter and open-position predicate definitions.

use crate::domain::column::display_name;
use crate::domain::value::CellValue;
use serde::{Deserialize, Serialize};

/// General filter operations, chain-composable (case A vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    In,
    Nin,
    Date,
    Gt,
    Lt,
    Eq,
    Ne,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::In => "in",
            FilterOp::Nin => "nin",
            FilterOp::Date => "date",
            FilterOp::Gt => "gt",
            FilterOp::Lt => "lt",
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
        }
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One predicate in a version's filter chain.
///
/// Operands are always carried as a list, even for single-operand
/// operations; `gt`/`lt`/`eq`/`ne` read the first element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub id: String,
    pub name: String,
    pub column: String,
    pub operation: FilterOp,
    pub values: Vec<CellValue>,
}

impl Filter {
    pub fn new(column: &str, operation: FilterOp, values: Vec<CellValue>) -> Filter {
        Filter {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: describe(column, operation, &values),
            column: column.to_string(),
            operation,
            values,
        }
    }
}

/// Display name shown in the filter list, e.g. "Pair includes EURUSD".
fn describe(column: &str, operation: FilterOp, values: &[CellValue]) -> String {
    let mut name = display_name(column);
    match operation {
        FilterOp::Date => {
            let from = values.first().map(|v| v.to_string()).unwrap_or_default();
            let to = values.get(1).map(|v| v.to_string()).unwrap_or_default();
            name.push_str(&format!(" from {} to {}", from, to));
        }
        op => {
            name.push_str(match op {
                FilterOp::Gt => " greater than ",
                FilterOp::Lt => " lesser than ",
                FilterOp::Eq => " equal to ",
                FilterOp::Ne => " not equal to ",
                FilterOp::In => " includes ",
                FilterOp::Nin => " not includes ",
                FilterOp::Date => unreachable!(),
            });
            let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            name.push_str(&rendered.join(", "));
        }
    }
    name
}

/// Open-position operations (case B vocabulary, single predicate only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenOp {
    Empty,
    NotEmpty,
    Equal,
    NotEqual,
    Higher,
    Lower,
    Before,
    After,
}

impl OpenOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenOp::Empty => "empty",
            OpenOp::NotEmpty => "not_empty",
            OpenOp::Equal => "equal",
            OpenOp::NotEqual => "not_equal",
            OpenOp::Higher => "higher",
            OpenOp::Lower => "lower",
            OpenOp::Before => "before",
            OpenOp::After => "after",
        }
    }
}

impl std::fmt::Display for OpenOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ledger-level condition describing a trade that is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenCondition {
    pub column: String,
    pub operation: OpenOp,
    pub value: CellValue,
}
