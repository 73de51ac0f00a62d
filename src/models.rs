use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type CategoryId = i64;
pub type TransactionId = i64;

/// Direction of a money movement.
///
/// Stored and exported as the tokens `Трата` / `Доход` so databases and CSV
/// files written by earlier versions keep working.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    #[default]
    #[serde(rename = "Трата")]
    Expense,
    #[serde(rename = "Доход")]
    Income,
}

impl TransactionKind {
    pub const EXPENSE_TOKEN: &'static str = "Трата";
    pub const INCOME_TOKEN: &'static str = "Доход";

    pub fn as_token(self) -> &'static str {
        match self {
            TransactionKind::Expense => Self::EXPENSE_TOKEN,
            TransactionKind::Income => Self::INCOME_TOKEN,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction kind `{0}`")]
pub struct ParseKindError(pub String);

impl FromStr for TransactionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            Self::EXPENSE_TOKEN => Ok(TransactionKind::Expense),
            Self::INCOME_TOKEN => Ok(TransactionKind::Income),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_token()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon_path: Option<String>,
}

/// Field values of a transaction before (or instead of) it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category_id: Option<CategoryId>,
    pub note: Option<String>,
}

/// A stored transaction joined with its category, if it still has one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub total: f64,
}

/// Result of an insert guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Created(CategoryId),
    AlreadyExists,
}

impl AddOutcome {
    pub fn id(self) -> Option<CategoryId> {
        match self {
            AddOutcome::Created(id) => Some(id),
            AddOutcome::AlreadyExists => None,
        }
    }
}

/// Result of an update or delete addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    NotFound,
    /// The new category name belongs to another category.
    NameTaken,
}

impl WriteOutcome {
    pub(crate) fn from_affected(rows: usize) -> Self {
        if rows == 0 {
            WriteOutcome::NotFound
        } else {
            WriteOutcome::Applied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tokens_parse_back() {
        assert_eq!("Трата".parse::<TransactionKind>(), Ok(TransactionKind::Expense));
        assert_eq!(" Доход ".parse::<TransactionKind>(), Ok(TransactionKind::Income));
        assert_eq!(
            "income".parse::<TransactionKind>(),
            Err(ParseKindError("income".to_string()))
        );
    }

    #[test]
    fn kind_serializes_as_legacy_token() {
        let json = serde_json::to_string(&TransactionKind::Income).unwrap();
        assert_eq!(json, "\"Доход\"");
        let kind: TransactionKind = serde_json::from_str("\"Трата\"").unwrap();
        assert_eq!(kind, TransactionKind::Expense);
    }

    #[test]
    fn affected_rows_map_to_outcome() {
        assert_eq!(WriteOutcome::from_affected(0), WriteOutcome::NotFound);
        assert_eq!(WriteOutcome::from_affected(2), WriteOutcome::Applied);
    }
}
