//! Bulk transfer of transactions to and from CSV files with the header
//! `date,amount,type,category_name,note`.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::Store;
use crate::error::{StoreError, TransferError};
use crate::models::{AddOutcome, CategoryId, NewTransaction, TransactionKind};

pub const HEADER: [&str; 5] = ["date", "amount", "type", "category_name", "note"];

/// Category name given to imported rows whose category field is empty.
/// Export writes uncategorized rows with an empty field, so a re-import moves
/// them into this category.
pub const UNCATEGORIZED: &str = "Без категории";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub categories_created: usize,
}

#[derive(Serialize)]
struct ExportRow<'a> {
    date: NaiveDate,
    amount: f64,
    #[serde(rename = "type")]
    kind: TransactionKind,
    category_name: &'a str,
    note: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    category_name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

/// Writes every transaction, newest first, replacing any file at `path`.
/// Returns the number of data rows written.
pub fn export_all(store: &Store, path: &Path) -> Result<usize, TransferError> {
    let records = store.get_transactions(None)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(HEADER)?;
    for record in &records {
        writer.serialize(ExportRow {
            date: record.date,
            amount: record.amount,
            kind: record.kind,
            category_name: record.category_name.as_deref().unwrap_or(""),
            note: record.note.as_deref().unwrap_or(""),
        })?;
    }
    writer.flush()?;
    info!(rows = records.len(), path = %path.display(), "transactions exported");
    Ok(records.len())
}

/// Replaces all transactions with the rows of the CSV file at `path`.
///
/// Categories are kept; unknown category names are created on the way. The
/// first malformed row stops the import, leaving the rows before it stored
/// and the previous transactions gone.
pub fn import_all(store: &Store, path: &Path) -> Result<ImportSummary, TransferError> {
    // Short rows are allowed; their missing trailing fields read as empty.
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let has_amount_column = reader.headers()?.iter().any(|name| name == "amount");
    let mut resolver = CategoryResolver::load(store)?;
    store.clear_transactions()?;

    let mut rows = 0;
    for (index, result) in reader.deserialize::<ImportRow>().enumerate() {
        let row_number = index + 1;
        let row = result?;
        let new = parse_row(row_number, &row, has_amount_column)?;
        let category_name = row
            .category_name
            .or(row.category)
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let category_id = resolver.resolve(category_name)?;
        store.add_transaction(&NewTransaction { category_id, ..new })?;
        rows += 1;
    }

    let summary = ImportSummary {
        rows,
        categories_created: resolver.created,
    };
    info!(
        rows = summary.rows,
        categories_created = summary.categories_created,
        path = %path.display(),
        "transactions imported"
    );
    Ok(summary)
}

/// A file without an `amount` column imports every row with amount `0.0`.
fn parse_row(
    row_number: usize,
    row: &ImportRow,
    has_amount_column: bool,
) -> Result<NewTransaction, TransferError> {
    let raw_amount = match row.amount.as_deref() {
        None if !has_amount_column => "0",
        value => value.unwrap_or("").trim(),
    };
    let amount = raw_amount
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| TransferError::MalformedAmount {
            row: row_number,
            value: raw_amount.to_string(),
        })?;

    let raw_date = row.date.as_deref().unwrap_or("").trim();
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
        TransferError::MalformedDate {
            row: row_number,
            value: raw_date.to_string(),
        }
    })?;

    let kind = match row.kind.as_deref() {
        None => TransactionKind::Expense,
        Some(token) => token.parse().map_err(|_| TransferError::UnknownKind {
            row: row_number,
            value: token.to_string(),
        })?,
    };

    Ok(NewTransaction {
        date,
        amount,
        kind,
        category_id: None,
        note: row.note.clone(),
    })
}

/// Name to id lookup built once per import and extended as categories are created.
struct CategoryResolver<'a> {
    store: &'a Store,
    ids: HashMap<String, CategoryId>,
    created: usize,
}

impl<'a> CategoryResolver<'a> {
    fn load(store: &'a Store) -> Result<Self, StoreError> {
        let ids = store
            .get_categories()?
            .into_iter()
            .map(|category| (category.name, category.id))
            .collect();
        Ok(Self {
            store,
            ids,
            created: 0,
        })
    }

    fn resolve(&mut self, name: String) -> Result<Option<CategoryId>, StoreError> {
        if let Some(id) = self.ids.get(&name) {
            return Ok(Some(*id));
        }
        let id = match self.store.add_category(&name, None)? {
            AddOutcome::Created(id) => {
                self.created += 1;
                debug!(id, name = %name, "category created during import");
                Some(id)
            }
            // Created by someone else after the map was loaded.
            AddOutcome::AlreadyExists => self.store.find_category_by_name(&name)?.map(|c| c.id),
        };
        if let Some(id) = id {
            self.ids.insert(name, id);
        }
        Ok(id)
    }
}
