use std::fs;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{
    AddOutcome, Category, CategoryId, CategoryTotal, NewTransaction, TransactionId,
    TransactionKind, TransactionRecord, WriteOutcome,
};

pub type DbPool = Pool<SqliteConnectionManager>;

type Result<T> = std::result::Result<T, StoreError>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        icon_path TEXT
    );

    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        amount REAL NOT NULL,
        type TEXT NOT NULL,
        category_id INTEGER,
        note TEXT,
        FOREIGN KEY(category_id) REFERENCES categories(id)
    );
";

const TRANSACTION_COLUMNS: &str = "
    SELECT t.id, t.date, t.amount, t.type, t.category_id, c.name, c.icon_path, t.note
    FROM transactions t
    LEFT JOIN categories c ON t.category_id = c.id
";

/// Handle to the finance database.
///
/// Cloning is cheap; clones share the pool. Each method checks out one
/// connection and gives it back before returning.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

impl Store {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        if let Some(dir) = config.db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| StoreError::DataDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let manager = SqliteConnectionManager::file(&config.db_path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .build(manager)?;
        let store = Self { pool };
        store.init_schema()?;
        info!(path = %config.db_path.display(), "database ready");
        Ok(store)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Creates both tables if they are missing. Safe to call any number of times.
    pub fn init_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    // categories

    /// Inserts a category. The UNIQUE constraint decides whether the name is
    /// taken, so there is no window between a lookup and the insert.
    pub fn add_category(&self, name: &str, icon_path: Option<&str>) -> Result<AddOutcome> {
        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO categories (name, icon_path) VALUES (?1, ?2)",
            params![name, icon_path],
        ) {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                debug!(id, name, "category created");
                Ok(AddOutcome::Created(id))
            }
            Err(err) if is_unique_violation(&err) => {
                debug!(name, "category already exists");
                Ok(AddOutcome::AlreadyExists)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn get_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "
            SELECT id, name, icon_path
            FROM categories
            ORDER BY name
            ",
        )?;
        let rows = stmt.query_map([], category_from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, icon_path FROM categories WHERE name = ?1",
                params![name],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    pub fn update_category(
        &self,
        id: CategoryId,
        name: &str,
        icon_path: Option<&str>,
    ) -> Result<WriteOutcome> {
        let conn = self.conn()?;
        match conn.execute(
            "UPDATE categories SET name = ?1, icon_path = ?2 WHERE id = ?3",
            params![name, icon_path, id],
        ) {
            Ok(rows) => Ok(WriteOutcome::from_affected(rows)),
            Err(err) if is_unique_violation(&err) => Ok(WriteOutcome::NameTaken),
            Err(err) => Err(err.into()),
        }
    }

    /// Detaches every transaction from the category, then removes it.
    /// Transactions themselves are never deleted.
    pub fn delete_category(&self, id: CategoryId) -> Result<WriteOutcome> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let detached = tx.execute(
            "UPDATE transactions SET category_id = NULL WHERE category_id = ?1",
            params![id],
        )?;
        let removed = tx.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        tx.commit()?;
        debug!(id, detached, "category deleted");
        Ok(WriteOutcome::from_affected(removed))
    }

    // transactions

    /// Inserts a transaction as given; amounts are validated by the caller.
    pub fn add_transaction(&self, new: &NewTransaction) -> Result<TransactionId> {
        let conn = self.conn()?;
        conn.execute(
            "
            INSERT INTO transactions (date, amount, type, category_id, note)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![new.date, new.amount, new.kind, new.category_id, new.note],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, kind = %new.kind, amount = new.amount, "transaction created");
        Ok(id)
    }

    pub fn update_transaction(&self, id: TransactionId, new: &NewTransaction) -> Result<WriteOutcome> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "
            UPDATE transactions
            SET date = ?1, amount = ?2, type = ?3, category_id = ?4, note = ?5
            WHERE id = ?6
            ",
            params![new.date, new.amount, new.kind, new.category_id, new.note, id],
        )?;
        Ok(WriteOutcome::from_affected(rows))
    }

    pub fn delete_transaction(&self, id: TransactionId) -> Result<WriteOutcome> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        Ok(WriteOutcome::from_affected(rows))
    }

    pub fn clear_transactions(&self) -> Result<()> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM transactions", [])?;
        info!(rows, "transactions cleared");
        Ok(())
    }

    /// Full reset: transactions first, then categories.
    pub fn clear_all(&self) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM transactions", [])?;
        tx.execute("DELETE FROM categories", [])?;
        tx.commit()?;
        info!("database cleared");
        Ok(())
    }

    pub fn get_transaction(&self, id: TransactionId) -> Result<Option<TransactionRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("{TRANSACTION_COLUMNS} WHERE t.id = ?1"),
                params![id],
                transaction_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Newest first. `None` or `Some(0)` returns every row.
    pub fn get_transactions(&self, limit: Option<u32>) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn()?;
        let limit = match limit {
            Some(n) if n > 0 => i64::from(n),
            _ => -1,
        };
        let mut stmt = conn.prepare(&format!(
            "{TRANSACTION_COLUMNS} ORDER BY t.date DESC, t.id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], transaction_from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    // aggregates

    /// Income minus expenses over every transaction; `0.0` for an empty table.
    pub fn get_balance(&self) -> Result<f64> {
        let conn = self.conn()?;
        let balance = conn.query_row(
            "
            SELECT COALESCE(SUM(CASE
                WHEN type = ?1 THEN amount
                WHEN type = ?2 THEN -amount
                ELSE 0 END), 0.0)
            FROM transactions
            ",
            params![TransactionKind::Income, TransactionKind::Expense],
            |row| row.get(0),
        )?;
        Ok(balance)
    }

    /// Expense totals per category, largest first. Uncategorized expenses and
    /// categories without expenses do not appear.
    pub fn get_expenses_by_category(&self) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "
            SELECT c.name, SUM(t.amount) AS total
            FROM transactions t
            JOIN categories c ON t.category_id = c.id
            WHERE t.type = ?1
            GROUP BY c.id
            ORDER BY total DESC
            ",
        )?;
        let rows = stmt.query_map(params![TransactionKind::Expense], |row| {
            Ok(CategoryTotal {
                name: row.get(0)?,
                total: row.get(1)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        icon_path: row.get(2)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<TransactionRecord> {
    Ok(TransactionRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: row.get(2)?,
        kind: row.get(3)?,
        category_id: row.get(4)?,
        category_name: row.get(5)?,
        category_icon: row.get(6)?,
        note: row.get(7)?,
    })
}
