//! Personal finance tracker: a SQLite store of categories and income/expense
//! transactions, CSV import/export, and a small local JSON API on top.

#[macro_use]
extern crate rocket;

pub mod api;
pub mod config;
pub mod csv_io;
pub mod db;
pub mod error;
pub mod models;
pub mod validation;

pub use config::StoreConfig;
pub use db::Store;
pub use error::{StoreError, TransferError};
pub use models::{
    AddOutcome, Category, CategoryTotal, NewTransaction, TransactionKind, TransactionRecord,
    WriteOutcome,
};
