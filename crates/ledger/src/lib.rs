//! SQLite ledger of delivered items.
//!
//! The ledger is what makes an import resumable: a row is written only after
//! the remote confirms an item, and every later run skips items that already
//! have a row. Rows are partitioned by a *scope* (see [`scope`]) so that
//! importing the same spool into a different account or subfolder starts
//! from scratch.
//!
//! Rows are never updated or deleted. Deleting the database file forgets
//! everything and the next run sends the whole spool again.

mod db;
pub mod error;
mod key;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::key::{KeyStrategy, key_for_content, key_for_path};
pub use crate::models::Record;
pub use crate::repo::{DedupStore, Ledger, scope};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn DedupStore + Send + Sync>;
