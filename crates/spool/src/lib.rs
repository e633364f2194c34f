//! Access to a local mail spool.
//!
//! A spool is a directory tree where every directory is a mail folder and
//! every regular file is one message (Cyrus-style `1.`, `2.`, ...), mixed with
//! index and cache files the server keeps next to them. [`Exclusions`] decide
//! which directories and files are not messages, or are too large to import.

pub mod backend;
pub mod error;
mod exclude;
mod models;
mod path;

pub use crate::backend::Spool;
pub use crate::exclude::{Excluded, Exclusions};
pub use crate::models::SpoolEntry;
pub use crate::path::{ROOT_FOLDER, folder_name, validate as validate_path};
use std::sync::Arc;

pub type SpoolHandle = Arc<dyn Spool + Send + Sync>;
