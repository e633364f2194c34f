//! Importing a spool into a remote mailbox.
//!
//! A [`Migration`] runs in two phases. [`resolve_labels`] maps every spool
//! folder to a label and creates the missing ones; the resulting table is
//! frozen. The import phase then streams entries out of a [`WorkSource`]
//! (skipping whatever the ledger already knows about) into the executor,
//! which sends each one under its folder's label and records it.

mod context;
pub mod error;
mod import;
mod labels;
mod migrate;
mod progress;
mod source;

pub use crate::context::Context;
pub use crate::import::{Sent, work_item};
pub use crate::labels::{FolderEntry, Resolution, resolve_labels};
pub use crate::migrate::{Migration, MigrationEvent, Summary};
pub use crate::progress::Progress;
pub use crate::source::{Candidate, WorkSource};
