//! Folder to label naming.
//!
//! Local folders form a tree (`Archive/2020/Q1`), remote labels are flat
//! names that merely *look* hierarchical and are stricter about whitespace.
//! [`LabelMapper`] turns one into the other; [`LabelTable`] holds the
//! resulting name to identifier mapping once labels exist remotely.

pub mod error;
mod mapper;
mod normalize;
mod overrides;
mod table;

pub use crate::mapper::LabelMapper;
pub use crate::normalize::normalize;
pub use crate::overrides::Overrides;
pub use crate::table::LabelTable;

/// Separator between components of folder and label names.
pub const SEPARATOR: char = '/';
/// Folder name of the spool root.
pub const ROOT: &str = ".";
