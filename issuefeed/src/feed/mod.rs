//! Feed export records
//!
//! An export file is an Atom-style feed whose entries describe either issues
//! or comments. Both share one schema, [`RawEntry`]; the directory a file was
//! found in decides how its entries are applied to the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// XML decoding of export files
pub mod parser;

pub use parser::{parse_file, parse_reader};

/// One parsed entry from an export file, either an issue or a comment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Path-shaped identifier, e.g. `.../issues/42` or `.../issues/42/comments/3`
    pub id: String,
    /// Entry title
    pub title: String,
    /// When the entry was published, if the export recorded it
    pub published: Option<DateTime<Utc>>,
    /// Raw markup body
    pub content: String,
    /// Author name
    pub author: String,
    /// Owner username
    pub owner: String,
    /// Status string, e.g. "New" or "Fixed"
    pub status: String,
    /// Labels in source order; duplicates are kept
    pub labels: Vec<String>,
    /// Reference to the issue this one was merged into
    pub merged_into: String,
    /// CC'd usernames in source order
    pub cc: Vec<String>,
    /// Field changes recorded with this entry
    pub updates: Vec<Update>,
}

/// A delta recorded on an entry
///
/// Carried through for history display and never queried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Summary change
    pub summary: String,
    /// Owner change
    pub owner: String,
    /// Label changes, e.g. "-Priority-Medium"
    pub labels: Vec<String>,
    /// Status change
    pub status: String,
    /// Merged-into change
    pub merged_into: String,
    /// CC list change
    pub cc: Vec<String>,
}
