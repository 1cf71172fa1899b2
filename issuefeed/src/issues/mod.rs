//! Issue store and queries
//!
//! Issues live in an [`IssueStorage`] and are read back through an
//! [`IssueQuery`]. Query results are owned snapshots: later inserts or
//! comment attachments never change a result already handed out.

use crate::feed::RawEntry;
use crate::identity::IssueId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Storage wrapper that collects performance metrics for all operations
pub mod instrumented_storage;
/// Performance metrics collection
pub mod metrics;
/// Filtered views computed by scanning the store
pub mod query;
/// The storage trait and its in-memory implementation
pub mod storage;

pub use instrumented_storage::InstrumentedIssueStorage;
pub use metrics::{MetricsSnapshot, Operation, PerformanceMetrics};
pub use query::{IssueComment, IssueQuery};
pub use storage::{InMemoryIssueStore, IssueStorage};

/// Markup taken from an export and rendered without escaping
///
/// Export content is treated as trusted, matching how the exporter produced
/// it. Nothing in this crate sanitizes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markup(String);

impl Markup {
    /// Wrap markup that will be rendered as-is
    pub fn trusted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw markup
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An issue as held by the store, with its attached comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Primary key
    pub id: IssueId,
    /// Title
    pub title: String,
    /// When the issue was published
    pub published: Option<DateTime<Utc>>,
    /// Body markup
    pub content: Markup,
    /// Status string
    pub status: String,
    /// Labels in source order; duplicates are kept
    pub labels: Vec<String>,
    /// Comments in arrival order
    pub comments: Vec<RawEntry>,
}

impl Issue {
    /// Derive an issue from a parsed issue entry
    ///
    /// Comment-only fields (author, owner, cc, updates) are dropped.
    pub fn from_entry(id: IssueId, entry: RawEntry) -> Self {
        Self {
            id,
            title: entry.title,
            published: entry.published,
            content: Markup::trusted(entry.content),
            status: entry.status,
            labels: entry.labels,
            comments: Vec::new(),
        }
    }

    /// Whether any label equals `name` exactly
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label == name)
    }
}

/// Display order for issues: ascending id
pub fn by_id(a: &Issue, b: &Issue) -> Ordering {
    a.id.cmp(&b.id)
}

/// Sort issues into display order
pub fn sort_by_id(issues: &mut [Arc<Issue>]) {
    issues.sort_by(|a, b| by_id(a, b));
}
