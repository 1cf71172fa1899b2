//! # IssueFeed
//!
//! An in-memory, concurrently queryable index of issues and comments loaded
//! from issue-tracker feed exports.
//!
//! ## Features
//!
//! - **Feed parsing**: Atom-style XML exports decoded into raw entries
//! - **Identity resolution**: integer issue ids derived from path-shaped entry ids
//! - **Issue store**: a single-lock store that can be queried while it is loading
//! - **Queries**: by tag, by status, by comment author, and distinct tags/statuses
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use issuefeed::{FeedLoader, InMemoryIssueStore, IssueQuery, IssueStorage};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> issuefeed::Result<()> {
//! let storage: Arc<dyn IssueStorage> = Arc::new(InMemoryIssueStore::new());
//! let query = IssueQuery::new(storage.clone());
//!
//! FeedLoader::new(storage)
//!     .run(Path::new("issues"), Path::new("comments"))
//!     .await?;
//!
//! for issue in query.find_by_tag("bug").await {
//!     println!("{}: {}", issue.id, issue.title);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Shared helpers
pub mod common;

/// Configuration from defaults, environment and YAML
pub mod config;

/// Error types
pub mod error;

/// Feed export parsing
pub mod feed;

/// Issue id derivation
pub mod identity;

/// Issue store and queries
pub mod issues;

/// Directory loading pipeline
pub mod loader;

pub use config::{Config, ConfigError, YamlConfig};
pub use error::{ErrorChain, ErrorChainExt, IssueFeedError, Result};
pub use feed::{RawEntry, Update};
pub use identity::{IdentityResolver, IssueId};
pub use issues::{
    by_id, sort_by_id, InMemoryIssueStore, InstrumentedIssueStorage, Issue, IssueComment,
    IssueQuery, IssueStorage, Markup, MetricsSnapshot, PerformanceMetrics,
};
pub use loader::{FeedLoader, LoadPolicy, LoadReport, PhaseReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
