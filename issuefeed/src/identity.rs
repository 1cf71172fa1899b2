//! Integer ids derived from path-shaped entry identifiers
//!
//! An issue entry is identified as `<prefix>/issues/<n>` and a comment entry
//! as `<prefix>/issues/<n>/comments/<k>`. The issue id is always the final
//! path segment once the comment suffix has been dropped. The number of
//! segments dropped for comments is fixed per export layout.

use crate::error::{IssueFeedError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trailing segments of `<issue>/comments/<k>` that follow the issue id
pub const DEFAULT_COMMENT_ID_DEPTH: usize = 2;

/// Primary key of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(i64);

impl IssueId {
    /// Get the raw value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for IssueId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<IssueId> for i64 {
    fn from(value: IssueId) -> Self {
        value.0
    }
}

/// Split an identifier into lexically cleaned path segments
///
/// Empty segments and `.` are dropped and `..` removes the segment before
/// it, so `a//b/./c/` and `a/b/c` resolve identically.
fn segments(identifier: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for segment in identifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn parse_segment(identifier: &str, segment: &str) -> Result<IssueId> {
    segment.parse::<i64>().map(IssueId).map_err(|_| {
        IssueFeedError::invalid_identifier(
            identifier,
            format!("segment '{segment}' is not a base-10 integer"),
        )
    })
}

/// The issue id of an issue entry: its final path segment as an integer
pub fn issue_id(identifier: &str) -> Result<IssueId> {
    match segments(identifier).last() {
        Some(last) => parse_segment(identifier, last),
        None => Err(IssueFeedError::invalid_identifier(
            identifier,
            "identifier has no path segments",
        )),
    }
}

/// The owning issue id of a `<issue-path>/comments/<k>` comment entry
pub fn parent_issue_id(identifier: &str) -> Result<IssueId> {
    parent_issue_id_at_depth(identifier, DEFAULT_COMMENT_ID_DEPTH)
}

/// The owning issue id of a comment entry whose id has `depth` segments
/// after the issue id
///
/// `depth` is 2 for `<issue>/comments/<k>` and 3 for
/// `<issue>/comments/full/<k>`.
pub fn parent_issue_id_at_depth(identifier: &str, depth: usize) -> Result<IssueId> {
    let parts = segments(identifier);
    if parts.len() <= depth {
        return Err(IssueFeedError::invalid_identifier(
            identifier,
            format!(
                "expected at least {} path segments for a comment, found {}",
                depth + 1,
                parts.len()
            ),
        ));
    }
    parse_segment(identifier, parts[parts.len() - 1 - depth])
}

/// Resolves ids for one export layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityResolver {
    comment_depth: usize,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self {
            comment_depth: DEFAULT_COMMENT_ID_DEPTH,
        }
    }
}

impl IdentityResolver {
    /// Resolver for comment ids with `comment_depth` trailing segments
    pub fn new(comment_depth: usize) -> Self {
        Self { comment_depth }
    }

    /// See [`issue_id`]
    pub fn issue_id(&self, identifier: &str) -> Result<IssueId> {
        issue_id(identifier)
    }

    /// See [`parent_issue_id_at_depth`]
    pub fn parent_issue_id(&self, identifier: &str) -> Result<IssueId> {
        parent_issue_id_at_depth(identifier, self.comment_depth)
    }
}
