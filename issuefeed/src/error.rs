//! Unified error handling for the issuefeed library
//!
//! Parser and identity failures propagate up through the loader and end the
//! load run. Query operations never fail: "not found" is an empty result.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// The main error type for the issuefeed library
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IssueFeedError {
    /// Opening or reading an export file failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Walking an export directory failed
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// An export file is not a well-formed feed document
    #[error("Malformed input in {}: {source}", path.display())]
    MalformedInput {
        /// File that failed to decode
        path: PathBuf,
        /// Decoder error
        #[source]
        source: quick_xml::DeError,
    },

    /// An entry identifier does not have the expected path shape
    #[error("Invalid identifier '{identifier}': {reason}")]
    InvalidIdentifier {
        /// The offending identifier
        identifier: String,
        /// What was wrong with it
        reason: String,
    },

    /// The load run was cancelled before it finished
    #[error("Load cancelled")]
    Cancelled,

    /// A blocking parse task panicked or was aborted
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl IssueFeedError {
    /// Build an [`IssueFeedError::InvalidIdentifier`]
    pub fn invalid_identifier(identifier: &str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether a tolerant load may skip the file that produced this error
    ///
    /// Only per-file content errors qualify. Walk failures, cancellation and
    /// task failures always end the run.
    pub fn is_file_local(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::MalformedInput { .. } | Self::InvalidIdentifier { .. }
        )
    }
}

/// Result type alias for issuefeed operations
pub type Result<T> = std::result::Result<T, IssueFeedError>;

/// Error chain formatter for detailed error reporting
pub struct ErrorChain<'a>(&'a dyn std::error::Error);

impl<'a> fmt::Display for ErrorChain<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: {}", self.0)?;

        let mut current = self.0.source();
        let mut level = 1;

        while let Some(err) = current {
            writeln!(f, "{:indent$}Caused by: {}", "", err, indent = level * 2)?;
            current = err.source();
            level += 1;
        }

        Ok(())
    }
}

/// Extension trait for error types to format the full error chain
pub trait ErrorChainExt {
    /// Format the full error chain
    fn error_chain(&self) -> ErrorChain<'_>;
}

impl<E: std::error::Error> ErrorChainExt for E {
    fn error_chain(&self) -> ErrorChain<'_> {
        ErrorChain(self)
    }
}
