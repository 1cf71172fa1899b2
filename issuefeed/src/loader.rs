//! Two-phase loading of export directories into an issue store
//!
//! The issues directory is loaded first, then the comments directory.
//! Comments whose issue is not in the store are dropped. Parsing runs on the
//! blocking pool so queries on the same runtime keep being served while a
//! load is in progress.

use crate::config::{Config, ConfigError};
use crate::error::{ErrorChainExt, IssueFeedError, Result};
use crate::feed::{self, RawEntry};
use crate::identity::{IdentityResolver, IssueId};
use crate::issues::{Issue, IssueStorage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// What a load run does with a file that cannot be parsed or resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPolicy {
    /// End the run with the file's error
    #[default]
    FailFast,
    /// Log the error, skip the whole file and continue
    SkipAndLog,
}

impl fmt::Display for LoadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadPolicy::FailFast => write!(f, "fail-fast"),
            LoadPolicy::SkipAndLog => write!(f, "skip-and-log"),
        }
    }
}

impl FromStr for LoadPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail-fast" => Ok(LoadPolicy::FailFast),
            "skip-and-log" => Ok(LoadPolicy::SkipAndLog),
            other => Err(ConfigError::InvalidValue {
                field: "load_policy".to_string(),
                value: other.to_string(),
                hint: "expected 'fail-fast' or 'skip-and-log'".to_string(),
            }),
        }
    }
}

/// Counts for one load phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    /// Files parsed and applied
    pub files_parsed: usize,
    /// Files skipped under [`LoadPolicy::SkipAndLog`]
    pub files_skipped: usize,
    /// Issues inserted or comments attached
    pub entries_applied: usize,
    /// Comments whose issue was not in the store
    pub comments_dropped: usize,
}

/// Counts for a full run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// The issues phase
    pub issues: PhaseReport,
    /// The comments phase
    pub comments: PhaseReport,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Issues,
    Comments,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Issues => write!(f, "issues"),
            Phase::Comments => write!(f, "comments"),
        }
    }
}

/// Loads export directories into an [`IssueStorage`]
#[derive(Clone)]
pub struct FeedLoader {
    storage: Arc<dyn IssueStorage>,
    policy: LoadPolicy,
    resolver: IdentityResolver,
    file_extension: Option<String>,
    cancel: CancellationToken,
}

impl FeedLoader {
    /// Loader with the default policy and comment layout
    pub fn new(storage: Arc<dyn IssueStorage>) -> Self {
        Self {
            storage,
            policy: LoadPolicy::default(),
            resolver: IdentityResolver::default(),
            file_extension: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Loader using the policy, comment layout and extension filter of `config`
    pub fn from_config(storage: Arc<dyn IssueStorage>, config: &Config) -> Self {
        Self::new(storage)
            .with_policy(config.load_policy)
            .with_comment_depth(config.comment_id_depth)
            .with_file_extension(config.file_extension.clone())
    }

    /// Set the load policy
    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set how many trailing segments follow the issue id in comment ids
    pub fn with_comment_depth(mut self, depth: usize) -> Self {
        self.resolver = IdentityResolver::new(depth);
        self
    }

    /// Only load files with this extension (no leading dot)
    pub fn with_file_extension(mut self, extension: Option<String>) -> Self {
        self.file_extension = extension;
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the run at the next file boundary when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Load issues, then comments
    pub async fn run(&self, issues_dir: &Path, comments_dir: &Path) -> Result<LoadReport> {
        let issues = self.load_issues(issues_dir).await?;
        let comments = self.load_comments(comments_dir).await?;

        let report = LoadReport { issues, comments };
        info!(
            "Load complete: {} issues, {} comments attached, {} comments dropped",
            report.issues.entries_applied,
            report.comments.entries_applied,
            report.comments.comments_dropped
        );
        Ok(report)
    }

    /// Run the full load as a background task
    pub fn spawn(self, issues_dir: PathBuf, comments_dir: PathBuf) -> JoinHandle<Result<LoadReport>> {
        tokio::spawn(async move { self.run(&issues_dir, &comments_dir).await })
    }

    /// Insert every issue entry found under `dir`
    pub async fn load_issues(&self, dir: &Path) -> Result<PhaseReport> {
        self.load_phase(Phase::Issues, dir).await
    }

    /// Attach every comment entry found under `dir` to its issue
    pub async fn load_comments(&self, dir: &Path) -> Result<PhaseReport> {
        self.load_phase(Phase::Comments, dir).await
    }

    async fn load_phase(&self, phase: Phase, dir: &Path) -> Result<PhaseReport> {
        info!("Loading {} from {}", phase, dir.display());
        let mut report = PhaseReport::default();

        self.check_cancelled(phase)?;
        for path in self.export_files(dir)? {
            self.check_cancelled(phase)?;

            let resolved = match self.read_file(phase, &path).await {
                Ok(resolved) => resolved,
                Err(e) if self.policy == LoadPolicy::SkipAndLog && e.is_file_local() => {
                    warn!("Skipping {}: {}", path.display(), e.error_chain());
                    report.files_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            debug!("Parsed {} entries from {}", resolved.len(), path.display());
            self.apply(phase, resolved, &mut report).await;
            report.files_parsed += 1;
        }

        info!(
            "Finished {}: {} files, {} skipped, {} applied",
            phase, report.files_parsed, report.files_skipped, report.entries_applied
        );
        Ok(report)
    }

    fn check_cancelled(&self, phase: Phase) -> Result<()> {
        if self.cancel.is_cancelled() {
            info!("Load cancelled during {} phase", phase);
            return Err(IssueFeedError::Cancelled);
        }
        Ok(())
    }

    /// Regular files under `dir`, recursively, in file-name order
    fn export_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(wanted) = &self.file_extension {
                let matches = entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == wanted);
                if !matches {
                    continue;
                }
            }
            files.push(entry.into_path());
        }
        Ok(files)
    }

    /// Parse one file and resolve every entry's key before anything is applied,
    /// so a skipped file leaves no partial state behind
    async fn read_file(&self, phase: Phase, path: &Path) -> Result<Vec<(IssueId, RawEntry)>> {
        let owned = path.to_path_buf();
        let entries = tokio::task::spawn_blocking(move || feed::parse_file(&owned)).await??;

        entries
            .into_iter()
            .map(|entry| -> Result<(IssueId, RawEntry)> {
                let id = match phase {
                    Phase::Issues => self.resolver.issue_id(&entry.id)?,
                    Phase::Comments => self.resolver.parent_issue_id(&entry.id)?,
                };
                Ok((id, entry))
            })
            .collect()
    }

    async fn apply(&self, phase: Phase, resolved: Vec<(IssueId, RawEntry)>, report: &mut PhaseReport) {
        for (id, entry) in resolved {
            match phase {
                Phase::Issues => {
                    self.storage.insert(Issue::from_entry(id, entry)).await;
                    report.entries_applied += 1;
                }
                Phase::Comments => {
                    let comment_id = entry.id.clone();
                    if self.storage.attach_comment(id, entry).await {
                        report.entries_applied += 1;
                    } else {
                        debug!("Dropping comment {}: issue {} not loaded", comment_id, id);
                        report.comments_dropped += 1;
                    }
                }
            }
        }
    }
}
