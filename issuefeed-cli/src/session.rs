//! Resolving settings and starting the background load

use crate::cli::Cli;
use crate::error::{CliError, CliResult, IntoCliResult};
use crate::exit_codes::EXIT_ERROR;
use issuefeed::{
    Config, FeedLoader, InMemoryIssueStore, InstrumentedIssueStorage, IssueQuery, LoadReport,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Layer command-line flags over the environment and YAML configuration
pub fn resolve_config(cli: &Cli) -> CliResult<Config> {
    let mut config = Config::new();

    if let Some(dir) = &cli.issues_dir {
        config.issues_dir = dir.clone();
    }
    if let Some(dir) = &cli.comments_dir {
        config.comments_dir = dir.clone();
    }
    if let Some(policy) = cli.load_policy {
        config.load_policy = policy.into();
    }
    if let Some(depth) = cli.comment_depth {
        config.comment_id_depth = depth;
    }
    if let Some(ext) = &cli.extension {
        config.file_extension = Some(ext.trim_start_matches('.').to_string());
    }

    config.validate().cli_error(EXIT_ERROR)?;
    Ok(config)
}

/// A store being populated in the background
pub struct Session {
    pub query: IssueQuery,
    pub storage: Arc<InstrumentedIssueStorage>,
    load: JoinHandle<issuefeed::Result<LoadReport>>,
    cancel: CancellationToken,
}

impl Session {
    /// Start loading the directories named by `config`
    pub fn start(config: &Config) -> Self {
        let storage = Arc::new(InstrumentedIssueStorage::new(Box::new(
            InMemoryIssueStore::new(),
        )));
        let query = IssueQuery::new(storage.clone());

        let loader = FeedLoader::from_config(storage.clone(), config);
        let cancel = loader.cancellation_token();
        let load = loader.spawn(config.issues_dir.clone(), config.comments_dir.clone());

        Self {
            query,
            storage,
            load,
            cancel,
        }
    }

    /// Wait for the load to finish; call at most once
    pub async fn wait(&mut self) -> CliResult<LoadReport> {
        match (&mut self.load).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(e)) => Err(CliError::from_error(e, EXIT_ERROR)),
            Err(e) => Err(CliError::from_error(e, EXIT_ERROR)),
        }
    }

    /// Stop the load at the next file boundary without waiting for it
    pub fn abandon(self) {
        self.cancel.cancel();
        tracing::debug!("Abandoned background load");
    }
}
