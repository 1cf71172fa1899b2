//! Configuration management for issuefeed
//!
//! Values are resolved from defaults, then `ISSUEFEED_*` environment
//! variables, then an `issuefeed.yaml` file. Command-line flags are applied
//! on top by the caller.

use crate::common::env_loader::EnvLoader;
use crate::identity::DEFAULT_COMMENT_ID_DEPTH;
use crate::loader::LoadPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILENAME: &str = "issuefeed.yaml";
const ENV_PREFIX: &str = "ISSUEFEED";

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        /// Path to the configuration file that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML content from a configuration file
    #[error("Invalid YAML syntax in {path}:\n{source}\n\nHint: Check for proper indentation and YAML formatting")]
    YamlParse {
        /// Path to the configuration file with invalid YAML content
        path: PathBuf,
        /// Underlying YAML parsing error
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid configuration value for a specific field
    #[error("Invalid configuration value for '{field}': {value}\n{hint}")]
    InvalidValue {
        /// Name of the configuration field
        field: String,
        /// The invalid value
        value: String,
        /// How to fix it
        hint: String,
    },
}

/// Settings for a load run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding issue export files (default: "issues")
    pub issues_dir: PathBuf,
    /// Directory holding comment export files (default: "comments")
    pub comments_dir: PathBuf,
    /// What to do with a file that fails to parse (default: fail fast)
    pub load_policy: LoadPolicy,
    /// Trailing segments dropped from a comment id to reach its issue (default: 2)
    pub comment_id_depth: usize,
    /// Only parse files with this extension; `None` parses every file
    pub file_extension: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            issues_dir: PathBuf::from("issues"),
            comments_dir: PathBuf::from("comments"),
            load_policy: LoadPolicy::FailFast,
            comment_id_depth: DEFAULT_COMMENT_ID_DEPTH,
            file_extension: None,
        }
    }
}

impl Config {
    /// Create a configuration from defaults, environment and YAML file
    ///
    /// An unreadable or invalid YAML file is logged and ignored so that a
    /// broken config file never prevents a load.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.apply_env_vars();

        match YamlConfig::load_or_default() {
            Ok(yaml_config) => yaml_config.apply_to_config(&mut config),
            Err(e) => {
                tracing::warn!(
                    "Failed to load YAML configuration, falling back to env vars and defaults: {}",
                    e
                );
            }
        }

        config
    }

    fn apply_env_vars(&mut self) {
        let loader = EnvLoader::new(ENV_PREFIX);

        if let Some(dir) = loader.load_optional::<PathBuf>("ISSUES_DIR") {
            self.issues_dir = dir;
        }
        if let Some(dir) = loader.load_optional::<PathBuf>("COMMENTS_DIR") {
            self.comments_dir = dir;
        }
        self.load_policy = loader.load_parsed("LOAD_POLICY", self.load_policy);
        self.comment_id_depth = loader.load_parsed("COMMENT_ID_DEPTH", self.comment_id_depth);
        if let Some(ext) = loader.load_optional::<String>("FILE_EXTENSION") {
            self.file_extension = Some(ext);
        }
    }

    /// Find the issuefeed.yaml configuration file
    ///
    /// Searched in order: the working directory, `~/.config/issuefeed/`, `~`.
    pub fn find_yaml_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(CONFIG_FILENAME)];

        if let Some(home_dir) = dirs::home_dir() {
            search_paths.push(home_dir.join(".config").join("issuefeed").join(CONFIG_FILENAME));
            search_paths.push(home_dir.join(CONFIG_FILENAME));
        }

        let found = search_paths.into_iter().find(|p| p.is_file());
        match &found {
            Some(path) => tracing::debug!("Found configuration file: {:?}", path),
            None => tracing::debug!("No {} found in any search location", CONFIG_FILENAME),
        }
        found
    }

    /// Validate the current configuration settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::validate_dir(&self.issues_dir, "issues_dir")?;
        Self::validate_dir(&self.comments_dir, "comments_dir")?;

        if self.comment_id_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "comment_id_depth".to_string(),
                value: "0".to_string(),
                hint: "comment_id_depth must be at least 1 (use 2 for <issue>/comments/<n>)"
                    .to_string(),
            });
        }

        if let Some(ext) = &self.file_extension {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(ConfigError::InvalidValue {
                    field: "file_extension".to_string(),
                    value: ext.clone(),
                    hint: "file_extension must be non-empty and given without a leading dot"
                        .to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_dir(dir: &Path, field: &str) -> Result<(), ConfigError> {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                value: String::new(),
                hint: format!("{field} cannot be empty"),
            });
        }
        Ok(())
    }

    /// Generate an example YAML configuration file content
    pub fn example_yaml_config() -> &'static str {
        r#"# issuefeed.yaml
issues_dir: "export/issues"
comments_dir: "export/comments"
# fail-fast | skip-and-log
load_policy: fail-fast
# 2 for <issue>/comments/<n>, 3 for <issue>/comments/full/<n>
comment_id_depth: 2
"#
    }
}

/// Configuration loaded from an issuefeed.yaml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlConfig {
    /// Directory holding issue export files
    pub issues_dir: Option<PathBuf>,
    /// Directory holding comment export files
    pub comments_dir: Option<PathBuf>,
    /// Load policy
    pub load_policy: Option<LoadPolicy>,
    /// Comment identifier depth
    pub comment_id_depth: Option<usize>,
    /// Extension filter
    pub file_extension: Option<String>,
}

impl YamlConfig {
    /// Apply YAML configuration values to an existing Config
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(dir) = &self.issues_dir {
            config.issues_dir = dir.clone();
        }
        if let Some(dir) = &self.comments_dir {
            config.comments_dir = dir.clone();
        }
        if let Some(policy) = self.load_policy {
            config.load_policy = policy;
        }
        if let Some(depth) = self.comment_id_depth {
            config.comment_id_depth = depth;
        }
        if let Some(ext) = &self.file_extension {
            config.file_extension = Some(ext.clone());
        }
    }

    /// Load YAML configuration from a file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::info!("Loading YAML configuration from: {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Try to load YAML configuration, returning default if no file is found
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Config::find_yaml_config_file() {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }
}
