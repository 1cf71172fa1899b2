use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use issuefeed::LoadPolicy;
use std::io;
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LoadPolicyArg {
    /// Stop at the first file that cannot be loaded
    FailFast,
    /// Log and skip files that cannot be loaded
    SkipAndLog,
}

impl From<LoadPolicyArg> for LoadPolicy {
    fn from(arg: LoadPolicyArg) -> Self {
        match arg {
            LoadPolicyArg::FailFast => LoadPolicy::FailFast,
            LoadPolicyArg::SkipAndLog => LoadPolicy::SkipAndLog,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "issuefeed")]
#[command(version)]
#[command(about = "Query issue-tracker feed exports")]
#[command(long_about = "
issuefeed loads issue and comment feed exports into memory and answers
queries against them. Issues are loaded from the issues directory first,
then comments are attached from the comments directory.

Settings are read from ISSUEFEED_* environment variables and an
issuefeed.yaml file; flags given here take precedence over both.

Example usage:
  issuefeed show 42                 # Show one issue with its comments
  issuefeed tag bug                 # Issues labelled 'bug'
  issuefeed tag bug New             # Issues labelled 'bug' with status 'New'
  issuefeed tags                    # Every label, in first-seen order
  issuefeed comments alice          # Comments written by alice
  issuefeed load                    # Load only and print a summary
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding issue export files
    #[arg(long, global = true, value_name = "DIR")]
    pub issues_dir: Option<PathBuf>,

    /// Directory holding comment export files
    #[arg(long, global = true, value_name = "DIR")]
    pub comments_dir: Option<PathBuf>,

    /// What to do with a file that cannot be loaded
    #[arg(long, global = true, value_enum)]
    pub load_policy: Option<LoadPolicyArg>,

    /// Path segments after the issue id in comment ids
    #[arg(long, global = true, value_name = "N")]
    pub comment_depth: Option<usize>,

    /// Only load files with this extension
    #[arg(long, global = true, value_name = "EXT")]
    pub extension: Option<String>,

    /// Query without waiting for loading to finish
    #[arg(long, global = true)]
    pub no_wait: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the exports and print a summary
    #[command(long_about = "
Loads both export directories and prints how many files were parsed or
skipped and how many issues and comments were stored, followed by store
operation timings.

Exit codes:
  0 - Load completed
  2 - Load failed

Example:
  issuefeed load --issues-dir export/issues --comments-dir export/comments
  issuefeed load --load-policy skip-and-log
")]
    Load,
    /// Show one issue with its comments
    Show {
        /// Issue id
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// List issues carrying a label, optionally narrowed by status
    #[command(long_about = "
Lists the issues carrying a label, ordered by id. Labels match exactly
and case-sensitively. With a status, only issues in that status are shown.

Examples:
  issuefeed tag Type-Defect
  issuefeed tag Type-Defect Accepted
  issuefeed tag bug --format json
")]
    Tag {
        /// Label to match
        name: String,

        /// Status to match
        status: Option<String>,
    },
    /// List every label in first-seen order
    Tags {
        /// Show how many issues carry each label
        #[arg(short, long)]
        counts: bool,
    },
    /// List issues in a status
    Status {
        /// Status to match
        status: String,
    },
    /// List every status in first-seen order
    Statuses,
    /// List comments written by an author
    Comments {
        /// Author name
        author: String,
    },
    /// Print the effective configuration
    Config {
        /// Print an example issuefeed.yaml instead
        #[arg(long)]
        example: bool,
    },
    /// Generate shell completion scripts
    #[command(long_about = "
Generates shell completion scripts for various shells.

Examples:
  # Bash
  issuefeed completion bash > ~/.local/share/bash-completion/completions/issuefeed

  # Zsh
  issuefeed completion zsh > ~/.zfunc/_issuefeed

  # Fish
  issuefeed completion fish > ~/.config/fish/completions/issuefeed.fish
")]
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    #[allow(dead_code)]
    pub fn try_parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(args)
    }

    pub fn is_tty() -> bool {
        io::stdout().is_terminal()
    }

    pub fn should_use_color() -> bool {
        Self::is_tty() && std::env::var("NO_COLOR").is_err()
    }
}
