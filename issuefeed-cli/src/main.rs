use std::process;
mod cli;
mod completions;
mod error;
mod exit_codes;
mod load;
mod query;
mod session;

use clap::CommandFactory;
use cli::{Cli, Commands, OutputFormat};
use error::{handle_cli_result, CliResult};
use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_WARNING};
use issuefeed::{Config, IssueQuery};
use session::{resolve_config, Session};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // Fast path for help
    let Some(command) = &cli.command else {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("Failed to print help: {}", e);
            process::exit(EXIT_ERROR);
        }
        process::exit(EXIT_SUCCESS);
    };

    use tracing::Level;
    use tracing_subscriber::EnvFilter;

    let log_level = if cli.quiet {
        Level::ERROR
    } else if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::TRACE
    } else {
        Level::INFO
    };

    // RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(log_level.into()));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let exit_code = match command {
        Commands::Completion { shell } => {
            tracing::debug!("Generating completion for {:?}", shell);
            run_completions(*shell)
        }
        Commands::Config { example } => handle_cli_result(run_config(&cli, *example)),
        _ => handle_cli_result(run_with_store(&cli, command).await),
    };

    process::exit(exit_code);
}

fn run_completions(shell: clap_complete::Shell) -> i32 {
    match completions::print_completion(shell) {
        Ok(_) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Completion error: {}", e);
            EXIT_WARNING
        }
    }
}

fn run_config(cli: &Cli, example: bool) -> CliResult<()> {
    if example {
        print!("{}", Config::example_yaml_config());
        return Ok(());
    }

    let config = resolve_config(cli)?;
    let extension = config.file_extension.as_deref().unwrap_or("");
    match cli.format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "issues_dir": config.issues_dir,
                "comments_dir": config.comments_dir,
                "load_policy": config.load_policy.to_string(),
                "comment_id_depth": config.comment_id_depth,
                "file_extension": config.file_extension,
            });
            println!("{}", serde_json::to_string_pretty(&value).map_err(anyhow::Error::from)?);
        }
        OutputFormat::Table => {
            println!("issues_dir: {}", config.issues_dir.display());
            println!("comments_dir: {}", config.comments_dir.display());
            println!("load_policy: {}", config.load_policy);
            println!("comment_id_depth: {}", config.comment_id_depth);
            println!("file_extension: {}", extension);
        }
    }
    Ok(())
}

async fn run_with_store(cli: &Cli, command: &Commands) -> CliResult<()> {
    let config = resolve_config(cli)?;
    tracing::debug!("Resolved configuration: {:?}", config);
    let mut session = Session::start(&config);

    if let Commands::Load = command {
        return load::run_load_command(&mut session, cli.format).await;
    }

    if cli.no_wait {
        let result = run_query(&session.query, command, cli.format).await;
        session.abandon();
        return result;
    }

    session.wait().await?;
    run_query(&session.query, command, cli.format).await
}

async fn run_query(issue_query: &IssueQuery, command: &Commands, format: OutputFormat) -> CliResult<()> {
    match command {
        Commands::Show { id } => query::show_issue(issue_query, *id, format).await,
        Commands::Tag { name, status } => {
            query::list_tag(issue_query, name, status.as_deref(), format).await
        }
        Commands::Tags { counts } => query::list_tags(issue_query, *counts, format).await,
        Commands::Status { status } => query::list_status(issue_query, status, format).await,
        Commands::Statuses => query::list_statuses(issue_query, format).await,
        Commands::Comments { author } => query::list_comments(issue_query, author, format).await,
        Commands::Load | Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}
