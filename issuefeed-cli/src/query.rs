use anyhow::Result;
use colored::*;
use issuefeed::{sort_by_id, Issue, IssueComment, IssueId, IssueQuery};
use std::sync::Arc;
use tabled::{
    settings::{object::Rows, Alignment, Color, Style},
    Table, Tabled,
};

use crate::cli::{Cli, OutputFormat};
use crate::error::{CliError, CliResult, IntoCliResult};
use crate::exit_codes::{EXIT_ERROR, EXIT_WARNING};

const CONTENT_WIDTH: usize = 60;

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Labels")]
    labels: String,
    #[tabled(rename = "Comments")]
    comments: usize,
}

#[derive(Tabled)]
struct CommentRow {
    #[tabled(rename = "Issue")]
    issue: i64,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Published")]
    published: String,
    #[tabled(rename = "Content")]
    content: String,
}

#[derive(Tabled)]
struct NameRow {
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled, serde::Serialize)]
struct TagCountRow {
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Issues")]
    issues: usize,
}

fn not_found(message: String) -> CliError {
    CliError::new(message, EXIT_WARNING)
}

fn truncate(text: &str, width: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > width {
        let head: String = flat.chars().take(width.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        flat
    }
}

fn finish_table(mut table: Table) -> String {
    table.with(Style::modern());
    if Cli::should_use_color() {
        table.modify(Rows::first(), Color::FG_BRIGHT_CYAN);
    }
    table.modify(Rows::new(1..), Alignment::left());
    table.to_string()
}

fn render_issues(issues: &[Arc<Issue>], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let plain: Vec<&Issue> = issues.iter().map(|issue| issue.as_ref()).collect();
            Ok(serde_json::to_string_pretty(&plain)?)
        }
        OutputFormat::Table => {
            let rows = issues.iter().map(|issue| IssueRow {
                id: issue.id.value(),
                status: issue.status.clone(),
                title: truncate(&issue.title, CONTENT_WIDTH),
                labels: issue.labels.join(", "),
                comments: issue.comments.len(),
            });
            Ok(finish_table(Table::new(rows)))
        }
    }
}

fn render_comments(comments: &[IssueComment], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(comments)?),
        OutputFormat::Table => {
            let rows = comments.iter().map(|c| CommentRow {
                issue: c.issue_id.value(),
                author: c.comment.author.clone(),
                published: c
                    .comment
                    .published
                    .map(|p| p.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                content: truncate(&c.comment.content, CONTENT_WIDTH),
            });
            Ok(finish_table(Table::new(rows)))
        }
    }
}

fn render_names(names: &[String], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(names)?),
        OutputFormat::Table => {
            let rows = names.iter().map(|name| NameRow { name: name.clone() });
            Ok(finish_table(Table::new(rows)))
        }
    }
}

fn render_issue_detail(issue: &Issue, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(issue)?);
    }

    let mut out = String::new();
    let heading = format!("Issue {}: {}", issue.id, issue.title);
    if Cli::should_use_color() {
        out.push_str(&heading.as_str().bold().to_string());
    } else {
        out.push_str(&heading);
    }
    out.push('\n');
    out.push_str(&format!("Status:    {}\n", issue.status));
    if let Some(published) = issue.published {
        out.push_str(&format!("Published: {}\n", published.to_rfc3339()));
    }
    if !issue.labels.is_empty() {
        out.push_str(&format!("Labels:    {}\n", issue.labels.join(", ")));
    }
    if !issue.content.as_str().is_empty() {
        out.push('\n');
        out.push_str(issue.content.as_str());
        out.push('\n');
    }

    out.push_str(&format!("\nComments ({})\n", issue.comments.len()));
    if !issue.comments.is_empty() {
        let comments: Vec<IssueComment> = issue
            .comments
            .iter()
            .map(|comment| IssueComment {
                issue_id: issue.id,
                comment: comment.clone(),
            })
            .collect();
        out.push_str(&render_comments(&comments, OutputFormat::Table)?);
        out.push('\n');
    }
    Ok(out)
}

fn print(rendered: String) {
    println!("{}", rendered.trim_end());
}

/// Show one issue
pub async fn show_issue(query: &IssueQuery, id: i64, format: OutputFormat) -> CliResult<()> {
    let issue = query
        .find_by_id(IssueId::from(id))
        .await
        .ok_or_else(|| not_found(format!("Issue {id} not found")))?;

    print(render_issue_detail(&issue, format)?);
    Ok(())
}

/// List issues carrying `name`, optionally narrowed to `status`
pub async fn list_tag(
    query: &IssueQuery,
    name: &str,
    status: Option<&str>,
    format: OutputFormat,
) -> CliResult<()> {
    let mut issues = match status {
        Some(status) => query.find_by_tag_and_status(name, status).await,
        None => query.find_by_tag(name).await,
    };

    if issues.is_empty() {
        return Err(not_found(match status {
            Some(status) => format!("Tag/Status {name:?}/{status:?} not found"),
            None => format!("Tag {name:?} not found"),
        }));
    }

    sort_by_id(&mut issues);
    print(render_issues(&issues, format)?);
    Ok(())
}

/// List issues in `status`
pub async fn list_status(query: &IssueQuery, status: &str, format: OutputFormat) -> CliResult<()> {
    let mut issues = query.find_by_status(status).await;
    if issues.is_empty() {
        return Err(not_found(format!("Status {status:?} not found")));
    }

    sort_by_id(&mut issues);
    print(render_issues(&issues, format)?);
    Ok(())
}

/// List every label, optionally with per-label issue counts
pub async fn list_tags(query: &IssueQuery, counts: bool, format: OutputFormat) -> CliResult<()> {
    let tags = query.all_tags().await;
    if tags.is_empty() {
        return Err(not_found("No tags found".to_string()));
    }

    if !counts {
        print(render_names(&tags, format)?);
        return Ok(());
    }

    let mut rows = Vec::with_capacity(tags.len());
    for tag in tags {
        let issues = query.count_by_tag(&tag).await;
        rows.push(TagCountRow { tag, issues });
    }

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&rows).cli_error(EXIT_ERROR)?,
        OutputFormat::Table => finish_table(Table::new(rows)),
    };
    print(rendered);
    Ok(())
}

/// List every status
pub async fn list_statuses(query: &IssueQuery, format: OutputFormat) -> CliResult<()> {
    let statuses = query.all_statuses().await;
    if statuses.is_empty() {
        return Err(not_found("No statuses found".to_string()));
    }

    print(render_names(&statuses, format)?);
    Ok(())
}

/// List comments by `author`, ordered by issue id
pub async fn list_comments(query: &IssueQuery, author: &str, format: OutputFormat) -> CliResult<()> {
    let mut comments = query.find_comments_by_author(author).await;
    if comments.is_empty() {
        return Err(not_found(format!("Comments by {author:?} not found")));
    }

    comments.sort_by_key(|c| c.issue_id);
    print(render_comments(&comments, format)?);
    Ok(())
}
