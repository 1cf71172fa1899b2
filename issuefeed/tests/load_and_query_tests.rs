//! End-to-end loading of export directories followed by queries

use issuefeed::{
    sort_by_id, FeedLoader, InMemoryIssueStore, InstrumentedIssueStorage, IssueId, IssueQuery,
    IssueStorage, LoadPolicy,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const FEED_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:issues="http://schemas.google.com/projecthosting/issues/2009">"#;

fn write_feed(dir: &Path, name: &str, entries: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), format!("{FEED_HEADER}{entries}</feed>")).unwrap();
}

fn export_dirs() -> (TempDir, PathBuf, PathBuf) {
    let temp = TempDir::new().unwrap();
    let issues = temp.path().join("issues");
    let comments = temp.path().join("comments");
    fs::create_dir_all(&issues).unwrap();
    fs::create_dir_all(&comments).unwrap();
    (temp, issues, comments)
}

#[tokio::test]
async fn test_single_issue_with_comment() {
    let (_temp, issues_dir, comments_dir) = export_dirs();
    write_feed(
        &issues_dir,
        "issues.xml",
        r#"<entry>
  <id>http://example.org/p/demo/issues/42</id>
  <title>Crash</title>
  <issues:status>open</issues:status>
  <issues:label>bug</issues:label>
</entry>"#,
    );
    write_feed(
        &comments_dir,
        "comments.xml",
        r#"<entry>
  <id>http://example.org/p/demo/issues/42/comments/1</id>
  <author><name>alice</name></author>
  <content type="html">Confirmed</content>
</entry>"#,
    );

    let storage: Arc<dyn IssueStorage> = Arc::new(InMemoryIssueStore::new());
    let query = IssueQuery::new(storage.clone());
    FeedLoader::new(storage)
        .run(&issues_dir, &comments_dir)
        .await
        .unwrap();

    let issue = query.find_by_id(IssueId::from(42)).await.unwrap();
    assert_eq!(issue.comments.len(), 1);

    let by_alice = query.find_comments_by_author("alice").await;
    assert_eq!(by_alice.len(), 1);
    assert_eq!(by_alice[0].issue_id, IssueId::from(42));
    assert_eq!(by_alice[0].comment.content, "Confirmed");

    let bugs: Vec<IssueId> = query.find_by_tag("bug").await.iter().map(|i| i.id).collect();
    assert_eq!(bugs, vec![IssueId::from(42)]);
    assert!(query.find_by_status("closed").await.is_empty());
}

#[tokio::test]
async fn test_tags_statuses_and_display_order() {
    let (_temp, issues_dir, comments_dir) = export_dirs();
    write_feed(
        &issues_dir,
        "a.xml",
        r#"<entry><id>p/issues/30</id><issues:status>New</issues:status>
  <issues:label>a</issues:label><issues:label>b</issues:label></entry>"#,
    );
    write_feed(
        &issues_dir,
        "b.xml",
        r#"<entry><id>p/issues/4</id><issues:status>Fixed</issues:status>
  <issues:label>b</issues:label><issues:label>c</issues:label></entry>
<entry><id>p/issues/12</id><issues:status>New</issues:status>
  <issues:label>b</issues:label></entry>"#,
    );

    let storage: Arc<dyn IssueStorage> = Arc::new(InMemoryIssueStore::new());
    let query = IssueQuery::new(storage.clone());
    FeedLoader::new(storage)
        .run(&issues_dir, &comments_dir)
        .await
        .unwrap();

    assert_eq!(query.all_tags().await, vec!["a", "b", "c"]);
    assert_eq!(query.all_statuses().await, vec!["New", "Fixed"]);
    assert_eq!(query.count_by_tag("b").await, 3);

    let mut tagged = query.find_by_tag("b").await;
    sort_by_id(&mut tagged);
    let ids: Vec<i64> = tagged.iter().map(|i| i.id.value()).collect();
    assert_eq!(ids, vec![4, 12, 30]);

    let mut new_b = query.find_by_tag_and_status("b", "New").await;
    sort_by_id(&mut new_b);
    let ids: Vec<i64> = new_b.iter().map(|i| i.id.value()).collect();
    assert_eq!(ids, vec![12, 30]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_queries_while_loading_in_background() {
    let (_temp, issues_dir, comments_dir) = export_dirs();
    for n in 0..20 {
        write_feed(
            &issues_dir,
            &format!("{n:03}.xml"),
            &format!(
                "<entry><id>p/issues/{n}</id><issues:status>open</issues:status>\
                 <issues:label>bug</issues:label></entry>"
            ),
        );
        write_feed(
            &comments_dir,
            &format!("{n:03}.xml"),
            &format!("<entry><id>p/issues/{n}/comments/1</id><author><name>bot</name></author></entry>"),
        );
    }

    let storage: Arc<dyn IssueStorage> = Arc::new(InMemoryIssueStore::new());
    let query = IssueQuery::new(storage.clone());
    let handle = FeedLoader::new(storage).spawn(issues_dir, comments_dir);

    let mut last = 0;
    while !handle.is_finished() {
        let seen = query.find_by_tag("bug").await.len();
        assert!(seen >= last);
        last = seen;
        tokio::task::yield_now().await;
    }

    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.issues.entries_applied, 20);
    assert_eq!(report.comments.entries_applied, 20);
    assert_eq!(query.find_comments_by_author("bot").await.len(), 20);
}

#[tokio::test]
async fn test_tolerant_load_through_instrumented_storage() {
    let (_temp, issues_dir, comments_dir) = export_dirs();
    write_feed(&issues_dir, "good.xml", "<entry><id>p/issues/1</id></entry>");
    fs::write(issues_dir.join("broken.xml"), "<feed><entry><id>2").unwrap();
    write_feed(
        &comments_dir,
        "c.xml",
        "<entry><id>p/issues/1/comments/1</id></entry>\
         <entry><id>p/issues/2/comments/1</id></entry>",
    );

    let instrumented = Arc::new(InstrumentedIssueStorage::new(Box::new(
        InMemoryIssueStore::new(),
    )));
    let report = FeedLoader::new(instrumented.clone())
        .with_policy(LoadPolicy::SkipAndLog)
        .run(&issues_dir, &comments_dir)
        .await
        .unwrap();

    assert_eq!(report.issues.files_skipped, 1);
    assert_eq!(report.comments.comments_dropped, 1);

    let metrics = instrumented.get_metrics_snapshot();
    assert_eq!(metrics.insert_ops, 1);
    assert_eq!(metrics.attach_ops, 2);
    assert_eq!(instrumented.comment_count().await, 1);
}
