use super::storage::IssueStorage;
use super::Issue;
use crate::feed::RawEntry;
use crate::identity::IssueId;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// A comment together with the issue it is attached to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueComment {
    /// Owning issue
    pub issue_id: IssueId,
    /// The comment entry
    pub comment: RawEntry,
}

/// Read-only views over an [`IssueStorage`]
///
/// Every multi-issue query is one full scan. Results are owned and
/// unordered; use [`super::sort_by_id`] before display.
#[derive(Clone)]
pub struct IssueQuery {
    storage: Arc<dyn IssueStorage>,
}

impl IssueQuery {
    /// Query over `storage`
    pub fn new(storage: Arc<dyn IssueStorage>) -> Self {
        Self { storage }
    }

    /// The underlying storage
    pub fn storage(&self) -> &Arc<dyn IssueStorage> {
        &self.storage
    }

    /// Point lookup
    pub async fn find_by_id(&self, id: IssueId) -> Option<Arc<Issue>> {
        self.storage.find_by_id(id).await
    }

    async fn filter<P>(&self, mut predicate: P) -> Vec<Arc<Issue>>
    where
        P: FnMut(&Issue) -> bool + Send,
    {
        let mut matches = Vec::new();
        self.storage
            .scan(&mut |issue: &Arc<Issue>| {
                if predicate(issue) {
                    matches.push(Arc::clone(issue));
                }
            })
            .await;
        matches
    }

    /// Issues carrying label `name`, matched exactly
    pub async fn find_by_tag(&self, name: &str) -> Vec<Arc<Issue>> {
        self.filter(|issue| issue.has_label(name)).await
    }

    /// Number of issues carrying label `name`
    pub async fn count_by_tag(&self, name: &str) -> usize {
        let mut count = 0;
        self.storage
            .scan(&mut |issue: &Arc<Issue>| {
                if issue.has_label(name) {
                    count += 1;
                }
            })
            .await;
        count
    }

    /// Issues whose status equals `status`
    pub async fn find_by_status(&self, status: &str) -> Vec<Arc<Issue>> {
        self.filter(|issue| issue.status == status).await
    }

    /// Issues carrying label `name` whose status equals `status`
    ///
    /// Filters the result of [`Self::find_by_tag`]. Issues are immutable once
    /// handed out, so the status check reads the same scan the tag check did.
    pub async fn find_by_tag_and_status(&self, name: &str, status: &str) -> Vec<Arc<Issue>> {
        let mut issues = self.find_by_tag(name).await;
        issues.retain(|issue| issue.status == status);
        issues
    }

    /// Distinct labels in first-seen order
    pub async fn all_tags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut tags = Vec::new();
        self.storage
            .scan(&mut |issue: &Arc<Issue>| {
                for label in &issue.labels {
                    if seen.insert(label.clone()) {
                        tags.push(label.clone());
                    }
                }
            })
            .await;
        tags
    }

    /// Distinct statuses in first-seen order
    pub async fn all_statuses(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut statuses = Vec::new();
        self.storage
            .scan(&mut |issue: &Arc<Issue>| {
                if seen.insert(issue.status.clone()) {
                    statuses.push(issue.status.clone());
                }
            })
            .await;
        statuses
    }

    /// Comments written by `author`, in issue-then-comment order
    pub async fn find_comments_by_author(&self, author: &str) -> Vec<IssueComment> {
        let mut comments = Vec::new();
        self.storage
            .scan(&mut |issue: &Arc<Issue>| {
                comments.extend(
                    issue
                        .comments
                        .iter()
                        .filter(|comment| comment.author == author)
                        .map(|comment| IssueComment {
                            issue_id: issue.id,
                            comment: comment.clone(),
                        }),
                );
            })
            .await;
        comments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::storage::InMemoryIssueStore;

    fn issue(id: i64, status: &str, labels: &[&str]) -> Issue {
        Issue::from_entry(
            IssueId::from(id),
            RawEntry {
                id: format!("p/issues/{id}"),
                status: status.to_string(),
                labels: labels.iter().map(|l| l.to_string()).collect(),
                ..RawEntry::default()
            },
        )
    }

    fn comment(issue: i64, n: i64, author: &str) -> RawEntry {
        RawEntry {
            id: format!("p/issues/{issue}/comments/{n}"),
            author: author.to_string(),
            content: format!("comment {n}"),
            ..RawEntry::default()
        }
    }

    fn ids(issues: &[Arc<Issue>]) -> Vec<i64> {
        let mut ids: Vec<i64> = issues.iter().map(|i| i.id.value()).collect();
        ids.sort();
        ids
    }

    async fn populated() -> IssueQuery {
        let store = InMemoryIssueStore::new();
        store.insert(issue(1, "open", &["a", "b"])).await;
        store.insert(issue(2, "closed", &["b", "c"])).await;
        store.insert(issue(3, "open", &["c", "c"])).await;
        store.insert(issue(4, "Open", &["bug"])).await;
        IssueQuery::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_find_by_tag_exact_match() {
        let query = populated().await;

        assert_eq!(ids(&query.find_by_tag("b").await), vec![1, 2]);
        assert_eq!(ids(&query.find_by_tag("c").await), vec![2, 3]);
        assert!(query.find_by_tag("B").await.is_empty());
        assert!(query.find_by_tag("bu").await.is_empty());
        assert!(query.find_by_tag("missing").await.is_empty());

        // Repeated calls without mutation agree
        assert_eq!(
            ids(&query.find_by_tag("b").await),
            ids(&query.find_by_tag("b").await)
        );
    }

    #[tokio::test]
    async fn test_count_by_tag() {
        let query = populated().await;

        assert_eq!(query.count_by_tag("c").await, 2);
        assert_eq!(query.count_by_tag("bug").await, 1);
        assert_eq!(query.count_by_tag("nope").await, 0);
    }

    #[tokio::test]
    async fn test_find_by_status_is_case_sensitive() {
        let query = populated().await;

        assert_eq!(ids(&query.find_by_status("open").await), vec![1, 3]);
        assert_eq!(ids(&query.find_by_status("Open").await), vec![4]);
        assert!(query.find_by_status("fixed").await.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_tag_and_status_is_subset() {
        let query = populated().await;

        let both = query.find_by_tag_and_status("c", "open").await;
        assert_eq!(ids(&both), vec![3]);

        let by_tag = ids(&query.find_by_tag("c").await);
        let by_status = ids(&query.find_by_status("open").await);
        for id in ids(&both) {
            assert!(by_tag.contains(&id));
            assert!(by_status.contains(&id));
        }
    }

    #[tokio::test]
    async fn test_all_tags_first_seen_order() {
        let store = InMemoryIssueStore::new();
        store.insert(issue(10, "open", &["a", "b"])).await;
        store.insert(issue(5, "open", &["b", "c"])).await;
        let query = IssueQuery::new(Arc::new(store));

        assert_eq!(query.all_tags().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_all_statuses_first_seen_order() {
        let query = populated().await;
        assert_eq!(query.all_statuses().await, vec!["open", "closed", "Open"]);
    }

    #[tokio::test]
    async fn test_empty_store_queries() {
        let query = IssueQuery::new(Arc::new(InMemoryIssueStore::new()));

        assert!(query.find_by_id(IssueId::from(1)).await.is_none());
        assert!(query.all_tags().await.is_empty());
        assert!(query.all_statuses().await.is_empty());
        assert!(query.find_comments_by_author("alice").await.is_empty());
    }

    #[tokio::test]
    async fn test_find_comments_by_author() {
        let store = InMemoryIssueStore::new();
        store.insert(issue(1, "open", &[])).await;
        store.insert(issue(2, "open", &[])).await;
        store.attach_comment(IssueId::from(1), comment(1, 1, "alice")).await;
        store.attach_comment(IssueId::from(1), comment(1, 2, "bob")).await;
        store.attach_comment(IssueId::from(2), comment(2, 1, "alice")).await;
        store.attach_comment(IssueId::from(1), comment(1, 3, "alice")).await;
        let query = IssueQuery::new(Arc::new(store));

        let found = query.find_comments_by_author("alice").await;
        let pairs: Vec<(i64, &str)> = found
            .iter()
            .map(|c| (c.issue_id.value(), c.comment.id.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (1, "p/issues/1/comments/1"),
                (1, "p/issues/1/comments/3"),
                (2, "p/issues/2/comments/1"),
            ]
        );
        assert!(query.find_comments_by_author("Alice").await.is_empty());
    }

    #[tokio::test]
    async fn test_results_are_not_live() {
        let store = Arc::new(InMemoryIssueStore::new());
        store.insert(issue(1, "open", &["bug"])).await;
        let query = IssueQuery::new(store.clone());

        let before = query.find_by_tag("bug").await;
        store.insert(issue(2, "open", &["bug"])).await;
        store.attach_comment(IssueId::from(1), comment(1, 1, "alice")).await;

        assert_eq!(ids(&before), vec![1]);
        assert!(before[0].comments.is_empty());
        assert_eq!(ids(&query.find_by_tag("bug").await), vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_tag_and_status_under_concurrent_inserts() {
        let store = Arc::new(InMemoryIssueStore::new());
        let query = IssueQuery::new(store.clone());

        let writer = tokio::spawn(async move {
            for n in 0..500 {
                let status = if n % 2 == 0 { "open" } else { "closed" };
                store.insert(issue(n, status, &["bug"])).await;
            }
        });

        for _ in 0..50 {
            for found in query.find_by_tag_and_status("bug", "open").await {
                assert!(found.has_label("bug"));
                assert_eq!(found.status, "open");
            }
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();

        assert_eq!(query.find_by_tag_and_status("bug", "open").await.len(), 250);
    }
}
