use super::Issue;
use crate::feed::RawEntry;
use crate::identity::IssueId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

/// Trait for issue storage operations
///
/// Every operation is one critical section. A full scan sees the store as it
/// was at a single point between writes.
#[async_trait]
pub trait IssueStorage: Send + Sync {
    /// Store `issue` under its id, replacing any issue already there
    async fn insert(&self, issue: Issue);

    /// Append `comment` to the issue with `issue_id`
    ///
    /// Returns `false`, and drops the comment, when no such issue exists.
    async fn attach_comment(&self, issue_id: IssueId, comment: RawEntry) -> bool;

    /// Point lookup
    async fn find_by_id(&self, id: IssueId) -> Option<Arc<Issue>>;

    /// Visit every issue in first-insertion order while holding the store's lock
    async fn scan(&self, visit: &mut (dyn for<'a> FnMut(&'a Arc<Issue>) + Send));

    /// Number of issues
    async fn len(&self) -> usize;

    /// Whether the store holds no issues
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All issues, in first-insertion order, as of one scan
    async fn snapshot(&self) -> Vec<Arc<Issue>> {
        let mut issues = Vec::new();
        self.scan(&mut |issue: &Arc<Issue>| issues.push(Arc::clone(issue)))
            .await;
        issues
    }

    /// Total number of attached comments across all issues
    async fn comment_count(&self) -> usize {
        let mut count = 0;
        self.scan(&mut |issue: &Arc<Issue>| count += issue.comments.len())
            .await;
        count
    }
}

/// Slots in first-insertion order plus an id index into them
#[derive(Debug, Default)]
struct StoreInner {
    slots: Vec<Arc<Issue>>,
    index: HashMap<IssueId, usize>,
}

/// In-memory issue store guarded by a single lock
///
/// Issues are held behind `Arc` so scans hand out cheap clones. Attaching a
/// comment copies the issue only when a reader still holds the old version.
#[derive(Debug, Default)]
pub struct InMemoryIssueStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryIssueStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IssueStorage for InMemoryIssueStore {
    async fn insert(&self, issue: Issue) {
        let mut inner = self.inner.write().await;
        let id = issue.id;
        let issue = Arc::new(issue);

        match inner.index.get(&id).copied() {
            Some(slot) => {
                trace!("Replacing issue {}", id);
                inner.slots[slot] = issue;
            }
            None => {
                let slot = inner.slots.len();
                inner.slots.push(issue);
                inner.index.insert(id, slot);
            }
        }
    }

    async fn attach_comment(&self, issue_id: IssueId, comment: RawEntry) -> bool {
        let mut inner = self.inner.write().await;
        let Some(slot) = inner.index.get(&issue_id).copied() else {
            return false;
        };
        Arc::make_mut(&mut inner.slots[slot]).comments.push(comment);
        true
    }

    async fn find_by_id(&self, id: IssueId) -> Option<Arc<Issue>> {
        let inner = self.inner.read().await;
        inner
            .index
            .get(&id)
            .map(|&slot| Arc::clone(&inner.slots[slot]))
    }

    async fn scan(&self, visit: &mut (dyn for<'a> FnMut(&'a Arc<Issue>) + Send)) {
        let inner = self.inner.read().await;
        for issue in &inner.slots {
            visit(issue);
        }
    }

    async fn len(&self) -> usize {
        self.inner.read().await.slots.len()
    }
}
