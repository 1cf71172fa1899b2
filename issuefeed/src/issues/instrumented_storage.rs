use super::metrics::{MetricsSnapshot, Operation, PerformanceMetrics};
use super::storage::IssueStorage;
use super::Issue;
use crate::feed::RawEntry;
use crate::identity::IssueId;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;

/// A storage wrapper that times every store operation
///
/// Derived operations (`snapshot`, `comment_count`) go through `scan` and are
/// counted as scans.
pub struct InstrumentedIssueStorage {
    storage: Box<dyn IssueStorage>,
    metrics: PerformanceMetrics,
}

impl InstrumentedIssueStorage {
    /// Wrap `storage`
    pub fn new(storage: Box<dyn IssueStorage>) -> Self {
        Self {
            storage,
            metrics: PerformanceMetrics::new(),
        }
    }

    /// Get access to the performance metrics collector
    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Get a snapshot of current performance metrics
    pub fn get_metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.get_stats()
    }

    /// Reset all performance metrics to zero
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }
}

#[async_trait]
impl IssueStorage for InstrumentedIssueStorage {
    async fn insert(&self, issue: Issue) {
        let start = Instant::now();
        self.storage.insert(issue).await;
        self.metrics
            .record_operation(Operation::Insert, start.elapsed());
    }

    async fn attach_comment(&self, issue_id: IssueId, comment: RawEntry) -> bool {
        let start = Instant::now();
        let attached = self.storage.attach_comment(issue_id, comment).await;
        self.metrics
            .record_operation(Operation::Attach, start.elapsed());
        attached
    }

    async fn find_by_id(&self, id: IssueId) -> Option<Arc<Issue>> {
        let start = Instant::now();
        let result = self.storage.find_by_id(id).await;
        self.metrics
            .record_operation(Operation::Lookup, start.elapsed());
        result
    }

    async fn scan(&self, visit: &mut (dyn for<'a> FnMut(&'a Arc<Issue>) + Send)) {
        let start = Instant::now();
        self.storage.scan(visit).await;
        self.metrics.record_operation(Operation::Scan, start.elapsed());
    }

    async fn len(&self) -> usize {
        self.storage.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::storage::InMemoryIssueStore;

    fn create_test_storage() -> InstrumentedIssueStorage {
        InstrumentedIssueStorage::new(Box::new(InMemoryIssueStore::new()))
    }

    fn issue(id: i64) -> Issue {
        Issue::from_entry(IssueId::from(id), RawEntry::default())
    }

    #[tokio::test]
    async fn test_instrumented_storage_creation() {
        let storage = create_test_storage();
        assert_eq!(storage.get_metrics_snapshot().total_operations(), 0);
    }

    #[tokio::test]
    async fn test_operations_are_counted_by_kind() {
        let storage = create_test_storage();

        storage.insert(issue(1)).await;
        storage.insert(issue(2)).await;
        assert!(storage.attach_comment(IssueId::from(1), RawEntry::default()).await);
        assert!(!storage.attach_comment(IssueId::from(3), RawEntry::default()).await);
        assert!(storage.find_by_id(IssueId::from(2)).await.is_some());
        assert_eq!(storage.snapshot().await.len(), 2);

        let snapshot = storage.get_metrics_snapshot();
        assert_eq!(snapshot.insert_ops, 2);
        assert_eq!(snapshot.attach_ops, 2);
        assert_eq!(snapshot.lookup_ops, 1);
        assert_eq!(snapshot.scan_ops, 1);
    }

    #[tokio::test]
    async fn test_reset_metrics_keeps_data() {
        let storage = create_test_storage();
        storage.insert(issue(1)).await;
        storage.reset_metrics();

        assert_eq!(storage.get_metrics_snapshot().total_operations(), 0);
        assert_eq!(storage.len().await, 1);
    }
}
