use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::Duration;

/// Store operation kinds that are timed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Issue insertion
    Insert,
    /// Comment attachment
    Attach,
    /// Point lookup
    Lookup,
    /// Full scan
    Scan,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Insert => "insert",
            Operation::Attach => "attach",
            Operation::Lookup => "lookup",
            Operation::Scan => "scan",
        };
        f.write_str(name)
    }
}

/// Counter pair for one operation kind
#[derive(Debug, Default)]
struct OperationStats {
    count: AtomicU64,
    total_micros: AtomicU64,
}

impl OperationStats {
    fn record(&self, duration: Duration) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    fn load(&self) -> (u64, f64) {
        let count = self.count.load(Ordering::Relaxed);
        let total = self.total_micros.load(Ordering::Relaxed);
        let avg = if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        };
        (count, avg)
    }

    fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.total_micros.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
struct MetricsInner {
    insert: OperationStats,
    attach: OperationStats,
    lookup: OperationStats,
    scan: OperationStats,
}

/// Lock-free operation counters, cheap to clone and share
#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    inner: Arc<MetricsInner>,
}

impl PerformanceMetrics {
    /// Create zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    fn stats(&self, operation: Operation) -> &OperationStats {
        match operation {
            Operation::Insert => &self.inner.insert,
            Operation::Attach => &self.inner.attach,
            Operation::Lookup => &self.inner.lookup,
            Operation::Scan => &self.inner.scan,
        }
    }

    /// Record one completed operation
    pub fn record_operation(&self, operation: Operation, duration: Duration) {
        self.stats(operation).record(duration);
    }

    /// Read the current counters
    pub fn get_stats(&self) -> MetricsSnapshot {
        let (insert_ops, avg_insert_time) = self.inner.insert.load();
        let (attach_ops, avg_attach_time) = self.inner.attach.load();
        let (lookup_ops, avg_lookup_time) = self.inner.lookup.load();
        let (scan_ops, avg_scan_time) = self.inner.scan.load();

        MetricsSnapshot {
            insert_ops,
            attach_ops,
            lookup_ops,
            scan_ops,
            avg_insert_time,
            avg_attach_time,
            avg_lookup_time,
            avg_scan_time,
        }
    }

    /// Zero all counters
    pub fn reset(&self) {
        for op in [
            Operation::Insert,
            Operation::Attach,
            Operation::Lookup,
            Operation::Scan,
        ] {
            self.stats(op).reset();
        }
    }
}

/// Point-in-time copy of [`PerformanceMetrics`]; times are in microseconds
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Inserts recorded
    pub insert_ops: u64,
    /// Comment attachments recorded
    pub attach_ops: u64,
    /// Point lookups recorded
    pub lookup_ops: u64,
    /// Full scans recorded
    pub scan_ops: u64,

    /// Mean insert time
    pub avg_insert_time: f64,
    /// Mean attach time
    pub avg_attach_time: f64,
    /// Mean lookup time
    pub avg_lookup_time: f64,
    /// Mean scan time
    pub avg_scan_time: f64,
}

impl MetricsSnapshot {
    fn entries(&self) -> [(Operation, u64, f64); 4] {
        [
            (Operation::Insert, self.insert_ops, self.avg_insert_time),
            (Operation::Attach, self.attach_ops, self.avg_attach_time),
            (Operation::Lookup, self.lookup_ops, self.avg_lookup_time),
            (Operation::Scan, self.scan_ops, self.avg_scan_time),
        ]
    }

    /// Operations of every kind
    pub fn total_operations(&self) -> u64 {
        self.insert_ops + self.attach_ops + self.lookup_ops + self.scan_ops
    }

    /// Mean time across all operations, weighted by count
    pub fn overall_avg_time(&self) -> f64 {
        let total_ops = self.total_operations();
        if total_ops == 0 {
            return 0.0;
        }
        let total_time: f64 = self
            .entries()
            .iter()
            .map(|(_, count, avg)| *count as f64 * avg)
            .sum();
        total_time / total_ops as f64
    }

    /// The operation kind with the highest mean time, if any ran
    pub fn slowest_operation(&self) -> Option<Operation> {
        self.entries()
            .into_iter()
            .filter(|(_, count, _)| *count > 0)
            .max_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(op, _, _)| op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let stats = PerformanceMetrics::new().get_stats();

        assert_eq!(stats.total_operations(), 0);
        assert_eq!(stats.overall_avg_time(), 0.0);
        assert_eq!(stats.slowest_operation(), None);
    }

    #[test]
    fn test_record_multiple_operations() {
        let metrics = PerformanceMetrics::new();

        metrics.record_operation(Operation::Insert, Duration::from_micros(1000));
        metrics.record_operation(Operation::Attach, Duration::from_micros(500));
        metrics.record_operation(Operation::Lookup, Duration::from_micros(100));
        metrics.record_operation(Operation::Scan, Duration::from_micros(2400));

        let stats = metrics.get_stats();
        assert_eq!(stats.insert_ops, 1);
        assert_eq!(stats.attach_ops, 1);
        assert_eq!(stats.lookup_ops, 1);
        assert_eq!(stats.scan_ops, 1);
        assert_eq!(stats.avg_scan_time, 2400.0);
        assert_eq!(stats.total_operations(), 4);
        assert_eq!(stats.overall_avg_time(), 1000.0); // (1000 + 500 + 100 + 2400) / 4
        assert_eq!(stats.slowest_operation(), Some(Operation::Scan));
    }

    #[test]
    fn test_average_over_same_operation() {
        let metrics = PerformanceMetrics::new();

        metrics.record_operation(Operation::Lookup, Duration::from_micros(1000));
        metrics.record_operation(Operation::Lookup, Duration::from_micros(2000));
        metrics.record_operation(Operation::Lookup, Duration::from_micros(3000));

        let stats = metrics.get_stats();
        assert_eq!(stats.lookup_ops, 3);
        assert_eq!(stats.avg_lookup_time, 2000.0);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = PerformanceMetrics::new();
        metrics.record_operation(Operation::Insert, Duration::from_micros(10));
        metrics.reset();

        assert_eq!(metrics.get_stats().total_operations(), 0);
    }

    #[test]
    fn test_clones_share_counters_across_threads() {
        let metrics = PerformanceMetrics::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.record_operation(Operation::Insert, Duration::from_micros(1));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.get_stats().insert_ops, 800);
    }
}
