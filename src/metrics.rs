use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub uptime_seconds: u64,
    pub total_uploads: u64,
    pub rejected_uploads: u64,
    pub total_downloads: u64,
    pub denied_downloads: u64,
    pub total_bytes_stored: u64,
    pub total_bytes_served: u64,
}

pub struct MetricsCollector {
    start_time: std::time::SystemTime,
    uploads: AtomicU64,
    rejected_uploads: AtomicU64,
    downloads: AtomicU64,
    denied_downloads: AtomicU64,
    bytes_stored: AtomicU64,
    bytes_served: AtomicU64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: std::time::SystemTime::now(),
            uploads: AtomicU64::new(0),
            rejected_uploads: AtomicU64::new(0),
            downloads: AtomicU64::new(0),
            denied_downloads: AtomicU64::new(0),
            bytes_stored: AtomicU64::new(0),
            bytes_served: AtomicU64::new(0),
        }
    }

    pub fn record_upload(&self, bytes: u64) {
        self.uploads.fetch_add(1, Ordering::Relaxed);
        self.bytes_stored.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_rejected_upload(&self) {
        self.rejected_uploads.fetch_add(1, Ordering::Relaxed);
    }

    /// `bytes` is what the response body will carry, which is less than the
    /// object size for range requests.
    pub fn record_download(&self, bytes: u64) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
        self.bytes_served.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_denied_download(&self) {
        self.denied_downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> Metrics {
        let uptime = self.start_time.elapsed().unwrap_or_default().as_secs();

        Metrics {
            uptime_seconds: uptime,
            total_uploads: self.uploads.load(Ordering::Relaxed),
            rejected_uploads: self.rejected_uploads.load(Ordering::Relaxed),
            total_downloads: self.downloads.load(Ordering::Relaxed),
            denied_downloads: self.denied_downloads.load(Ordering::Relaxed),
            total_bytes_stored: self.bytes_stored.load(Ordering::Relaxed),
            total_bytes_served: self.bytes_served.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsCollector::new();
        metrics.record_upload(10);
        metrics.record_upload(5);
        metrics.record_rejected_upload();
        metrics.record_download(4);
        metrics.record_denied_download();

        let snapshot = metrics.get_metrics();
        assert_eq!(snapshot.total_uploads, 2);
        assert_eq!(snapshot.total_bytes_stored, 15);
        assert_eq!(snapshot.rejected_uploads, 1);
        assert_eq!(snapshot.total_downloads, 1);
        assert_eq!(snapshot.total_bytes_served, 4);
        assert_eq!(snapshot.denied_downloads, 1);
    }
}
