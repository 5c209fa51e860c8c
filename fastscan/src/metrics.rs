use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Tracks scan activity counters.
#[derive(Debug, Clone, Default)]
pub struct ScanMetrics {
    bytes_mapped: Arc<AtomicU64>,
    bytes_scanned: Arc<AtomicU64>,
    matches_found: Arc<AtomicU64>,
    sequential_scans: Arc<AtomicU64>,
    parallel_scans: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a file mapping
    pub fn record_mmap(&self, bytes: u64) {
        self.bytes_mapped.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records an executed scan and which path it took
    pub fn record_scan(&self, bytes: u64, parallel: bool) {
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
        if parallel {
            self.parallel_scans.fetch_add(1, Ordering::Relaxed);
        } else {
            self.sequential_scans.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records matches reported to the caller
    pub fn record_matches(&self, count: u64) {
        self.matches_found.fetch_add(count, Ordering::Relaxed);
    }

    /// Gets current counter values
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            bytes_mapped: self.bytes_mapped.load(Ordering::Relaxed),
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
            sequential_scans: self.sequential_scans.load(Ordering::Relaxed),
            parallel_scans: self.parallel_scans.load(Ordering::Relaxed),
        }
    }

    /// Logs current counter values
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Bytes mapped: {}\n\
             Bytes scanned: {}\n\
             Matches found: {}\n\
             Scans (sequential/parallel): {}/{}",
            stats.bytes_mapped,
            stats.bytes_scanned,
            stats.matches_found,
            stats.sequential_scans,
            stats.parallel_scans
        );
    }
}

/// Snapshot of scan activity counters
#[derive(Debug, Clone, Copy)]
pub struct ScanStats {
    pub bytes_mapped: u64,
    pub bytes_scanned: u64,
    pub matches_found: u64,
    pub sequential_scans: u64,
    pub parallel_scans: u64,
}
