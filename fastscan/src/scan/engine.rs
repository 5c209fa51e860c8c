use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info};

use super::partition::{self, Partition};
use super::scanner;
use crate::config::ScanConfig;
use crate::errors::{ScanError, ScanResult};
use crate::metrics::ScanMetrics;
use crate::region::Region;

/// Initial capacity of a worker's local offset buffer; it doubles from
/// here as matches accumulate.
const INITIAL_WORKER_CAPACITY: usize = 4096;

/// Coordinates a single scan: owns the pattern, the cap, the mapped
/// region, and (after `execute`) the final offset list.
///
/// The offsets stay owned by the context until `take_matches` detaches
/// them, after which the context will never free them; `destroy` (or
/// drop) releases whatever is still held and is safe to call repeatedly.
#[derive(Debug)]
pub struct ScanContext {
    pattern: Vec<u8>,
    cap: usize,
    config: ScanConfig,
    metrics: ScanMetrics,
    region: Option<Region>,
    matches: Option<Vec<u64>>,
}

impl ScanContext {
    /// Validates the pattern and cap and prepares an empty context.
    pub fn new(pattern: impl Into<Vec<u8>>, cap: usize) -> ScanResult<Self> {
        Self::with_config(pattern, cap, ScanConfig::default())
    }

    pub fn with_config(
        pattern: impl Into<Vec<u8>>,
        cap: usize,
        config: ScanConfig,
    ) -> ScanResult<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(ScanError::invalid_arg("pattern must not be empty"));
        }
        if cap == 0 {
            return Err(ScanError::invalid_arg("match cap must be positive"));
        }
        Ok(ScanContext {
            pattern,
            cap,
            config,
            metrics: ScanMetrics::new(),
            region: None,
            matches: None,
        })
    }

    /// Maps the file at `path` for scanning.
    pub fn load(&mut self, path: impl AsRef<Path>) -> ScanResult<()> {
        let region = Region::open(path)?;
        self.metrics.record_mmap(region.len() as u64);
        self.region = Some(region);
        Ok(())
    }

    /// Runs the scan, populating the offset list.
    ///
    /// Regions below the configured parallel threshold are scanned on the
    /// calling thread; larger ones are partitioned across workers and the
    /// per-worker results concatenated in worker order, which keeps the
    /// final list ascending without a sort.
    pub fn execute(&mut self) -> ScanResult<()> {
        let region = match &self.region {
            Some(region) => region,
            None => return Err(ScanError::NullArg),
        };
        let data = region.as_bytes();

        let matches = if data.len() < self.pattern.len() {
            Vec::new()
        } else if data.len() < self.config.parallel_threshold {
            self.metrics.record_scan(data.len() as u64, false);
            Self::scan_sequential(data, &self.pattern, self.cap)?
        } else {
            self.metrics.record_scan(data.len() as u64, true);
            self.scan_parallel(data)?
        };

        info!(
            "scan complete: {} matches in {} bytes",
            matches.len(),
            data.len()
        );
        self.metrics.record_matches(matches.len() as u64);
        self.matches = Some(matches);
        Ok(())
    }

    fn scan_sequential(data: &[u8], pattern: &[u8], cap: usize) -> ScanResult<Vec<u64>> {
        let most = data.len() - pattern.len() + 1;
        let mut out = Vec::new();
        out.try_reserve_exact(cap.min(most))
            .map_err(|_| ScanError::OutOfBounds)?;
        scanner::scan_raw(data, pattern, cap, &mut out);
        Ok(out)
    }

    fn scan_parallel(&self, data: &[u8]) -> ScanResult<Vec<u64>> {
        let workers = self.config.thread_count.get();
        let parts = partition::split(data.len(), self.pattern.len(), workers);
        debug!("scanning {} bytes across {} workers", data.len(), parts.len());

        let locals = parts
            .par_iter()
            .map(|part| Self::scan_partition(data, &self.pattern, part, self.cap))
            .collect::<ScanResult<Vec<Vec<u64>>>>()?;

        let total: usize = locals.iter().map(Vec::len).sum();
        let final_count = total.min(self.cap);
        let mut merged = Vec::new();
        merged
            .try_reserve_exact(final_count)
            .map_err(|_| ScanError::OutOfBounds)?;
        merged.extend(locals.into_iter().flatten().take(final_count));
        Ok(merged)
    }

    /// Scans one partition into a fresh local buffer.
    ///
    /// Matches starting before `owned_start` belong to the previous
    /// worker and are skipped; the local cap equals the global cap, a
    /// safe upper bound.
    fn scan_partition(
        data: &[u8],
        pattern: &[u8],
        part: &Partition,
        cap: usize,
    ) -> ScanResult<Vec<u64>> {
        let mut local: Vec<u64> = Vec::new();
        if local
            .try_reserve_exact(INITIAL_WORKER_CAPACITY.min(cap))
            .is_err()
        {
            return Err(ScanError::OutOfBounds);
        }

        let mut grow_failed = false;
        scanner::for_each_match(&data[part.scan_start..part.scan_end], pattern, |at| {
            let offset = part.scan_start + at;
            if offset < part.owned_start {
                return true;
            }
            if local.len() == local.capacity() && local.try_reserve(local.capacity()).is_err() {
                grow_failed = true;
                return false;
            }
            local.push(offset as u64);
            local.len() < cap
        });

        if grow_failed {
            return Err(ScanError::OutOfBounds);
        }
        Ok(local)
    }

    /// Offsets found by the last `execute`, ascending.
    pub fn matches(&self) -> &[u64] {
        self.matches.as_deref().unwrap_or(&[])
    }

    pub fn match_count(&self) -> usize {
        self.matches.as_ref().map_or(0, Vec::len)
    }

    /// Detaches the offset list, transferring ownership to the caller.
    /// The context keeps nothing and will not free the buffer.
    pub fn take_matches(&mut self) -> Vec<u64> {
        self.matches.take().unwrap_or_default()
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Releases the region and any still-owned offset list. Idempotent;
    /// dropping the context has the same effect.
    pub fn destroy(&mut self) {
        self.matches = None;
        self.region = None;
    }
}

/// Scans `path` for `pattern`, returning at most `cap` ascending offsets.
pub fn scan_file(path: impl AsRef<Path>, pattern: &[u8], cap: usize) -> ScanResult<Vec<u64>> {
    scan_file_with_config(path, pattern, cap, ScanConfig::default())
}

pub fn scan_file_with_config(
    path: impl AsRef<Path>,
    pattern: &[u8],
    cap: usize,
    config: ScanConfig,
) -> ScanResult<Vec<u64>> {
    let mut ctx = ScanContext::with_config(pattern.to_vec(), cap, config)?;
    ctx.load(path)?;
    ctx.execute()?;
    ctx.metrics().log_stats();
    Ok(ctx.take_matches())
}
