/// A worker's slice of the region.
///
/// `scan_start..scan_end` is what the worker reads; it extends
/// `pattern_len - 1` bytes beyond the logical chunk on both sides so
/// matches straddling a chunk boundary are seen by the workers on both
/// sides of it. `owned_start` is where the worker's authority begins:
/// any match starting before it belongs to the previous worker and is
/// discarded, so every occurrence is reported by exactly one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Partition {
    pub scan_start: usize,
    pub scan_end: usize,
    pub owned_start: usize,
}

/// Splits `len` bytes into `workers` contiguous logical chunks with
/// overlapped scan ranges. The last chunk absorbs the remainder.
pub(crate) fn split(len: usize, pattern_len: usize, workers: usize) -> Vec<Partition> {
    debug_assert!(pattern_len >= 1);

    let workers = workers.clamp(1, len.max(1));
    let chunk = len / workers;
    let overlap = pattern_len - 1;

    (0..workers)
        .map(|w| {
            let owned_start = w * chunk;
            let owned_end = if w == workers - 1 {
                len
            } else {
                (w + 1) * chunk
            };
            Partition {
                scan_start: if w == 0 {
                    0
                } else {
                    owned_start.saturating_sub(overlap)
                },
                scan_end: if w == workers - 1 {
                    len
                } else {
                    (owned_end + overlap).min(len)
                },
                owned_start,
            }
        })
        .collect()
}
