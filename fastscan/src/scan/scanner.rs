//! The vectorized literal matcher.
//!
//! On x86_64 the haystack is walked in 16-byte strides with SSE2: a wide
//! equality compare against the first pattern byte produces a candidate
//! mask, a second compare against the next pattern byte is ANDed in to
//! thin it out, and surviving bits are verified in full. Single-byte
//! patterns and non-x86_64 targets go through `memchr`, which honors the
//! same contract.

use memchr::memchr_iter;

/// Appends every offset `i` with `data[i..i + pattern.len()] == pattern`
/// to `out`, in strictly ascending order, stopping once `cap` offsets
/// have been written. Offsets are relative to `data`.
///
/// Overlapping occurrences are all reported. A `cap` of zero writes
/// nothing; a haystack shorter than the pattern matches nothing.
pub fn scan_raw(data: &[u8], pattern: &[u8], cap: usize, out: &mut Vec<u64>) {
    if cap == 0 {
        return;
    }
    let mut remaining = cap;
    for_each_match(data, pattern, |at| {
        out.push(at as u64);
        remaining -= 1;
        remaining > 0
    });
}

/// Drives `emit` with match offsets in strictly ascending order until the
/// haystack is exhausted or `emit` returns `false`.
pub(crate) fn for_each_match(data: &[u8], pattern: &[u8], mut emit: impl FnMut(usize) -> bool) {
    if pattern.is_empty() || data.len() < pattern.len() {
        return;
    }

    if pattern.len() == 1 {
        for at in memchr_iter(pattern[0], data) {
            if !emit(at) {
                return;
            }
        }
        return;
    }

    #[cfg(target_arch = "x86_64")]
    unsafe {
        scan_sse2(data, pattern, &mut emit)
    }

    #[cfg(not(target_arch = "x86_64"))]
    for at in memchr::memmem::find_iter(data, pattern) {
        if !emit(at) {
            return;
        }
    }
}

/// SSE2 stride scan. Caller guarantees `2 <= pattern.len() <= data.len()`.
///
/// Loads are unaligned and never cross `data.len()`: the stride loop stops
/// at `data.len() - 16` and the scalar tail finishes the rest, and the
/// verification vector is built from a padded copy of the pattern so short
/// patterns are never over-read either.
#[cfg(target_arch = "x86_64")]
unsafe fn scan_sse2(data: &[u8], pattern: &[u8], emit: &mut impl FnMut(usize) -> bool) {
    use std::arch::x86_64::*;

    let len = data.len();
    let last = len - pattern.len();
    let ptr = data.as_ptr();

    let first = _mm_set1_epi8(pattern[0] as i8);
    let second = _mm_set1_epi8(pattern[1] as i8);

    let mut padded = [0u8; 16];
    let prefix_len = pattern.len().min(16);
    padded[..prefix_len].copy_from_slice(&pattern[..prefix_len]);
    let prefix = _mm_loadu_si128(padded.as_ptr() as *const __m128i);
    let prefix_mask: u32 = if pattern.len() >= 16 {
        0xFFFF
    } else {
        (1u32 << pattern.len()) - 1
    };

    let mut pos = 0usize;

    if len > 16 {
        let stride_end = len - 16;
        while pos < stride_end {
            let chunk = _mm_loadu_si128(ptr.add(pos) as *const __m128i);
            let mut mask = _mm_movemask_epi8(_mm_cmpeq_epi8(chunk, first)) as u32;

            if mask != 0 {
                let next = _mm_loadu_si128(ptr.add(pos + 1) as *const __m128i);
                mask &= _mm_movemask_epi8(_mm_cmpeq_epi8(next, second)) as u32;
            }

            while mask != 0 {
                let at = pos + mask.trailing_zeros() as usize;
                mask &= mask - 1;
                if at > last {
                    break;
                }
                let hit = if pattern.len() <= 16 && at + 16 <= len {
                    let cand = _mm_loadu_si128(ptr.add(at) as *const __m128i);
                    let eq = _mm_movemask_epi8(_mm_cmpeq_epi8(cand, prefix)) as u32;
                    (eq & prefix_mask) == prefix_mask
                } else {
                    data[at..at + pattern.len()] == *pattern
                };
                if hit && !emit(at) {
                    return;
                }
            }

            pos += 16;
        }
    }

    while pos <= last {
        if data[pos] == pattern[0]
            && data[pos + 1] == pattern[1]
            && data[pos..pos + pattern.len()] == *pattern
            && !emit(pos)
        {
            return;
        }
        pos += 1;
    }
}
