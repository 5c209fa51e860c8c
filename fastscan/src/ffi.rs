//! C ABI bridge for host runtimes.
//!
//! The surface is a handle-based rendition of the scanner: create a
//! context with a pattern and cap, point it at a file, execute, then
//! either read the offsets in place or detach them. A detached buffer is
//! no longer owned by the context; the host must release it exactly once
//! through [`fastscan_matches_free`], which is the finalizer a managed
//! runtime attaches to the external array it builds around the pointer.
//!
//! Every fallible entry point returns a [`Status`]; see the mapping table
//! on that type for host-side error categories.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;
use std::slice;

use crate::errors::Status;
use crate::scan::ScanContext;

/// Marshalling limit for paths crossing the bridge, in bytes.
pub const MAX_PATH_BYTES: usize = 1024;
/// Marshalling limit for patterns crossing the bridge, in bytes. The
/// core itself has no pattern-length bound.
pub const MAX_PATTERN_BYTES: usize = 4096;

/// Opaque scan handle shared with the host runtime.
pub struct FastscanCtx {
    inner: ScanContext,
}

/// Creates a scan context for `pattern` (raw bytes, not NUL-terminated)
/// capped at `max_matches` results, storing the handle in `out_ctx`.
///
/// # Safety
///
/// `pattern` must point to `pattern_len` readable bytes and `out_ctx`
/// to a writable pointer slot.
#[no_mangle]
pub unsafe extern "C" fn fastscan_init(
    pattern: *const u8,
    pattern_len: usize,
    max_matches: i32,
    out_ctx: *mut *mut FastscanCtx,
) -> Status {
    if out_ctx.is_null() {
        return Status::NullArg;
    }
    *out_ctx = ptr::null_mut();

    if pattern.is_null() {
        return Status::NullArg;
    }
    if pattern_len == 0 || pattern_len >= MAX_PATTERN_BYTES {
        return Status::InvalidArg;
    }
    if max_matches <= 0 {
        return Status::InvalidArg;
    }

    let bytes = slice::from_raw_parts(pattern, pattern_len);
    match ScanContext::new(bytes.to_vec(), max_matches as usize) {
        Ok(inner) => {
            *out_ctx = Box::into_raw(Box::new(FastscanCtx { inner }));
            Status::Success
        }
        Err(e) => e.status(),
    }
}

/// Maps the file at `path` (NUL-terminated UTF-8) into the context.
///
/// # Safety
///
/// `ctx` must be a live handle from [`fastscan_init`] and `path` a valid
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn fastscan_load(ctx: *mut FastscanCtx, path: *const c_char) -> Status {
    let ctx = match ctx.as_mut() {
        Some(ctx) => ctx,
        None => return Status::NullArg,
    };
    if path.is_null() {
        return Status::NullArg;
    }

    let raw = CStr::from_ptr(path);
    if raw.to_bytes().len() >= MAX_PATH_BYTES {
        return Status::InvalidArg;
    }
    let path = match raw.to_str() {
        Ok(path) => path,
        Err(_) => return Status::InvalidArg,
    };

    match ctx.inner.load(path) {
        Ok(()) => Status::Success,
        Err(e) => e.status(),
    }
}

/// Runs the scan over the loaded region.
///
/// # Safety
///
/// `ctx` must be a live handle from [`fastscan_init`].
#[no_mangle]
pub unsafe extern "C" fn fastscan_execute(ctx: *mut FastscanCtx) -> Status {
    match ctx.as_mut() {
        Some(ctx) => match ctx.inner.execute() {
            Ok(()) => Status::Success,
            Err(e) => e.status(),
        },
        None => Status::NullArg,
    }
}

/// Pointer to the offset array owned by the context, or null when there
/// are no matches. Valid until the context is destroyed or the buffer is
/// detached.
///
/// # Safety
///
/// `ctx` must be a live handle from [`fastscan_init`].
#[no_mangle]
pub unsafe extern "C" fn fastscan_matches(ctx: *const FastscanCtx) -> *const u64 {
    match ctx.as_ref() {
        Some(ctx) if ctx.inner.match_count() > 0 => ctx.inner.matches().as_ptr(),
        _ => ptr::null(),
    }
}

/// Number of offsets in the context's result buffer.
///
/// # Safety
///
/// `ctx` must be a live handle from [`fastscan_init`] or null.
#[no_mangle]
pub unsafe extern "C" fn fastscan_match_count(ctx: *const FastscanCtx) -> usize {
    ctx.as_ref().map_or(0, |ctx| ctx.inner.match_count())
}

/// Detaches the result buffer, transferring its ownership to the host.
///
/// On success `*out_ptr`/`*out_len` describe a contiguous native-endian
/// `u64` array (null/0 when there were no matches). The context forgets
/// the buffer; the host must release it exactly once with
/// [`fastscan_matches_free`]. Destroying the context afterwards will not
/// touch it.
///
/// # Safety
///
/// `ctx` must be a live handle from [`fastscan_init`]; `out_ptr` and
/// `out_len` must be writable.
#[no_mangle]
pub unsafe extern "C" fn fastscan_detach(
    ctx: *mut FastscanCtx,
    out_ptr: *mut *mut u64,
    out_len: *mut usize,
) -> Status {
    if out_ptr.is_null() || out_len.is_null() {
        return Status::NullArg;
    }
    *out_ptr = ptr::null_mut();
    *out_len = 0;

    let ctx = match ctx.as_mut() {
        Some(ctx) => ctx,
        None => return Status::NullArg,
    };

    let matches = ctx.inner.take_matches();
    if matches.is_empty() {
        return Status::Success;
    }

    let boxed = matches.into_boxed_slice();
    *out_len = boxed.len();
    *out_ptr = Box::into_raw(boxed) as *mut u64;
    Status::Success
}

/// Releases a buffer obtained from [`fastscan_detach`]. Null-safe; must
/// be called at most once per detached buffer with the length the detach
/// reported.
///
/// # Safety
///
/// `ptr`/`len` must be exactly the pair produced by one detach call, or
/// `ptr` must be null.
#[no_mangle]
pub unsafe extern "C" fn fastscan_matches_free(ptr: *mut u64, len: usize) {
    if ptr.is_null() {
        return;
    }
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)));
}

/// Destroys the context: unmaps the region and frees any result buffer
/// still owned (a detached buffer is left alone). Null-safe.
///
/// # Safety
///
/// `ctx` must be a handle from [`fastscan_init`] that has not been
/// destroyed yet, or null.
#[no_mangle]
pub unsafe extern "C" fn fastscan_destroy(ctx: *mut FastscanCtx) {
    if ctx.is_null() {
        return;
    }
    drop(Box::from_raw(ctx));
}
