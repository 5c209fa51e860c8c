use memmap2::MmapOptions;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::trace;

use crate::errors::{ScanError, ScanResult};

/// A read-only, whole-file memory mapping.
///
/// The file handle is held for the lifetime of the mapping. Zero-size
/// files produce a valid `Region` with no mapping at all; `as_bytes`
/// then yields the empty slice. Unmapping and closing happen on drop.
///
/// The mapped file must not be truncated by another process while the
/// `Region` exists; accessing pages past a shrunken end raises a bus
/// error. This is inherent to memory-mapped scanning and is documented
/// rather than mitigated.
#[derive(Debug)]
pub struct Region {
    map: Option<memmap2::Mmap>,
    len: usize,
    _file: File,
}

impl Region {
    /// Opens `path` read-only and maps its full contents.
    pub fn open(path: impl AsRef<Path>) -> ScanResult<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| ScanError::open_failed(path, e))?;
        let meta = file.metadata().map_err(|e| ScanError::open_failed(path, e))?;
        if !meta.is_file() {
            return Err(ScanError::open_failed(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let len = usize::try_from(meta.len()).map_err(|_| {
            ScanError::mmap_failed(
                path,
                io::Error::new(
                    io::ErrorKind::Unsupported,
                    "file does not fit in the address space",
                ),
            )
        })?;

        if len == 0 {
            trace!("empty file, skipping mmap: {}", path.display());
            return Ok(Region {
                map: None,
                len: 0,
                _file: file,
            });
        }

        let mut options = MmapOptions::new();
        #[cfg(target_os = "linux")]
        options.populate();

        let map = unsafe { options.map(&file) }.map_err(|e| ScanError::mmap_failed(path, e))?;

        // Access hints only; the scan is correct without them.
        #[cfg(unix)]
        if let Err(e) = map.advise(memmap2::Advice::Sequential) {
            trace!("sequential advice rejected for {}: {}", path.display(), e);
        }

        trace!("mapped {} bytes from {}", len, path.display());
        Ok(Region {
            map: Some(map),
            len,
            _file: file,
        })
    }

    /// Size of the mapped file in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The mapped bytes; empty for a zero-size file.
    pub fn as_bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}
