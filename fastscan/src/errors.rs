use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result codes crossing the C ABI boundary.
///
/// Host bridges map these onto their own error categories:
/// `OpenFailed` -> "File not found", `MmapFailed` -> "Memory mapping
/// failed", `OutOfBounds` -> "Buffer allocation failed", `InvalidArg` ->
/// "Invalid argument", anything else -> generic failure.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success = 0,
    NullArg = 1,
    InvalidArg = 2,
    OutOfBounds = 3,
    MmapFailed = 4,
    OpenFailed = 5,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("required argument is missing")]
    NullArg,
    #[error("invalid argument: {0}")]
    InvalidArg(String),
    #[error("buffer allocation failed")]
    OutOfBounds,
    #[error("memory mapping failed for {path}: {source}")]
    MmapFailed { path: PathBuf, source: io::Error },
    #[error("failed to open {path}: {source}")]
    OpenFailed { path: PathBuf, source: io::Error },
}

pub type ScanResult<T> = Result<T, ScanError>;

impl ScanError {
    pub fn invalid_arg(msg: impl Into<String>) -> Self {
        ScanError::InvalidArg(msg.into())
    }

    pub(crate) fn open_failed(path: &Path, source: io::Error) -> Self {
        ScanError::OpenFailed {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn mmap_failed(path: &Path, source: io::Error) -> Self {
        ScanError::MmapFailed {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The ABI status code for this error.
    pub fn status(&self) -> Status {
        match self {
            ScanError::NullArg => Status::NullArg,
            ScanError::InvalidArg(_) => Status::InvalidArg,
            ScanError::OutOfBounds => Status::OutOfBounds,
            ScanError::MmapFailed { .. } => Status::MmapFailed,
            ScanError::OpenFailed { .. } => Status::OpenFailed,
        }
    }
}
