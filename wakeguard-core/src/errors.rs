//! Error types for the filesystem and persistence layers
//!
//! Keep errors small - they cross the storage path on every accepted
//! sample. Everything here is handled inside the crate; the public
//! surface of the log and the controller never returns an error.

use thiserror_no_std::Error;

/// Result type for raw filesystem operations
pub type FsResult<T> = Result<T, FsError>;

/// Status codes surfaced by the consumed filesystem API
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// Path does not exist
    #[error("no such file or directory")]
    NotFound,

    /// Underlying device or transport failure
    #[error("filesystem I/O failure")]
    Io,

    /// Volume has no room left for the write
    #[error("no space left on volume")]
    NoSpace,

    /// Handle was opened in a mode that forbids this operation
    #[error("file handle not valid for this operation")]
    InvalidHandle,
}

/// Record-level persistence failures layered on top of [`FsError`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Raw filesystem operation failed
    #[error("filesystem: {0}")]
    Fs(#[from] FsError),

    /// Record carries a format version this build does not understand
    #[error("record version {found} not supported")]
    UnsupportedVersion {
        /// Version byte found on disk
        found: u8,
    },

    /// Fewer bytes on disk than the record needs
    #[error("record truncated: expected {expected} bytes, read {read}")]
    Truncated {
        /// Bytes the record format requires
        expected: usize,
        /// Bytes actually transferred
        read: usize,
    },

    /// Ring header fields fail range validation
    #[error("ring header fields out of range")]
    CorruptHeader,
}

#[cfg(feature = "defmt")]
impl defmt::Format for FsError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NotFound => defmt::write!(fmt, "no such file or directory"),
            Self::Io => defmt::write!(fmt, "filesystem I/O failure"),
            Self::NoSpace => defmt::write!(fmt, "no space left on volume"),
            Self::InvalidHandle => defmt::write!(fmt, "file handle not valid for this operation"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StorageError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Fs(e) => defmt::write!(fmt, "filesystem: {}", e),
            Self::UnsupportedVersion { found } => {
                defmt::write!(fmt, "record version {} not supported", found)
            }
            Self::Truncated { expected, read } => {
                defmt::write!(fmt, "record truncated: expected {}, read {}", expected, read)
            }
            Self::CorruptHeader => defmt::write!(fmt, "ring header fields out of range"),
        }
    }
}
