//! Unified error type for the index and storage core.
//!
//! Every fallible operation in this crate returns [`Result<T>`], built from a
//! single [`Error`] enum with stable `VDB-NNN` codes so that adapters layered
//! on top (HTTP handlers, CLI output, metrics) can match on the kind without
//! string-parsing messages.

use thiserror::Error as ThisError;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the index and storage core.
///
/// Variants map onto the five error kinds from the component design: the
/// `code()` method reports a stable identifier for each.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Factory-time configuration error: unknown variant or invalid parameter.
    #[error("[VDB-001] configuration error: {0}")]
    Config(String),

    /// Dimension mismatch between an argument and the index/storage it's used with.
    #[error("[VDB-002] dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured on the index.
        expected: usize,
        /// Dimension of the vector actually supplied.
        actual: usize,
    },

    /// Any other argument-validation failure (non-positive `k`, malformed identifier, ...).
    #[error("[VDB-003] invalid argument: {0}")]
    InvalidArgument(String),

    /// `search` was called on an index with no vectors.
    #[error("[VDB-004] index is empty")]
    EmptyIndex,

    /// Operation attempted on a handle that has already been closed.
    #[error("[VDB-005] handle is closed")]
    Closed,

    /// `insert` would exceed the index's configured capacity.
    #[error("[VDB-006] capacity exceeded: max {max}")]
    CapacityExceeded {
        /// Configured maximum element count.
        max: usize,
    },

    /// Wrapped I/O failure (open, read, write, flush, remap).
    #[error("[VDB-007] I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record's checksum did not match its payload.
    #[error("[VDB-008] checksum mismatch for record '{0}'")]
    ChecksumMismatch(String),

    /// The storage file is structurally corrupt (bad header, truncated record).
    #[error("[VDB-009] corrupt storage: {0}")]
    Corrupt(String),

    /// The requested identifier does not exist.
    #[error("[VDB-010] not found: {0}")]
    NotFound(String),

    /// The operation is not implemented for this index/storage variant.
    #[error("[VDB-011] unsupported operation: {0}")]
    Unsupported(String),

    /// Catch-all for invariant violations that should never happen in practice.
    #[error("[VDB-012] internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the stable error code, e.g. `"VDB-002"`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "VDB-001",
            Self::DimensionMismatch { .. } => "VDB-002",
            Self::InvalidArgument(_) => "VDB-003",
            Self::EmptyIndex => "VDB-004",
            Self::Closed => "VDB-005",
            Self::CapacityExceeded { .. } => "VDB-006",
            Self::Io(_) => "VDB-007",
            Self::ChecksumMismatch(_) => "VDB-008",
            Self::Corrupt(_) => "VDB-009",
            Self::NotFound(_) => "VDB-010",
            Self::Unsupported(_) => "VDB-011",
            Self::Internal(_) => "VDB-012",
        }
    }

    /// Returns whether a caller can reasonably retry or reconfigure and move on,
    /// as opposed to the handle being permanently wedged.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Corrupt(_) | Self::Internal(_) | Self::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::Config("x".into()).code(), "VDB-001");
        assert_eq!(
            Error::DimensionMismatch {
                expected: 4,
                actual: 3
            }
            .code(),
            "VDB-002"
        );
        assert_eq!(Error::EmptyIndex.code(), "VDB-004");
        assert_eq!(Error::CapacityExceeded { max: 10 }.code(), "VDB-006");
    }

    #[test]
    fn corrupt_and_internal_are_not_recoverable() {
        assert!(!Error::Corrupt("bad header".into()).is_recoverable());
        assert!(!Error::Internal("lock poisoned".into()).is_recoverable());
        assert!(!Error::Closed.is_recoverable());
        assert!(Error::NotFound("v1".into()).is_recoverable());
    }
}
