//! Error type for tensor data access.

use tenscope_safetensors::{DecodeError, HeaderError};

/// Error raised when materializing or viewing tensor data.
///
/// A failed materialization leaves the cache key unpopulated, so the caller
/// may retry after fixing the underlying problem.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Container-level failure (header unreadable, range out of bounds).
    #[error("Format error: {0}")]
    Header(#[from] HeaderError),
    /// Payload did not decode against its declared shape and dtype.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// No tensor with this name in the catalog.
    #[error("Unknown tensor: {0}")]
    UnknownTensor(String),
    /// The tensor's header entry was malformed; it has no readable data.
    #[error("Tensor {name} has a malformed header entry: {reason}")]
    ErroredTensor {
        /// Tensor name.
        name: String,
        /// Error recorded at catalog time.
        reason: String,
    },
}
