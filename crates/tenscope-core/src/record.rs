//! Tensor records and the per-file catalog.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Dtype;

/// Metadata for one tensor entry in the container header.
///
/// A record with `error` set describes an entry whose header was malformed;
/// it is kept in the catalog for diagnostics but excluded from hierarchy
/// classification and aggregate counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorRecord {
    /// Tensor name (unique key within the file).
    pub name: String,
    /// Shape in row-major order. Empty for errored entries.
    pub shape: Vec<usize>,
    /// Declared data type. `None` when the header entry was unreadable.
    pub dtype: Option<Dtype>,
    /// Payload size in bytes. 0 means unknown (errored or overflowing entry).
    pub byte_size: u64,
    /// Error recorded while reading this entry's header, if any.
    pub error: Option<String>,
}

impl TensorRecord {
    /// Number of elements, from the shape product.
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn element_count(&self) -> Option<u64> {
        self.shape
            .iter()
            .try_fold(1u64, |acc, &d| acc.checked_mul(d as u64))
    }

    /// Whether this entry's header was malformed.
    #[must_use]
    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }
}

/// Ordered listing of one opened container file.
///
/// Records appear in header order. The catalog is immutable once built; a new
/// file open produces a whole new catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Path the container was opened from.
    pub path: PathBuf,
    /// Total file size in bytes.
    pub file_size: u64,
    /// Tensor records in header order.
    pub records: Vec<TensorRecord>,
    /// Global string metadata from the header, in header order.
    pub metadata: Vec<(String, String)>,
}

impl Catalog {
    /// Look up a record by tensor name.
    #[must_use]
    pub fn record(&self, name: &str) -> Option<&TensorRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Iterate over records whose headers parsed cleanly.
    pub fn valid_records(&self) -> impl Iterator<Item = &TensorRecord> {
        self.records.iter().filter(|r| !r.is_errored())
    }

    /// Total number of records, errored entries included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of tensors stored in a reduced-precision floating format.
    #[must_use]
    pub fn reduced_precision_count(&self) -> usize {
        self.valid_records()
            .filter(|r| r.dtype.is_some_and(|d| d.is_reduced_precision()))
            .count()
    }
}
