//! Serializable structure snapshot.
//!
//! Building the document is pure; writing it to disk is the caller's job.

use serde::Serialize;

use tenscope_core::Dtype;

use crate::session::Session;

/// Exportable summary of the opened file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    /// Path the container was opened from.
    pub path: String,
    /// Total file size in bytes.
    pub size_bytes: u64,
    /// Number of tensor entries, errored ones included.
    pub tensor_count: usize,
    /// Number of tensors stored in a reduced-precision floating format.
    pub reduced_precision_count: usize,
}

/// One exported tensor leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TensorExport {
    /// Tensor name.
    pub name: String,
    /// Shape in row-major order.
    pub shape: Vec<usize>,
    /// Declared dtype.
    pub dtype: Option<Dtype>,
    /// Payload size in bytes.
    pub size_bytes: u64,
}

/// One hierarchy branch with its tensor leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchExport {
    /// Branch label.
    pub branch: String,
    /// Leaves in render order.
    pub tensors: Vec<TensorExport>,
}

/// The full export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    /// File summary.
    pub file: FileSummary,
    /// Global metadata in header order.
    pub metadata: Vec<(String, String)>,
    /// Hierarchy branches in render order.
    pub structure: Vec<BranchExport>,
}

/// Build the export snapshot for a session.
#[must_use]
pub fn snapshot(session: &Session) -> ExportDocument {
    let catalog = session.catalog();
    let tree = session.tree();

    let structure = tree
        .children
        .iter()
        .map(|branch| BranchExport {
            branch: branch.label.clone(),
            tensors: branch
                .leaf_names()
                .into_iter()
                .filter_map(|name| catalog.record(name))
                .map(|record| TensorExport {
                    name: record.name.clone(),
                    shape: record.shape.clone(),
                    dtype: record.dtype,
                    size_bytes: record.byte_size,
                })
                .collect(),
        })
        .collect();

    ExportDocument {
        file: FileSummary {
            path: catalog.path.display().to_string(),
            size_bytes: catalog.file_size,
            tensor_count: catalog.len(),
            reduced_precision_count: catalog.reduced_precision_count(),
        },
        metadata: catalog.metadata.clone(),
        structure,
    }
}
