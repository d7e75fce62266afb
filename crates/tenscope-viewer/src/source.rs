//! Tensor data sources.

use std::path::{Path, PathBuf};

use tracing::info;

use tenscope_core::Catalog;
use tenscope_safetensors::{decode, SafetensorsContent, TensorData};

use crate::error::AccessError;

/// A catalog plus on-demand access to flattened tensor values.
///
/// The trait seam lets the cache be exercised against an instrumented source
/// in tests; production code uses [`FileSource`].
pub trait TensorSource: Send + Sync {
    /// The catalog of the opened container.
    fn catalog(&self) -> &Catalog;

    /// Read and decode one tensor's values (reduced-precision floats are
    /// upconverted to f32).
    fn read_values(&self, name: &str) -> Result<TensorData, AccessError>;
}

/// File-backed tensor source for one safetensors container.
pub struct FileSource {
    path: PathBuf,
    content: SafetensorsContent,
    catalog: Catalog,
}

impl FileSource {
    /// Open a container file: parse the header and build the catalog without
    /// reading any payload bytes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AccessError> {
        let path = path.as_ref().to_path_buf();
        let content = SafetensorsContent::from_file(&path)?;
        let catalog = content.catalog(&path);
        info!(
            path = %path.display(),
            tensors = catalog.len(),
            size = catalog.file_size,
            "opened safetensors container"
        );
        Ok(Self {
            path,
            content,
            catalog,
        })
    }

    /// Path the container was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TensorSource for FileSource {
    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn read_values(&self, name: &str) -> Result<TensorData, AccessError> {
        let record = self
            .catalog
            .record(name)
            .ok_or_else(|| AccessError::UnknownTensor(name.to_string()))?;
        if let Some(reason) = &record.error {
            return Err(AccessError::ErroredTensor {
                name: name.to_string(),
                reason: reason.clone(),
            });
        }
        let dtype = record.dtype.ok_or_else(|| AccessError::ErroredTensor {
            name: name.to_string(),
            reason: "missing dtype".to_string(),
        })?;
        let element_count = record.element_count().unwrap_or(0) as usize;

        let mut file = std::fs::File::open(&self.path)?;
        let raw = self.content.read_tensor_data(&mut file, name)?;
        Ok(decode(&raw, dtype, element_count)?)
    }
}
