//! Paged access into a materialized tensor's flattened values.

use tenscope_core::ViewerConfig;
use tenscope_safetensors::Scalar;

use crate::cache::CachedTensor;

/// One bounded window into a tensor's flattened values.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    /// Tensor name.
    pub name: String,
    /// Flat index of the first value. Clamped into `[0, total)`; 0 when the
    /// tensor is empty.
    pub start: usize,
    /// Total number of values in the tensor.
    pub total: usize,
    /// The window's values, never padded past the end.
    pub values: Vec<Scalar>,
}

impl PageView {
    /// Number of values in this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the page holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Cut a clamped page out of a cached tensor.
///
/// `start` is clamped to the last valid index (an empty tensor yields an
/// empty view); `page_size` is clamped into the configured bounds; the
/// returned length is `min(page_size, total - start)`.
#[must_use]
pub fn page_of(
    tensor: &CachedTensor,
    start: usize,
    page_size: usize,
    config: &ViewerConfig,
) -> PageView {
    let total = tensor.len();
    if total == 0 {
        return PageView {
            name: tensor.name.clone(),
            start: 0,
            total: 0,
            values: Vec::new(),
        };
    }

    let start = start.min(total - 1);
    let page_size = config.clamp_page_size(page_size);
    let len = page_size.min(total - start);

    PageView {
        name: tensor.name.clone(),
        start,
        total,
        values: tensor.values.slice(start, len),
    }
}
