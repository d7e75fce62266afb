//! The per-file session unit.

use std::path::Path;
use std::sync::Arc;

use tenscope_core::{Catalog, ViewerConfig};
use tenscope_model::{build_tree, HierarchyNode};

use crate::cache::{CachedTensor, TensorCache};
use crate::error::AccessError;
use crate::page::{page_of, PageView};
use crate::search::{search, SearchResults};
use crate::source::{FileSource, TensorSource};

/// One opened container: catalog, hierarchy tree, and tensor cache.
///
/// The three are built together and live together; opening another file
/// means building a new `Session` and dropping this one, so no caller can
/// observe a catalog from one file with a tree or cache from another. A
/// failed open produces no session at all, which keeps "open failed"
/// distinguishable from "no file selected" (no `Session` value).
pub struct Session {
    config: ViewerConfig,
    source: Box<dyn TensorSource>,
    tree: HierarchyNode,
    cache: TensorCache,
}

impl Session {
    /// Open a container file and build the full session unit.
    pub fn open(path: impl AsRef<Path>, config: ViewerConfig) -> Result<Self, AccessError> {
        let source = FileSource::open(path)?;
        Ok(Self::from_source(Box::new(source), config))
    }

    /// Build a session over an arbitrary source (used by tests).
    #[must_use]
    pub fn from_source(source: Box<dyn TensorSource>, config: ViewerConfig) -> Self {
        let tree = build_tree(source.catalog());
        let cache = TensorCache::new(config.cache_budget_bytes);
        Self {
            config,
            source,
            tree,
            cache,
        }
    }

    /// The catalog of the opened file.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.source.catalog()
    }

    /// The hierarchy tree of the opened file.
    #[must_use]
    pub fn tree(&self) -> &HierarchyNode {
        &self.tree
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Get a tensor's materialized values, decoding on first access.
    pub fn get(&self, name: &str) -> Result<Arc<CachedTensor>, AccessError> {
        self.cache.get(name, self.source.as_ref())
    }

    /// A clamped page of a tensor's flattened values.
    ///
    /// Materializes the tensor if needed; cache errors propagate unchanged
    /// and no partial page is returned.
    pub fn view(
        &self,
        name: &str,
        start: usize,
        page_size: usize,
    ) -> Result<PageView, AccessError> {
        let tensor = self.get(name)?;
        Ok(page_of(&tensor, start, page_size, &self.config))
    }

    /// Case-insensitive substring search over catalog names.
    #[must_use]
    pub fn search(&self, query: &str) -> SearchResults {
        search(self.source.catalog(), query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenscope_core::{Dtype, TensorRecord};
    use tenscope_safetensors::TensorData;

    struct StaticSource {
        catalog: Catalog,
    }

    impl TensorSource for StaticSource {
        fn catalog(&self) -> &Catalog {
            &self.catalog
        }

        fn read_values(&self, name: &str) -> Result<TensorData, AccessError> {
            let record = self
                .catalog
                .record(name)
                .ok_or_else(|| AccessError::UnknownTensor(name.to_string()))?;
            let len: usize = record.shape.iter().product();
            Ok(TensorData::F32((0..len).map(|i| i as f32).collect()))
        }
    }

    fn session_of(names: &[&str]) -> Session {
        let catalog = Catalog {
            records: names
                .iter()
                .map(|&name| TensorRecord {
                    name: name.to_string(),
                    shape: vec![6],
                    dtype: Some(Dtype::F32),
                    byte_size: 24,
                    error: None,
                })
                .collect(),
            ..Catalog::default()
        };
        Session::from_source(Box::new(StaticSource { catalog }), ViewerConfig::default())
    }

    #[test]
    fn test_tree_matches_catalog() {
        let session = session_of(&["embed_tokens.weight", "norm.weight"]);
        assert_eq!(session.tree().leaf_names().len(), 2);
        assert_eq!(session.catalog().len(), 2);
    }

    #[test]
    fn test_view_unknown_tensor_propagates_error() {
        let session = session_of(&["norm.weight"]);
        assert!(matches!(
            session.view("missing", 0, 50),
            Err(AccessError::UnknownTensor(_))
        ));
    }

    #[test]
    fn test_view_pages_cached_values() {
        let session = session_of(&["norm.weight"]);
        let page = session.view("norm.weight", 0, 50).unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.len(), 6);
    }

    #[test]
    fn test_search_through_session() {
        let session = session_of(&["layers.0.self_attn.q_proj.weight", "norm.weight"]);
        assert_eq!(session.search("Q_PROJ").total, 1);
    }
}
