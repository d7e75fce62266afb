//! Viewer configuration.

use serde::{Deserialize, Serialize};

/// Configuration for pagination, search, and cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Smallest allowed page size for value listings.
    #[serde(default = "default_min_page")]
    pub min_page: usize,

    /// Largest allowed page size for value listings.
    #[serde(default = "default_max_page")]
    pub max_page: usize,

    /// Page size used when the caller does not specify one.
    #[serde(default = "default_page")]
    pub default_page: usize,

    /// Maximum number of search matches surfaced for display.
    ///
    /// The search itself always reports the true total match count.
    #[serde(default = "default_search_cap")]
    pub search_cap: usize,

    /// Byte budget for the materialized tensor cache.
    ///
    /// `None` keeps every materialized tensor for the session lifetime.
    /// When set, least-recently-used entries are dropped to stay within
    /// budget.
    #[serde(default)]
    pub cache_budget_bytes: Option<u64>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_page: default_min_page(),
            max_page: default_max_page(),
            default_page: default_page(),
            search_cap: default_search_cap(),
            cache_budget_bytes: None,
        }
    }
}

fn default_min_page() -> usize {
    10
}

fn default_max_page() -> usize {
    200
}

fn default_page() -> usize {
    50
}

fn default_search_cap() -> usize {
    20
}

impl ViewerConfig {
    /// Clamp a requested page size into `[min_page, max_page]`.
    #[must_use]
    pub fn clamp_page_size(&self, requested: usize) -> usize {
        requested.clamp(self.min_page, self.max_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.min_page, 10);
        assert_eq!(config.max_page, 200);
        assert_eq!(config.default_page, 50);
        assert_eq!(config.search_cap, 20);
        assert_eq!(config.cache_budget_bytes, None);
    }

    #[test]
    fn test_clamp_page_size() {
        let config = ViewerConfig::default();
        assert_eq!(config.clamp_page_size(0), 10);
        assert_eq!(config.clamp_page_size(50), 50);
        assert_eq!(config.clamp_page_size(10_000), 200);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: ViewerConfig = serde_json::from_str(r#"{"max_page": 64}"#).unwrap();
        assert_eq!(config.max_page, 64);
        assert_eq!(config.min_page, 10);
    }
}
