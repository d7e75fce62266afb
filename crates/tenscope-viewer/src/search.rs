//! Case-insensitive substring search over catalog names.

use serde::Serialize;

use tenscope_core::{Catalog, Dtype};

/// One search match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Tensor name.
    pub name: String,
    /// Declared dtype.
    pub dtype: Option<Dtype>,
    /// Declared shape.
    pub shape: Vec<usize>,
}

/// Search outcome: every match in catalog order plus the true total.
///
/// Truncation for display is the presentation layer's job; `total` always
/// reports the full match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    /// Matches in catalog order.
    pub matches: Vec<SearchHit>,
    /// True number of matches.
    pub total: usize,
}

/// Filter catalog names by case-insensitive substring containment.
///
/// Error-flagged records never match.
#[must_use]
pub fn search(catalog: &Catalog, query: &str) -> SearchResults {
    let query = query.to_lowercase();
    let matches: Vec<SearchHit> = catalog
        .valid_records()
        .filter(|r| r.name.to_lowercase().contains(&query))
        .map(|r| SearchHit {
            name: r.name.clone(),
            dtype: r.dtype,
            shape: r.shape.clone(),
        })
        .collect();
    let total = matches.len();
    SearchResults { matches, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenscope_core::TensorRecord;

    fn catalog_of(names: &[&str]) -> Catalog {
        Catalog {
            records: names
                .iter()
                .map(|&name| TensorRecord {
                    name: name.to_string(),
                    shape: vec![2, 2],
                    dtype: Some(Dtype::F32),
                    byte_size: 16,
                    error: None,
                })
                .collect(),
            ..Catalog::default()
        }
    }

    #[test]
    fn test_case_insensitive_match() {
        let catalog = catalog_of(&[
            "self_attn.q_proj.weight",
            "self_attn.q_norm.weight",
            "mlp.up_proj.weight",
        ]);
        let results = search(&catalog, "PROJ");
        assert_eq!(results.total, 2);
        assert_eq!(results.matches[0].name, "self_attn.q_proj.weight");
        assert_eq!(results.matches[1].name, "mlp.up_proj.weight");
    }

    #[test]
    fn test_no_matches() {
        let catalog = catalog_of(&["norm.weight"]);
        let results = search(&catalog, "q_proj");
        assert_eq!(results.total, 0);
        assert!(results.matches.is_empty());
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let catalog = catalog_of(&["a", "b", "c"]);
        assert_eq!(search(&catalog, "").total, 3);
    }

    #[test]
    fn test_errored_records_do_not_match() {
        let mut catalog = catalog_of(&["q_proj.weight", "q_proj.bias"]);
        catalog.records[1].error = Some("malformed".to_string());
        let results = search(&catalog, "q_proj");
        assert_eq!(results.total, 1);
        assert_eq!(results.matches[0].name, "q_proj.weight");
    }

    #[test]
    fn test_matches_keep_catalog_order() {
        let catalog = catalog_of(&["z.weight", "a.weight", "m.weight"]);
        let results = search(&catalog, "weight");
        let names: Vec<&str> = results.matches.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["z.weight", "a.weight", "m.weight"]);
    }
}
