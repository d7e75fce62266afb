//! Hierarchy tree construction.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use tenscope_core::Catalog;

use crate::rules::{classify, generic_slot_label, slot_index, Route, BLOCK_SLOTS};

/// What a hierarchy node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// Tree root.
    Root,
    /// Token embedding branch.
    Embedding,
    /// One transformer block, by numeric index.
    Block(usize),
    /// A component leaf inside a block.
    ComponentSlot,
    /// Model-final norm branch.
    FinalNorm,
    /// Language-model head branch.
    Head,
    /// Catch-all branch for an unrecognized leading segment.
    Other,
}

/// One node of the hierarchy tree.
///
/// Leaves carry the tensor name they reference; group nodes do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    /// Display label.
    pub label: String,
    /// Node kind.
    pub kind: NodeKind,
    /// Ordered children.
    pub children: Vec<HierarchyNode>,
    /// Referenced tensor name, for leaves.
    pub tensor: Option<String>,
}

impl HierarchyNode {
    fn group(label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            label: label.into(),
            kind,
            children: Vec::new(),
            tensor: None,
        }
    }

    fn leaf(label: impl Into<String>, kind: NodeKind, tensor: &str) -> Self {
        Self {
            label: label.into(),
            kind,
            children: Vec::new(),
            tensor: Some(tensor.to_string()),
        }
    }

    /// Collect all leaves in render order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&HierarchyNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a HierarchyNode>) {
        if self.tensor.is_some() {
            out.push(self);
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }

    /// Names of all referenced tensors, in render order.
    #[must_use]
    pub fn leaf_names(&self) -> Vec<&str> {
        self.leaves()
            .into_iter()
            .filter_map(|n| n.tensor.as_deref())
            .collect()
    }
}

/// Per-block accumulator: canonical slots plus fallback names in input order.
#[derive(Default)]
struct BlockBucket {
    /// One list per canonical slot (weight and bias can share a slot).
    slots: Vec<Vec<String>>,
    /// Names matching no canonical slot, with their generic labels.
    fallback: Vec<(String, String)>,
}

impl BlockBucket {
    fn new() -> Self {
        Self {
            slots: vec![Vec::new(); BLOCK_SLOTS.len()],
            fallback: Vec::new(),
        }
    }
}

/// Build the hierarchy tree for a catalog.
///
/// Only records whose headers parsed cleanly participate. The result is fully
/// determined by the catalog: rebuilding yields a structurally identical
/// tree. Root branch order is embedding, blocks in ascending numeric order,
/// final norm, head, then other groups in first-seen order.
#[must_use]
pub fn build_tree(catalog: &Catalog) -> HierarchyNode {
    let mut embedding: Vec<String> = Vec::new();
    let mut blocks: BTreeMap<usize, BlockBucket> = BTreeMap::new();
    let mut final_norm: Vec<String> = Vec::new();
    let mut head: Vec<String> = Vec::new();
    let mut other: Vec<(String, Vec<String>)> = Vec::new();

    for record in catalog.valid_records() {
        let name = record.name.clone();
        match classify(&name) {
            Route::Embedding => embedding.push(name),
            Route::FinalNorm => final_norm.push(name),
            Route::Head => head.push(name),
            Route::Block(index) => {
                let bucket = blocks.entry(index).or_insert_with(BlockBucket::new);
                match slot_index(&name) {
                    Some(slot) => bucket.slots[slot].push(name),
                    None => {
                        let label = generic_slot_label(&name);
                        bucket.fallback.push((label, name));
                    }
                }
            }
            Route::Other(group) => match other.iter_mut().find(|(g, _)| *g == group) {
                Some((_, names)) => names.push(name),
                None => other.push((group, vec![name])),
            },
        }
    }

    let mut root = HierarchyNode::group("Model", NodeKind::Root);

    if !embedding.is_empty() {
        let mut node = HierarchyNode::group("Embedding (embed_tokens)", NodeKind::Embedding);
        node.children = embedding
            .iter()
            .map(|n| HierarchyNode::leaf(n.clone(), NodeKind::ComponentSlot, n))
            .collect();
        root.children.push(node);
    }

    // BTreeMap iteration gives ascending numeric block order.
    for (index, bucket) in &blocks {
        let mut node = HierarchyNode::group(format!("Block {index}"), NodeKind::Block(*index));
        for (slot, names) in bucket.slots.iter().enumerate() {
            for name in names {
                node.children.push(HierarchyNode::leaf(
                    BLOCK_SLOTS[slot].1,
                    NodeKind::ComponentSlot,
                    name,
                ));
            }
        }
        for (label, name) in &bucket.fallback {
            node.children
                .push(HierarchyNode::leaf(label.clone(), NodeKind::ComponentSlot, name));
        }
        root.children.push(node);
    }

    if !final_norm.is_empty() {
        let mut node = HierarchyNode::group("Final Norm (norm)", NodeKind::FinalNorm);
        node.children = final_norm
            .iter()
            .map(|n| HierarchyNode::leaf(n.clone(), NodeKind::ComponentSlot, n))
            .collect();
        root.children.push(node);
    }

    if !head.is_empty() {
        let mut node = HierarchyNode::group("LM Head (lm_head)", NodeKind::Head);
        node.children = head
            .iter()
            .map(|n| HierarchyNode::leaf(n.clone(), NodeKind::ComponentSlot, n))
            .collect();
        root.children.push(node);
    }

    for (group, names) in &other {
        let mut node = HierarchyNode::group(group.clone(), NodeKind::Other);
        node.children = names
            .iter()
            .map(|n| HierarchyNode::leaf(n.clone(), NodeKind::ComponentSlot, n))
            .collect();
        root.children.push(node);
    }

    debug!(
        branches = root.children.len(),
        leaves = root.leaves().len(),
        "built hierarchy tree"
    );

    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenscope_core::{Dtype, TensorRecord};

    fn catalog_of(names: &[&str]) -> Catalog {
        Catalog {
            records: names
                .iter()
                .map(|&name| TensorRecord {
                    name: name.to_string(),
                    shape: vec![4],
                    dtype: Some(Dtype::F32),
                    byte_size: 16,
                    error: None,
                })
                .collect(),
            ..Catalog::default()
        }
    }

    #[test]
    fn test_every_valid_name_appears_exactly_once() {
        let names = [
            "embed_tokens.weight",
            "layers.0.self_attn.q_proj.weight",
            "layers.0.self_attn.q_proj.bias",
            "layers.0.rotary_emb.inv_freq",
            "layers.1.mlp.gate_proj.weight",
            "norm.weight",
            "lm_head.weight",
            "vision_tower.patch_embed.weight",
        ];
        let tree = build_tree(&catalog_of(&names));
        let mut leaf_names = tree.leaf_names();
        leaf_names.sort_unstable();
        let mut expected: Vec<&str> = names.to_vec();
        expected.sort_unstable();
        assert_eq!(leaf_names, expected);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let catalog = catalog_of(&[
            "embed_tokens.weight",
            "layers.1.mlp.up_proj.weight",
            "layers.0.input_layernorm.weight",
            "norm.weight",
        ]);
        assert_eq!(build_tree(&catalog), build_tree(&catalog));
    }

    #[test]
    fn test_blocks_sort_numerically() {
        let catalog = catalog_of(&[
            "layers.2.mlp.up_proj.weight",
            "layers.10.mlp.up_proj.weight",
            "layers.1.mlp.up_proj.weight",
        ]);
        let tree = build_tree(&catalog);
        let kinds: Vec<NodeKind> = tree.children.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Block(1), NodeKind::Block(2), NodeKind::Block(10)]
        );
    }

    #[test]
    fn test_block_scoped_norm_stays_in_block() {
        let catalog = catalog_of(&["layers.3.norm.weight", "norm.weight"]);
        let tree = build_tree(&catalog);
        let block = tree
            .children
            .iter()
            .find(|c| c.kind == NodeKind::Block(3))
            .expect("block 3");
        assert_eq!(block.leaf_names(), vec!["layers.3.norm.weight"]);
        let final_norm = tree
            .children
            .iter()
            .find(|c| c.kind == NodeKind::FinalNorm)
            .expect("final norm");
        assert_eq!(final_norm.leaf_names(), vec!["norm.weight"]);
    }

    #[test]
    fn test_canonical_slot_order_within_block() {
        // Input order is scrambled; render order must be canonical.
        let catalog = catalog_of(&[
            "layers.0.mlp.down_proj.weight",
            "layers.0.self_attn.q_proj.weight",
            "layers.0.post_attention_layernorm.weight",
            "layers.0.input_layernorm.weight",
            "layers.0.self_attn.k_proj.weight",
        ]);
        let tree = build_tree(&catalog);
        let block = &tree.children[0];
        let labels: Vec<&str> = block.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Input LayerNorm",
                "Q Projection",
                "K Projection",
                "Post-Attention LayerNorm",
                "MLP Down",
            ]
        );
    }

    #[test]
    fn test_unrecognized_block_names_append_after_slots() {
        let catalog = catalog_of(&[
            "layers.0.rotary_emb.inv_freq",
            "layers.0.self_attn.q_proj.weight",
        ]);
        let tree = build_tree(&catalog);
        let block = &tree.children[0];
        let labels: Vec<&str> = block.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Q Projection", "rotary_emb.inv_freq"]);
    }

    #[test]
    fn test_errored_records_are_excluded() {
        let mut catalog = catalog_of(&["embed_tokens.weight", "lm_head.weight"]);
        catalog.records[1].error = Some("malformed".to_string());
        let tree = build_tree(&catalog);
        assert_eq!(tree.leaf_names(), vec!["embed_tokens.weight"]);
        assert!(!tree.children.iter().any(|c| c.kind == NodeKind::Head));
    }

    #[test]
    fn test_top_level_branch_order() {
        let catalog = catalog_of(&[
            "embed_tokens.weight",
            "layers.0.self_attn.q_proj.weight",
            "layers.0.mlp.down_proj.weight",
            "norm.weight",
            "lm_head.weight",
        ]);
        let tree = build_tree(&catalog);
        let kinds: Vec<NodeKind> = tree.children.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Embedding,
                NodeKind::Block(0),
                NodeKind::FinalNorm,
                NodeKind::Head,
            ]
        );
        for branch in &tree.children {
            match branch.kind {
                NodeKind::Block(_) => assert_eq!(branch.children.len(), 2),
                _ => assert_eq!(branch.children.len(), 1),
            }
        }
    }

    #[test]
    fn test_other_groups_keep_first_seen_order() {
        let catalog = catalog_of(&[
            "vision_tower.a.weight",
            "audio_tower.b.weight",
            "vision_tower.c.weight",
        ]);
        let tree = build_tree(&catalog);
        let labels: Vec<&str> = tree.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["vision_tower", "audio_tower"]);
        assert_eq!(
            tree.children[0].leaf_names(),
            vec!["vision_tower.a.weight", "vision_tower.c.weight"]
        );
    }
}
