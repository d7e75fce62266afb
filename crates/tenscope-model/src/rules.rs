//! Name classification rules.
//!
//! The rule order mirrors the reference behavior exactly: prefix checks for
//! the embedding, final norm, and head buckets, then block containment.
//! A name inside `layers.<N>` always routes to that block, so a block-scoped
//! `norm` is never taken for the model's final norm (the prefix rules cannot
//! fire on it — `layers.3.norm.weight` does not start with `norm`).

/// Where a tensor name routes in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Token embedding bucket (`embed_tokens*`).
    Embedding,
    /// Model-final norm bucket (`norm*` outside any block).
    FinalNorm,
    /// Language-model head bucket (`lm_head*`).
    Head,
    /// Numbered transformer block (`*layers.<N>*`).
    Block(usize),
    /// Anything else, grouped by the name's leading dot-segment.
    Other(String),
}

/// One classification rule: predicate plus route extractor.
type Rule = fn(&str) -> Option<Route>;

/// Ordered rule table; first match wins.
const RULES: &[Rule] = &[
    |n| n.starts_with("embed_tokens").then_some(Route::Embedding),
    |n| n.starts_with("norm").then_some(Route::FinalNorm),
    |n| n.starts_with("lm_head").then_some(Route::Head),
    |n| block_index(n).map(Route::Block),
];

/// Classify one tensor name.
///
/// Falls through to [`Route::Other`] keyed on the leading dot-segment when no
/// rule matches (including names that mention `layers` without a valid
/// numeric index).
#[must_use]
pub fn classify(name: &str) -> Route {
    RULES
        .iter()
        .find_map(|rule| rule(name))
        .unwrap_or_else(|| Route::Other(leading_segment(name).to_string()))
}

/// Extract the block index from a `layers.<N>` segment pair, if present.
#[must_use]
pub fn block_index(name: &str) -> Option<usize> {
    let mut segments = name.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segment == "layers" {
            if let Some(index) = segments.peek().and_then(|s| s.parse::<usize>().ok()) {
                return Some(index);
            }
        }
    }
    None
}

/// Canonical component slots within a block, in render order.
///
/// Pairs of (match substring, display label). Absent slots are omitted from
/// the tree; names matching none stay in the block with a generic label.
pub const BLOCK_SLOTS: &[(&str, &str)] = &[
    ("input_layernorm", "Input LayerNorm"),
    ("self_attn.q_norm", "Q Norm"),
    ("self_attn.k_norm", "K Norm"),
    ("self_attn.q_proj", "Q Projection"),
    ("self_attn.k_proj", "K Projection"),
    ("self_attn.v_proj", "V Projection"),
    ("self_attn.o_proj", "O Projection"),
    ("post_attention_layernorm", "Post-Attention LayerNorm"),
    ("mlp.gate_proj", "MLP Gate"),
    ("mlp.up_proj", "MLP Up"),
    ("mlp.down_proj", "MLP Down"),
];

/// Find the canonical slot a within-block name belongs to.
#[must_use]
pub fn slot_index(name: &str) -> Option<usize> {
    BLOCK_SLOTS
        .iter()
        .position(|(pattern, _)| name.contains(pattern))
}

/// Generic label for a within-block name that matches no canonical slot:
/// the part after `layers.<N>.`, with the `self_attn.` / `mlp.` slot prefix
/// stripped.
#[must_use]
pub fn generic_slot_label(name: &str) -> String {
    let tail = block_tail(name).unwrap_or(name);
    tail.replace("self_attn.", "").replace("mlp.", "")
}

/// The part of the name after the `layers.<N>.` prefix.
fn block_tail(name: &str) -> Option<&str> {
    let pos = name.find("layers.")?;
    let after = &name[pos + "layers.".len()..];
    let dot = after.find('.')?;
    Some(&after[dot + 1..])
}

fn leading_segment(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_rule() {
        assert_eq!(classify("embed_tokens.weight"), Route::Embedding);
    }

    #[test]
    fn test_final_norm_rule() {
        assert_eq!(classify("norm.weight"), Route::FinalNorm);
    }

    #[test]
    fn test_head_rule() {
        assert_eq!(classify("lm_head.weight"), Route::Head);
    }

    #[test]
    fn test_block_rule() {
        assert_eq!(
            classify("layers.0.self_attn.q_proj.weight"),
            Route::Block(0)
        );
        assert_eq!(classify("model.layers.17.mlp.up_proj.weight"), Route::Block(17));
    }

    #[test]
    fn test_block_norm_is_not_final_norm() {
        assert_eq!(classify("layers.3.norm.weight"), Route::Block(3));
    }

    #[test]
    fn test_other_rule() {
        assert_eq!(
            classify("vision_tower.patch_embed.weight"),
            Route::Other("vision_tower".to_string())
        );
    }

    #[test]
    fn test_layers_without_index_is_other() {
        assert_eq!(
            classify("layers.final.weight"),
            Route::Other("layers".to_string())
        );
    }

    #[test]
    fn test_block_index_extraction() {
        assert_eq!(block_index("layers.12.mlp.down_proj.weight"), Some(12));
        assert_eq!(block_index("decoder.layers.0.bias"), Some(0));
        assert_eq!(block_index("layers.x.weight"), None);
        assert_eq!(block_index("embed_tokens.weight"), None);
    }

    #[test]
    fn test_slot_index_order() {
        assert_eq!(slot_index("layers.0.input_layernorm.weight"), Some(0));
        assert_eq!(slot_index("layers.0.self_attn.q_proj.weight"), Some(3));
        assert_eq!(slot_index("layers.0.post_attention_layernorm.weight"), Some(7));
        assert_eq!(slot_index("layers.0.mlp.down_proj.weight"), Some(10));
        assert_eq!(slot_index("layers.0.cross_attn.weird.weight"), None);
    }

    #[test]
    fn test_generic_slot_label() {
        assert_eq!(
            generic_slot_label("layers.2.self_attn.rotary_emb.inv_freq"),
            "rotary_emb.inv_freq"
        );
        assert_eq!(generic_slot_label("layers.2.residual_scale"), "residual_scale");
    }
}
