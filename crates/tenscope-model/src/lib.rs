//! Model hierarchy classification.
//!
//! Transformer checkpoints store a flat list of tensor names like
//! `layers.0.self_attn.q_proj.weight`. This crate classifies that flat set
//! into a navigable tree: embedding, numbered blocks with canonical component
//! slots, final norm, head, and a catch-all bucket.
//!
//! Classification is driven by an ordered rule table (first match wins) so
//! each rule can be tested in isolation; rebuilding from the same catalog is
//! deterministic.

#![warn(missing_docs)]

mod rules;
mod tree;

pub use rules::{block_index, classify, slot_index, Route, BLOCK_SLOTS};
pub use tree::{build_tree, HierarchyNode, NodeKind};
