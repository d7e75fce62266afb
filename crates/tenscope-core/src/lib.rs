//! Core types and configuration for the tenscope safetensors inspector.
//!
//! This crate provides the foundational types shared by the format reader,
//! hierarchy builder, and viewer session:
//!
//! - The closed [`Dtype`] enumeration with element widths and canonical names
//! - [`TensorRecord`] and [`Catalog`] describing one opened container file
//! - [`ViewerConfig`] for pagination, search, and cache bounds

#![warn(missing_docs)]

mod config;
mod record;
mod types;

pub use config::ViewerConfig;
pub use record::{Catalog, TensorRecord};
pub use types::{human_size, Dtype};
