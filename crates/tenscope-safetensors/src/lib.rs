//! Safetensors container reader.
//!
//! Safetensors is the HuggingFace format for safe tensor storage: a
//! length-prefixed JSON header describing named tensors, followed by one
//! contiguous raw data region.
//!
//! ```text
//! Safetensors := HEADER_LEN HEADER DATA
//!
//! HEADER_LEN := u64 (little-endian)
//! HEADER     := JSON {
//!   "__metadata__": { "key": "value", ... },      // optional
//!   "tensor_name": {
//!     "dtype": "F32" | "BF16" | ...,
//!     "shape": [dim1, dim2, ...],
//!     "data_offsets": [start, end]                // relative to DATA
//!   },
//!   ...
//! }
//! ```
//!
//! This crate reads the header and tensor listing without touching payload
//! bytes; tensor data is fetched lazily by byte range and decoded into flat
//! value vectors, upconverting reduced-precision floats to f32.
//!
//! # Example
//!
//! ```ignore
//! use tenscope_safetensors::SafetensorsContent;
//!
//! let content = SafetensorsContent::from_file("model.safetensors")?;
//! let catalog = content.catalog("model.safetensors");
//!
//! let mut file = std::fs::File::open("model.safetensors")?;
//! let raw = content.read_tensor_data(&mut file, "embed_tokens.weight")?;
//! ```

#![warn(missing_docs)]

mod data;
mod decode;
mod header;

pub use data::{Scalar, TensorData};
pub use decode::{decode, DecodeError};
pub use header::{
    HeaderError, SafetensorsContent, MAX_DIMS, MAX_HEADER_LENGTH, MAX_TENSOR_COUNT,
};
