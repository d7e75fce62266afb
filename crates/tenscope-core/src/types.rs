//! Common type definitions.

use serde::{Deserialize, Serialize};

/// Data type of a stored tensor.
///
/// This is the closed set of dtypes the safetensors container may declare.
/// Reduced-precision floating formats are normalized to [`Dtype::F32`] when a
/// tensor is materialized; everything else passes through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dtype {
    /// 32-bit floating point.
    F32,
    /// 16-bit floating point.
    F16,
    /// Brain floating point (16-bit).
    BF16,
    /// 8-bit floating point (E4M3).
    #[serde(rename = "F8_E4M3")]
    F8E4M3,
    /// 8-bit floating point (E5M2).
    #[serde(rename = "F8_E5M2")]
    F8E5M2,
    /// 64-bit floating point.
    F64,
    /// 8-bit signed integer.
    I8,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 8-bit unsigned integer.
    U8,
    /// 32-bit unsigned integer.
    U32,
    /// Boolean (one byte per element).
    #[serde(rename = "BOOL")]
    Bool,
}

impl Dtype {
    /// Size of one element in bytes.
    #[must_use]
    pub const fn element_size(&self) -> usize {
        match self {
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F16 | Self::BF16 | Self::I16 => 2,
            Self::F8E4M3 | Self::F8E5M2 | Self::I8 | Self::U8 | Self::Bool => 1,
            Self::F64 | Self::I64 => 8,
        }
    }

    /// Whether this is a floating format narrower than f32.
    ///
    /// Such tensors are upconverted to f32 on materialization.
    #[must_use]
    pub const fn is_reduced_precision(&self) -> bool {
        matches!(self, Self::F16 | Self::BF16 | Self::F8E4M3 | Self::F8E5M2)
    }

    /// Canonical display name (lower-case).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::F8E4M3 => "f8_e4m3",
            Self::F8E5M2 => "f8_e5m2",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U32 => "u32",
            Self::Bool => "bool",
        }
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a byte count for display (B / KB / MB / GB).
#[must_use]
pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}
