//! Flattened tensor value storage.

use tenscope_core::Dtype;

/// Flattened tensor values in row-major order.
///
/// One variant per canonical storage dtype. Reduced-precision floats never
/// appear here: decoding upconverts them to [`TensorData::F32`].
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    /// 32-bit floats (also holds upconverted f16/bf16/f8 payloads).
    F32(Vec<f32>),
    /// 64-bit floats.
    F64(Vec<f64>),
    /// 8-bit signed integers.
    I8(Vec<i8>),
    /// 16-bit signed integers.
    I16(Vec<i16>),
    /// 32-bit signed integers.
    I32(Vec<i32>),
    /// 64-bit signed integers.
    I64(Vec<i64>),
    /// 8-bit unsigned integers.
    U8(Vec<u8>),
    /// 32-bit unsigned integers.
    U32(Vec<u32>),
    /// Booleans.
    Bool(Vec<bool>),
}

impl TensorData {
    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::I8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    /// Whether no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical dtype of the stored values (post-normalization).
    #[must_use]
    pub const fn dtype(&self) -> Dtype {
        match self {
            Self::F32(_) => Dtype::F32,
            Self::F64(_) => Dtype::F64,
            Self::I8(_) => Dtype::I8,
            Self::I16(_) => Dtype::I16,
            Self::I32(_) => Dtype::I32,
            Self::I64(_) => Dtype::I64,
            Self::U8(_) => Dtype::U8,
            Self::U32(_) => Dtype::U32,
            Self::Bool(_) => Dtype::Bool,
        }
    }

    /// In-memory size of the stored values in bytes.
    #[must_use]
    pub fn byte_len(&self) -> u64 {
        self.len() as u64 * self.dtype().element_size() as u64
    }

    /// Get one value by flat index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Scalar> {
        if index >= self.len() {
            return None;
        }
        Some(match self {
            Self::F32(v) => Scalar::F32(v[index]),
            Self::F64(v) => Scalar::F64(v[index]),
            Self::I8(v) => Scalar::Int(v[index] as i64),
            Self::I16(v) => Scalar::Int(v[index] as i64),
            Self::I32(v) => Scalar::Int(v[index] as i64),
            Self::I64(v) => Scalar::Int(v[index]),
            Self::U8(v) => Scalar::UInt(v[index] as u64),
            Self::U32(v) => Scalar::UInt(v[index] as u64),
            Self::Bool(v) => Scalar::Bool(v[index]),
        })
    }

    /// Copy out the values in `[start, start + len)`.
    ///
    /// The caller is responsible for passing an in-bounds range.
    #[must_use]
    pub fn slice(&self, start: usize, len: usize) -> Vec<Scalar> {
        (start..start + len).filter_map(|i| self.get(i)).collect()
    }
}

/// One tensor value, widened to a display-friendly representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// 32-bit float value.
    F32(f32),
    /// 64-bit float value.
    F64(f64),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value.
    UInt(u64),
    /// Boolean value.
    Bool(bool),
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::F32(v) => write!(f, "{v:.6}"),
            Self::F64(v) => write!(f, "{v:.6}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}
