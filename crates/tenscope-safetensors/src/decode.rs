//! Decoding raw payload bytes into flattened values.
//!
//! The one normalization rule: floating formats narrower than f32 (F16, BF16,
//! and the two F8 encodings) are upconverted to f32, since the runtime has no
//! native arithmetic for them. Every other dtype passes through unchanged.

use tenscope_core::Dtype;

use crate::data::TensorData;

/// Error type for payload decoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload size does not match the declared shape and dtype.
    #[error("Invalid data size: expected {expected} bytes, got {actual}")]
    InvalidSize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },
}

/// Decode raw payload bytes into a flat value vector.
///
/// `element_count` comes from the header's shape product; the payload must be
/// exactly `element_count * dtype.element_size()` bytes. Values are produced
/// in row-major order, little-endian as stored.
pub fn decode(data: &[u8], dtype: Dtype, element_count: usize) -> Result<TensorData, DecodeError> {
    let expected = element_count * dtype.element_size();
    if data.len() != expected {
        return Err(DecodeError::InvalidSize {
            expected,
            actual: data.len(),
        });
    }

    Ok(match dtype {
        Dtype::F32 => TensorData::F32(
            data.chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        ),
        Dtype::F16 => TensorData::F32(
            data.chunks_exact(2)
                .map(|b| half::f16::from_le_bytes([b[0], b[1]]).to_f32())
                .collect(),
        ),
        Dtype::BF16 => TensorData::F32(
            data.chunks_exact(2)
                .map(|b| half::bf16::from_le_bytes([b[0], b[1]]).to_f32())
                .collect(),
        ),
        Dtype::F8E4M3 => TensorData::F32(data.iter().map(|&b| f8_e4m3_to_f32(b)).collect()),
        Dtype::F8E5M2 => TensorData::F32(data.iter().map(|&b| f8_e5m2_to_f32(b)).collect()),
        Dtype::F64 => TensorData::F64(
            data.chunks_exact(8)
                .map(|b| {
                    f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
                })
                .collect(),
        ),
        Dtype::I8 => TensorData::I8(data.iter().map(|&b| b as i8).collect()),
        Dtype::I16 => TensorData::I16(
            data.chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]))
                .collect(),
        ),
        Dtype::I32 => TensorData::I32(
            data.chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        ),
        Dtype::I64 => TensorData::I64(
            data.chunks_exact(8)
                .map(|b| {
                    i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
                })
                .collect(),
        ),
        Dtype::U8 => TensorData::U8(data.to_vec()),
        Dtype::U32 => TensorData::U32(
            data.chunks_exact(4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        ),
        Dtype::Bool => TensorData::Bool(data.iter().map(|&b| b != 0).collect()),
    })
}

/// E5M2 shares f16's exponent layout; widening the byte into the high half of
/// an f16 bit pattern gives an exact conversion.
fn f8_e5m2_to_f32(bits: u8) -> f32 {
    half::f16::from_bits(u16::from(bits) << 8).to_f32()
}

/// E4M3 conversion: 1 sign, 4 exponent (bias 7), 3 mantissa bits.
/// The format has no infinities; 0x7f / 0xff are NaN.
fn f8_e4m3_to_f32(bits: u8) -> f32 {
    let sign = if bits & 0x80 != 0 { -1.0f32 } else { 1.0f32 };
    let exp = (bits >> 3) & 0x0f;
    let mantissa = bits & 0x07;

    if exp == 0x0f && mantissa == 0x07 {
        return f32::NAN;
    }
    if exp == 0 {
        // Subnormal: mantissa / 8 * 2^-6
        return sign * (mantissa as f32 / 8.0) * 2f32.powi(-6);
    }
    sign * (1.0 + mantissa as f32 / 8.0) * 2f32.powi(i32::from(exp) - 7)
}
