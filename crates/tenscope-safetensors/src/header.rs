//! Safetensors header parsing and lazy raw-byte access.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use serde_json::Value;
use tracing::{debug, warn};

use tenscope_core::{Catalog, Dtype, TensorRecord};

/// Maximum allowed header length (100 MB).
/// Prevents memory exhaustion from malicious files.
pub const MAX_HEADER_LENGTH: u64 = 100 * 1024 * 1024;

/// Maximum allowed tensor count (100,000 tensors).
/// Modern LLMs typically have < 10,000 tensors.
pub const MAX_TENSOR_COUNT: usize = 100_000;

/// Maximum allowed number of dimensions per tensor.
pub const MAX_DIMS: usize = 64;

/// Error type for header reading.
///
/// These are file-level failures: no partial catalog is produced. Malformed
/// individual tensor entries do not surface here; they are recorded inline on
/// the affected [`TensorRecord`] and enumeration continues.
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// File too small to hold the length prefix.
    #[error("File too small for safetensors container: {size} bytes")]
    FileTooSmall {
        /// Actual file size.
        size: u64,
    },
    /// Header length exceeds the hard limit.
    #[error("Header too large: {size} bytes exceeds maximum of {max} bytes")]
    HeaderTooLarge {
        /// Declared header length.
        size: u64,
        /// Maximum allowed length.
        max: u64,
    },
    /// Header length runs past the end of the file.
    #[error("Truncated header: declared {declared} bytes, only {available} available")]
    TruncatedHeader {
        /// Declared header length.
        declared: u64,
        /// Bytes actually present after the prefix.
        available: u64,
    },
    /// Header is not valid JSON.
    #[error("Invalid header JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// Header JSON is not an object.
    #[error("Header is not a JSON object")]
    NotAnObject,
    /// Too many tensor entries.
    #[error("Too many tensors: {count} exceeds maximum of {max}")]
    TooManyTensors {
        /// Actual count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// Tensor not found in the header.
    #[error("Tensor not found: {0}")]
    TensorNotFound(String),
    /// Tensor entry was malformed at header-read time.
    #[error("Tensor entry unreadable: {name}: {reason}")]
    EntryUnreadable {
        /// Tensor name.
        name: String,
        /// Recorded header error.
        reason: String,
    },
    /// Byte range falls outside the data region of the file as it is now.
    #[error("Data range out of bounds for {name}: [{start}, {end}) with {available} data bytes")]
    RangeOutOfBounds {
        /// Tensor name.
        name: String,
        /// Range start, relative to the data region.
        start: u64,
        /// Range end, relative to the data region.
        end: u64,
        /// Data region size at read time.
        available: u64,
    },
}

/// Parsed safetensors header (listing + metadata, no payload bytes).
///
/// Use [`SafetensorsContent::read_tensor_data`] to lazily fetch a tensor's
/// raw bytes by byte range.
#[derive(Debug, Clone)]
pub struct SafetensorsContent {
    /// Global string metadata in header order.
    pub metadata: Vec<(String, String)>,
    /// Tensor records in header order, malformed entries flagged inline.
    pub records: Vec<TensorRecord>,
    /// Byte ranges within the data region, valid entries only.
    ranges: HashMap<String, (u64, u64)>,
    /// Offset of the data region from the start of the file.
    pub data_start: u64,
    /// Total file size at open time.
    pub file_size: u64,
}

impl SafetensorsContent {
    /// Read a safetensors header from a reader.
    ///
    /// Reads the length prefix, the JSON header, and the tensor listing but
    /// no payload bytes. A malformed individual entry is recorded as an
    /// error-flagged record; file-level problems abort with [`HeaderError`].
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self, HeaderError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size < 8 {
            return Err(HeaderError::FileTooSmall { size: file_size });
        }
        reader.seek(SeekFrom::Start(0))?;

        let header_len = reader.read_u64::<LittleEndian>()?;
        if header_len > MAX_HEADER_LENGTH {
            return Err(HeaderError::HeaderTooLarge {
                size: header_len,
                max: MAX_HEADER_LENGTH,
            });
        }
        if header_len > file_size - 8 {
            return Err(HeaderError::TruncatedHeader {
                declared: header_len,
                available: file_size - 8,
            });
        }

        let mut header_bytes = vec![0u8; header_len as usize];
        reader.read_exact(&mut header_bytes)?;

        let header: Value = serde_json::from_slice(&header_bytes)?;
        let Value::Object(entries) = header else {
            return Err(HeaderError::NotAnObject);
        };

        let data_start = 8 + header_len;
        let data_len = file_size - data_start;

        let tensor_count = entries.iter().filter(|(k, _)| *k != "__metadata__").count();
        if tensor_count > MAX_TENSOR_COUNT {
            return Err(HeaderError::TooManyTensors {
                count: tensor_count,
                max: MAX_TENSOR_COUNT,
            });
        }

        let mut metadata = Vec::new();
        let mut records = Vec::with_capacity(tensor_count);
        let mut ranges = HashMap::with_capacity(tensor_count);

        // serde_json's preserve_order feature keeps the map in header order,
        // which is the catalog order contract.
        for (name, value) in entries {
            if name == "__metadata__" {
                match value {
                    Value::Object(map) => {
                        for (k, v) in map {
                            let v = match v {
                                Value::String(s) => s,
                                other => other.to_string(),
                            };
                            metadata.push((k, v));
                        }
                    }
                    _ => warn!("__metadata__ is not an object, ignoring"),
                }
                continue;
            }

            match parse_entry(&name, &value, data_len) {
                Ok((record, range)) => {
                    ranges.insert(name, range);
                    records.push(record);
                }
                Err(reason) => {
                    warn!(tensor = %name, %reason, "malformed tensor entry");
                    records.push(TensorRecord {
                        name,
                        shape: Vec::new(),
                        dtype: None,
                        byte_size: 0,
                        error: Some(reason),
                    });
                }
            }
        }

        debug!(
            tensors = records.len(),
            metadata_keys = metadata.len(),
            data_start,
            "parsed safetensors header"
        );

        Ok(Self {
            metadata,
            records,
            ranges,
            data_start,
            file_size,
        })
    }

    /// Read a safetensors header from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HeaderError> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        Self::read(&mut reader)
    }

    /// Build the catalog for this file.
    #[must_use]
    pub fn catalog(&self, path: impl AsRef<Path>) -> Catalog {
        Catalog {
            path: path.as_ref().to_path_buf(),
            file_size: self.file_size,
            records: self.records.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Get a record by tensor name.
    #[must_use]
    pub fn record(&self, name: &str) -> Option<&TensorRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Total number of tensor entries, errored ones included.
    #[must_use]
    pub fn num_tensors(&self) -> usize {
        self.records.len()
    }

    /// Read one tensor's raw payload bytes.
    ///
    /// Seeks into the data region using the entry's byte range. Fails if the
    /// entry is unknown or error-flagged, or if the range no longer fits the
    /// file (e.g. the file shrank since the header was read).
    pub fn read_tensor_data<R: Read + Seek>(
        &self,
        reader: &mut R,
        name: &str,
    ) -> Result<Vec<u8>, HeaderError> {
        let Some((start, end)) = self.ranges.get(name).copied() else {
            return match self.record(name) {
                Some(record) => Err(HeaderError::EntryUnreadable {
                    name: name.to_string(),
                    reason: record.error.clone().unwrap_or_default(),
                }),
                None => Err(HeaderError::TensorNotFound(name.to_string())),
            };
        };

        // Re-check against the file as it is now, not as it was at open.
        let current_size = reader.seek(SeekFrom::End(0))?;
        let available = current_size.saturating_sub(self.data_start);
        if end > available {
            return Err(HeaderError::RangeOutOfBounds {
                name: name.to_string(),
                start,
                end,
                available,
            });
        }

        let mut data = vec![0u8; (end - start) as usize];
        reader.seek(SeekFrom::Start(self.data_start + start))?;
        reader.read_exact(&mut data)?;
        Ok(data)
    }
}

/// Parse one tensor entry from the header JSON.
///
/// Returns the record and its byte range within the data region, or the
/// reason the entry is malformed.
fn parse_entry(
    name: &str,
    value: &Value,
    data_len: u64,
) -> Result<(TensorRecord, (u64, u64)), String> {
    let Value::Object(fields) = value else {
        return Err("entry is not a JSON object".to_string());
    };

    let dtype_value = fields.get("dtype").ok_or("missing dtype")?;
    let dtype: Dtype = serde_json::from_value(dtype_value.clone())
        .map_err(|_| format!("unknown dtype {dtype_value}"))?;

    let shape_value = fields.get("shape").ok_or("missing shape")?;
    let Value::Array(dims) = shape_value else {
        return Err("shape is not an array".to_string());
    };
    if dims.len() > MAX_DIMS {
        return Err(format!("too many dimensions: {}", dims.len()));
    }
    let shape: Vec<usize> = dims
        .iter()
        .map(|d| {
            d.as_u64()
                .and_then(|d| usize::try_from(d).ok())
                .ok_or_else(|| format!("invalid dimension {d}"))
        })
        .collect::<Result<_, _>>()?;

    let offsets_value = fields.get("data_offsets").ok_or("missing data_offsets")?;
    let offsets: [u64; 2] = serde_json::from_value(offsets_value.clone())
        .map_err(|_| format!("invalid data_offsets {offsets_value}"))?;
    let [start, end] = offsets;

    if end < start {
        return Err(format!("inverted data_offsets [{start}, {end})"));
    }
    if end > data_len {
        return Err(format!(
            "data_offsets [{start}, {end}) exceed data region of {data_len} bytes"
        ));
    }

    let element_count = shape
        .iter()
        .try_fold(1u64, |acc, &d| acc.checked_mul(d as u64))
        .ok_or("element count overflow")?;
    let expected = element_count
        .checked_mul(dtype.element_size() as u64)
        .ok_or("byte size overflow")?;
    let actual = end - start;
    if expected != actual {
        return Err(format!(
            "size mismatch: shape {shape:?} of {dtype} needs {expected} bytes, range has {actual}"
        ));
    }

    Ok((
        TensorRecord {
            name: name.to_string(),
            shape,
            dtype: Some(dtype),
            byte_size: actual,
            error: None,
        },
        (start, end),
    ))
}
