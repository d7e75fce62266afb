//! Lazy, memoizing tensor cache.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use tenscope_core::Dtype;
use tenscope_safetensors::TensorData;

use crate::error::AccessError;
use crate::source::TensorSource;

/// A fully materialized tensor: flattened values plus shape.
///
/// Immutable once built; shared out of the cache behind an [`Arc`].
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTensor {
    /// Tensor name.
    pub name: String,
    /// Canonical dtype of the stored values (post-normalization).
    pub dtype: Dtype,
    /// Shape in row-major order.
    pub shape: Vec<usize>,
    /// Flattened values.
    pub values: TensorData,
}

impl CachedTensor {
    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the tensor holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-key materialization slot. Holding the slot lock while decoding gives
/// at-most-one in-flight materialization per tensor name.
type Slot = Arc<Mutex<Option<Arc<CachedTensor>>>>;

#[derive(Default)]
struct Ledger {
    /// Recency order, least recent first, with in-memory sizes.
    order: VecDeque<(String, u64)>,
    /// Total bytes held.
    bytes: u64,
}

/// Memoizing cache over a [`TensorSource`].
///
/// First access decodes and stores; later accesses return the stored value
/// without touching the source. A failed materialization leaves the key
/// unpopulated so it can be retried. With a byte budget set, least-recently
/// used entries are dropped once the budget is exceeded; the entry just
/// materialized is never dropped by its own insertion.
pub struct TensorCache {
    slots: Mutex<HashMap<String, Slot>>,
    ledger: Mutex<Ledger>,
    budget: Option<u64>,
}

impl TensorCache {
    /// Create a cache. `budget` of `None` means entries are kept for the
    /// whole session.
    #[must_use]
    pub fn new(budget: Option<u64>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ledger: Mutex::new(Ledger::default()),
            budget,
        }
    }

    /// Get a tensor, materializing it on first access.
    pub fn get(
        &self,
        name: &str,
        source: &dyn TensorSource,
    ) -> Result<Arc<CachedTensor>, AccessError> {
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(name.to_string()).or_default().clone()
        };

        let mut guard = slot.lock();
        if let Some(tensor) = guard.as_ref() {
            self.touch(name);
            return Ok(Arc::clone(tensor));
        }

        let record = source
            .catalog()
            .record(name)
            .ok_or_else(|| AccessError::UnknownTensor(name.to_string()))?;
        let shape = record.shape.clone();

        let values = source.read_values(name)?;
        let tensor = Arc::new(CachedTensor {
            name: name.to_string(),
            dtype: values.dtype(),
            shape,
            values,
        });
        *guard = Some(Arc::clone(&tensor));
        debug!(tensor = name, elements = tensor.len(), "materialized tensor");

        self.admit(name, tensor.values.byte_len());
        Ok(tensor)
    }

    /// Number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ledger.lock().order.len()
    }

    /// Whether the cache holds no materialized entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently held.
    #[must_use]
    pub fn resident_bytes(&self) -> u64 {
        self.ledger.lock().bytes
    }

    /// Move an entry to the most-recent position.
    fn touch(&self, name: &str) {
        let mut ledger = self.ledger.lock();
        if let Some(pos) = ledger.order.iter().position(|(n, _)| n == name) {
            let entry = ledger.order.remove(pos).expect("position just found");
            ledger.order.push_back(entry);
        }
    }

    /// Record a new entry and evict least-recently-used ones over budget.
    fn admit(&self, name: &str, bytes: u64) {
        let mut evicted = Vec::new();
        {
            let mut ledger = self.ledger.lock();
            ledger.order.push_back((name.to_string(), bytes));
            ledger.bytes += bytes;

            if let Some(budget) = self.budget {
                while ledger.bytes > budget && ledger.order.len() > 1 {
                    // Skip the entry just inserted if it reaches the front.
                    let victim_pos = ledger
                        .order
                        .iter()
                        .position(|(n, _)| n != name)
                        .expect("more than one entry");
                    let (victim, victim_bytes) =
                        ledger.order.remove(victim_pos).expect("position just found");
                    ledger.bytes -= victim_bytes;
                    evicted.push(victim);
                }
            }
        }
        for victim in evicted {
            debug!(tensor = %victim, "evicted tensor over cache budget");
            self.slots.lock().remove(&victim);
        }
    }
}
