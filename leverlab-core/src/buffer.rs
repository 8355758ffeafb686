//! Preallocated, growth-bounded record buffers.

use thiserror::Error;

/// Record writer failures. Always fatal for the sweep: results are never truncated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("{kind} buffer exhausted at capacity {capacity}; raise the capacity or lower divide_records_array_size_by")]
    BufferExhausted { capacity: usize, kind: &'static str },
}

/// Append-only buffer with a fixed capacity.
///
/// The fill counter only moves forward. Pushing past capacity fails instead of
/// reallocating, so an undersized estimate surfaces as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBuffer<T> {
    records: Vec<T>,
    capacity: usize,
}

impl<T> RecordBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `record`, returning the slot it was written to.
    #[inline]
    pub fn push(&mut self, record: T) -> Result<usize, RecordError> {
        let slot = self.records.len();
        if slot >= self.capacity {
            return Err(RecordError::BufferExhausted {
                capacity: self.capacity,
                kind: kind_name::<T>(),
            });
        }
        self.records.push(record);
        Ok(slot)
    }

    /// Number of slots written so far.
    pub fn filled(&self) -> usize {
        self.records.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    /// The filled records, truncated to the fill count. Unused capacity is released.
    pub fn into_vec(self) -> Vec<T> {
        let mut records = self.records;
        records.shrink_to_fit();
        records
    }
}

fn kind_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
