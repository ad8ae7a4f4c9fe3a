//! An in-memory store.

use parking_lot::RwLock;

use crate::{
    range::RangeError,
    storage::{read_slice, ReadableStorageTraits, StorageError, WritableStorageTraits},
};

/// An in-memory store.
///
/// The store is a single growable byte buffer.
/// Writes beyond the end of the buffer grow it, filling any gap with zeros.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Vec<u8>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of the bytes in the store.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Consume the store and return its bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data.into_inner()
    }
}

impl From<Vec<u8>> for MemoryStore {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        read_slice(&self.data.read(), offset, buf)
    }

    fn size(&self) -> Result<u64, StorageError> {
        Ok(self.data.read().len() as u64)
    }
}

impl WritableStorageTraits for MemoryStore {
    fn write_at(&self, offset: u64, value: &[u8]) -> Result<(), StorageError> {
        let offset = usize::try_from(offset).map_err(|_| RangeError::Overflow)?;
        let end = offset
            .checked_add(value.len())
            .ok_or(RangeError::Overflow)?;
        let mut data = self.data.write();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[offset..end].copy_from_slice(value);
        Ok(())
    }
}
