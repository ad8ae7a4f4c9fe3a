use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A run of elements that is contiguous both in storage and in the destination array.
///
/// The caller of a [`Layout`](super::Layout) issues one read or write of [`nelems`](Chunk::nelems) elements at byte offset [`file_pos`](Chunk::file_pos),
/// and copies them to or from the destination array starting at element [`start_elem`](Chunk::start_elem).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display("file_pos {file_pos} start_elem {start_elem} nelems {nelems}")]
pub struct Chunk {
    file_pos: u64,
    start_elem: u64,
    nelems: u64,
}

impl Chunk {
    /// Create a new chunk.
    #[must_use]
    pub const fn new(file_pos: u64, start_elem: u64, nelems: u64) -> Self {
        Self {
            file_pos,
            start_elem,
            nelems,
        }
    }

    /// Return the absolute byte offset of the chunk in storage.
    #[must_use]
    pub const fn file_pos(&self) -> u64 {
        self.file_pos
    }

    /// Return the linearised index of the first element of the chunk in the destination array.
    #[must_use]
    pub const fn start_elem(&self) -> u64 {
        self.start_elem
    }

    /// Return the number of elements.
    #[must_use]
    pub const fn nelems(&self) -> u64 {
        self.nelems
    }

    /// Return the byte range of the chunk in storage.
    #[must_use]
    pub const fn byte_range(&self, element_size: u64) -> std::ops::Range<u64> {
        self.file_pos..self.file_pos + self.nelems * element_size
    }

    /// Return the range of linearised element indices of the chunk in the destination array.
    #[must_use]
    pub const fn destination_range(&self) -> std::ops::Range<u64> {
        self.start_elem..self.start_elem + self.nelems
    }

    /// Return the byte range of the chunk in the destination array.
    #[must_use]
    pub const fn destination_byte_range(&self, element_size: u64) -> std::ops::Range<u64> {
        self.start_elem * element_size..(self.start_elem + self.nelems) * element_size
    }
}
