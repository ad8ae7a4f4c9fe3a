//! Chunked layouts.
//!
//! A layout translates a logical request for the elements of a [`Section`](crate::section::Section) of an array into the sequence of [`Chunk`]s that must be read from (or written to) storage.
//! Each chunk is a run of elements that is contiguous both in storage and in the destination array.
//!
//! There are two layouts:
//!  - [`RegularLayout`]: a single stored array, optionally split into fixed-size records along its outermost dimension.
//!  - [`TiledLayout`]: a tile storing a section of a larger logical array, read against a section of the logical array.
//!
//! Both are driven by the same merge-then-enumerate algorithm.
//! Starting from the innermost dimension, dimensions are merged into a single run while they are contiguous in both storage and the destination.
//! The remaining outer dimensions are enumerated in row-major order, producing one chunk per combination.
//!
//! Chunks are yielded lazily in strictly increasing destination order, they never overlap, and their element counts sum to [`Layout::total_elements`].
//! All validation happens when a layout is constructed, so iteration cannot fail.
//!
//! ```
//! # use nclayout::{layout::{Layout, RegularLayout}, section::Section};
//! # use std::num::NonZeroU64;
//! let wanted: Section = "0:1,0:19,0:29,0:3".parse()?;
//!
//! // the two wanted rows of the outer dimension are adjacent in storage
//! let layout = RegularLayout::new(0, 1, None, &[10, 20, 30, 4], &wanted)?;
//! assert_eq!(layout.chunk_size_hint(), 4800);
//! assert_eq!(layout.num_chunks(), 1);
//!
//! // padded records are not
//! let layout = RegularLayout::new(0, 1, NonZeroU64::new(4096), &[10, 20, 30, 4], &wanted)?;
//! assert_eq!(layout.chunk_size_hint(), 2400);
//! assert_eq!(layout.num_chunks(), 2);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

mod chunk;
mod indexer;
mod regular_layout;
mod tiled_layout;

use std::iter::FusedIterator;

pub use chunk::Chunk;
pub use regular_layout::RegularLayout;
pub use tiled_layout::TiledLayout;

/// The iteration state of a [`Layout`].
///
/// Layouts cannot be reset: a new layout must be constructed to iterate again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum LayoutState {
    /// No chunk has been requested yet.
    Constructed,
    /// At least one chunk has been requested and more remain.
    Iterating,
    /// All chunks have been yielded.
    Exhausted,
}

/// A lazy, finite sequence of [`Chunk`]s.
///
/// Layouts own their inputs and hold no shared state, so independent layouts can be iterated on separate threads.
pub trait Layout: Iterator<Item = Chunk> + FusedIterator + Send {
    /// Return the size in bytes of an element.
    fn element_size(&self) -> u64;

    /// Return the total number of elements over all chunks.
    fn total_elements(&self) -> u64;

    /// Return the number of elements in the largest chunk.
    ///
    /// Every chunk has this many elements, except that an empty layout returns zero.
    fn chunk_size_hint(&self) -> u64;

    /// Return the total number of chunks, including chunks that have already been yielded.
    fn num_chunks(&self) -> u64;

    /// Return the shape of the destination array that [`Chunk::start_elem`] indexes.
    fn destination_shape(&self) -> &[u64];

    /// Returns true if another chunk remains. This has no side effects.
    fn has_next(&self) -> bool;

    /// Return the iteration state.
    fn state(&self) -> LayoutState;
}

/// Compute row-major strides for `shape`, checking for overflow.
///
/// Only the products of trailing extents are computed, so the product of the whole shape may exceed [`u64::MAX`].
pub(crate) fn checked_row_major_strides(shape: &[u64]) -> Option<Vec<u64>> {
    let mut strides = vec![1u64; shape.len()];
    for i in (1..shape.len()).rev() {
        strides[i - 1] = strides[i].checked_mul(shape[i])?;
    }
    Some(strides)
}
