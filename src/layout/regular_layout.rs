use std::{iter::FusedIterator, num::NonZeroU64};

use crate::{range::RangeError, section::Section};

use super::{
    checked_row_major_strides,
    indexer::{ChunkIndexer, IndexerDimension},
    Chunk, Layout, LayoutState,
};

/// The layout of a section of a single stored array.
///
/// The array is stored in row-major order starting at a byte offset.
/// If a record size is given, the outermost dimension is a record dimension:
/// each index of that dimension is stored in its own block of `record_size` bytes, which may be padded.
///
/// Chunks are yielded in destination order, where the destination is an array with the shape of the wanted section.
#[derive(Clone, Debug)]
pub struct RegularLayout {
    indexer: ChunkIndexer,
    wanted: Section,
    record_size: Option<NonZeroU64>,
}

impl RegularLayout {
    /// Create a new regular layout.
    ///
    /// Reads `wanted` from an array with `var_shape` whose elements of `element_size` bytes are stored from `start_pos`.
    /// Unfilled ranges of `wanted` select the whole dimension.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if
    ///  - `wanted` does not lie within `var_shape`,
    ///  - `element_size` is zero, or
    ///  - a byte position overflows [`u64`].
    pub fn new(
        start_pos: u64,
        element_size: u64,
        record_size: Option<NonZeroU64>,
        var_shape: &[u64],
        wanted: &Section,
    ) -> Result<Self, RangeError> {
        let wanted = wanted.set_defaults(var_shape);
        wanted.check_in_range(var_shape)?;
        let ranges = wanted.filled_ranges()?;
        let destination_shape = wanted.shape()?;

        let storage_strides = checked_row_major_strides(var_shape).ok_or(RangeError::Overflow)?;
        let destination_strides =
            checked_row_major_strides(&destination_shape).ok_or(RangeError::Overflow)?;

        let mut source_start = start_pos;
        let mut dimensions = Vec::with_capacity(ranges.len());
        for (i, (range, (storage_stride, destination_stride))) in std::iter::zip(
            &ranges,
            std::iter::zip(storage_strides, destination_strides),
        )
        .enumerate()
        {
            let index_bytes = match record_size {
                Some(record_size) if i == 0 => Some(record_size.get()),
                _ => element_size.checked_mul(storage_stride),
            }
            .ok_or(RangeError::Overflow)?;
            source_start = range
                .first()
                .checked_mul(index_bytes)
                .and_then(|offset| source_start.checked_add(offset))
                .ok_or(RangeError::Overflow)?;
            dimensions.push(IndexerDimension {
                length: range.length(),
                source_stride: range
                    .stride()
                    .checked_mul(index_bytes)
                    .ok_or(RangeError::Overflow)?,
                destination_stride,
            });
        }

        let indexer =
            ChunkIndexer::new(element_size, source_start, 0, dimensions, destination_shape)?;
        tracing::debug!(
            wanted = %wanted,
            num_chunks = indexer.num_chunks(),
            chunk_size = indexer.chunk_size(),
            "Created regular layout"
        );
        Ok(Self {
            indexer,
            wanted,
            record_size,
        })
    }

    /// Return the wanted section, with unfilled ranges resolved against the variable shape.
    #[must_use]
    pub fn wanted_section(&self) -> &Section {
        &self.wanted
    }

    /// Return the record size.
    #[must_use]
    pub fn record_size(&self) -> Option<NonZeroU64> {
        self.record_size
    }
}

impl Layout for RegularLayout {
    fn element_size(&self) -> u64 {
        self.indexer.element_size()
    }

    fn total_elements(&self) -> u64 {
        self.indexer.total_elements()
    }

    fn chunk_size_hint(&self) -> u64 {
        self.indexer.chunk_size()
    }

    fn num_chunks(&self) -> u64 {
        self.indexer.num_chunks()
    }

    fn destination_shape(&self) -> &[u64] {
        self.indexer.destination_shape()
    }

    fn has_next(&self) -> bool {
        self.indexer.has_next()
    }

    fn state(&self) -> LayoutState {
        self.indexer.state()
    }
}

impl Iterator for RegularLayout {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        self.indexer.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indexer.size_hint()
    }
}

impl DoubleEndedIterator for RegularLayout {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.indexer.next_back()
    }
}

impl FusedIterator for RegularLayout {}
