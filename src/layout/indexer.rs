use std::iter::FusedIterator;

use crate::{range::RangeError, section::unravel_index};

use super::{Chunk, LayoutState};

/// A dimension of a [`ChunkIndexer`], in destination order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct IndexerDimension {
    /// The number of selected elements.
    pub length: u64,
    /// The distance in bytes in storage between consecutive selected elements.
    pub source_stride: u64,
    /// The distance in elements in the destination between consecutive selected elements.
    pub destination_stride: u64,
}

/// The merge-then-enumerate engine shared by all layouts.
///
/// Trailing dimensions that are contiguous in both storage and the destination are merged into one run of [`chunk_size`](ChunkIndexer::chunk_size) elements.
/// The outer dimensions are enumerated in row-major order, yielding one [`Chunk`] per combination of outer indices.
#[derive(Clone, Debug)]
pub(crate) struct ChunkIndexer {
    element_size: u64,
    source_start: u64,
    destination_start: u64,
    outer: Vec<IndexerDimension>,
    outer_shape: Vec<u64>,
    chunk_size: u64,
    num_chunks: u64,
    destination_shape: Vec<u64>,
    index_front: u64,
    index_back: u64,
    started: bool,
}

impl ChunkIndexer {
    /// Create a new chunk indexer.
    ///
    /// `source_start` is a byte offset in storage and `destination_start` is an element offset in an array of `destination_shape`.
    ///
    /// # Errors
    /// Returns [`RangeError::ZeroElementSize`] if `element_size` is zero, or [`RangeError::Overflow`] if any reachable byte or element offset overflows [`u64`].
    pub fn new(
        element_size: u64,
        source_start: u64,
        destination_start: u64,
        dimensions: Vec<IndexerDimension>,
        destination_shape: Vec<u64>,
    ) -> Result<Self, RangeError> {
        if element_size == 0 {
            return Err(RangeError::ZeroElementSize);
        }
        Self::check_extents(element_size, source_start, destination_start, &dimensions)?;

        let mut chunk_size = 1u64;
        let mut split = dimensions.len();
        for dimension in dimensions.iter().rev() {
            let contiguous = dimension.length == 1
                || (chunk_size
                    .checked_mul(element_size)
                    .is_some_and(|run_bytes| dimension.source_stride == run_bytes)
                    && dimension.destination_stride == chunk_size);
            if !contiguous {
                break;
            }
            chunk_size *= dimension.length;
            split -= 1;
        }

        let mut outer = dimensions;
        outer.truncate(split);
        let outer_shape = outer.iter().map(|dimension| dimension.length).collect::<Vec<_>>();
        let num_chunks = outer_shape.iter().product::<u64>();
        Ok(Self {
            element_size,
            source_start,
            destination_start,
            outer,
            outer_shape,
            chunk_size,
            num_chunks,
            destination_shape,
            index_front: 0,
            index_back: num_chunks,
            started: false,
        })
    }

    /// Create a chunk indexer that yields no chunks.
    pub fn new_empty(element_size: u64, destination_shape: Vec<u64>) -> Self {
        Self {
            element_size,
            source_start: 0,
            destination_start: 0,
            outer: Vec::new(),
            outer_shape: Vec::new(),
            chunk_size: 0,
            num_chunks: 0,
            destination_shape,
            index_front: 0,
            index_back: 0,
            started: false,
        }
    }

    /// Check that the last byte and element reachable by `dimensions` fit in a [`u64`].
    ///
    /// This also bounds the total number of elements, as every selected element has a distinct destination offset.
    fn check_extents(
        element_size: u64,
        source_start: u64,
        destination_start: u64,
        dimensions: &[IndexerDimension],
    ) -> Result<(), RangeError> {
        let mut source_end = source_start.checked_add(element_size);
        let mut destination_end = destination_start.checked_add(1);
        let mut total_elements = Some(1u64);
        for dimension in dimensions {
            if dimension.length == 0 {
                return Err(RangeError::ZeroLength);
            }
            let span = dimension.length - 1;
            source_end = span
                .checked_mul(dimension.source_stride)
                .and_then(|span| source_end?.checked_add(span));
            destination_end = span
                .checked_mul(dimension.destination_stride)
                .and_then(|span| destination_end?.checked_add(span));
            total_elements = total_elements.and_then(|total| total.checked_mul(dimension.length));
        }
        match (source_end, destination_end, total_elements) {
            (Some(_), Some(_), Some(_)) => Ok(()),
            _ => Err(RangeError::Overflow),
        }
    }

    pub fn element_size(&self) -> u64 {
        self.element_size
    }

    /// The number of elements in each chunk.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn num_chunks(&self) -> u64 {
        self.num_chunks
    }

    /// The number of elements over all chunks.
    pub fn total_elements(&self) -> u64 {
        self.num_chunks() * self.chunk_size
    }

    pub fn destination_shape(&self) -> &[u64] {
        &self.destination_shape
    }

    /// The number of dimensions enumerated rather than merged.
    #[cfg(test)]
    pub fn num_outer_dimensions(&self) -> usize {
        self.outer.len()
    }

    pub fn has_next(&self) -> bool {
        self.index_front < self.index_back
    }

    pub fn state(&self) -> LayoutState {
        if !self.started {
            LayoutState::Constructed
        } else if self.has_next() {
            LayoutState::Iterating
        } else {
            LayoutState::Exhausted
        }
    }

    fn chunk(&self, index: u64) -> Chunk {
        let indices = unravel_index(index, &self.outer_shape);
        let (file_pos, start_elem) = std::iter::zip(&indices, &self.outer).fold(
            (self.source_start, self.destination_start),
            |(file_pos, start_elem), (&index, dimension)| {
                (
                    file_pos + index * dimension.source_stride,
                    start_elem + index * dimension.destination_stride,
                )
            },
        );
        Chunk::new(file_pos, start_elem, self.chunk_size)
    }
}

impl Iterator for ChunkIndexer {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        self.started = true;
        if self.index_front < self.index_back {
            let chunk = self.chunk(self.index_front);
            self.index_front += 1;
            Some(chunk)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.index_back - self.index_front).ok();
        (remaining.unwrap_or(usize::MAX), remaining)
    }
}

impl DoubleEndedIterator for ChunkIndexer {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.started = true;
        if self.index_back > self.index_front {
            self.index_back -= 1;
            Some(self.chunk(self.index_back))
        } else {
            None
        }
    }
}

impl FusedIterator for ChunkIndexer {}

#[cfg(test)]
mod tests {
    use super::*;

    fn dimension(length: u64, source_stride: u64, destination_stride: u64) -> IndexerDimension {
        IndexerDimension {
            length,
            source_stride,
            destination_stride,
        }
    }

    #[test]
    fn indexer_merge_contiguous() {
        // 2x3 of a 4x3 array of 2 byte elements, starting at row 1
        let indexer = ChunkIndexer::new(
            2,
            6,
            0,
            vec![dimension(2, 6, 3), dimension(3, 2, 1)],
            vec![2, 3],
        )
        .unwrap();
        assert_eq!(indexer.chunk_size(), 6);
        assert_eq!(indexer.num_chunks(), 1);
        assert_eq!(indexer.num_outer_dimensions(), 0);
        assert_eq!(indexer.collect::<Vec<_>>(), vec![Chunk::new(6, 0, 6)]);
    }

    #[test]
    fn indexer_merge_stops_at_gap() {
        // 2x2 of a 4x3 array of 1 byte elements
        let indexer = ChunkIndexer::new(
            1,
            0,
            0,
            vec![dimension(2, 3, 2), dimension(2, 1, 1)],
            vec![2, 2],
        )
        .unwrap();
        assert_eq!(indexer.chunk_size(), 2);
        assert_eq!(indexer.num_outer_dimensions(), 1);
        assert_eq!(
            indexer.collect::<Vec<_>>(),
            vec![Chunk::new(0, 0, 2), Chunk::new(3, 2, 2)]
        );
    }

    #[test]
    fn indexer_merge_unit_dimensions() {
        let indexer = ChunkIndexer::new(
            1,
            0,
            0,
            vec![dimension(1, 1000, 4), dimension(4, 1, 1), dimension(1, 77, 1)],
            vec![1, 4, 1],
        )
        .unwrap();
        assert_eq!(indexer.chunk_size(), 4);
        assert_eq!(indexer.num_chunks(), 1);
    }

    #[test]
    fn indexer_scalar() {
        let indexer = ChunkIndexer::new(8, 100, 0, vec![], vec![]).unwrap();
        assert_eq!(indexer.total_elements(), 1);
        assert_eq!(indexer.collect::<Vec<_>>(), vec![Chunk::new(100, 0, 1)]);
    }

    #[test]
    fn indexer_empty() {
        let mut indexer = ChunkIndexer::new_empty(4, vec![3, 3]);
        assert_eq!(indexer.num_chunks(), 0);
        assert_eq!(indexer.total_elements(), 0);
        assert_eq!(indexer.chunk_size(), 0);
        assert_eq!(indexer.state(), LayoutState::Constructed);
        assert_eq!(indexer.next(), None);
        assert_eq!(indexer.state(), LayoutState::Exhausted);
    }

    #[test]
    fn indexer_state() {
        let mut indexer =
            ChunkIndexer::new(1, 0, 0, vec![dimension(3, 2, 1)], vec![3]).unwrap();
        assert_eq!(indexer.state(), LayoutState::Constructed);
        assert!(indexer.has_next());
        assert!(indexer.has_next());
        assert_eq!(indexer.state(), LayoutState::Constructed);
        assert_eq!(indexer.next(), Some(Chunk::new(0, 0, 1)));
        assert_eq!(indexer.state(), LayoutState::Iterating);
        assert_eq!(indexer.next_back(), Some(Chunk::new(4, 2, 1)));
        assert_eq!(indexer.next(), Some(Chunk::new(2, 1, 1)));
        assert_eq!(indexer.state(), LayoutState::Exhausted);
        assert!(!indexer.has_next());
        assert_eq!(indexer.next(), None);
        assert_eq!(indexer.next_back(), None);
    }

    #[test]
    fn indexer_errors() {
        assert_eq!(
            ChunkIndexer::new(0, 0, 0, vec![], vec![]).unwrap_err(),
            RangeError::ZeroElementSize
        );
        assert_eq!(
            ChunkIndexer::new(1, u64::MAX - 2, 0, vec![dimension(4, 1, 1)], vec![4])
                .unwrap_err(),
            RangeError::Overflow
        );
        assert_eq!(
            ChunkIndexer::new(
                1,
                0,
                0,
                vec![dimension(u64::MAX, 0, 0), dimension(2, 0, 0)],
                vec![u64::MAX, 2]
            )
            .unwrap_err(),
            RangeError::Overflow
        );
    }
}
