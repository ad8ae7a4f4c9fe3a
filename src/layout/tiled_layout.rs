use std::iter::FusedIterator;

use itertools::Itertools;

use crate::{range::RangeError, section::Section};

use super::{
    checked_row_major_strides,
    indexer::{ChunkIndexer, IndexerDimension},
    Chunk, Layout, LayoutState,
};

/// The layout of a tile of a larger logical array.
///
/// A tile stores the elements of its data section in row-major order starting at a byte offset.
/// The data section is expressed in the coordinates of the logical array, and its ranges may be named.
///
/// Chunks cover the intersection of the data section with the wanted section.
/// Their file positions are within the tile, and their destination positions are within an array with the shape of the wanted section.
/// Many tiles of one logical array can therefore be read in any order and scattered into one destination.
///
/// If the ranges of both sections are all named, dimensions are correlated by name and may be ordered differently in each section.
/// Otherwise they are correlated by position.
#[derive(Clone, Debug)]
pub struct TiledLayout {
    indexer: ChunkIndexer,
    data: Section,
    want: Section,
    intersection: Option<Intersection>,
}

#[derive(Clone, Debug)]
struct Intersection {
    global: Section,
    in_data: Section,
    in_want: Section,
}

impl TiledLayout {
    /// Create a new tiled layout for a tile stored from byte offset zero.
    ///
    /// # Errors
    /// See [`new_with_start_pos`](TiledLayout::new_with_start_pos).
    pub fn new(element_size: u64, data: &Section, want: &Section) -> Result<Self, RangeError> {
        Self::new_with_start_pos(0, element_size, data, want)
    }

    /// Create a new tiled layout for a tile stored from byte offset `start_pos`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if
    ///  - the ranks of `data` and `want` differ,
    ///  - either section is unfilled,
    ///  - the dimensions of `data` and `want` cannot be correlated,
    ///  - `element_size` is zero, or
    ///  - a byte position overflows [`u64`].
    pub fn new_with_start_pos(
        start_pos: u64,
        element_size: u64,
        data: &Section,
        want: &Section,
    ) -> Result<Self, RangeError> {
        if data.rank() != want.rank() {
            return Err(RangeError::IncompatibleRank(data.rank(), want.rank()));
        }
        if element_size == 0 {
            return Err(RangeError::ZeroElementSize);
        }
        let data_ranges = data.filled_ranges()?;
        let want_ranges = want.filled_ranges()?;
        let dimension_map = correlate_dimensions(data, want)?;
        let destination_shape = want.shape()?;

        let intersection = std::iter::zip(&want_ranges, &dimension_map)
            .map(|(want_range, &d)| want_range.intersect(data_ranges[d]))
            .collect::<Option<Vec<_>>>();
        let Some(intersection) = intersection else {
            tracing::debug!(data = %data, want = %want, "Tile does not intersect");
            return Ok(Self {
                indexer: ChunkIndexer::new_empty(element_size, destination_shape),
                data: data.clone(),
                want: want.clone(),
                intersection: None,
            });
        };

        let data_shape = data.shape()?;
        let local_strides = checked_row_major_strides(&data_shape).ok_or(RangeError::Overflow)?;
        let destination_strides =
            checked_row_major_strides(&destination_shape).ok_or(RangeError::Overflow)?;

        let mut source_start = start_pos;
        let mut destination_start = 0u64;
        let mut in_data = vec![None; data.rank()];
        let mut in_want = Vec::with_capacity(want.rank());
        let mut dimensions = Vec::with_capacity(want.rank());
        for (w, (range, &d)) in std::iter::zip(&intersection, &dimension_map).enumerate() {
            let local = range.relative_to(data_ranges[d])?;
            let destination = range.relative_to(want_ranges[w])?;
            let local_bytes = local_strides[d]
                .checked_mul(element_size)
                .ok_or(RangeError::Overflow)?;
            source_start = local
                .first()
                .checked_mul(local_bytes)
                .and_then(|offset| source_start.checked_add(offset))
                .ok_or(RangeError::Overflow)?;
            destination_start = destination
                .first()
                .checked_mul(destination_strides[w])
                .and_then(|offset| destination_start.checked_add(offset))
                .ok_or(RangeError::Overflow)?;
            dimensions.push(IndexerDimension {
                length: range.length(),
                source_stride: local
                    .stride()
                    .checked_mul(local_bytes)
                    .ok_or(RangeError::Overflow)?,
                destination_stride: destination
                    .stride()
                    .checked_mul(destination_strides[w])
                    .ok_or(RangeError::Overflow)?,
            });
            in_data[d] = Some(local);
            in_want.push(destination);
        }

        let indexer = ChunkIndexer::new(
            element_size,
            source_start,
            destination_start,
            dimensions,
            destination_shape,
        )?;
        let intersection = Intersection {
            global: Section::new(intersection),
            in_data: Section::new_partial(in_data),
            in_want: Section::new(in_want),
        };
        tracing::debug!(
            intersection = %intersection.global,
            num_chunks = indexer.num_chunks(),
            chunk_size = indexer.chunk_size(),
            "Created tiled layout"
        );
        Ok(Self {
            indexer,
            data: data.clone(),
            want: want.clone(),
            intersection: Some(intersection),
        })
    }

    /// Returns true if the tile intersects the wanted section.
    ///
    /// A tile that is not needed yields no chunks and need not be opened.
    #[must_use]
    pub fn is_needed(&self) -> bool {
        self.intersection.is_some()
    }

    /// Return the intersection of the data and wanted sections in the coordinates of the logical array, in wanted dimension order.
    #[must_use]
    pub fn intersection(&self) -> Option<&Section> {
        self.intersection.as_ref().map(|i| &i.global)
    }

    /// Return the intersection as positions within the tile, in data dimension order.
    #[must_use]
    pub fn intersection_in_data(&self) -> Option<&Section> {
        self.intersection.as_ref().map(|i| &i.in_data)
    }

    /// Return the intersection as positions within the wanted section.
    #[must_use]
    pub fn intersection_in_want(&self) -> Option<&Section> {
        self.intersection.as_ref().map(|i| &i.in_want)
    }

    /// Return the data section of the tile.
    #[must_use]
    pub fn data_section(&self) -> &Section {
        &self.data
    }

    /// Return the wanted section.
    #[must_use]
    pub fn want_section(&self) -> &Section {
        &self.want
    }
}

/// For each dimension of `want`, find the corresponding dimension of `data`.
fn correlate_dimensions(data: &Section, want: &Section) -> Result<Vec<usize>, RangeError> {
    if !(data.is_named() && want.is_named()) {
        return Ok((0..want.rank()).collect());
    }
    let data_names = data.range_names();
    let want_names = want.range_names();
    for names in [&data_names, &want_names] {
        if let Some(duplicate) = names.iter().flatten().duplicates().next() {
            return Err(RangeError::DuplicateRangeName((*duplicate).to_string()));
        }
    }
    want_names
        .iter()
        .flatten()
        .map(|name| {
            data.find_dimension(name)
                .ok_or_else(|| RangeError::UncorrelatedDimension((*name).to_string()))
        })
        .collect()
}

impl Layout for TiledLayout {
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

impl Iterator for TiledLayout {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        self.indexer.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indexer.size_hint()
    }
}

impl DoubleEndedIterator for TiledLayout {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.indexer.next_back()
    }
}

impl FusedIterator for TiledLayout {}
