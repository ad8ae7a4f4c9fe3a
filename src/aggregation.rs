//! Aggregation of tiles into a logical array.
//!
//! A [`TiledArray`] stitches many independently stored [`Tile`]s into one logical array.
//! Each tile stores a rectangular section of the logical array, in row-major order from a byte offset of its own storage.
//!
//! A request for a section of the logical array is served by:
//!  1. building a [`TiledLayout`] for every tile and skipping tiles that do not intersect the request,
//!  2. reading the needed tiles concurrently, each into a compact buffer of its intersection, and
//!  3. scattering the buffers into the destination in tile order.
//!
//! Tiles may overlap, in which case the tile added last wins.
//! Elements of the request not covered by any tile hold the fill value.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon_iter_concurrent_limit::iter_concurrent_limit;
use thiserror::Error;

use crate::{
    config::global_config,
    layout::{Chunk, Layout, TiledLayout},
    range::RangeError,
    section::Section,
    storage::{ReadableStorage, StorageError},
};

/// An aggregation error.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// The fill value does not have the element size.
    #[error("fill value has length {0}, expected the element size {1}")]
    InvalidFillValue(usize, u64),
    /// An invalid section or layout.
    #[error(transparent)]
    RangeError(#[from] RangeError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// A tile of a [`TiledArray`].
#[derive(Clone)]
pub struct Tile {
    storage: ReadableStorage,
    start_pos: u64,
    data_section: Section,
}

impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("start_pos", &self.start_pos)
            .field("data_section", &self.data_section)
            .finish_non_exhaustive()
    }
}

impl Tile {
    /// Create a new tile storing `data_section` of the logical array from `start_pos` of `storage`.
    ///
    /// # Errors
    /// Returns [`RangeError::UnfilledRange`] if `data_section` is unfilled.
    pub fn new(
        storage: ReadableStorage,
        start_pos: u64,
        data_section: Section,
    ) -> Result<Self, RangeError> {
        data_section.filled_ranges()?;
        Ok(Self {
            storage,
            start_pos,
            data_section,
        })
    }

    /// Return the storage of the tile.
    #[must_use]
    pub fn storage(&self) -> &ReadableStorage {
        &self.storage
    }

    /// Return the byte offset of the tile in its storage.
    #[must_use]
    pub fn start_pos(&self) -> u64 {
        self.start_pos
    }

    /// Return the section of the logical array stored by the tile.
    #[must_use]
    pub fn data_section(&self) -> &Section {
        &self.data_section
    }

    /// Create the layout of this tile for a request of `want`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if `want` cannot be correlated with the data section of the tile.
    pub fn layout(&self, element_size: u64, want: &Section) -> Result<TiledLayout, RangeError> {
        TiledLayout::new_with_start_pos(self.start_pos, element_size, &self.data_section, want)
    }

    /// Read the chunks of `layout` into a compact buffer, in chunk order.
    fn read(&self, layout: TiledLayout) -> Result<(Vec<Chunk>, Vec<u8>), AggregationError> {
        let element_size = layout.element_size();
        let size = layout
            .total_elements()
            .checked_mul(element_size)
            .and_then(|size| usize::try_from(size).ok())
            .ok_or(RangeError::Overflow)?;
        let mut bytes = vec![0; size];
        let mut chunks = Vec::with_capacity(usize::try_from(layout.num_chunks()).unwrap_or(0));
        let mut offset = 0;
        for chunk in layout {
            let length = usize::try_from(chunk.nelems() * element_size)
                .map_err(|_| RangeError::Overflow)?;
            self.storage
                .read_at(chunk.file_pos(), &mut bytes[offset..offset + length])?;
            offset += length;
            chunks.push(chunk);
        }
        Ok((chunks, bytes))
    }
}

/// A logical array aggregated from [`Tile`]s.
#[derive(Debug)]
pub struct TiledArray {
    element_size: u64,
    fill_value: Vec<u8>,
    tiles: Vec<Tile>,
}

impl TiledArray {
    /// Create a new tiled array with no tiles.
    ///
    /// # Errors
    /// Returns an [`AggregationError`] if `element_size` is zero or `fill_value` is not `element_size` bytes.
    pub fn new(element_size: u64, fill_value: Vec<u8>) -> Result<Self, AggregationError> {
        if element_size == 0 {
            return Err(RangeError::ZeroElementSize.into());
        }
        if fill_value.len() as u64 != element_size {
            return Err(AggregationError::InvalidFillValue(
                fill_value.len(),
                element_size,
            ));
        }
        Ok(Self {
            element_size,
            fill_value,
            tiles: Vec::new(),
        })
    }

    /// Return the size in bytes of an element.
    #[must_use]
    pub fn element_size(&self) -> u64 {
        self.element_size
    }

    /// Return the fill value.
    #[must_use]
    pub fn fill_value(&self) -> &[u8] {
        &self.fill_value
    }

    /// Return the tiles.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Add a tile storing `data_section` of the logical array from `start_pos` of `storage`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if `data_section` is unfilled or its rank differs from the existing tiles.
    pub fn add_tile(
        &mut self,
        storage: ReadableStorage,
        start_pos: u64,
        data_section: Section,
    ) -> Result<(), AggregationError> {
        if let Some(tile) = self.tiles.first() {
            if tile.data_section.rank() != data_section.rank() {
                return Err(RangeError::IncompatibleRank(
                    data_section.rank(),
                    tile.data_section.rank(),
                )
                .into());
            }
        }
        self.tiles.push(Tile::new(storage, start_pos, data_section)?);
        Ok(())
    }

    /// Return the indices of the tiles that intersect `want`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if `want` cannot be correlated with a tile.
    pub fn needed_tiles(&self, want: &Section) -> Result<Vec<usize>, AggregationError> {
        let mut needed = Vec::new();
        for (i, tile) in self.tiles.iter().enumerate() {
            if tile.layout(self.element_size, want)?.is_needed() {
                needed.push(i);
            }
        }
        Ok(needed)
    }

    /// Read `want` from the tiles.
    ///
    /// The result holds the elements of `want` in row-major order.
    /// Tiles are read concurrently, up to the [tile concurrent limit](crate::config::Config#tile-concurrent-limit).
    ///
    /// # Errors
    /// Returns an [`AggregationError`] if `want` cannot be correlated with a tile, or a read fails.
    #[tracing::instrument(skip_all, fields(want = %want, tiles = self.tiles.len()))]
    pub fn retrieve(&self, want: &Section) -> Result<Vec<u8>, AggregationError> {
        let mut needed = Vec::with_capacity(self.tiles.len());
        for (i, tile) in self.tiles.iter().enumerate() {
            let layout = tile.layout(self.element_size, want)?;
            if layout.is_needed() {
                needed.push((tile, layout));
            } else {
                tracing::debug!(tile = i, data = %tile.data_section, "Skipping tile");
            }
        }

        let num_elements = want
            .shape()?
            .iter()
            .try_fold(1u64, |size, &extent| size.checked_mul(extent))
            .and_then(|size| usize::try_from(size).ok())
            .ok_or(RangeError::Overflow)?;
        let mut out = self.fill_value.repeat(num_elements);

        let tile_concurrent_limit = global_config().tile_concurrent_limit();
        let tile_bytes = iter_concurrent_limit!(
            tile_concurrent_limit,
            needed,
            map,
            |(tile, layout): (&Tile, TiledLayout)| tile.read(layout)
        )
        .collect::<Result<Vec<_>, AggregationError>>()?;

        let element_size = self.element_size;
        for (chunks, bytes) in tile_bytes {
            let mut offset = 0;
            for chunk in chunks {
                let range = chunk.destination_byte_range(element_size);
                let destination = usize::try_from(range.start)
                    .ok()
                    .zip(usize::try_from(range.end).ok())
                    .and_then(|(start, end)| out.get_mut(start..end))
                    .ok_or(StorageError::ChunkOutOfBuffer(chunk))?;
                destination.copy_from_slice(&bytes[offset..offset + destination.len()]);
                offset += destination.len();
            }
        }
        Ok(out)
    }
}
