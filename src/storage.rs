//! Storage and layout-driven I/O.
//!
//! A [`Layout`] only computes where bytes live.
//! This module performs the I/O: [`retrieve_layout_into`] issues exactly one read per [`Chunk`] and scatters it into a destination buffer,
//! and [`store_layout`] is its write-side mirror.
//!
//! Storage is anything implementing [`ReadableStorageTraits`] and/or [`WritableStorageTraits`]:
//!  - [`MemoryStore`]: a growable in-memory byte buffer,
//!  - [`FileStore`]: a file,
//!  - `[u8]` and [`bytes::Bytes`]: read-only byte slices.

mod file_store;
mod memory_store;

use std::sync::Arc;

use itertools::Either;
use thiserror::Error;

use crate::{
    config::global_config,
    layout::{Chunk, Layout},
    range::RangeError,
};

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// [`Arc`] wrapped readable storage.
pub type ReadableStorage = Arc<dyn ReadableStorageTraits>;

/// [`Arc`] wrapped writable storage.
pub type WritableStorage = Arc<dyn WritableStorageTraits>;

/// [`Arc`] wrapped readable and writable storage.
pub type ReadableWritableStorage = Arc<dyn ReadableWritableStorageTraits>;

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// A read extends beyond the end of the storage.
    #[error("read of {1} bytes at offset {0} is beyond the end of storage with size {2}")]
    OutOfBounds(u64, u64, u64),
    /// A buffer does not have the length required by a layout.
    #[error("buffer has length {0}, expected {1}")]
    InvalidBufferLength(usize, u64),
    /// A chunk does not lie within the destination buffer.
    #[error("chunk ({0}) does not lie within the destination buffer")]
    ChunkOutOfBuffer(Chunk),
    /// An invalid layout.
    #[error(transparent)]
    RangeError(#[from] RangeError),
}

/// Readable storage traits.
pub trait ReadableStorageTraits: Send + Sync {
    /// Read `buf.len()` bytes starting at byte `offset` into `buf`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the bytes cannot be read, or [`StorageError::OutOfBounds`] if they extend beyond the end of the storage.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Return the size of the storage in bytes.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the size cannot be determined.
    fn size(&self) -> Result<u64, StorageError>;
}

/// Writable storage traits.
pub trait WritableStorageTraits: Send + Sync {
    /// Write `data` starting at byte `offset`, growing the storage if required.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the bytes cannot be written.
    fn write_at(&self, offset: u64, data: &[u8]) -> Result<(), StorageError>;
}

/// A supertrait of [`ReadableStorageTraits`] and [`WritableStorageTraits`].
pub trait ReadableWritableStorageTraits: ReadableStorageTraits + WritableStorageTraits {}

impl<T> ReadableWritableStorageTraits for T where T: ReadableStorageTraits + WritableStorageTraits
{}

/// Copy `buf.len()` bytes of `data` starting at `offset` into `buf`.
fn read_slice(data: &[u8], offset: u64, buf: &mut [u8]) -> Result<(), StorageError> {
    let out_of_bounds = || StorageError::OutOfBounds(offset, buf.len() as u64, data.len() as u64);
    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    let bytes = start
        .checked_add(buf.len())
        .and_then(|end| data.get(start..end))
        .ok_or_else(out_of_bounds)?;
    buf.copy_from_slice(bytes);
    Ok(())
}

impl ReadableStorageTraits for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        read_slice(self, offset, buf)
    }

    fn size(&self) -> Result<u64, StorageError> {
        Ok(self.len() as u64)
    }
}

impl ReadableStorageTraits for bytes::Bytes {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        read_slice(self, offset, buf)
    }

    fn size(&self) -> Result<u64, StorageError> {
        Ok(self.len() as u64)
    }
}

/// Return the size in bytes of the destination of `layout`.
///
/// # Errors
/// Returns [`RangeError::Overflow`] if the size overflows [`u64`].
pub fn destination_size<L: Layout + ?Sized>(layout: &L) -> Result<u64, RangeError> {
    layout
        .destination_shape()
        .iter()
        .try_fold(layout.element_size(), |size, &extent| size.checked_mul(extent))
        .ok_or(RangeError::Overflow)
}

fn destination_bytes(
    chunk: &Chunk,
    element_size: u64,
    buffer_len: usize,
) -> Result<std::ops::Range<usize>, StorageError> {
    let range = chunk.destination_byte_range(element_size);
    match (usize::try_from(range.start), usize::try_from(range.end)) {
        (Ok(start), Ok(end)) if end <= buffer_len => Ok(start..end),
        _ => Err(StorageError::ChunkOutOfBuffer(*chunk)),
    }
}

/// Read the chunks of `layout` from `storage` into a new buffer.
///
/// The buffer holds the destination array of the layout in row-major order.
/// Elements of the destination that are not covered by a chunk are zero.
///
/// # Errors
/// Returns a [`StorageError`] if a read fails or the destination does not fit in memory.
pub fn retrieve_layout<S, L>(storage: &S, layout: L) -> Result<Vec<u8>, StorageError>
where
    S: ReadableStorageTraits + ?Sized,
    L: Layout,
{
    let size = usize::try_from(destination_size(&layout)?).map_err(|_| RangeError::Overflow)?;
    let mut out = vec![0; size];
    retrieve_layout_into(storage, layout, &mut out)?;
    Ok(out)
}

/// Read the chunks of `layout` from `storage` into `out`.
///
/// `out` holds the destination array of the layout in row-major order.
/// One read is issued per chunk, in destination order, or in file order if [sort reads by file position](crate::config::Config#sort-reads-by-file-position) is enabled.
/// Elements of `out` that are not covered by a chunk are left unchanged.
///
/// # Errors
/// Returns a [`StorageError`] if a read fails or the length of `out` does not match the destination of `layout`.
pub fn retrieve_layout_into<S, L>(
    storage: &S,
    layout: L,
    out: &mut [u8],
) -> Result<(), StorageError>
where
    S: ReadableStorageTraits + ?Sized,
    L: Layout,
{
    let expected = destination_size(&layout)?;
    if out.len() as u64 != expected {
        return Err(StorageError::InvalidBufferLength(out.len(), expected));
    }
    let element_size = layout.element_size();
    let sort = global_config().sort_reads_by_file_position();
    let chunks = if sort {
        let mut chunks = layout.collect::<Vec<_>>();
        chunks.sort_unstable_by_key(Chunk::file_pos);
        Either::Left(chunks.into_iter())
    } else {
        Either::Right(layout)
    };
    for chunk in chunks {
        let range = destination_bytes(&chunk, element_size, out.len())?;
        storage.read_at(chunk.file_pos(), &mut out[range])?;
        tracing::trace!(%chunk, "Read chunk");
    }
    Ok(())
}

/// Write the chunks of `layout` from `data` to `storage`.
///
/// `data` holds the destination array of the layout in row-major order.
/// This is the inverse of [`retrieve_layout_into`]: one write is issued per chunk.
///
/// # Errors
/// Returns a [`StorageError`] if a write fails or the length of `data` does not match the destination of `layout`.
pub fn store_layout<S, L>(storage: &S, layout: L, data: &[u8]) -> Result<(), StorageError>
where
    S: WritableStorageTraits + ?Sized,
    L: Layout,
{
    let expected = destination_size(&layout)?;
    if data.len() as u64 != expected {
        return Err(StorageError::InvalidBufferLength(data.len(), expected));
    }
    let element_size = layout.element_size();
    for chunk in layout {
        let range = destination_bytes(&chunk, element_size, data.len())?;
        storage.write_at(chunk.file_pos(), &data[range])?;
        tracing::trace!(%chunk, "Wrote chunk");
    }
    Ok(())
}
