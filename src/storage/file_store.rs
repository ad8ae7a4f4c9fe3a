//! A file store.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use parking_lot::Mutex;

use crate::storage::{ReadableStorageTraits, StorageError, WritableStorageTraits};

/// A store backed by a single file.
///
/// Reads and writes seek to an absolute byte offset, so the file position is held under a lock for each operation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileStore {
    /// Open an existing file for reading.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        tracing::debug!(path = %path.display(), "Opened file store");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Open a file for reading and writing, creating it if it does not exist.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the file cannot be opened or created.
    pub fn open_read_write<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        tracing::debug!(path = %path.display(), "Opened file store for writing");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Create an empty file for reading and writing, truncating it if it exists.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        tracing::debug!(path = %path.display(), "Created file store");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Return the path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReadableStorageTraits for FileStore {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        let mut file = self.file.lock();
        let size = file.metadata()?.len();
        let length = buf.len() as u64;
        if offset.checked_add(length).map_or(true, |end| end > size) {
            return Err(StorageError::OutOfBounds(offset, length, size));
        }
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn size(&self) -> Result<u64, StorageError> {
        Ok(self.file.lock().metadata()?.len())
    }
}

impl WritableStorageTraits for FileStore {
    fn write_at(&self, offset: u64, data: &[u8]) -> Result<(), StorageError> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        Ok(())
    }
}
