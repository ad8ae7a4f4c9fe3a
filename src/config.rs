//! Global configuration options.

use std::{num::NonZeroUsize, sync::OnceLock};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the nclayout crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// # I/O Configuration Options
///
/// ## Sort Reads By File Position
///  > default: [`false`]
///
/// Layouts yield chunks in destination order.
/// If enabled, [`retrieve_layout_into`](crate::storage::retrieve_layout_into) collects the chunks of a layout and reads them in increasing file position instead.
/// This can reduce seeking on storage where reads are expensive to reorder.
///
/// # Concurrency Configuration Options
///
/// ## Tile Concurrent Limit
/// > default: [`std::thread::available_parallelism`]`()`
///
/// The maximum number of tiles of a [`TiledArray`](crate::aggregation::TiledArray) that are read concurrently.
/// Limiting concurrency can reduce memory usage, as every tile being read holds a buffer of its intersection with the request.
/// A limit of 1 reads tiles sequentially.
#[derive(Debug)]
pub struct Config {
    sort_reads_by_file_position: bool,
    tile_concurrent_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sort_reads_by_file_position: false,
            tile_concurrent_limit: std::thread::available_parallelism()
                .map_or(1, NonZeroUsize::get),
        }
    }
}

impl Config {
    /// Get the [sort reads by file position](#sort-reads-by-file-position) configuration.
    #[must_use]
    pub fn sort_reads_by_file_position(&self) -> bool {
        self.sort_reads_by_file_position
    }

    /// Set the [sort reads by file position](#sort-reads-by-file-position) configuration.
    pub fn set_sort_reads_by_file_position(&mut self, sort_reads_by_file_position: bool) {
        self.sort_reads_by_file_position = sort_reads_by_file_position;
    }

    /// Get the [tile concurrent limit](#tile-concurrent-limit) configuration.
    #[must_use]
    pub fn tile_concurrent_limit(&self) -> usize {
        self.tile_concurrent_limit
    }

    /// Set the [tile concurrent limit](#tile-concurrent-limit) configuration.
    ///
    /// A limit of zero is treated as 1.
    pub fn set_tile_concurrent_limit(&mut self, concurrent_limit: usize) {
        self.tile_concurrent_limit = concurrent_limit.max(1);
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global nclayout configuration.
///
/// This might deadlock if the global config is already mutably held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).read()
}

/// Returns a mutable reference to the global nclayout configuration.
///
/// This might deadlock if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).write()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_tile_concurrent_limit() {
        let mut config = Config::default();
        assert!(config.tile_concurrent_limit() >= 1);
        config.set_tile_concurrent_limit(0);
        assert_eq!(config.tile_concurrent_limit(), 1);
        config.set_tile_concurrent_limit(3);
        assert_eq!(config.tile_concurrent_limit(), 3);
    }

    #[test]
    fn config_sort_reads_by_file_position() {
        let mut config = Config::default();
        assert!(!config.sort_reads_by_file_position());
        config.set_sort_reads_by_file_position(true);
        assert!(config.sort_reads_by_file_position());
    }

    #[test]
    fn global_config_access() {
        let limit = global_config().tile_concurrent_limit();
        assert!(limit >= 1);
        drop(global_config_mut());
    }
}
