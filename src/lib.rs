//! A rust library for computing the chunked layout of multidimensional array variables in self-describing binary files.
//!
//! Reading a section of an N-dimensional variable means translating a *logical* request (elements at these index ranges, possibly strided)
//! into the *physical* sequence of contiguous byte runs that must be read from storage, and the positions those runs occupy in the caller's destination buffer.
//! This crate computes that translation and performs the resulting I/O.
//!
//! ## Getting Started
//! - Describe a request with a [`Section`](section::Section) of [`Range`](range::Range)s, e.g. `"0:2,0:3:1".parse::<Section>()`.
//! - Build a [`RegularLayout`](layout::RegularLayout) for a variable stored contiguously (optionally in padded records),
//!   or a [`TiledLayout`](layout::TiledLayout) for a tile of a larger logical array.
//! - Drain the [`Chunk`](layout::Chunk)s of the layout, or let [`storage::retrieve_layout`] do the reads.
//! - Stitch many tiles into one logical array with [`aggregation::TiledArray`].
//!
//! ## Example
//! ```rust
//! # use nclayout::{layout::{Chunk, Layout, RegularLayout}, section::Section, storage};
//! // A 10x10 array of 1 byte elements, read every other row and column
//! let data: Vec<u8> = (0..100).collect();
//! let wanted: Section = "0:9:2,0:9:2".parse()?;
//! let layout = RegularLayout::new(0, 1, None, &[10, 10], &wanted)?;
//! assert_eq!(layout.num_chunks(), 25);
//! let bytes = storage::retrieve_layout(data.as_slice(), layout)?;
//! assert_eq!(&bytes[..6], &[0, 2, 4, 6, 8, 20]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Logging
//! Layout construction and tile reads emit [`tracing`] events.
//! No subscriber is installed by this crate.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
// #![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod aggregation;
pub mod config;
pub mod layout;
pub mod range;
pub mod section;
pub mod storage;
