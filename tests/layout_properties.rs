//! Property-based tests for layouts.
//!
//! Every layout is checked against a brute-force enumeration of the elements it selects.

use std::num::NonZeroU64;

use nclayout::{
    layout::{Chunk, Layout, RegularLayout, TiledLayout},
    range::Range,
    section::{ravel_indices, Section},
};
use proptest::prelude::*;

/// A range selecting at least one index of a dimension with `extent`.
fn range_within(extent: u64) -> impl Strategy<Value = Range> {
    (0..extent, 1..=3u64).prop_flat_map(move |(first, stride)| {
        let max_length = (extent - 1 - first) / stride + 1;
        (1..=max_length)
            .prop_map(move |length| Range::new_with_length(first, stride, length).unwrap())
    })
}

/// An array shape of rank 0 to 4 and a section of it.
fn shape_and_section() -> impl Strategy<Value = (Vec<u64>, Section)> {
    prop::collection::vec(1..6u64, 0..=4).prop_flat_map(|shape| {
        let ranges = shape
            .iter()
            .map(|&extent| range_within(extent))
            .collect::<Vec<_>>();
        (Just(shape), ranges.prop_map(Section::new))
    })
}

/// A logical array shape with a tile section and a wanted section of it.
fn shape_and_sections() -> impl Strategy<Value = (Vec<u64>, Section, Section)> {
    prop::collection::vec(1..8u64, 1..=3).prop_flat_map(|shape| {
        let ranges = || {
            shape
                .iter()
                .map(|&extent| range_within(extent))
                .collect::<Vec<_>>()
        };
        let (data, want) = (ranges(), ranges());
        (
            Just(shape),
            data.prop_map(Section::new),
            want.prop_map(Section::new),
        )
    })
}

/// Expand chunks to `(destination element, file position)` pairs.
fn expand(chunks: &[Chunk], element_size: u64) -> Vec<(u64, u64)> {
    chunks
        .iter()
        .flat_map(|chunk| {
            (0..chunk.nelems()).map(move |i| {
                (
                    chunk.start_elem() + i,
                    chunk.file_pos() + i * element_size,
                )
            })
        })
        .collect()
}

/// Chunks are in strictly increasing destination order and never overlap.
fn is_ordered(chunks: &[Chunk]) -> bool {
    chunks
        .windows(2)
        .all(|pair| pair[0].destination_range().end <= pair[1].start_elem())
}

fn regular_brute_force(
    start_pos: u64,
    element_size: u64,
    record_size: Option<u64>,
    var_shape: &[u64],
    wanted: &Section,
) -> Vec<(u64, u64)> {
    let record_elements = var_shape.iter().skip(1).product::<u64>();
    let indices = wanted.indices().unwrap();
    let linearised = wanted.linearised_indices(var_shape).unwrap();
    (0..)
        .zip(std::iter::zip(&indices, &linearised))
        .map(|(n, (index, linear))| {
            let offset = match record_size {
                Some(record_size) => {
                    index[0] * record_size + (linear - index[0] * record_elements) * element_size
                }
                None => linear * element_size,
            };
            (n, start_pos + offset)
        })
        .collect()
}

fn tiled_brute_force(
    start_pos: u64,
    element_size: u64,
    data: &Section,
    want: &Section,
) -> Vec<(u64, u64)> {
    let data_ranges = data.filled_ranges().unwrap();
    let data_shape = data.shape().unwrap();
    (0..)
        .zip(want.indices().unwrap().iter())
        .filter_map(|(n, index)| {
            let local = std::iter::zip(&index, &data_ranges)
                .map(|(&i, range)| {
                    range
                        .contains(i)
                        .then(|| (i - range.first()) / range.stride())
                })
                .collect::<Option<Vec<_>>>()?;
            Some((
                n,
                start_pos + ravel_indices(&local, &data_shape) * element_size,
            ))
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_regular_layout_matches_brute_force(
        (var_shape, wanted) in shape_and_section(),
        start_pos in 0..100u64,
        element_size in 1..=4u64,
        record_padding in prop::option::of(0..8u64),
    ) {
        let record_size = record_padding.filter(|_| !var_shape.is_empty()).map(|padding| {
            element_size * var_shape[1..].iter().product::<u64>() + padding
        });
        let layout = RegularLayout::new(
            start_pos,
            element_size,
            record_size.and_then(NonZeroU64::new),
            &var_shape,
            &wanted,
        ).unwrap();
        let total_elements = layout.total_elements();
        let chunk_size_hint = layout.chunk_size_hint();
        let num_chunks = layout.num_chunks();
        let chunks = layout.collect::<Vec<_>>();

        prop_assert_eq!(total_elements, wanted.compute_size());
        prop_assert_eq!(chunks.len() as u64, num_chunks);
        prop_assert!(chunks.iter().all(|chunk| chunk.nelems() == chunk_size_hint));
        prop_assert_eq!(chunks.iter().map(Chunk::nelems).sum::<u64>(), total_elements);
        prop_assert!(is_ordered(&chunks));
        prop_assert_eq!(
            expand(&chunks, element_size),
            regular_brute_force(start_pos, element_size, record_size, &var_shape, &wanted)
        );
    }

    #[test]
    fn prop_tiled_layout_matches_brute_force(
        (_shape, data, want) in shape_and_sections(),
        start_pos in 0..100u64,
        element_size in 1..=4u64,
    ) {
        let layout =
            TiledLayout::new_with_start_pos(start_pos, element_size, &data, &want).unwrap();
        let want_shape = want.shape().unwrap();
        prop_assert_eq!(layout.is_needed(), data.intersects(&want).unwrap());
        prop_assert_eq!(layout.destination_shape(), want_shape.as_slice());
        let total_elements = layout.total_elements();
        let chunks = layout.collect::<Vec<_>>();

        prop_assert_eq!(chunks.iter().map(Chunk::nelems).sum::<u64>(), total_elements);
        prop_assert!(is_ordered(&chunks));
        prop_assert_eq!(
            expand(&chunks, element_size),
            tiled_brute_force(start_pos, element_size, &data, &want)
        );
    }

    #[test]
    fn prop_range_intersect_is_exact(
        (a, b) in (1..40u64).prop_flat_map(|extent| (range_within(extent), range_within(extent))),
    ) {
        let expected = a.iter().filter(|&i| b.contains(i)).collect::<Vec<_>>();
        let actual = a
            .intersect(&b)
            .map(|range| range.iter().collect::<Vec<_>>())
            .unwrap_or_default();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(a.intersects(&b), b.intersects(&a));
    }

    #[test]
    fn prop_range_compose_inverts_relative_to(
        (base, relative) in (1..40u64).prop_flat_map(|extent| {
            range_within(extent).prop_flat_map(|base| {
                let length = base.length();
                (Just(base), range_within(length))
            })
        }),
    ) {
        let composed = base.compose(&relative).unwrap();
        prop_assert!(base.contains_range(&composed));
        prop_assert_eq!(composed.relative_to(&base).unwrap(), relative);
    }
}
