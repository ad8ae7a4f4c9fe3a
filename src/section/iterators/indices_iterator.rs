use std::iter::FusedIterator;

use crate::{
    range::{Range, RangeError},
    section::{unravel_index, Section},
};

/// An iterator over the indices of the elements in a section.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// For example, the section `1:2,0:4:2` produces `[(1, 0), (1, 2), (1, 4), (2, 0), (2, 2), (2, 4)]`.
pub struct Indices {
    ranges: Vec<Range>,
    shape: Vec<u64>,
    length: usize,
}

impl Indices {
    /// Create a new indices struct.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if `section` is unfilled or has more than [`usize::MAX`] elements.
    pub fn new(section: Section) -> Result<Self, RangeError> {
        let ranges = section
            .filled_ranges()?
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        let shape = ranges.iter().map(Range::length).collect::<Vec<_>>();
        let length = section
            .checked_size()
            .and_then(|size| usize::try_from(size).ok())
            .ok_or(RangeError::Overflow)?;
        Ok(Self {
            ranges,
            shape,
            length,
        })
    }

    /// Return the number of indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the number of indices is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> IndicesIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a Indices {
    type Item = Vec<u64>;
    type IntoIter = IndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIterator::new_with_start_end(&self.ranges, &self.shape, 0, self.length as u64)
    }
}

/// Serial indices iterator.
///
/// See [`Indices`].
pub struct IndicesIterator<'a> {
    ranges: &'a [Range],
    shape: &'a [u64],
    index_front: u64,
    index_back: u64,
}

impl<'a> IndicesIterator<'a> {
    fn new_with_start_end(
        ranges: &'a [Range],
        shape: &'a [u64],
        index_front: u64,
        index_back: u64,
    ) -> Self {
        Self {
            ranges,
            shape,
            index_front,
            index_back,
        }
    }

    fn indices(&self, index: u64) -> Vec<u64> {
        let mut indices = unravel_index(index, self.shape);
        std::iter::zip(indices.iter_mut(), self.ranges)
            .for_each(|(index, range)| *index = range.first() + *index * range.stride());
        indices
    }
}

impl Iterator for IndicesIterator<'_> {
    type Item = Vec<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index_front < self.index_back {
            let indices = self.indices(self.index_front);
            self.index_front += 1;
            Some(indices)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Bounded by Indices::length, which is a usize.
        let length = (self.index_back - self.index_front) as usize;
        (length, Some(length))
    }
}

impl DoubleEndedIterator for IndicesIterator<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index_back > self.index_front {
            self.index_back -= 1;
            Some(self.indices(self.index_back))
        } else {
            None
        }
    }
}

impl ExactSizeIterator for IndicesIterator<'_> {}

impl FusedIterator for IndicesIterator<'_> {}
