//! Index ranges.
//!
//! A [`Range`] selects the indices `first, first + stride, ..., last` along one dimension of an array.
//! A [`Section`](crate::section::Section) holds one range per dimension.
//!
//! Ranges are immutable. Every method that "modifies" a range returns a new one.

use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    str::FromStr,
};

use num::integer::{ExtendedGcd, Integer};
use thiserror::Error;

/// A range error.
///
/// All validation failures of [`Range`]s, [`Section`](crate::section::Section)s and [`layouts`](crate::layout) are reported with this type.
/// Once a layout has been constructed, chunk enumeration cannot fail.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    /// The last index of a range precedes its first index.
    #[error("invalid range {0}:{1}, last must not be less than first")]
    InvalidRange(u64, u64),
    /// A range stride of zero.
    #[error("range stride must be greater than zero")]
    ZeroStride,
    /// A range length of zero.
    #[error("range length must be greater than zero")]
    ZeroLength,
    /// A range of a section extends beyond the extent of its dimension.
    #[error("illegal range for dimension {0}: last requested {1} >= extent {2}")]
    OutOfBounds(usize, u64, u64),
    /// A range extends beyond the length of the range it is relative to.
    #[error("range {0} exceeds length {1}")]
    ExceedsLength(Range, u64),
    /// A section has an unfilled range for a dimension with zero extent.
    #[error("dimension {0} has zero extent")]
    EmptyDimension(usize),
    /// The number of ranges does not match the expected rank.
    #[error("number of ranges ({0}) must equal rank {1}")]
    IncompatibleRank(usize, usize),
    /// A range of a section has not been set.
    #[error("range for dimension {0} is not set")]
    UnfilledRange(usize),
    /// An index is not an element of a range.
    #[error("index {0} is not an element of range {1}")]
    NotAnElement(u64, Range),
    /// A range starts before the origin it is shifted to.
    #[error("range {0} starts before origin {1}")]
    BeforeOrigin(Range, u64),
    /// A range is not aligned with the strides of the range it is relative to.
    #[error("range {0} is not aligned with range {1}")]
    Misaligned(Range, Range),
    /// A named dimension has no counterpart.
    #[error("dimension {0:?} has no matching dimension")]
    UncorrelatedDimension(String),
    /// A range name matches more than one dimension.
    #[error("range name {0:?} matches more than one dimension")]
    DuplicateRangeName(String),
    /// An element size of zero.
    #[error("element size must be greater than zero")]
    ZeroElementSize,
    /// Index or byte arithmetic overflows [`u64`].
    #[error("index arithmetic overflows u64")]
    Overflow,
    /// A malformed range or section specification.
    #[error("illegal selector {0:?}")]
    InvalidSpec(String),
}

/// A strided index range along a single dimension.
///
/// A range may carry a name, which is used to correlate dimensions across sections.
/// The name is metadata only: it does not participate in equality, hashing, or any index arithmetic.
#[derive(Clone, Debug)]
pub struct Range {
    name: Option<String>,
    first: u64,
    stride: u64,
    length: u64,
}

impl Range {
    /// Create a new range of consecutive indices `first..=last`.
    ///
    /// # Errors
    /// Returns [`RangeError::InvalidRange`] if `last < first`.
    pub fn new(first: u64, last: u64) -> Result<Self, RangeError> {
        Self::new_strided(first, last, 1)
    }

    /// Create a new range `first..=last` with `stride`.
    ///
    /// `last` is rounded down to the last element actually selected, `first + (length - 1) * stride`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if `stride` is zero or `last < first`.
    pub fn new_strided(first: u64, last: u64, stride: u64) -> Result<Self, RangeError> {
        if stride == 0 {
            Err(RangeError::ZeroStride)
        } else if last < first {
            Err(RangeError::InvalidRange(first, last))
        } else {
            let length = (last - first) / stride + 1;
            Ok(Self {
                name: None,
                first,
                stride: canonical_stride(stride, length),
                length,
            })
        }
    }

    /// Create a new range of `length` elements starting at `first` with `stride`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if `stride` or `length` is zero, or the last element overflows [`u64`].
    pub fn new_with_length(first: u64, stride: u64, length: u64) -> Result<Self, RangeError> {
        if stride == 0 {
            return Err(RangeError::ZeroStride);
        }
        if length == 0 {
            return Err(RangeError::ZeroLength);
        }
        (length - 1)
            .checked_mul(stride)
            .and_then(|span| first.checked_add(span))
            .ok_or(RangeError::Overflow)?;
        Ok(Self {
            name: None,
            first,
            stride: canonical_stride(stride, length),
            length,
        })
    }

    /// Create a new range covering an entire dimension of `extent`.
    ///
    /// # Errors
    /// Returns [`RangeError::ZeroLength`] if `extent` is zero.
    pub fn new_full(extent: u64) -> Result<Self, RangeError> {
        Self::new_with_length(0, 1, extent)
    }

    /// Create a new range selecting the single index `index`.
    #[must_use]
    pub fn new_scalar(index: u64) -> Self {
        Self {
            name: None,
            first: index,
            stride: 1,
            length: 1,
        }
    }

    /// Return this range with `name`.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Return this range without a name.
    #[must_use]
    pub fn without_name(mut self) -> Self {
        self.name = None;
        self
    }

    /// Return the name of the range.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Return the first index.
    #[must_use]
    pub const fn first(&self) -> u64 {
        self.first
    }

    /// Return the last index.
    #[must_use]
    pub const fn last(&self) -> u64 {
        // Cannot overflow, checked on construction.
        self.first + (self.length - 1) * self.stride
    }

    /// Return the stride.
    #[must_use]
    pub const fn stride(&self) -> u64 {
        self.stride
    }

    /// Return the number of selected indices.
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// Return the `i`th selected index, or [`None`] if `i >= length`.
    #[must_use]
    pub fn element(&self, i: u64) -> Option<u64> {
        (i < self.length).then(|| self.first + i * self.stride)
    }

    /// Returns true if `index` is selected by the range.
    #[must_use]
    pub fn contains(&self, index: u64) -> bool {
        index >= self.first && index <= self.last() && (index - self.first) % self.stride == 0
    }

    /// Returns true if every index selected by `other` is selected by this range.
    #[must_use]
    pub fn contains_range(&self, other: &Self) -> bool {
        self.contains(other.first)
            && self.contains(other.last())
            && (other.length == 1 || other.stride % self.stride == 0)
    }

    /// Return the position of `index` within the range, such that `self.element(position) == Some(index)`.
    ///
    /// # Errors
    /// Returns [`RangeError::NotAnElement`] if `index` is not selected by the range.
    pub fn index(&self, index: u64) -> Result<u64, RangeError> {
        if self.contains(index) {
            Ok((index - self.first) / self.stride)
        } else {
            Err(RangeError::NotAnElement(index, self.clone()))
        }
    }

    /// Returns true if the range covers all of a dimension with `extent`, in order and without gaps.
    #[must_use]
    pub fn is_whole(&self, extent: u64) -> bool {
        self.first == 0 && self.length == extent && (self.stride == 1 || self.length == 1)
    }

    /// Return the intersection of this range and `other`, or [`None`] if they have no index in common.
    ///
    /// The intersection of two strided ranges is always a strided range.
    /// Its stride is the least common multiple of the input strides and its first index is the smallest common index.
    /// The result keeps the name of this range.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let lower = std::cmp::max(self.first, other.first);
        let upper = std::cmp::min(self.last(), other.last());
        if lower > upper {
            return None;
        }
        let (first, stride) =
            first_common_index(self.first, self.stride, other.first, other.stride, lower)?;
        if first > upper {
            return None;
        }
        let (stride, length) = match u64::try_from(stride) {
            Ok(stride) => (stride, (upper - first) / stride + 1),
            // the next common index lies beyond u64::MAX
            Err(_) => (1, 1),
        };
        Some(Self {
            name: self.name.clone(),
            first,
            stride: canonical_stride(stride, length),
            length,
        })
    }

    /// Returns true if this range and `other` have at least one index in common.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.intersect(other).is_some()
    }

    /// Return the smallest range covering this range and `other`.
    ///
    /// The common stride is kept if both ranges have the same stride and phase, otherwise the result has stride 1.
    /// The result keeps the name of this range.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let first = std::cmp::min(self.first, other.first);
        let last = std::cmp::max(self.last(), other.last());
        let stride = if self.stride == other.stride
            && self.first % self.stride == other.first % other.stride
        {
            self.stride
        } else {
            1
        };
        let length = (last - first) / stride + 1;
        Self {
            name: self.name.clone(),
            first,
            stride: canonical_stride(stride, length),
            length,
        }
    }

    /// Return the range with `origin` subtracted from its indices.
    ///
    /// # Errors
    /// Returns [`RangeError::BeforeOrigin`] if the range starts before `origin`.
    pub fn shift_origin(&self, origin: u64) -> Result<Self, RangeError> {
        let first = self
            .first
            .checked_sub(origin)
            .ok_or_else(|| RangeError::BeforeOrigin(self.clone(), origin))?;
        Ok(Self {
            first,
            ..self.clone()
        })
    }

    /// Compose this range with `relative`, a range of positions within this range.
    ///
    /// For example, composing `10:20:2` with `1:3` gives `12:16:2`.
    ///
    /// # Errors
    /// Returns [`RangeError::ExceedsLength`] if `relative` selects positions beyond the length of this range.
    pub fn compose(&self, relative: &Self) -> Result<Self, RangeError> {
        if relative.last() >= self.length {
            return Err(RangeError::ExceedsLength(relative.clone(), self.length));
        }
        Ok(Self {
            name: self.name.clone(),
            first: self.first + relative.first * self.stride,
            stride: canonical_stride(self.stride * relative.stride, relative.length),
            length: relative.length,
        })
    }

    /// Express this range as positions within `base`, the inverse of [`compose`](Range::compose).
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the first index is not an element of `base` or the stride is not a multiple of the stride of `base`.
    pub fn relative_to(&self, base: &Self) -> Result<Self, RangeError> {
        if !base.contains_range(self) {
            return Err(RangeError::Misaligned(self.clone(), base.clone()));
        }
        Ok(Self {
            name: self.name.clone(),
            first: (self.first - base.first) / base.stride,
            stride: if self.length == 1 {
                1
            } else {
                self.stride / base.stride
            },
            length: self.length,
        })
    }

    /// Return a compacted range with stride 1: `first / stride ..= last / stride`.
    #[must_use]
    pub fn compact(&self) -> Self {
        Self {
            name: self.name.clone(),
            first: self.first / self.stride,
            stride: 1,
            length: self.length,
        }
    }

    /// Return an iterator over the selected indices.
    #[must_use]
    pub fn iter(&self) -> RangeIterator {
        RangeIterator {
            first: self.first,
            stride: self.stride,
            index_front: 0,
            index_back: self.length,
        }
    }
}

/// Single element ranges always have stride 1.
const fn canonical_stride(stride: u64, length: u64) -> u64 {
    if length == 1 {
        1
    } else {
        stride
    }
}

/// Solve `x ≡ a (mod m)`, `x ≡ b (mod n)` for the smallest `x >= lower`.
///
/// Returns `x` and `lcm(m, n)`, or [`None`] if the congruences have no solution.
fn first_common_index(a: u64, m: u64, b: u64, n: u64, lower: u64) -> Option<(u64, u128)> {
    let (m_signed, n_signed) = (i128::from(m), i128::from(n));
    let ExtendedGcd { gcd, x, .. } = m_signed.extended_gcd(&n_signed);
    let difference = i128::from(b) - i128::from(a);
    if difference % gcd != 0 {
        return None;
    }
    let n_reduced = n_signed / gcd;
    // m * k ≡ b - a (mod n), with k in [0, n / gcd)
    let k = (x.rem_euclid(n_reduced).unsigned_abs()
        * (difference / gcd).rem_euclid(n_reduced).unsigned_abs())
        % n_reduced.unsigned_abs();
    let lcm = u128::from(m) / gcd.unsigned_abs() * u128::from(n);
    let solution = u128::from(a) + u128::from(m) * k;
    let lower = u128::from(lower);
    let first = if solution >= lower {
        solution - (solution - lower) / lcm * lcm
    } else {
        solution + (lower - solution).div_ceil(lcm) * lcm
    };
    Some((u64::try_from(first).ok()?, lcm))
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        self.first == other.first && self.stride == other.stride && self.length == other.length
    }
}

impl Eq for Range {}

impl Hash for Range {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.first.hash(state);
        self.stride.hash(state);
        self.length.hash(state);
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.stride == 1 {
            write!(f, "{}:{}", self.first, self.last())
        } else {
            write!(f, "{}:{}:{}", self.first, self.last(), self.stride)
        }
    }
}

impl FromStr for Range {
    type Err = RangeError;

    /// Parse `index`, `first:last`, or `first:last:stride`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RangeError::InvalidSpec(s.to_string());
        let parts = s
            .split(':')
            .map(|part| part.trim().parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [index] => Ok(Self::new_scalar(*index)),
            [first, last] => Self::new(*first, *last),
            [first, last, stride] => Self::new_strided(*first, *last, *stride),
            _ => Err(invalid()),
        }
    }
}

impl<'a> IntoIterator for &'a Range {
    type Item = u64;
    type IntoIter = RangeIterator;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the indices selected by a [`Range`].
#[derive(Clone, Debug)]
pub struct RangeIterator {
    first: u64,
    stride: u64,
    index_front: u64,
    index_back: u64,
}

impl Iterator for RangeIterator {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index_front < self.index_back {
            let index = self.first + self.index_front * self.stride;
            self.index_front += 1;
            Some(index)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.index_back - self.index_front).ok();
        (remaining.unwrap_or(usize::MAX), remaining)
    }
}

impl DoubleEndedIterator for RangeIterator {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index_back > self.index_front {
            self.index_back -= 1;
            Some(self.first + self.index_back * self.stride)
        } else {
            None
        }
    }
}

impl FusedIterator for RangeIterator {}
