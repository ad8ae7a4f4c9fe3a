//! Sections of multidimensional arrays.
//!
//! A [`Section`] is an ordered sequence of [`Range`]s, one per dimension.
//! It describes either the full shape of a stored variable or a subset of it that is wanted by a reader.
//!
//! A dimension of a section may be left unfilled, meaning "the whole dimension".
//! Unfilled dimensions are resolved against an array shape with [`Section::set_defaults`].
//!
//! Sections can be parsed from and printed as selector strings such as `"(1:20,:,3,10:20:2)"`:
//!  - `first:last` and `first:last:stride` select a strided range,
//!  - a bare index selects a single element, and
//!  - `:` leaves the dimension unfilled.

pub mod iterators;

use std::{fmt::Display, str::FromStr};

use derive_more::From;
use itertools::izip;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::range::{Range, RangeError};

pub use iterators::{Indices, IndicesIterator, LinearisedIndices, LinearisedIndicesIterator};

/// A section of a multidimensional array.
///
/// A section with zero ranges denotes a scalar, which is also the [`Default`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, From)]
pub struct Section {
    ranges: Vec<Option<Range>>,
}

impl From<Vec<Range>> for Section {
    fn from(ranges: Vec<Range>) -> Self {
        Self::new(ranges)
    }
}

impl Section {
    /// Create a new section with every dimension filled.
    #[must_use]
    pub fn new(ranges: Vec<Range>) -> Self {
        Self {
            ranges: ranges.into_iter().map(Some).collect(),
        }
    }

    /// Create a new section where [`None`] ranges span their whole dimension.
    #[must_use]
    pub fn new_partial(ranges: Vec<Option<Range>>) -> Self {
        Self { ranges }
    }

    /// Create a new zero rank section.
    #[must_use]
    pub fn new_scalar() -> Self {
        Self::default()
    }

    /// Create a new section covering all of an array with `shape`.
    ///
    /// # Errors
    /// Returns [`RangeError::ZeroLength`] if any dimension has zero extent.
    pub fn new_with_shape(shape: &[u64]) -> Result<Self, RangeError> {
        Ok(Self::new(
            shape
                .iter()
                .map(|&extent| Range::new_full(extent))
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    /// Create a new section from an `origin` and `shape`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if `origin` and `shape` have different lengths, a dimension has zero extent, or the section overflows [`u64`].
    pub fn new_with_origin_shape(origin: &[u64], shape: &[u64]) -> Result<Self, RangeError> {
        if origin.len() != shape.len() {
            return Err(RangeError::IncompatibleRank(origin.len(), shape.len()));
        }
        Ok(Self::new(
            std::iter::zip(origin, shape)
                .map(|(&first, &length)| Range::new_with_length(first, 1, length))
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    /// Create a new section from an `origin`, `shape`, and `stride`.
    ///
    /// `shape` is the number of selected elements in each dimension.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the arguments have different lengths or do not describe valid ranges.
    pub fn new_with_origin_shape_stride(
        origin: &[u64],
        shape: &[u64],
        stride: &[u64],
    ) -> Result<Self, RangeError> {
        if origin.len() != shape.len() {
            return Err(RangeError::IncompatibleRank(origin.len(), shape.len()));
        }
        if stride.len() != shape.len() {
            return Err(RangeError::IncompatibleRank(stride.len(), shape.len()));
        }
        Ok(Self::new(
            izip!(origin, shape, stride)
                .map(|(&first, &length, &stride)| Range::new_with_length(first, stride, length))
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    /// Create a new section from `ranges` and validate it against an array `shape`.
    ///
    /// Unfilled ranges span their whole dimension.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the section is not within `shape`, see [`check_in_range`](Section::check_in_range).
    pub fn of(ranges: Vec<Option<Range>>, shape: &[u64]) -> Result<Self, RangeError> {
        let section = Self::new_partial(ranges).set_defaults(shape);
        section.check_in_range(shape)?;
        Ok(section)
    }

    /// Return `section` filled against `shape`, or all of `shape` if `section` is [`None`].
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the section is not within `shape`.
    pub fn fill(section: Option<&Self>, shape: &[u64]) -> Result<Self, RangeError> {
        match section {
            Some(section) => Self::of(section.ranges.clone(), shape),
            None => Self::new_with_shape(shape),
        }
    }

    /// Return the rank (number of dimensions).
    #[must_use]
    pub fn rank(&self) -> usize {
        self.ranges.len()
    }

    /// Return the ranges. Unfilled dimensions are [`None`].
    #[must_use]
    pub fn ranges(&self) -> &[Option<Range>] {
        &self.ranges
    }

    /// Return the range of dimension `i`, or [`None`] if it is unfilled or beyond the rank.
    #[must_use]
    pub fn range(&self, i: usize) -> Option<&Range> {
        self.ranges.get(i).and_then(Option::as_ref)
    }

    /// Returns true if every dimension has a range.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.ranges.iter().all(Option::is_some)
    }

    /// Return the ranges of a filled section.
    ///
    /// # Errors
    /// Returns [`RangeError::UnfilledRange`] if a dimension has no range.
    pub fn filled_ranges(&self) -> Result<Vec<&Range>, RangeError> {
        self.ranges
            .iter()
            .enumerate()
            .map(|(i, range)| range.as_ref().ok_or(RangeError::UnfilledRange(i)))
            .collect()
    }

    /// Return the first index of each dimension.
    ///
    /// # Errors
    /// Returns [`RangeError::UnfilledRange`] if a dimension has no range.
    pub fn origin(&self) -> Result<Vec<u64>, RangeError> {
        Ok(self.filled_ranges()?.iter().map(|r| r.first()).collect())
    }

    /// Return the number of selected elements in each dimension.
    ///
    /// # Errors
    /// Returns [`RangeError::UnfilledRange`] if a dimension has no range.
    pub fn shape(&self) -> Result<Vec<u64>, RangeError> {
        Ok(self.filled_ranges()?.iter().map(|r| r.length()).collect())
    }

    /// Return the stride of each dimension.
    ///
    /// # Errors
    /// Returns [`RangeError::UnfilledRange`] if a dimension has no range.
    pub fn stride(&self) -> Result<Vec<u64>, RangeError> {
        Ok(self.filled_ranges()?.iter().map(|r| r.stride()).collect())
    }

    /// Return the number of selected elements, saturating at [`u64::MAX`].
    ///
    /// Unfilled dimensions do not contribute to the size.
    #[must_use]
    pub fn compute_size(&self) -> u64 {
        self.ranges
            .iter()
            .flatten()
            .fold(1u64, |size, range| size.saturating_mul(range.length()))
    }

    /// Return the number of selected elements, or [`None`] if it overflows [`u64`].
    ///
    /// Unfilled dimensions do not contribute to the size.
    #[must_use]
    pub fn checked_size(&self) -> Option<u64> {
        self.ranges
            .iter()
            .flatten()
            .try_fold(1u64, |size, range| size.checked_mul(range.length()))
    }

    /// Fill unfilled dimensions with the whole extent of the corresponding dimension of `shape`.
    ///
    /// Dimensions with zero extent, or beyond the rank of `shape`, are left unfilled.
    /// Use [`check_in_range`](Section::check_in_range) to validate the result.
    #[must_use]
    pub fn set_defaults(&self, shape: &[u64]) -> Self {
        let ranges = self
            .ranges
            .iter()
            .enumerate()
            .map(|(i, range)| match range {
                Some(range) => Some(range.clone()),
                None => shape
                    .get(i)
                    .and_then(|&extent| Range::new_full(extent).ok()),
            })
            .collect();
        Self { ranges }
    }

    /// Check that the section lies within an array of `shape`.
    ///
    /// An unfilled dimension is within range if its extent is non-zero.
    ///
    /// # Errors
    /// Returns a [`RangeError`] describing the first problem found.
    pub fn check_in_range(&self, shape: &[u64]) -> Result<(), RangeError> {
        if self.rank() != shape.len() {
            return Err(RangeError::IncompatibleRank(self.rank(), shape.len()));
        }
        for (i, (range, &extent)) in std::iter::zip(&self.ranges, shape).enumerate() {
            match range {
                Some(range) if range.last() >= extent => {
                    return Err(RangeError::OutOfBounds(i, range.last(), extent));
                }
                None if extent == 0 => return Err(RangeError::EmptyDimension(i)),
                _ => {}
            }
        }
        Ok(())
    }

    fn zip_filled<'a>(
        &'a self,
        other: &'a Self,
    ) -> Result<impl Iterator<Item = (&'a Range, &'a Range)>, RangeError> {
        if self.rank() != other.rank() {
            return Err(RangeError::IncompatibleRank(other.rank(), self.rank()));
        }
        Ok(std::iter::zip(self.filled_ranges()?, other.filled_ranges()?))
    }

    /// Return the intersection of this section with `other`, or [`None`] if they do not intersect.
    ///
    /// Strided ranges intersect exactly, see [`Range::intersect`].
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the ranks differ or either section is unfilled.
    pub fn intersect(&self, other: &Self) -> Result<Option<Self>, RangeError> {
        Ok(self
            .zip_filled(other)?
            .map(|(a, b)| a.intersect(b))
            .collect::<Option<Vec<_>>>()
            .map(Self::new))
    }

    /// Returns true if this section and `other` have at least one element in common.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the ranks differ or either section is unfilled.
    pub fn intersects(&self, other: &Self) -> Result<bool, RangeError> {
        Ok(self.zip_filled(other)?.all(|(a, b)| a.intersects(b)))
    }

    /// Return the smallest section covering this section and `other`, see [`Range::union`].
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the ranks differ or either section is unfilled.
    pub fn union(&self, other: &Self) -> Result<Self, RangeError> {
        Ok(Self::new(
            self.zip_filled(other)?.map(|(a, b)| a.union(b)).collect(),
        ))
    }

    /// Re-express this section relative to the first indices of `origin`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the ranks differ, either section is unfilled, or a range starts before the origin.
    pub fn shift_origin(&self, origin: &Self) -> Result<Self, RangeError> {
        self.shift_origin_by(&origin.origin()?)
    }

    /// Re-express this section relative to `origin`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the ranks differ, the section is unfilled, or a range starts before the origin.
    pub fn shift_origin_by(&self, origin: &[u64]) -> Result<Self, RangeError> {
        if origin.len() != self.rank() {
            return Err(RangeError::IncompatibleRank(origin.len(), self.rank()));
        }
        Ok(Self::new(
            std::iter::zip(self.filled_ranges()?, origin)
                .map(|(range, &origin)| range.shift_origin(origin))
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    /// Compose this section with `relative`, a section of positions within this section.
    ///
    /// Unfilled dimensions of `relative` keep the range of this section.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the ranks differ, this section is unfilled, or `relative` exceeds this section.
    pub fn compose(&self, relative: &Self) -> Result<Self, RangeError> {
        if relative.rank() != self.rank() {
            return Err(RangeError::IncompatibleRank(relative.rank(), self.rank()));
        }
        Ok(Self::new(
            std::iter::zip(self.filled_ranges()?, &relative.ranges)
                .map(|(base, relative)| match relative {
                    Some(relative) => base.compose(relative),
                    None => Ok(base.clone()),
                })
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    /// Returns true if every element of `other` is an element of this section.
    ///
    /// Unfilled dimensions of this section contain everything.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.rank() == other.rank()
            && std::iter::zip(&self.ranges, &other.ranges).all(|(base, range)| match (base, range) {
                (None, _) => true,
                (Some(base), Some(range)) => base.contains_range(range),
                (Some(_), None) => false,
            })
    }

    /// Return the linearised element offset of the first element of `intersect` within this section.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the ranks differ, either section is unfilled, or the first element of `intersect` is not an element of this section.
    /// Returns [`RangeError::Overflow`] if the offset overflows [`u64`].
    pub fn offset(&self, intersect: &Self) -> Result<u64, RangeError> {
        let mut offset = 0u64;
        let mut stride = Some(1u64);
        for (base, range) in self.zip_filled(intersect)?.collect::<Vec<_>>().into_iter().rev() {
            let index = base.index(range.first())?;
            if index != 0 {
                offset = stride
                    .and_then(|stride| index.checked_mul(stride))
                    .and_then(|index_offset| offset.checked_add(index_offset))
                    .ok_or(RangeError::Overflow)?;
            }
            stride = stride.and_then(|stride| stride.checked_mul(base.length()));
        }
        Ok(offset)
    }

    /// Return this section with the range of each dimension named by `names`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the number of names is not the rank or the section is unfilled.
    pub fn with_range_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, RangeError> {
        if names.len() != self.rank() {
            return Err(RangeError::IncompatibleRank(names.len(), self.rank()));
        }
        Ok(Self::new(
            std::iter::zip(self.filled_ranges()?, names)
                .map(|(range, name)| range.clone().with_name(name.as_ref()))
                .collect(),
        ))
    }

    /// Return the range names, [`None`] for unnamed or unfilled dimensions.
    #[must_use]
    pub fn range_names(&self) -> Vec<Option<&str>> {
        self.ranges
            .iter()
            .map(|range| range.as_ref().and_then(Range::name))
            .collect()
    }

    /// Returns true if every dimension has a named range.
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.ranges
            .iter()
            .all(|range| range.as_ref().is_some_and(|range| range.name().is_some()))
    }

    /// Find the range named `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Range> {
        self.find_dimension(name)
            .and_then(|dimension| self.range(dimension))
    }

    /// Find the dimension of the range named `name`.
    #[must_use]
    pub fn find_dimension(&self, name: &str) -> Option<usize> {
        self.ranges
            .iter()
            .position(|range| range.as_ref().and_then(Range::name) == Some(name))
    }

    /// Return this section without its single element dimensions.
    #[must_use]
    pub fn reduce(&self) -> Self {
        Self {
            ranges: self
                .ranges
                .iter()
                .filter(|range| range.as_ref().map_or(true, |range| range.length() > 1))
                .cloned()
                .collect(),
        }
    }

    /// Return this section with every range compacted, see [`Range::compact`].
    #[must_use]
    pub fn compact(&self) -> Self {
        Self {
            ranges: self
                .ranges
                .iter()
                .map(|range| range.as_ref().map(Range::compact))
                .collect(),
        }
    }

    /// Returns true if any filled dimension has a stride other than 1.
    #[must_use]
    pub fn is_strided(&self) -> bool {
        self.ranges.iter().flatten().any(|range| range.stride() != 1)
    }

    /// Returns true if this section selects the whole of an array with `shape`, ignoring strides.
    ///
    /// # Errors
    /// Returns [`RangeError::IncompatibleRank`] if the rank does not match `shape`.
    pub fn equivalent(&self, shape: &[u64]) -> Result<bool, RangeError> {
        if self.rank() != shape.len() {
            return Err(RangeError::IncompatibleRank(self.rank(), shape.len()));
        }
        Ok(std::iter::zip(&self.ranges, shape).all(|(range, &extent)| {
            range
                .as_ref()
                .map_or(true, |range| range.first() == 0 && range.length() == extent)
        }))
    }

    /// Returns true if both sections have the same shape once single element dimensions are removed.
    #[must_use]
    pub fn conformal(&self, other: &Self) -> bool {
        self.compute_size() == other.compute_size() && self.reduce().equal_shape(&other.reduce())
    }

    /// Returns true if both sections have the same rank and the same number of selected elements in each dimension.
    #[must_use]
    pub fn equal_shape(&self, other: &Self) -> bool {
        self.rank() == other.rank()
            && std::iter::zip(&self.ranges, &other.ranges).all(|(a, b)| {
                a.as_ref().map(Range::length) == b.as_ref().map(Range::length)
            })
    }

    /// Return the multidimensional indices of the elements in the section.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the section is unfilled or has more elements than [`usize::MAX`].
    pub fn indices(&self) -> Result<Indices, RangeError> {
        Indices::new(self.clone())
    }

    /// Return the linearised indices of the elements in the section within an array of `array_shape`.
    ///
    /// # Errors
    /// Returns a [`RangeError`] if the section is unfilled or not within `array_shape`.
    pub fn linearised_indices(&self, array_shape: &[u64]) -> Result<LinearisedIndices, RangeError> {
        LinearisedIndices::new(self.clone(), array_shape.to_vec())
    }
}

/// Unravel a linearised index to ND indices.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> Vec<u64> {
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        *indices_i = index % dim;
        index /= dim;
    }
    indices
}

/// Ravel ND indices to a linearised index.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    let mut index: u64 = 0;
    let mut count = 1;
    for (i, s) in std::iter::zip(indices, shape).rev() {
        index += i * count;
        count *= s;
    }
    index
}

impl Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match range {
                Some(range) => write!(f, "{range}")?,
                None => write!(f, ":")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Section {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
            .unwrap_or(trimmed);
        if inner.trim().is_empty() {
            return Ok(Self::new_scalar());
        }
        let ranges = inner
            .split(',')
            .map(|selector| match selector.trim() {
                ":" => Ok(None),
                selector => selector.parse::<Range>().map(Some).map_err(|err| match err {
                    RangeError::InvalidSpec(_) => RangeError::InvalidSpec(s.to_string()),
                    err => err,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new_partial(ranges))
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let spec = String::deserialize(deserializer)?;
        spec.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(spec: &str) -> Section {
        spec.parse().unwrap()
    }

    #[test]
    fn section_parse_display() {
        let s = section("(1:20,:,3,10:20:2)");
        assert_eq!(s.rank(), 4);
        assert_eq!(s.range(0), Some(&Range::new(1, 20).unwrap()));
        assert_eq!(s.range(1), None);
        assert_eq!(s.range(2), Some(&Range::new_scalar(3)));
        assert_eq!(s.range(3), Some(&Range::new_strided(10, 20, 2).unwrap()));
        assert_eq!(s.to_string(), "1:20,:,3:3,10:20:2");
        assert_eq!(section(&s.to_string()), s);
        assert_eq!(section(""), Section::new_scalar());
        assert_eq!(section("()"), Section::new_scalar());
        assert_eq!(
            "0:2,x".parse::<Section>(),
            Err(RangeError::InvalidSpec("0:2,x".to_string()))
        );
        assert_eq!(
            "5:2".parse::<Section>(),
            Err(RangeError::InvalidRange(5, 2))
        );
    }

    #[test]
    fn section_constructors() {
        let s = Section::new_with_shape(&[2, 3]).unwrap();
        assert_eq!(s.to_string(), "0:1,0:2");
        let s = Section::new_with_origin_shape(&[1, 2], &[3, 4]).unwrap();
        assert_eq!(s.origin().unwrap(), vec![1, 2]);
        assert_eq!(s.shape().unwrap(), vec![3, 4]);
        assert_eq!(s.stride().unwrap(), vec![1, 1]);
        let s = Section::new_with_origin_shape_stride(&[1, 0], &[3, 4], &[2, 3]).unwrap();
        assert_eq!(s.to_string(), "1:5:2,0:9:3");
        assert!(Section::new_with_origin_shape(&[1], &[3, 4]).is_err());
        assert!(Section::new_with_shape(&[2, 0]).is_err());
    }

    #[test]
    fn section_defaults_and_range_check() {
        let s = section(":,1:2");
        assert!(!s.is_filled());
        assert!(s.filled_ranges().is_err());
        let filled = s.set_defaults(&[4, 3]);
        assert!(filled.is_filled());
        assert_eq!(filled.to_string(), "0:3,1:2");
        assert_eq!(filled.compute_size(), 8);
        assert_eq!(Section::of(s.ranges().to_vec(), &[4, 3]), Ok(filled));

        assert_eq!(
            section("0:29").check_in_range(&[29]),
            Err(RangeError::OutOfBounds(0, 29, 29))
        );
        assert_eq!(
            section("0:2").check_in_range(&[29, 40]),
            Err(RangeError::IncompatibleRank(1, 2))
        );
        assert_eq!(
            section(":").set_defaults(&[0]).check_in_range(&[0]),
            Err(RangeError::EmptyDimension(0))
        );
        assert_eq!(
            RangeError::OutOfBounds(0, 29, 29).to_string(),
            "illegal range for dimension 0: last requested 29 >= extent 29"
        );
    }

    #[test]
    fn section_fill() {
        assert_eq!(
            Section::fill(None, &[2, 3]).unwrap(),
            Section::new_with_shape(&[2, 3]).unwrap()
        );
        assert_eq!(
            Section::fill(Some(&section("1,:")), &[2, 3]).unwrap(),
            section("1,0:2")
        );
        assert!(Section::fill(Some(&section("2,:")), &[2, 3]).is_err());
    }

    #[test]
    fn section_size() {
        assert_eq!(Section::new_scalar().compute_size(), 1);
        assert_eq!(section("0:9,0:4").compute_size(), 50);
        let huge = Section::new_with_origin_shape(&[0, 0], &[u64::MAX, 2]).unwrap();
        assert_eq!(huge.compute_size(), u64::MAX);
        assert_eq!(huge.checked_size(), None);
    }

    #[test]
    fn section_set_algebra() {
        let a = section("0:9,0:9");
        let b = section("5:14,2:3");
        assert_eq!(a.intersect(&b).unwrap(), Some(section("5:9,2:3")));
        assert!(a.intersects(&b).unwrap());
        assert_eq!(a.intersect(&section("10:12,0:1")).unwrap(), None);
        assert!(!a.intersects(&section("10:12,0:1")).unwrap());
        assert_eq!(a.union(&b).unwrap(), section("0:14,0:9"));
        assert!(a.intersect(&section("0:1")).is_err());
        assert!(a.intersect(&section("0:1,:")).is_err());

        assert_eq!(b.shift_origin(&a.intersect(&b).unwrap().unwrap()).unwrap(), section("0:9,0:1"));
        assert_eq!(b.shift_origin_by(&[5, 2]).unwrap(), section("0:9,0:1"));
        assert!(a.shift_origin_by(&[1, 0]).is_err());

        let base = section("10:20:2,0:9");
        assert_eq!(base.compose(&section("1:3,:")).unwrap(), section("12:16:2,0:9"));

        assert!(a.contains(&b.intersect(&a).unwrap().unwrap()));
        assert!(!a.contains(&b));
        assert!(section(":,0:9").contains(&b.intersect(&a).unwrap().unwrap()));
        assert!(!section("0:9:2").contains(&section("1:3")));
        assert!(section("0:9:2").contains(&section("2:6:4")));
    }

    #[test]
    fn section_offset() {
        let data = section("0:9,10:19");
        let intersect = section("2:3,12:15");
        assert_eq!(data.offset(&intersect), Ok(22));
        assert!(data.offset(&section("2:3,2:5")).is_err());
    }

    #[test]
    fn section_offset_overflow() {
        let data = Section::new_with_origin_shape(&[0, 0], &[u64::MAX, u64::MAX]).unwrap();
        let last_row = Section::new_with_origin_shape(&[u64::MAX - 1, 5], &[1, 1]).unwrap();
        assert_eq!(data.offset(&last_row), Err(RangeError::Overflow));
        let first_row = Section::new_with_origin_shape(&[0, 5], &[1, 1]).unwrap();
        assert_eq!(data.offset(&first_row), Ok(5));
    }

    #[test]
    fn section_names() {
        let s = section("0:9,0:4")
            .with_range_names(&["time", "lat"])
            .unwrap();
        assert!(s.is_named());
        assert_eq!(s.range_names(), vec![Some("time"), Some("lat")]);
        assert_eq!(s.find("lat"), Some(&Range::new(0, 4).unwrap()));
        assert_eq!(s.find_dimension("time"), Some(0));
        assert_eq!(s.find("lon"), None);
        assert!(section("0:9").with_range_names(&["a", "b"]).is_err());
        assert!(!section("0:9").is_named());
    }

    #[test]
    fn section_shape_queries() {
        let s = section("0,0:4,3:9:3,0");
        assert_eq!(s.reduce(), section("0:4,3:9:3"));
        assert_eq!(s.compact(), section("0,0:4,1:3,0"));
        assert!(s.is_strided());
        assert!(!s.compact().is_strided());
        assert!(section("0:1,:").equivalent(&[2, 7]).unwrap());
        assert!(!section("0:1,:").equivalent(&[3, 7]).unwrap());
        assert!(section("0:1").equivalent(&[2, 7]).is_err());
        assert!(section("0:4,0,0:2").conformal(&section("1:5,2:4")));
        assert!(!section("0:4,0:2").conformal(&section("0:2,0:4")));
        assert!(section("0:4,0:2").equal_shape(&section("5:9,1:5:2")));
    }

    #[test]
    fn section_serde() {
        let s = section("(1:20,:,3,10:20:2)");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#""1:20,:,3:3,10:20:2""#);
        assert_eq!(serde_json::from_str::<Section>(&json).unwrap(), s);
        assert!(serde_json::from_str::<Section>(r#""0:a""#).is_err());
    }

    #[test]
    fn ravel_unravel() {
        let shape = [4, 3, 2];
        assert_eq!(unravel_index(17, &shape), vec![2, 2, 1]);
        assert_eq!(ravel_indices(&[2, 2, 1], &shape), 17);
    }
}
