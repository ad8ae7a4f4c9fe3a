//! Section iterators.
//!
//! The iterators are:
//!  - [`Indices`]: iterate over the multidimensional indices of the elements in the section.
//!  - [`LinearisedIndices`]: iterate over linearised indices of the elements in the section within an array.
//!
//! These can be created with [`Section::indices`](super::Section::indices) and [`Section::linearised_indices`](super::Section::linearised_indices).
//!
//! Both iterators support [`into_iter()`](IntoIterator::into_iter) ([`IntoIterator`]).

mod indices_iterator;
mod linearised_indices_iterator;

pub use indices_iterator::{Indices, IndicesIterator};
pub use linearised_indices_iterator::{LinearisedIndices, LinearisedIndicesIterator};

#[cfg(test)]
mod tests {
    use crate::section::Section;

    #[test]
    fn section_iter_indices() {
        let section: Section = "1:2,1:2".parse().unwrap();
        let indices = section.indices().unwrap();
        let mut iter = indices.into_iter();
        assert_eq!(iter.size_hint(), (4, Some(4)));
        assert_eq!(iter.next(), Some(vec![1, 1]));
        assert_eq!(iter.next_back(), Some(vec![2, 2]));
        assert_eq!(iter.next(), Some(vec![1, 2]));
        assert_eq!(iter.next(), Some(vec![2, 1]));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn section_iter_indices_strided() {
        let section: Section = "1:8:2,0:9:4".parse().unwrap();
        let indices = section.indices().unwrap();
        assert_eq!(indices.len(), 12);
        let collected = indices.iter().collect::<Vec<_>>();
        assert_eq!(collected[0], vec![1, 0]);
        assert_eq!(collected[1], vec![1, 4]);
        assert_eq!(collected[2], vec![1, 8]);
        assert_eq!(collected[3], vec![3, 0]);
        assert_eq!(collected[11], vec![7, 8]);
    }

    #[test]
    fn section_iter_indices_scalar() {
        let indices = Section::new_scalar().indices().unwrap();
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![Vec::<u64>::new()]);
    }

    #[test]
    fn section_iter_indices_unfilled() {
        let section: Section = ":,1:2".parse().unwrap();
        assert!(section.indices().is_err());
    }

    #[test]
    fn section_iter_linearised_indices() {
        let section: Section = "1:2,5:6".parse().unwrap();
        let indices = section.linearised_indices(&[8, 8]).unwrap();
        assert_eq!(indices.len(), 4);
        let mut iter = indices.iter();
        assert_eq!(iter.next(), Some(13)); // [1,5]
        assert_eq!(iter.next(), Some(14)); // [1,6]
        assert_eq!(iter.next_back(), Some(22)); // [2,6]
        assert_eq!(iter.next(), Some(21)); // [2,5]
        assert_eq!(iter.next(), None);

        let section: Section = "0:4:2,1:7:3".parse().unwrap();
        let indices = section.linearised_indices(&[5, 8]).unwrap();
        assert_eq!(
            indices.iter().collect::<Vec<_>>(),
            vec![1, 4, 7, 17, 20, 23, 33, 36, 39]
        );
    }

    #[test]
    fn section_iter_linearised_indices_oob() {
        let section: Section = "1:2,5:6".parse().unwrap();
        assert!(section.linearised_indices(&[1, 1]).is_err());
        assert!(section.linearised_indices(&[8]).is_err());
    }
}
