//! Index type for sparse maps.
//!
//! An `Index` is an immutable fixed-rank tuple of coordinates identifying an
//! element or a tile of a tensor. Indices compare lexicographically.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::error::{Result, SparsityError};

pub(crate) type Coords = SmallVec<[usize; 8]>;

/// A fixed-rank coordinate tuple.
///
/// Uses `SmallVec<[usize; 8]>` so that indices up to rank 8 live on the stack.
///
/// # Example
/// ```
/// use sparsemap::Index;
///
/// let idx = Index::new(&[1, 2, 3]);
/// assert_eq!(idx.rank(), 3);
/// assert_eq!(idx[0], 1);
/// assert!(Index::new(&[1, 2]) < Index::new(&[1, 3]));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index {
    coords: Coords,
}

impl Index {
    /// Create a new Index from coordinates.
    pub fn new(coords: &[usize]) -> Self {
        Self {
            coords: coords.iter().copied().collect(),
        }
    }

    /// Create a new Index by collecting coordinates from an iterator.
    pub fn collect_from<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            coords: iter.into_iter().collect(),
        }
    }

    /// Number of modes.
    #[inline]
    pub fn rank(&self) -> usize {
        self.coords.len()
    }

    /// Coordinates as a slice.
    #[inline]
    pub fn coords(&self) -> &[usize] {
        &self.coords
    }

    /// Iterate over the coordinates.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.coords.iter()
    }

    /// Concatenate two indices: `(a..., b...)`.
    ///
    /// ```
    /// use sparsemap::Index;
    ///
    /// let ab = Index::new(&[1]).concat(&Index::new(&[2, 3]));
    /// assert_eq!(ab, Index::new(&[1, 2, 3]));
    /// ```
    pub fn concat(&self, other: &Index) -> Self {
        let mut coords = self.coords.clone();
        coords.extend_from_slice(&other.coords);
        Self { coords }
    }

    /// Splice fixed values into this index at absolute output positions.
    ///
    /// The result has rank `self.rank() + injections.len()`. Position `p` of
    /// the result holds `injections[p]` when present, otherwise the next
    /// unused coordinate of `self`.
    ///
    /// # Errors
    /// `InjectionOutOfRange` if a position is not below the resulting rank.
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use sparsemap::Index;
    ///
    /// let injected = Index::new(&[1, 2]).inject(&BTreeMap::from([(2, 1)])).unwrap();
    /// assert_eq!(injected, Index::new(&[1, 2, 1]));
    /// ```
    pub fn inject(&self, injections: &BTreeMap<usize, usize>) -> Result<Self> {
        let rank = self.rank() + injections.len();
        check_positions(injections.keys().copied(), rank)?;

        let mut original = self.coords.iter().copied();
        let coords = (0..rank)
            .map(|pos| match injections.get(&pos) {
                Some(&value) => value,
                // Positions are validated, so `original` has exactly enough left.
                None => original.next().unwrap_or_default(),
            })
            .collect();
        Ok(Self { coords })
    }

    /// Remove the coordinates at the given positions.
    ///
    /// Undoes [`Index::inject`] for the same set of positions.
    ///
    /// # Errors
    /// `InjectionOutOfRange` if a position is not below `self.rank()`.
    pub fn uninject<I>(&self, positions: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut removed: SmallVec<[bool; 8]> = SmallVec::from_elem(false, self.rank());
        for pos in positions {
            if pos >= self.rank() {
                return Err(SparsityError::InjectionOutOfRange {
                    position: pos,
                    rank: self.rank(),
                });
            }
            removed[pos] = true;
        }
        Ok(Self::collect_from(
            self.coords
                .iter()
                .zip(&removed)
                .filter(|(_, gone)| !**gone)
                .map(|(&c, _)| c),
        ))
    }
}

fn check_positions<I: IntoIterator<Item = usize>>(positions: I, rank: usize) -> Result<()> {
    for position in positions {
        if position >= rank {
            return Err(SparsityError::InjectionOutOfRange { position, rank });
        }
    }
    Ok(())
}

impl std::ops::Index<usize> for Index {
    type Output = usize;

    #[inline]
    fn index(&self, mode: usize) -> &Self::Output {
        &self.coords[mode]
    }
}

impl std::fmt::Display for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.coords.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

impl<const N: usize> From<[usize; N]> for Index {
    fn from(coords: [usize; N]) -> Self {
        Self::new(&coords)
    }
}

impl From<&[usize]> for Index {
    fn from(coords: &[usize]) -> Self {
        Self::new(coords)
    }
}

impl From<Vec<usize>> for Index {
    fn from(coords: Vec<usize>) -> Self {
        Self::new(&coords)
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.coords.iter()
    }
}

/// Iterator over the half-open Cartesian box `[lower, upper)`.
///
/// Indices come out in ascending lexicographic order (last mode fastest).
/// A rank-0 box yields the single empty index.
#[derive(Clone, Debug)]
pub struct IndexRange {
    lower: Coords,
    upper: Coords,
    next: Option<Coords>,
}

impl IndexRange {
    /// Create a range from per-mode lower (inclusive) and upper (exclusive)
    /// bounds.
    ///
    /// # Panics
    /// Panics if `lower` and `upper` have different lengths.
    pub fn new(lower: &[usize], upper: &[usize]) -> Self {
        assert_eq!(
            lower.len(),
            upper.len(),
            "lower and upper bounds must have the same rank"
        );
        let empty = lower.iter().zip(upper).any(|(lo, hi)| lo >= hi);
        let lower: Coords = lower.iter().copied().collect();
        Self {
            next: (!empty).then(|| lower.clone()),
            upper: upper.iter().copied().collect(),
            lower,
        }
    }

    /// Range over a shape, i.e. `[0, shape)`.
    pub fn from_shape(shape: &[usize]) -> Self {
        Self::new(&vec![0; shape.len()], shape)
    }

    /// Number of indices in the full range.
    pub fn volume(&self) -> usize {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(lo, hi)| hi.saturating_sub(*lo))
            .product()
    }
}

impl Iterator for IndexRange {
    type Item = Index;

    fn next(&mut self) -> Option<Index> {
        let current = self.next.take()?;
        let mut advanced = current.clone();
        for mode in (0..advanced.len()).rev() {
            advanced[mode] += 1;
            if advanced[mode] < self.upper[mode] {
                self.next = Some(advanced);
                break;
            }
            advanced[mode] = self.lower[mode];
        }
        Some(Index { coords: current })
    }
}
