//! Domain: an ordered set of equal-rank indices.
//!
//! A `Domain` holds the dependent coordinates tied to one independent
//! coordinate of a [`SparseMap`](crate::SparseMap). It supports set algebra
//! (`*` direct product, union, `^` intersection), mode injection and the
//! coordinate compression used to pack a domain into a dense block.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, SparsityError};
use crate::index::Index;

/// An ordered set of indices sharing a single rank.
///
/// Iteration is in ascending lexicographic order. The rank of an empty
/// domain is 0.
///
/// # Example
/// ```
/// use sparsemap::{Domain, Index};
///
/// let mut d = Domain::new();
/// d.insert(Index::new(&[1, 2])).unwrap();
/// d.insert(Index::new(&[0, 5])).unwrap();
/// d.insert(Index::new(&[1, 2])).unwrap(); // no-op
/// assert_eq!(d.len(), 2);
/// assert_eq!(d.rank(), 2);
/// assert!(d.insert(Index::new(&[3])).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Domain {
    indices: BTreeSet<Index>,
}

impl Domain {
    /// Create an empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a domain from a sequence of indices.
    ///
    /// # Errors
    /// `RankMismatch` if the indices do not all share one rank.
    pub fn try_from_indices<I>(indices: I) -> Result<Self>
    where
        I: IntoIterator<Item = Index>,
    {
        let mut domain = Self::new();
        for idx in indices {
            domain.insert(idx)?;
        }
        Ok(domain)
    }

    /// Domain holding a single index.
    pub fn singleton(idx: Index) -> Self {
        Self {
            indices: BTreeSet::from([idx]),
        }
    }

    /// Rank shared by all members, 0 when empty.
    #[inline]
    pub fn rank(&self) -> usize {
        self.indices.first().map_or(0, Index::rank)
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn contains(&self, idx: &Index) -> bool {
        self.indices.contains(idx)
    }

    /// Smallest member.
    #[inline]
    pub fn first(&self) -> Option<&Index> {
        self.indices.first()
    }

    /// Iterate over members in ascending order.
    pub fn iter(&self) -> std::collections::btree_set::Iter<'_, Index> {
        self.indices.iter()
    }

    /// Insert an index; inserting an existing member is a no-op.
    ///
    /// # Errors
    /// `RankMismatch` if the domain is non-empty and `idx` has another rank.
    pub fn insert(&mut self, idx: Index) -> Result<()> {
        if !self.is_empty() && idx.rank() != self.rank() {
            return Err(SparsityError::rank_mismatch(self.rank(), idx.rank()));
        }
        self.indices.insert(idx);
        Ok(())
    }

    /// Insert a member whose rank the caller has already validated.
    pub(crate) fn insert_unchecked(&mut self, idx: Index) {
        debug_assert!(self.is_empty() || idx.rank() == self.rank());
        self.indices.insert(idx);
    }

    /// Set union.
    ///
    /// # Errors
    /// `RankMismatch` if both domains are non-empty with different ranks.
    pub fn union(&self, other: &Domain) -> Result<Domain> {
        let mut result = self.clone();
        result.union_assign(other)?;
        Ok(result)
    }

    /// In-place set union; `self` is untouched on error.
    pub fn union_assign(&mut self, other: &Domain) -> Result<()> {
        if !self.is_empty() && !other.is_empty() && self.rank() != other.rank() {
            return Err(SparsityError::rank_mismatch(self.rank(), other.rank()));
        }
        self.indices.extend(other.indices.iter().cloned());
        Ok(())
    }

    /// Set intersection. Domains of different rank have no common members,
    /// so the result is empty.
    pub fn intersection(&self, other: &Domain) -> Domain {
        Domain {
            indices: self.indices.intersection(&other.indices).cloned().collect(),
        }
    }

    /// Direct product: every `a` in `self` paired with every `b` in `other`
    /// gives `a ⊕ b`.
    ///
    /// ```
    /// use sparsemap::{Domain, Index};
    ///
    /// let a = Domain::singleton(Index::new(&[1]));
    /// let b = Domain::singleton(Index::new(&[2]));
    /// assert_eq!(&a * &b, Domain::singleton(Index::new(&[1, 2])));
    /// ```
    pub fn direct_product(&self, other: &Domain) -> Domain {
        let indices = self
            .indices
            .iter()
            .flat_map(|a| other.indices.iter().map(move |b| a.concat(b)))
            .collect();
        Domain { indices }
    }

    /// Splice fixed values into every member at absolute output positions.
    ///
    /// See [`Index::inject`].
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use sparsemap::{Domain, Index};
    ///
    /// let d = Domain::singleton(Index::new(&[1, 2]));
    /// let injected = d.inject(&BTreeMap::from([(2, 1)])).unwrap();
    /// assert_eq!(injected, Domain::singleton(Index::new(&[1, 2, 1])));
    /// ```
    pub fn inject(&self, injections: &BTreeMap<usize, usize>) -> Result<Domain> {
        let rank = self.rank() + injections.len();
        if let Some(&position) = injections.keys().find(|&&p| p >= rank) {
            return Err(SparsityError::InjectionOutOfRange { position, rank });
        }
        let indices = self
            .indices
            .iter()
            .map(|idx| idx.inject(injections))
            .collect::<Result<_>>()?;
        Ok(Domain { indices })
    }

    /// Remove the coordinates at `positions` from every member.
    pub fn uninject(&self, positions: &[usize]) -> Result<Domain> {
        let indices = self
            .indices
            .iter()
            .map(|idx| idx.uninject(positions.iter().copied()))
            .collect::<Result<_>>()?;
        Ok(Domain { indices })
    }

    /// Per-mode sorted distinct coordinates, reusable for many lookups.
    pub fn compress(&self) -> CompressedDomain {
        let mut modes = vec![BTreeSet::new(); self.rank()];
        for idx in &self.indices {
            for (values, &c) in modes.iter_mut().zip(idx) {
                values.insert(c);
            }
        }
        CompressedDomain {
            modes: modes.into_iter().map(|m| m.into_iter().collect()).collect(),
        }
    }

    /// Shape of the dense block that holds this domain: for each mode, the
    /// number of distinct coordinates at that mode.
    pub fn result_extents(&self) -> Vec<usize> {
        self.compress().extents()
    }

    /// Position of a member inside the dense block of
    /// [`result_extents`](Self::result_extents).
    ///
    /// # Errors
    /// `IndexNotFound` if `idx` is not a member.
    pub fn result_index(&self, idx: &Index) -> Result<Index> {
        if !self.contains(idx) {
            return Err(not_found(idx));
        }
        self.compress().position(idx)
    }

    /// True when the domain is the full Cartesian product of its per-mode
    /// coordinate sets, i.e. packing it leaves no holes.
    pub fn is_rectangular(&self) -> bool {
        self.is_empty() || self.result_extents().iter().product::<usize>() == self.len()
    }
}

/// Per-mode coordinate compression of a [`Domain`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedDomain {
    modes: Vec<Vec<usize>>,
}

impl CompressedDomain {
    #[inline]
    pub fn rank(&self) -> usize {
        self.modes.len()
    }

    /// Number of distinct coordinates per mode.
    pub fn extents(&self) -> Vec<usize> {
        self.modes.iter().map(Vec::len).collect()
    }

    /// Compressed coordinates of `idx`.
    ///
    /// # Errors
    /// `RankMismatch` for a wrong-rank index, `IndexNotFound` if some
    /// coordinate never occurs at its mode.
    pub fn position(&self, idx: &Index) -> Result<Index> {
        if idx.rank() != self.rank() {
            return Err(SparsityError::rank_mismatch(self.rank(), idx.rank()));
        }
        let coords = self
            .modes
            .iter()
            .zip(idx)
            .map(|(values, c)| values.binary_search(c).map_err(|_| not_found(idx)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Index::from(coords))
    }
}

fn not_found(idx: &Index) -> SparsityError {
    SparsityError::IndexNotFound {
        index: idx.coords().to_vec(),
    }
}

impl std::ops::Mul for &Domain {
    type Output = Domain;

    fn mul(self, rhs: &Domain) -> Domain {
        self.direct_product(rhs)
    }
}

impl std::ops::Mul for Domain {
    type Output = Domain;

    fn mul(self, rhs: Domain) -> Domain {
        self.direct_product(&rhs)
    }
}

impl std::ops::BitXor for &Domain {
    type Output = Domain;

    fn bitxor(self, rhs: &Domain) -> Domain {
        self.intersection(rhs)
    }
}

impl std::ops::BitXor for Domain {
    type Output = Domain;

    fn bitxor(self, rhs: Domain) -> Domain {
        self.intersection(&rhs)
    }
}

impl<'a> IntoIterator for &'a Domain {
    type Item = &'a Index;
    type IntoIter = std::collections::btree_set::Iter<'a, Index>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter()
    }
}

impl IntoIterator for Domain {
    type Item = Index;
    type IntoIter = std::collections::btree_set::IntoIter<Index>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.into_iter()
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, idx) in self.indices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", idx)?;
        }
        write!(f, "}}")
    }
}
