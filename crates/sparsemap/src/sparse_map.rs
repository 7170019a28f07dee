//! SparseMap: ordered map from independent indices to domains.
//!
//! A `SparseMap` records, for each significant independent coordinate, the
//! [`Domain`] of dependent coordinates that are significant alongside it.
//! Local-correlation codes use it to say e.g. "for occupied orbital `i`, only
//! virtual orbitals in this set matter".
//!
//! # Set algebra
//!
//! | operation | meaning |
//! |-----------|---------|
//! | [`product_assign`](SparseMap::product_assign) (`*=`) | per-key direct product of domains |
//! | [`union_assign`](SparseMap::union_assign) (`+=`) | per-key union |
//! | [`intersect_assign`](SparseMap::intersect_assign) (`^=`) | per-key intersection |
//! | [`direct_product`](SparseMap::direct_product) | Cartesian product over all key pairs |
//! | [`inverse`](SparseMap::inverse) | swap independent and dependent roles |
//! | [`chain`](SparseMap::chain) | relation composition A→B, B→C into A→C |
//!
//! Every fallible operation validates ranks first and leaves `self`
//! untouched on error.

use std::collections::BTreeMap;

use crate::domain::Domain;
use crate::error::{Result, SparsityError};
use crate::index::Index;

/// Ordered mapping from independent [`Index`] to [`Domain`].
///
/// All keys share one rank ([`ind_rank`](Self::ind_rank)) and all domains
/// share one rank ([`dep_rank`](Self::dep_rank)); both are 0 for an empty map.
/// Stored domains are never empty.
///
/// # Example
/// ```
/// use sparsemap::{Index, SparseMap};
///
/// let mut sm = SparseMap::new();
/// sm.add_to_domain(Index::new(&[0]), Index::new(&[1, 2])).unwrap();
/// sm.add_to_domain(Index::new(&[0]), Index::new(&[3, 4])).unwrap();
/// sm.add_to_domain(Index::new(&[1]), Index::new(&[1, 2])).unwrap();
///
/// assert_eq!(sm.ind_rank(), 1);
/// assert_eq!(sm.dep_rank(), 2);
/// assert_eq!(sm.at(&Index::new(&[0])).unwrap().len(), 2);
/// assert_eq!(sm.to_string(), "{(0): {(1, 2), (3, 4)}, (1): {(1, 2)}}");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SparseMap {
    map: BTreeMap<Index, Domain>,
}

impl SparseMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(independent, dependents)` pairs.
    ///
    /// Pairs with no dependents contribute nothing.
    ///
    /// # Errors
    /// `RankMismatch` if keys or dependents disagree in rank.
    ///
    /// ```
    /// use sparsemap::{Index, SparseMap};
    ///
    /// let sm = SparseMap::try_from_pairs([
    ///     (Index::new(&[0]), vec![Index::new(&[1])]),
    ///     (Index::new(&[1]), vec![Index::new(&[1]), Index::new(&[2])]),
    /// ])
    /// .unwrap();
    /// assert_eq!(sm.len(), 2);
    /// ```
    pub fn try_from_pairs<I, D>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Index, D)>,
        D: IntoIterator<Item = Index>,
    {
        let mut sm = Self::new();
        for (ind, deps) in pairs {
            for dep in deps {
                sm.add_to_domain(ind.clone(), dep)?;
            }
        }
        Ok(sm)
    }

    /// Rank of the independent indices, 0 when empty.
    #[inline]
    pub fn ind_rank(&self) -> usize {
        self.map.keys().next().map_or(0, Index::rank)
    }

    /// Rank of the dependent indices, 0 when empty.
    #[inline]
    pub fn dep_rank(&self) -> usize {
        self.map.values().next().map_or(0, Domain::rank)
    }

    /// Number of independent indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn contains(&self, ind: &Index) -> bool {
        self.map.contains_key(ind)
    }

    /// Domain of `ind`, if present.
    #[inline]
    pub fn get(&self, ind: &Index) -> Option<&Domain> {
        self.map.get(ind)
    }

    /// Domain of `ind`.
    ///
    /// # Errors
    /// `RankMismatch` if `ind.rank() != self.ind_rank()` (0 for an empty
    /// map), `IndexNotFound` if it is not a key.
    pub fn at(&self, ind: &Index) -> Result<&Domain> {
        if ind.rank() != self.ind_rank() {
            return Err(SparsityError::rank_mismatch(self.ind_rank(), ind.rank()));
        }
        self.map.get(ind).ok_or_else(|| SparsityError::IndexNotFound {
            index: ind.coords().to_vec(),
        })
    }

    /// Iterate over `(independent, domain)` pairs in ascending key order.
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, Index, Domain> {
        self.map.iter()
    }

    /// Iterate over the independent indices in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &Index> {
        self.map.keys()
    }

    /// Add `dep` to the domain of `ind`, creating the entry if needed.
    ///
    /// # Errors
    /// `RankMismatch` if `ind` disagrees with [`ind_rank`](Self::ind_rank) or
    /// `dep` disagrees with [`dep_rank`](Self::dep_rank) of a non-empty map.
    pub fn add_to_domain(&mut self, ind: Index, dep: Index) -> Result<()> {
        if !self.is_empty() {
            if ind.rank() != self.ind_rank() {
                return Err(SparsityError::rank_mismatch(self.ind_rank(), ind.rank()));
            }
            if dep.rank() != self.dep_rank() {
                return Err(SparsityError::rank_mismatch(self.dep_rank(), dep.rank()));
            }
        }
        self.map.entry(ind).or_default().insert_unchecked(dep);
        Ok(())
    }

    /// `*=`: for keys present in both maps, replace the domain with the
    /// direct product of both domains. Keys present in only one are dropped.
    ///
    /// # Errors
    /// `RankMismatch` if both maps are non-empty with different `ind_rank`.
    pub fn product_assign(&mut self, rhs: &SparseMap) -> Result<()> {
        self.check_ind_rank(rhs)?;
        let map = self
            .map
            .iter()
            .filter_map(|(ind, lhs_domain)| {
                let domain = lhs_domain.direct_product(rhs.map.get(ind)?);
                (!domain.is_empty()).then(|| (ind.clone(), domain))
            })
            .collect();
        self.map = map;
        Ok(())
    }

    /// Value form of [`product_assign`](Self::product_assign).
    pub fn product(&self, rhs: &SparseMap) -> Result<SparseMap> {
        let mut result = self.clone();
        result.product_assign(rhs)?;
        Ok(result)
    }

    /// `+=`: union every domain of `rhs` into the domain of the same key.
    ///
    /// # Errors
    /// `RankMismatch` if both maps are non-empty and either rank differs.
    pub fn union_assign(&mut self, rhs: &SparseMap) -> Result<()> {
        self.check_ind_rank(rhs)?;
        if !self.is_empty() && !rhs.is_empty() && self.dep_rank() != rhs.dep_rank() {
            return Err(SparsityError::rank_mismatch(self.dep_rank(), rhs.dep_rank()));
        }
        for (ind, domain) in &rhs.map {
            let entry = self.map.entry(ind.clone()).or_default();
            for dep in domain {
                entry.insert_unchecked(dep.clone());
            }
        }
        Ok(())
    }

    /// Value form of [`union_assign`](Self::union_assign); commutative.
    pub fn union(&self, rhs: &SparseMap) -> Result<SparseMap> {
        let mut result = self.clone();
        result.union_assign(rhs)?;
        Ok(result)
    }

    /// `^=`: keep only keys present in both maps, with the intersection of
    /// their domains. Maps of different `ind_rank` share no keys, so the
    /// result is empty. Keys whose intersection is empty are dropped.
    pub fn intersect_assign(&mut self, rhs: &SparseMap) {
        let mut map = std::mem::take(&mut self.map);
        map.retain(|ind, domain| match rhs.map.get(ind) {
            Some(other) => {
                *domain = domain.intersection(other);
                !domain.is_empty()
            }
            None => false,
        });
        self.map = map;
    }

    /// Value form of [`intersect_assign`](Self::intersect_assign).
    pub fn intersection(&self, rhs: &SparseMap) -> SparseMap {
        let mut result = self.clone();
        result.intersect_assign(rhs);
        result
    }

    /// Cartesian product over all pairs of keys: key `(a ⊕ b)` maps to the
    /// direct product of the two domains. Empty if either map is empty.
    ///
    /// ```
    /// use sparsemap::{Index, SparseMap};
    ///
    /// let a = SparseMap::try_from_pairs([(Index::new(&[0]), [Index::new(&[1])])]).unwrap();
    /// let b = SparseMap::try_from_pairs([(Index::new(&[2]), [Index::new(&[3])])]).unwrap();
    /// let ab = a.direct_product(&b);
    /// assert_eq!(ab.to_string(), "{(0, 2): {(1, 3)}}");
    /// ```
    pub fn direct_product(&self, rhs: &SparseMap) -> SparseMap {
        let mut map = BTreeMap::new();
        for (lhs_ind, lhs_domain) in &self.map {
            for (rhs_ind, rhs_domain) in &rhs.map {
                let domain = lhs_domain.direct_product(rhs_domain);
                if !domain.is_empty() {
                    map.insert(lhs_ind.concat(rhs_ind), domain);
                }
            }
        }
        SparseMap { map }
    }

    /// Swap the roles of independent and dependent indices: every pair
    /// `(ind, dep)` becomes `(dep, ind)`.
    pub fn inverse(&self) -> SparseMap {
        let mut map: BTreeMap<Index, Domain> = BTreeMap::new();
        for (ind, domain) in &self.map {
            for dep in domain {
                map.entry(dep.clone())
                    .or_default()
                    .insert_unchecked(ind.clone());
            }
        }
        SparseMap { map }
    }

    /// Compose `self` (A→B) with `rhs` (B→C) into A→C.
    ///
    /// `(a, c)` is in the result when some `b` has `(a, b)` in `self` and
    /// `(b, c)` in `rhs`.
    ///
    /// # Errors
    /// `RankMismatch` if `self.dep_rank() != rhs.ind_rank()`. An empty map
    /// has rank 0 on both sides.
    pub fn chain(&self, rhs: &SparseMap) -> Result<SparseMap> {
        if self.dep_rank() != rhs.ind_rank() {
            return Err(SparsityError::rank_mismatch(self.dep_rank(), rhs.ind_rank()));
        }
        let mut map: BTreeMap<Index, Domain> = BTreeMap::new();
        for (a, domain_b) in &self.map {
            for c in domain_b.iter().filter_map(|b| rhs.map.get(b)).flatten() {
                map.entry(a.clone()).or_default().insert_unchecked(c.clone());
            }
        }
        Ok(SparseMap { map })
    }

    fn check_ind_rank(&self, rhs: &SparseMap) -> Result<()> {
        if !self.is_empty() && !rhs.is_empty() && self.ind_rank() != rhs.ind_rank() {
            return Err(SparsityError::rank_mismatch(self.ind_rank(), rhs.ind_rank()));
        }
        Ok(())
    }

    /// Assemble a map from entries whose ranks the caller guarantees.
    pub(crate) fn from_map_unchecked(map: BTreeMap<Index, Domain>) -> Self {
        let mut map = map;
        map.retain(|_, domain| !domain.is_empty());
        Self { map }
    }
}

impl std::ops::BitXorAssign<&SparseMap> for SparseMap {
    fn bitxor_assign(&mut self, rhs: &SparseMap) {
        self.intersect_assign(rhs);
    }
}

impl std::ops::BitXor for &SparseMap {
    type Output = SparseMap;

    fn bitxor(self, rhs: &SparseMap) -> SparseMap {
        self.intersection(rhs)
    }
}

impl<'a> IntoIterator for &'a SparseMap {
    type Item = (&'a Index, &'a Domain);
    type IntoIter = std::collections::btree_map::Iter<'a, Index, Domain>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl std::fmt::Display for SparseMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (ind, domain)) in self.map.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", ind, domain)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sm(pairs: &[(&[usize], &[&[usize]])]) -> SparseMap {
        SparseMap::try_from_pairs(pairs.iter().map(|(ind, deps)| {
            (
                Index::new(ind),
                deps.iter().map(|d| Index::new(d)).collect::<Vec<_>>(),
            )
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_map_ranks() {
        let m = SparseMap::new();
        assert!(m.is_empty());
        assert_eq!(m.ind_rank(), 0);
        assert_eq!(m.dep_rank(), 0);
        assert_eq!(m.to_string(), "{}");
    }

    #[test]
    fn test_add_to_domain_then_at() {
        let mut m = SparseMap::new();
        m.add_to_domain(Index::new(&[1]), Index::new(&[2, 3])).unwrap();
        assert!(m.at(&Index::new(&[1])).unwrap().contains(&Index::new(&[2, 3])));
    }

    #[test]
    fn test_add_to_domain_rank_checks() {
        let mut m = sm(&[(&[0], &[&[1, 1]])]);
        let before = m.clone();

        let err = m
            .add_to_domain(Index::new(&[0, 0]), Index::new(&[1, 1]))
            .unwrap_err();
        assert_eq!(err, SparsityError::RankMismatch { expected: 1, actual: 2 });

        let err = m.add_to_domain(Index::new(&[5]), Index::new(&[1])).unwrap_err();
        assert_eq!(err, SparsityError::RankMismatch { expected: 2, actual: 1 });

        assert_eq!(m, before);
    }

    #[test]
    fn test_at_errors() {
        let m = sm(&[(&[0], &[&[1]])]);
        assert_eq!(m.at(&Index::new(&[3])).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(
            m.at(&Index::new(&[0, 0])).unwrap_err().kind(),
            ErrorKind::RankMismatch
        );

        let empty = SparseMap::new();
        assert_eq!(
            empty.at(&Index::new(&[1])).unwrap_err(),
            SparsityError::RankMismatch { expected: 0, actual: 1 }
        );
        assert_eq!(empty.at(&Index::new(&[])).unwrap_err().kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_product_assign() {
        let mut a = sm(&[(&[0], &[&[1]]), (&[1], &[&[2]])]);
        let b = sm(&[(&[0], &[&[5], &[6]]), (&[2], &[&[7]])]);
        a.product_assign(&b).unwrap();
        assert_eq!(a, sm(&[(&[0], &[&[1, 5], &[1, 6]])]));
    }

    #[test]
    fn test_product_assign_rank_mismatch() {
        let mut a = sm(&[(&[0], &[&[1]])]);
        let b = sm(&[(&[0, 0], &[&[1]])]);
        let before = a.clone();
        assert_eq!(a.product_assign(&b).unwrap_err().kind(), ErrorKind::RankMismatch);
        assert_eq!(a, before);
    }

    #[test]
    fn test_union_assign() {
        let mut a = sm(&[(&[0], &[&[1]])]);
        let b = sm(&[(&[0], &[&[2]]), (&[3], &[&[4]])]);
        a.union_assign(&b).unwrap();
        assert_eq!(a, sm(&[(&[0], &[&[1], &[2]]), (&[3], &[&[4]])]));

        let mut empty = SparseMap::new();
        empty.union_assign(&b).unwrap();
        assert_eq!(empty, b);
    }

    #[test]
    fn test_union_assign_dep_rank_mismatch() {
        let mut a = sm(&[(&[0], &[&[1]])]);
        let b = sm(&[(&[0], &[&[1, 2]])]);
        assert_eq!(
            a.union_assign(&b).unwrap_err(),
            SparsityError::RankMismatch { expected: 1, actual: 2 }
        );
        assert_eq!(a, sm(&[(&[0], &[&[1]])]));
    }

    #[test]
    fn test_union_commutes() {
        let a = sm(&[(&[0], &[&[1]]), (&[1], &[&[1]])]);
        let b = sm(&[(&[0], &[&[2]]), (&[2], &[&[3]])]);
        assert_eq!(a.union(&b).unwrap(), b.union(&a).unwrap());
    }

    #[test]
    fn test_intersect_assign() {
        let mut a = sm(&[(&[0], &[&[1], &[2]]), (&[1], &[&[1]]), (&[2], &[&[5]])]);
        let b = sm(&[(&[0], &[&[2], &[3]]), (&[1], &[&[9]])]);
        a ^= &b;
        assert_eq!(a, sm(&[(&[0], &[&[2]])]));
    }

    #[test]
    fn test_intersect_idempotent_and_rank_mismatch() {
        let a = sm(&[(&[0], &[&[1], &[2]]), (&[1], &[&[1]])]);
        assert_eq!(&a ^ &a, a);
        let b = sm(&[(&[0, 0], &[&[1]])]);
        assert!((&a ^ &b).is_empty());
    }

    #[test]
    fn test_direct_product() {
        let a = sm(&[(&[0], &[&[1]]), (&[1], &[&[2]])]);
        let b = sm(&[(&[5], &[&[6], &[7]])]);
        let p = a.direct_product(&b);
        assert_eq!(p.ind_rank(), 2);
        assert_eq!(p.dep_rank(), 2);
        assert_eq!(
            p,
            sm(&[
                (&[0, 5], &[&[1, 6], &[1, 7]]),
                (&[1, 5], &[&[2, 6], &[2, 7]]),
            ])
        );
        assert!(a.direct_product(&SparseMap::new()).is_empty());
        assert!(SparseMap::new().direct_product(&a).is_empty());
    }

    #[test]
    fn test_inverse() {
        let a = sm(&[(&[0], &[&[1, 1], &[2, 2]]), (&[1], &[&[1, 1]])]);
        let inv = a.inverse();
        assert_eq!(inv, sm(&[(&[1, 1], &[&[0], &[1]]), (&[2, 2], &[&[0]])]));
        assert_eq!(inv.inverse(), a);
    }

    #[test]
    fn test_chain() {
        let ab = sm(&[(&[0], &[&[10], &[11]]), (&[1], &[&[12]])]);
        let bc = sm(&[(&[10], &[&[7, 7]]), (&[11], &[&[8, 8]]), (&[13], &[&[9, 9]])]);
        let ac = ab.chain(&bc).unwrap();
        assert_eq!(ac, sm(&[(&[0], &[&[7, 7], &[8, 8]])]));
    }

    #[test]
    fn test_chain_rank_mismatch() {
        let ab = sm(&[(&[0], &[&[1, 2]])]);
        let bc = sm(&[(&[1], &[&[3]])]);
        assert_eq!(ab.chain(&bc).unwrap_err().kind(), ErrorKind::RankMismatch);
    }

    #[test]
    fn test_chain_with_empty_operand() {
        let ab = sm(&[(&[0], &[&[1, 2]])]);
        let empty = SparseMap::new();
        assert_eq!(
            ab.chain(&empty).unwrap_err(),
            SparsityError::RankMismatch { expected: 2, actual: 0 }
        );
        assert_eq!(
            empty.chain(&ab).unwrap_err(),
            SparsityError::RankMismatch { expected: 0, actual: 1 }
        );
        assert!(empty.chain(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_display() {
        let a = sm(&[(&[1], &[&[3], &[2]]), (&[0], &[&[1]])]);
        assert_eq!(a.to_string(), "{(0): {(1)}, (1): {(2), (3)}}");
    }
}
