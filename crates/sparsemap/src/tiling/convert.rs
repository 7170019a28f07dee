//! Conversion of sparse maps between element and tile granularity.
//!
//! Tiling coarsens: every element index is replaced by the tile containing
//! it and entries that land on the same tile are merged. Untiling refines:
//! every tile index is replaced by all elements the tile covers. For a map
//! already at tile granularity, `tile(untile(m)) == m`.

use std::collections::BTreeMap;

use crate::domain::Domain;
use crate::error::{Result, SparsityError};
use crate::index::Index;
use crate::sparse_map::SparseMap;

use super::mode::Tiling;

/// Replace every element index of `domain` by its tile index.
///
/// # Errors
/// `RankMismatch` if the ranks of `domain` and `tiling` differ,
/// `ElementOutOfRange` if an element lies outside the tiling.
///
/// ```
/// use sparsemap::{Domain, Index, Tiling, tile_domain};
///
/// let tiling = Tiling::uniform(&[6], 2).unwrap();
/// let elements =
///     Domain::try_from_indices([Index::new(&[0]), Index::new(&[1]), Index::new(&[5])]).unwrap();
/// let tiles = tile_domain(&elements, &tiling).unwrap();
/// assert_eq!(tiles.to_string(), "{(0), (2)}");
/// ```
pub fn tile_domain(domain: &Domain, tiling: &Tiling) -> Result<Domain> {
    if domain.is_empty() {
        return Ok(Domain::new());
    }
    check_rank(tiling, domain.rank())?;
    let mut tiles = Domain::new();
    for element in domain {
        tiles.insert_unchecked(tiling.tile_of(element)?);
    }
    Ok(tiles)
}

/// Replace every tile index of `domain` by all elements of that tile.
pub fn untile_domain(domain: &Domain, tiling: &Tiling) -> Result<Domain> {
    if domain.is_empty() {
        return Ok(Domain::new());
    }
    check_rank(tiling, domain.rank())?;
    let mut elements = Domain::new();
    for tile in domain {
        for element in tiling.tile_elements(tile)? {
            elements.insert_unchecked(element);
        }
    }
    Ok(elements)
}

/// Coarsen the independent indices of `sm` to tile granularity.
///
/// Domains of independent indices that fall in the same tile are merged.
///
/// # Errors
/// `RankMismatch` if `tiling.rank() != sm.ind_rank()`, `ElementOutOfRange`
/// if a key lies outside the tiling.
pub fn tile_independent_indices(sm: &SparseMap, tiling: &Tiling) -> Result<SparseMap> {
    if sm.is_empty() {
        return Ok(SparseMap::new());
    }
    check_rank(tiling, sm.ind_rank())?;
    let mut map: BTreeMap<Index, Domain> = BTreeMap::new();
    for (ind, domain) in sm {
        let tile = tiling.tile_of(ind)?;
        let merged = map.entry(tile).or_default();
        for dep in domain {
            merged.insert_unchecked(dep.clone());
        }
    }
    tracing::trace!(
        elements = sm.len(),
        tiles = map.len(),
        "tiled independent indices"
    );
    Ok(SparseMap::from_map_unchecked(map))
}

/// Coarsen the dependent indices of `sm` to tile granularity.
///
/// # Errors
/// `RankMismatch` if `tiling.rank() != sm.dep_rank()`, `ElementOutOfRange`
/// if a dependent index lies outside the tiling.
pub fn tile_dependent_indices(sm: &SparseMap, tiling: &Tiling) -> Result<SparseMap> {
    if sm.is_empty() {
        return Ok(SparseMap::new());
    }
    check_rank(tiling, sm.dep_rank())?;
    let map = sm
        .iter()
        .map(|(ind, domain)| Ok((ind.clone(), tile_domain(domain, tiling)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(SparseMap::from_map_unchecked(map))
}

/// Coarsen both sides of `sm`.
pub fn tile_indices(sm: &SparseMap, ind_tiling: &Tiling, dep_tiling: &Tiling) -> Result<SparseMap> {
    let tiled = tile_independent_indices(sm, ind_tiling)?;
    tile_dependent_indices(&tiled, dep_tiling)
}

/// Refine the independent (tile) indices of `sm` to elements: every element
/// of a tile receives the tile's domain.
///
/// # Errors
/// `RankMismatch` if `tiling.rank() != sm.ind_rank()`, `TileOutOfRange` if a
/// key names no tile.
pub fn untile_independent_indices(sm: &SparseMap, tiling: &Tiling) -> Result<SparseMap> {
    if sm.is_empty() {
        return Ok(SparseMap::new());
    }
    check_rank(tiling, sm.ind_rank())?;
    let mut map = BTreeMap::new();
    for (tile, domain) in sm {
        for element in tiling.tile_elements(tile)? {
            map.insert(element, domain.clone());
        }
    }
    Ok(SparseMap::from_map_unchecked(map))
}

/// Refine the dependent (tile) indices of `sm` to elements.
pub fn untile_dependent_indices(sm: &SparseMap, tiling: &Tiling) -> Result<SparseMap> {
    if sm.is_empty() {
        return Ok(SparseMap::new());
    }
    check_rank(tiling, sm.dep_rank())?;
    let map = sm
        .iter()
        .map(|(ind, domain)| Ok((ind.clone(), untile_domain(domain, tiling)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(SparseMap::from_map_unchecked(map))
}

/// Refine both sides of `sm`.
pub fn untile_indices(
    sm: &SparseMap,
    ind_tiling: &Tiling,
    dep_tiling: &Tiling,
) -> Result<SparseMap> {
    let untiled = untile_independent_indices(sm, ind_tiling)?;
    untile_dependent_indices(&untiled, dep_tiling)
}

fn check_rank(tiling: &Tiling, rank: usize) -> Result<()> {
    if tiling.rank() != rank {
        return Err(SparsityError::rank_mismatch(rank, tiling.rank()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::tiling::ModeTiling;

    fn sm(pairs: &[(&[usize], &[&[usize]])]) -> SparseMap {
        SparseMap::try_from_pairs(pairs.iter().map(|(ind, deps)| {
            (
                Index::new(ind),
                deps.iter().map(|d| Index::new(d)).collect::<Vec<_>>(),
            )
        }))
        .unwrap()
    }

    // Mode tiled as [0, 2), [2, 5)
    fn tiling_1d() -> Tiling {
        Tiling::new(vec![ModeTiling::from_tile_sizes(&[2, 3]).unwrap()])
    }

    #[test]
    fn test_tile_domain() {
        let d = Domain::try_from_indices([Index::new(&[1]), Index::new(&[3]), Index::new(&[4])])
            .unwrap();
        let tiled = tile_domain(&d, &tiling_1d()).unwrap();
        assert_eq!(
            tiled,
            Domain::try_from_indices([Index::new(&[0]), Index::new(&[1])]).unwrap()
        );
    }

    #[test]
    fn test_tile_domain_out_of_range() {
        let d = Domain::singleton(Index::new(&[5]));
        let err = tile_domain(&d, &tiling_1d()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        let d2 = Domain::singleton(Index::new(&[0, 0]));
        assert_eq!(
            tile_domain(&d2, &tiling_1d()).unwrap_err().kind(),
            ErrorKind::RankMismatch
        );
    }

    #[test]
    fn test_tile_independent_merges_keys() {
        let m = sm(&[(&[0], &[&[7]]), (&[1], &[&[8]]), (&[3], &[&[9]])]);
        let tiled = tile_independent_indices(&m, &tiling_1d()).unwrap();
        assert_eq!(tiled, sm(&[(&[0], &[&[7], &[8]]), (&[1], &[&[9]])]));
    }

    #[test]
    fn test_tile_dependent() {
        let m = sm(&[(&[0], &[&[0], &[1], &[4]])]);
        let tiled = tile_dependent_indices(&m, &tiling_1d()).unwrap();
        assert_eq!(tiled, sm(&[(&[0], &[&[0], &[1]])]));
    }

    #[test]
    fn test_tile_rank_mismatch() {
        let m = sm(&[(&[0, 0], &[&[1]])]);
        assert_eq!(
            tile_independent_indices(&m, &tiling_1d()).unwrap_err().kind(),
            ErrorKind::RankMismatch
        );
        let m = sm(&[(&[0], &[&[1, 1]])]);
        assert_eq!(
            tile_dependent_indices(&m, &tiling_1d()).unwrap_err().kind(),
            ErrorKind::RankMismatch
        );
    }

    #[test]
    fn test_tile_indices_both_sides() {
        let m = sm(&[(&[0], &[&[4]]), (&[4], &[&[0], &[1]])]);
        let t = tiling_1d();
        let tiled = tile_indices(&m, &t, &t).unwrap();
        assert_eq!(tiled, sm(&[(&[0], &[&[1]]), (&[1], &[&[0]])]));
    }

    #[test]
    fn test_untile_independent() {
        let m = sm(&[(&[1], &[&[0]])]);
        let untiled = untile_independent_indices(&m, &tiling_1d()).unwrap();
        assert_eq!(
            untiled,
            sm(&[(&[2], &[&[0]]), (&[3], &[&[0]]), (&[4], &[&[0]])])
        );
    }

    #[test]
    fn test_untile_dependent() {
        let m = sm(&[(&[9], &[&[0]])]);
        let untiled = untile_dependent_indices(&m, &tiling_1d()).unwrap();
        assert_eq!(untiled, sm(&[(&[9], &[&[0], &[1]])]));
    }

    #[test]
    fn test_roundtrip() {
        let ind = Tiling::new(vec![
            ModeTiling::from_tile_sizes(&[2, 3]).unwrap(),
            ModeTiling::from_tile_sizes(&[1, 4]).unwrap(),
        ]);
        let dep = tiling_1d();
        let m = sm(&[(&[0, 1], &[&[1]]), (&[1, 0], &[&[0], &[1]])]);
        let untiled = untile_indices(&m, &ind, &dep).unwrap();
        assert_eq!(untiled.len(), 2 * 4 + 3);
        assert_eq!(tile_indices(&untiled, &ind, &dep).unwrap(), m);
    }

    #[test]
    fn test_empty_map() {
        let m = SparseMap::new();
        assert!(tile_indices(&m, &tiling_1d(), &tiling_1d()).unwrap().is_empty());
        assert!(untile_indices(&m, &tiling_1d(), &tiling_1d()).unwrap().is_empty());
    }
}
