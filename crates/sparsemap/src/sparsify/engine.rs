//! Construction of a tensor-of-tensors from an element sparse map.
//!
//! For every independent (outer) element `i` with domain `D(i)` the engine
//! gathers the dataset values at the members of `D(i)` and packs them into a
//! dense block of shape `D(i).result_extents()`. With a mode injection, some
//! dataset modes are not part of the domain; they take the value of a mode of
//! `i` instead (e.g. the diagonal `T[i, a, i]`).

use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::domain::Domain;
use crate::error::{Result, SparsityError};
use crate::index::Index;
use crate::scalar::Scalar;
use crate::source::DenseTensorSource;
use crate::sparse_map::SparseMap;
use crate::tensor::DenseTensor;
use crate::tensor_of_tensors::{TensorOfTensors, ToTTile};
use crate::tiling::{Tiling, tile_domain};

use super::config::SparsifyConfig;
use super::executor::{RayonExecutor, SequentialExecutor, TileExecutor};

/// Mode injection: independent-index mode -> dataset mode.
pub type ModeInjection = BTreeMap<usize, usize>;

/// Builds the outer tiles of a tensor-of-tensors, one tile per call.
///
/// Holds only shared references; a single populator serves every worker.
pub struct TilePopulator<'a, ElT, S>
where
    ElT: Scalar,
    S: DenseTensorSource<ElT> + ?Sized,
{
    source: &'a S,
    injection: &'a ModeInjection,
    // Outer tile -> outer elements of the map inside it with their domains.
    groups: BTreeMap<Index, Vec<(&'a Index, &'a Domain)>>,
    _marker: PhantomData<ElT>,
}

impl<'a, ElT, S> TilePopulator<'a, ElT, S>
where
    ElT: Scalar,
    S: DenseTensorSource<ElT> + ?Sized,
{
    /// Validate the inputs and group the keys of `esm` by outer tile.
    ///
    /// # Errors
    ///
    /// - `RankMismatch` if `outer_tiling.rank() != esm.ind_rank()` or
    ///   `esm.dep_rank() + injection.len()` differs from the dataset rank
    /// - `InvalidInjection` if the injection names an independent mode
    ///   `>= esm.ind_rank()`, a dataset mode `>=` the dataset rank, or the
    ///   same dataset mode twice
    /// - `ElementOutOfRange` if a key of `esm` lies outside `outer_tiling`
    pub fn new(
        esm: &'a SparseMap,
        source: &'a S,
        outer_tiling: &Tiling,
        injection: &'a ModeInjection,
    ) -> Result<Self> {
        let mut populator = Self {
            source,
            injection,
            groups: BTreeMap::new(),
            _marker: PhantomData,
        };
        if esm.is_empty() {
            return Ok(populator);
        }

        if outer_tiling.rank() != esm.ind_rank() {
            return Err(SparsityError::rank_mismatch(
                esm.ind_rank(),
                outer_tiling.rank(),
            ));
        }
        validate_injection(injection, esm.ind_rank(), source.rank())?;
        if esm.dep_rank() + injection.len() != source.rank() {
            return Err(SparsityError::rank_mismatch(
                source.rank(),
                esm.dep_rank() + injection.len(),
            ));
        }

        for (element, domain) in esm {
            if domain.is_empty() {
                continue;
            }
            let tile = outer_tiling.tile_of(element)?;
            populator
                .groups
                .entry(tile)
                .or_default()
                .push((element, domain));
        }
        Ok(populator)
    }

    /// Outer tiles containing at least one key of the map, ascending.
    pub fn candidate_tiles(&self) -> Vec<Index> {
        self.groups.keys().cloned().collect()
    }

    /// Populate outer tile `tile`.
    ///
    /// Returns `None` for tiles without keys of the map and for tiles whose
    /// blocks are all zero.
    pub fn populate(&self, tile: &Index) -> Result<Option<ToTTile<ElT>>> {
        let Some(elements) = self.groups.get(tile) else {
            return Ok(None);
        };
        let inner = elements
            .iter()
            .map(|&(element, domain)| {
                Ok((element.clone(), self.populate_element(element, domain)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        let tile = ToTTile::from_blocks(tile.clone(), inner);
        if tile.norm() == 0.0 {
            tracing::trace!(tile = %tile.tile(), "eliding zero outer tile");
            return Ok(None);
        }
        Ok(Some(tile))
    }

    fn populate_element(&self, element: &Index, domain: &Domain) -> Result<DenseTensor<ElT>> {
        // Dataset mode -> value of the injected outer mode.
        let values: BTreeMap<usize, usize> = self
            .injection
            .iter()
            .map(|(&ind_mode, &data_mode)| (data_mode, element[ind_mode]))
            .collect();
        let injected = domain.inject(&values)?;

        let compressed = domain.compress();
        let extents = compressed.extents();
        if extents.iter().product::<usize>() != domain.len() {
            tracing::debug!(
                element = %element,
                members = domain.len(),
                ?extents,
                "irregular domain, block holes are zero-filled"
            );
        }

        let mut block = DenseTensor::zeros(&extents);
        for data_tile in &tile_domain(&injected, self.source.tiling())? {
            if self.source.is_zero(data_tile) {
                continue;
            }
            for (data_element, value) in self.source.fetch(data_tile)? {
                if !injected.contains(&data_element) {
                    continue;
                }
                let stripped = data_element.uninject(values.keys().copied())?;
                let position = compressed.position(&stripped)?;
                if let Some(slot) = block.get_mut(position.coords()) {
                    *slot = value;
                }
            }
        }
        Ok(block)
    }
}

fn validate_injection(injection: &ModeInjection, ind_rank: usize, data_rank: usize) -> Result<()> {
    let mut seen = vec![false; data_rank];
    for (&ind_mode, &data_mode) in injection {
        if ind_mode >= ind_rank {
            return Err(SparsityError::InvalidInjection {
                message: format!("independent mode {ind_mode} >= independent rank {ind_rank}"),
            });
        }
        if data_mode >= data_rank {
            return Err(SparsityError::InvalidInjection {
                message: format!("dataset mode {data_mode} >= dataset rank {data_rank}"),
            });
        }
        if std::mem::replace(&mut seen[data_mode], true) {
            return Err(SparsityError::InvalidInjection {
                message: format!("dataset mode {data_mode} injected more than once"),
            });
        }
    }
    Ok(())
}

/// Sparsify `source` along `esm` with the default [`SparsifyConfig`].
///
/// See [`from_sparse_map_with`].
pub fn from_sparse_map<ElT, S>(
    esm: &SparseMap,
    source: &S,
    outer_tiling: &Tiling,
    injection: &ModeInjection,
) -> Result<TensorOfTensors<ElT>>
where
    ElT: Scalar,
    S: DenseTensorSource<ElT> + ?Sized,
{
    from_sparse_map_with(esm, source, outer_tiling, injection, &SparsifyConfig::default())
}

/// Build a tensor-of-tensors holding, for every key `i` of `esm`, the dense
/// block of dataset values selected by `esm[i]`.
///
/// `outer_tiling` tiles the independent modes. `injection` maps independent
/// modes to dataset modes that are fixed to the outer coordinate instead of
/// being part of the domain.
///
/// # Errors
///
/// See [`TilePopulator::new`]; errors from the dataset are propagated.
///
/// # Example
///
/// ```
/// use sparsemap::{
///     DenseTensor, Index, ModeInjection, SparseMap, SparsifyConfig, TiledTensor, Tiling,
///     from_sparse_map_with,
/// };
///
/// // T[a, i] = 10 * a + i
/// let data = DenseTensor::from_fn(&[3, 2], |idx| (10 * idx[0] + idx[1]) as f64);
/// let source = TiledTensor::from_dense(&data, Tiling::uniform(&[3, 2], 2).unwrap()).unwrap();
///
/// // i -> {a}; mode 0 of i is dataset mode 1
/// let esm = SparseMap::try_from_pairs([
///     (Index::new(&[1]), vec![Index::new(&[0]), Index::new(&[2])]),
/// ])
/// .unwrap();
/// let injection = ModeInjection::from([(0, 1)]);
/// let outer = Tiling::uniform(&[2], 2).unwrap();
///
/// let tot = from_sparse_map_with(&esm, &source, &outer, &injection, &SparsifyConfig::sequential())
///     .unwrap();
/// assert_eq!(tot.get(&Index::new(&[1])).unwrap().data(), &[1.0, 21.0]);
/// ```
#[tracing::instrument(
    skip_all,
    fields(elements = esm.len(), ind_rank = esm.ind_rank(), dep_rank = esm.dep_rank())
)]
pub fn from_sparse_map_with<ElT, S>(
    esm: &SparseMap,
    source: &S,
    outer_tiling: &Tiling,
    injection: &ModeInjection,
    config: &SparsifyConfig,
) -> Result<TensorOfTensors<ElT>>
where
    ElT: Scalar,
    S: DenseTensorSource<ElT> + ?Sized,
{
    let populator = TilePopulator::new(esm, source, outer_tiling, injection)?;
    if config.use_parallel(populator.groups.len()) {
        let executor = match config.num_threads {
            Some(n) => RayonExecutor::with_threads(n)?,
            None => RayonExecutor::new(),
        };
        populate_all(&populator, outer_tiling, &executor)
    } else {
        populate_all(&populator, outer_tiling, &SequentialExecutor)
    }
}

/// Like [`from_sparse_map_with`], with an explicit executor.
pub fn from_sparse_map_on<ElT, S, E>(
    esm: &SparseMap,
    source: &S,
    outer_tiling: &Tiling,
    injection: &ModeInjection,
    executor: &E,
) -> Result<TensorOfTensors<ElT>>
where
    ElT: Scalar,
    S: DenseTensorSource<ElT> + ?Sized,
    E: TileExecutor,
{
    let populator = TilePopulator::new(esm, source, outer_tiling, injection)?;
    populate_all(&populator, outer_tiling, executor)
}

fn populate_all<ElT, S, E>(
    populator: &TilePopulator<'_, ElT, S>,
    outer_tiling: &Tiling,
    executor: &E,
) -> Result<TensorOfTensors<ElT>>
where
    ElT: Scalar,
    S: DenseTensorSource<ElT> + ?Sized,
    E: TileExecutor,
{
    let candidates = populator.candidate_tiles();
    tracing::debug!(candidates = candidates.len(), "populating outer tiles");

    let populated = executor.execute(candidates, |tile| populator.populate(tile))?;
    let tot = TensorOfTensors::from_tiles(outer_tiling.clone(), populated.into_iter().flatten());
    tracing::debug!(
        nnz_tiles = tot.nnz_tiles(),
        nnz_blocks = tot.nnz_blocks(),
        "sparsification complete"
    );
    Ok(tot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::tiled_tensor::TiledTensor;
    use approx::assert_relative_eq;

    // T[a, b] = 10 * a + b + 1 over a 4x4 grid in 2x2 tiles
    fn source_2d() -> TiledTensor<f64> {
        let data = DenseTensor::from_fn(&[4, 4], |idx| (10 * idx[0] + idx[1] + 1) as f64);
        TiledTensor::from_dense(&data, Tiling::uniform(&[4, 4], 2).unwrap()).unwrap()
    }

    fn sm(pairs: &[(&[usize], &[&[usize]])]) -> SparseMap {
        SparseMap::try_from_pairs(pairs.iter().map(|(ind, deps)| {
            (
                Index::new(ind),
                deps.iter().map(|d| Index::new(d)).collect::<Vec<_>>(),
            )
        }))
        .unwrap()
    }

    fn sequential() -> SparsifyConfig {
        SparsifyConfig::sequential()
    }

    fn sparsify(
        esm: &SparseMap,
        source: &TiledTensor<f64>,
        outer: &Tiling,
    ) -> TensorOfTensors<f64> {
        from_sparse_map_with(esm, source, outer, &ModeInjection::new(), &sequential()).unwrap()
    }

    #[test]
    fn test_rectangular_blocks() {
        let esm = sm(&[
            (&[0], &[&[0, 1], &[0, 2], &[3, 1], &[3, 2]]),
            (&[2], &[&[1, 1]]),
        ]);
        let outer = Tiling::uniform(&[3], 2).unwrap();
        let tot = sparsify(&esm, &source_2d(), &outer);

        assert_eq!(tot.nnz_tiles(), 2);
        let b0 = tot.get(&Index::new(&[0])).unwrap();
        assert_eq!(b0.shape(), &[2, 2]);
        assert_eq!(b0.data(), &[2.0, 3.0, 32.0, 33.0]);
        let b2 = tot.get(&Index::new(&[2])).unwrap();
        assert_eq!(b2.shape(), &[1, 1]);
        assert_eq!(b2.data(), &[12.0]);
        assert!(tot.get(&Index::new(&[1])).is_none());
    }

    #[test]
    fn test_irregular_domain_zero_fills_holes() {
        let esm = sm(&[(&[0], &[&[0, 0], &[1, 3]])]);
        let outer = Tiling::uniform(&[1], 1).unwrap();
        let tot = sparsify(&esm, &source_2d(), &outer);
        let block = tot.get(&Index::new(&[0])).unwrap();
        assert_eq!(block.shape(), &[2, 2]);
        assert_eq!(block.data(), &[1.0, 0.0, 0.0, 14.0]);
    }

    #[test]
    fn test_injection() {
        // Diagonal in modes 0 and 2: block(i)[a] = T[i, a, i]
        let data =
            DenseTensor::from_fn(&[3, 2, 3], |idx| (100 * idx[0] + 10 * idx[1] + idx[2]) as f64);
        let tiling = Tiling::uniform(&[3, 2, 3], 2).unwrap();
        let source = TiledTensor::from_dense(&data, tiling).unwrap();
        let esm = sm(&[(&[0, 0], &[&[0], &[1]]), (&[2, 2], &[&[1]])]);
        let injection = ModeInjection::from([(0, 0), (1, 2)]);
        let outer = Tiling::uniform(&[3, 3], 3).unwrap();

        let tot = from_sparse_map_with(&esm, &source, &outer, &injection, &sequential()).unwrap();
        assert_eq!(tot.get(&Index::new(&[0, 0])).unwrap().data(), &[0.0, 10.0]);
        assert_eq!(tot.get(&Index::new(&[2, 2])).unwrap().data(), &[212.0]);
    }

    #[test]
    fn test_zero_tiles_elided() {
        let mut tiled: TiledTensor<f64> = TiledTensor::zeros(Tiling::uniform(&[4, 4], 2).unwrap());
        tiled
            .insert_tile(Index::new(&[1, 1]), DenseTensor::from_fn(&[2, 2], |_| 1.0))
            .unwrap();
        let esm = sm(&[(&[0], &[&[0, 0], &[0, 1]]), (&[1], &[&[2, 2], &[0, 0]])]);
        let outer = Tiling::uniform(&[2], 1).unwrap();

        let tot = from_sparse_map_with(&esm, &tiled, &outer, &ModeInjection::new(), &sequential())
            .unwrap();
        assert!(tot.is_tile_zero(&Index::new(&[0])));
        let block = tot.get(&Index::new(&[1])).unwrap();
        assert_eq!(block.data(), &[0.0, 0.0, 0.0, 1.0]);
        assert_relative_eq!(tot.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_map() {
        let outer = Tiling::uniform(&[4], 2).unwrap();
        let esm = SparseMap::new();
        let tot: TensorOfTensors<f64> =
            from_sparse_map(&esm, &source_2d(), &outer, &ModeInjection::new()).unwrap();
        assert!(tot.is_empty());
    }

    #[test]
    fn test_rank_mismatch() {
        let esm = sm(&[(&[0], &[&[0]])]);
        let outer = Tiling::uniform(&[4], 2).unwrap();
        let err = from_sparse_map(&esm, &source_2d(), &outer, &ModeInjection::new()).unwrap_err();
        assert_eq!(err, SparsityError::rank_mismatch(2, 1));

        let esm = sm(&[(&[0], &[&[0, 0]])]);
        let outer_2d = Tiling::uniform(&[4, 4], 2).unwrap();
        let err =
            from_sparse_map(&esm, &source_2d(), &outer_2d, &ModeInjection::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RankMismatch);
    }

    #[test]
    fn test_invalid_injection() {
        let esm = sm(&[(&[0], &[&[0]])]);
        let outer = Tiling::uniform(&[4], 2).unwrap();
        let source = source_2d();
        for injection in [
            ModeInjection::from([(1, 0)]),
            ModeInjection::from([(0, 2)]),
        ] {
            let err = from_sparse_map(&esm, &source, &outer, &injection).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }

        let err = validate_injection(&ModeInjection::from([(0, 1), (1, 1)]), 2, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_outer_element_out_of_range() {
        let esm = sm(&[(&[5], &[&[0, 0]])]);
        let outer = Tiling::uniform(&[4], 2).unwrap();
        let err = from_sparse_map(&esm, &source_2d(), &outer, &ModeInjection::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let esm = sm(&[
            (&[0], &[&[0, 0], &[3, 3]]),
            (&[1], &[&[1, 2]]),
            (&[4], &[&[2, 0], &[2, 1]]),
            (&[7], &[&[3, 0]]),
        ]);
        let outer = Tiling::uniform(&[8], 1).unwrap();
        let source = source_2d();
        let seq = sparsify(&esm, &source, &outer);
        let config = SparsifyConfig::default()
            .with_num_threads(2)
            .with_min_parallel_tiles(2);
        let par =
            from_sparse_map_with(&esm, &source, &outer, &ModeInjection::new(), &config).unwrap();
        assert_eq!(seq, par);
        assert_eq!(par.nnz_tiles(), 4);
    }

    #[test]
    fn test_few_keys_in_huge_outer_tiling() {
        // 65537^4 outer tiles; only one of them holds a key.
        let outer = Tiling::uniform(&[65537; 4], 1).unwrap();
        let esm = sm(&[(&[65536, 0, 0, 1], &[&[0], &[1]])]);
        let data = DenseTensor::from_fn(&[4], |idx| (idx[0] + 1) as f64);
        let source = TiledTensor::from_dense(&data, Tiling::uniform(&[4], 2).unwrap()).unwrap();

        assert!(!SparsifyConfig::default().use_parallel(1));
        let tot = from_sparse_map(&esm, &source, &outer, &ModeInjection::new()).unwrap();
        assert_eq!(tot.nnz_tiles(), 1);
        let block = tot.get(&Index::new(&[65536, 0, 0, 1])).unwrap();
        assert_eq!(block.data(), &[1.0, 2.0]);

        let config = SparsifyConfig::default().with_min_parallel_tiles(1);
        let par = from_sparse_map_with(&esm, &source, &outer, &ModeInjection::new(), &config);
        assert_eq!(par.unwrap(), tot);
    }

    #[test]
    fn test_populator_candidates() {
        let esm = sm(&[(&[0], &[&[0, 0]]), (&[1], &[&[0, 1]]), (&[5], &[&[1, 1]])]);
        let outer = Tiling::uniform(&[6], 2).unwrap();
        let source = source_2d();
        let injection = ModeInjection::new();
        let populator = TilePopulator::new(&esm, &source, &outer, &injection).unwrap();
        assert_eq!(
            populator.candidate_tiles(),
            vec![Index::new(&[0]), Index::new(&[2])]
        );
        assert!(populator.populate(&Index::new(&[1])).unwrap().is_none());
        let tile = populator.populate(&Index::new(&[0])).unwrap().unwrap();
        assert_eq!(tile.len(), 2);
    }
}
