//! Per-mode tilings and their multi-mode product.
//!
//! A [`ModeTiling`] partitions `[0, extent)` into contiguous tiles, stored as
//! cumulative boundaries for O(log n) element-to-tile lookup. A [`Tiling`]
//! holds one `ModeTiling` per mode.

use std::ops::Range;

use crate::error::{Result, SparsityError};
use crate::index::{Index, IndexRange};

/// Tiling of a single mode.
///
/// # Example
/// ```
/// use sparsemap::ModeTiling;
///
/// // Tiles [0, 2), [2, 5), [5, 9)
/// let mode = ModeTiling::new(vec![0, 2, 5, 9]).unwrap();
/// assert_eq!(mode.ntiles(), 3);
/// assert_eq!(mode.extent(), 9);
/// assert_eq!(mode.tile_of(4), Some(1));
/// assert_eq!(mode.tile_of(9), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModeTiling {
    /// boundaries[t]..boundaries[t + 1] is tile t
    boundaries: Vec<usize>,
}

impl ModeTiling {
    /// Create a tiling from its boundaries `[0, b1, ..., extent]`.
    ///
    /// # Errors
    /// `InvalidTiling` unless the boundaries start at 0 and strictly increase.
    pub fn new(boundaries: Vec<usize>) -> Result<Self> {
        if boundaries.first() != Some(&0) {
            return Err(SparsityError::InvalidTiling {
                message: format!("boundaries {:?} must start at 0", boundaries),
            });
        }
        if boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SparsityError::InvalidTiling {
                message: format!("boundaries {:?} must be strictly increasing", boundaries),
            });
        }
        Ok(Self { boundaries })
    }

    /// Create a tiling from tile sizes.
    ///
    /// ```
    /// use sparsemap::ModeTiling;
    ///
    /// let mode = ModeTiling::from_tile_sizes(&[2, 3, 4]).unwrap();
    /// assert_eq!(mode.boundaries(), &[0, 2, 5, 9]);
    /// ```
    pub fn from_tile_sizes(sizes: &[usize]) -> Result<Self> {
        let mut boundaries = Vec::with_capacity(sizes.len() + 1);
        boundaries.push(0);
        let mut total: usize = 0;
        for &size in sizes {
            total = total.checked_add(size).ok_or_else(|| SparsityError::InvalidTiling {
                message: "total extent overflows usize".to_string(),
            })?;
            boundaries.push(total);
        }
        Self::new(boundaries)
    }

    /// Tiles of `tile_size` elements covering `[0, extent)`; the last tile
    /// may be shorter.
    pub fn uniform(extent: usize, tile_size: usize) -> Result<Self> {
        if tile_size == 0 && extent > 0 {
            return Err(SparsityError::InvalidTiling {
                message: "tile size must be positive".to_string(),
            });
        }
        let mut boundaries: Vec<usize> = (0..extent).step_by(tile_size.max(1)).collect();
        boundaries.push(extent);
        boundaries.dedup();
        Self::new(boundaries)
    }

    /// A single tile spanning the whole mode.
    pub fn single(extent: usize) -> Result<Self> {
        Self::uniform(extent, extent)
    }

    #[inline]
    pub fn ntiles(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Number of elements covered.
    #[inline]
    pub fn extent(&self) -> usize {
        self.boundaries[self.ntiles()]
    }

    #[inline]
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// Element range of tile `tile`, or `None` if there is no such tile.
    pub fn tile_range(&self, tile: usize) -> Option<Range<usize>> {
        (tile < self.ntiles()).then(|| self.boundaries[tile]..self.boundaries[tile + 1])
    }

    /// Tile containing `element`, or `None` if it lies outside the extent.
    pub fn tile_of(&self, element: usize) -> Option<usize> {
        if element >= self.extent() {
            return None;
        }
        match self.boundaries[1..].binary_search(&element) {
            // Exactly at a boundary, belongs to the next tile
            Ok(i) => Some(i + 1),
            Err(i) => Some(i),
        }
    }
}

impl std::fmt::Display for ModeTiling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModeTiling({:?})", self.boundaries)
    }
}

/// Tiling of every mode of a tensor.
///
/// # Example
/// ```
/// use sparsemap::{Index, ModeTiling, Tiling};
///
/// let tiling = Tiling::new(vec![
///     ModeTiling::from_tile_sizes(&[2, 3]).unwrap(),
///     ModeTiling::from_tile_sizes(&[4, 5, 6]).unwrap(),
/// ]);
/// assert_eq!(tiling.rank(), 2);
/// assert_eq!(tiling.extents(), vec![5, 15]);
/// assert_eq!(tiling.tile_of(&Index::new(&[3, 4])).unwrap(), Index::new(&[1, 1]));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tiling {
    modes: Vec<ModeTiling>,
}

impl Tiling {
    pub fn new(modes: Vec<ModeTiling>) -> Self {
        Self { modes }
    }

    /// Same-size tiles in every mode (last tile per mode may be shorter).
    pub fn uniform(extents: &[usize], tile_size: usize) -> Result<Self> {
        let modes = extents
            .iter()
            .map(|&extent| ModeTiling::uniform(extent, tile_size))
            .collect::<Result<_>>()?;
        Ok(Self { modes })
    }

    /// Number of modes.
    #[inline]
    pub fn rank(&self) -> usize {
        self.modes.len()
    }

    #[inline]
    pub fn mode(&self, i: usize) -> &ModeTiling {
        &self.modes[i]
    }

    #[inline]
    pub fn modes(&self) -> &[ModeTiling] {
        &self.modes
    }

    /// Element extent of each mode.
    pub fn extents(&self) -> Vec<usize> {
        self.modes.iter().map(ModeTiling::extent).collect()
    }

    /// Number of tiles in each mode.
    pub fn ntiles(&self) -> Vec<usize> {
        self.modes.iter().map(ModeTiling::ntiles).collect()
    }

    /// Iterate over all tile indices in ascending order.
    pub fn tiles(&self) -> IndexRange {
        IndexRange::from_shape(&self.ntiles())
    }

    /// Tile containing `element`.
    ///
    /// # Errors
    /// `RankMismatch` on a wrong-rank element, `ElementOutOfRange` if some
    /// coordinate lies outside its mode.
    pub fn tile_of(&self, element: &Index) -> Result<Index> {
        self.check_rank(element)?;
        let coords = self
            .modes
            .iter()
            .zip(element)
            .enumerate()
            .map(|(mode, (tiling, &e))| {
                tiling.tile_of(e).ok_or(SparsityError::ElementOutOfRange {
                    mode,
                    element: e,
                    extent: tiling.extent(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Index::from(coords))
    }

    /// Per-mode element ranges of `tile`.
    ///
    /// # Errors
    /// `RankMismatch` on a wrong-rank tile, `TileOutOfRange` if some
    /// coordinate names no tile.
    pub fn tile_ranges(&self, tile: &Index) -> Result<Vec<Range<usize>>> {
        self.check_rank(tile)?;
        self.modes
            .iter()
            .zip(tile)
            .enumerate()
            .map(|(mode, (tiling, &t))| {
                tiling.tile_range(t).ok_or(SparsityError::TileOutOfRange {
                    mode,
                    tile: t,
                    ntiles: tiling.ntiles(),
                })
            })
            .collect()
    }

    /// Shape of `tile`.
    pub fn tile_shape(&self, tile: &Index) -> Result<Vec<usize>> {
        Ok(self.tile_ranges(tile)?.iter().map(|r| r.len()).collect())
    }

    /// First element of `tile`.
    pub fn tile_lower(&self, tile: &Index) -> Result<Index> {
        Ok(Index::collect_from(
            self.tile_ranges(tile)?.iter().map(|r| r.start),
        ))
    }

    /// Iterate over every element of `tile` in ascending order.
    pub fn tile_elements(&self, tile: &Index) -> Result<IndexRange> {
        let ranges = self.tile_ranges(tile)?;
        let lower: Vec<usize> = ranges.iter().map(|r| r.start).collect();
        let upper: Vec<usize> = ranges.iter().map(|r| r.end).collect();
        Ok(IndexRange::new(&lower, &upper))
    }

    fn check_rank(&self, idx: &Index) -> Result<()> {
        if idx.rank() != self.rank() {
            return Err(SparsityError::rank_mismatch(self.rank(), idx.rank()));
        }
        Ok(())
    }
}

impl std::ops::Index<usize> for Tiling {
    type Output = ModeTiling;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.modes[index]
    }
}

impl<'a> IntoIterator for &'a Tiling {
    type Item = &'a ModeTiling;
    type IntoIter = std::slice::Iter<'a, ModeTiling>;

    fn into_iter(self) -> Self::IntoIter {
        self.modes.iter()
    }
}
