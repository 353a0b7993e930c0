use serde::{Deserialize, Serialize};
use std::fmt;

/// A single (level, index) pair in one dimension of the dyadic encoding.
///
/// The 1-D coordinate of the pair is `index / 2^level`. Interior points have
/// `level >= 1` and an odd `index`; level 0 is reserved for the boundary,
/// where `index` is 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelIndex {
    pub level: u32,
    pub index: u32,
}

impl LevelIndex {
    pub fn new(level: u32, index: u32) -> Self {
        debug_assert!(
            if level == 0 {
                index <= 1
            } else {
                index % 2 == 1 && index < (1 << level)
            },
            "invalid level/index pair ({}, {})",
            level,
            index
        );
        Self { level, index }
    }

    /// Unit-interval coordinate of this pair.
    pub fn coord(&self) -> f64 {
        self.index as f64 / (1u64 << self.level) as f64
    }

    /// The direct hierarchical parent, one level coarser.
    ///
    /// Of the two neighbouring indices at the parent level, exactly one is
    /// odd; that one is the parent. Level-1 pairs are roots of the
    /// boundary-free hierarchy and have no parent.
    pub fn parent(&self) -> Option<LevelIndex> {
        if self.level <= 1 {
            return None;
        }
        let half = self.index / 2;
        let index = if half % 2 == 1 { half } else { half + 1 };
        Some(LevelIndex::new(self.level - 1, index))
    }

    /// The left hierarchical child, one level finer.
    ///
    /// Boundary pairs (level 0) sit outside the interior hierarchy and
    /// have no children, mirroring [LevelIndex::parent].
    pub fn left_child(&self) -> Option<LevelIndex> {
        if self.level == 0 {
            return None;
        }
        Some(LevelIndex::new(self.level + 1, 2 * self.index - 1))
    }

    pub fn right_child(&self) -> Option<LevelIndex> {
        if self.level == 0 {
            return None;
        }
        Some(LevelIndex::new(self.level + 1, 2 * self.index + 1))
    }

    /// Fixed-width packed form, usable as part of a structural hash key.
    pub fn packed(&self) -> u64 {
        ((self.level as u64) << 32) | self.index as u64
    }
}

impl fmt::Display for LevelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.level, self.index)
    }
}

/// A grid point of a `dim`-dimensional hierarchical sparse grid.
///
/// The point is a value object: one [LevelIndex] per dimension, equal to
/// another point iff every pair matches. Hashing runs over the packed
/// pairs, so points serve directly as structural keys in
/// [GridStorage](crate::structs::storage::GridStorage).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    coords: Vec<LevelIndex>,
}

impl GridPoint {
    pub fn new(coords: Vec<LevelIndex>) -> Self {
        debug_assert!(!coords.is_empty(), "a grid point needs at least one dimension");
        Self { coords }
    }

    /// Build a point from parallel level and index slices.
    pub fn from_level_index(levels: &[u32], indices: &[u32]) -> Self {
        debug_assert_eq!(levels.len(), indices.len());
        Self::new(
            levels
                .iter()
                .zip(indices.iter())
                .map(|(&l, &i)| LevelIndex::new(l, i))
                .collect(),
        )
    }

    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    pub fn level_index(&self, d: usize) -> LevelIndex {
        self.coords[d]
    }

    /// Unit-cube coordinate in dimension `d`.
    pub fn coord(&self, d: usize) -> f64 {
        self.coords[d].coord()
    }

    /// All unit-cube coordinates, one per dimension.
    pub fn coords(&self) -> Vec<f64> {
        self.coords.iter().map(|li| li.coord()).collect()
    }

    pub fn level_vector(&self) -> Vec<u32> {
        self.coords.iter().map(|li| li.level).collect()
    }

    /// Sum of levels over all dimensions, the usual cost measure of a point.
    pub fn level_sum(&self) -> u32 {
        self.coords.iter().map(|li| li.level).sum()
    }

    /// The direct hierarchical parent in dimension `d`, if any.
    pub fn parent(&self, d: usize) -> Option<GridPoint> {
        self.coords[d]
            .parent()
            .map(|li| self.with_level_index(d, li))
    }

    /// The left hierarchical child in dimension `d`; `None` if that
    /// dimension sits on the boundary.
    pub fn left_child(&self, d: usize) -> Option<GridPoint> {
        self.coords[d]
            .left_child()
            .map(|li| self.with_level_index(d, li))
    }

    pub fn right_child(&self, d: usize) -> Option<GridPoint> {
        self.coords[d]
            .right_child()
            .map(|li| self.with_level_index(d, li))
    }

    /// A copy of this point with dimension `d` replaced.
    pub fn with_level_index(&self, d: usize, li: LevelIndex) -> GridPoint {
        let mut coords = self.coords.clone();
        coords[d] = li;
        GridPoint { coords }
    }

    /// True for points of the root subspace, level 1 in every dimension.
    pub fn is_root(&self) -> bool {
        self.coords.iter().all(|li| li.level == 1)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (d, li) in self.coords.iter().enumerate() {
            if d > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", li)?;
        }
        write!(f, "]")
    }
}
