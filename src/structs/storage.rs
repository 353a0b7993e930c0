use crate::error::GridError;
use crate::structs::point::GridPoint;
use std::collections::{BTreeSet, HashMap};

/// Hashed storage of the points of a hierarchical sparse grid.
///
/// Every stored point owns a dense id in `[0, size)`; the id is stable until
/// the next size-changing mutation, after which callers must re-resolve
/// points through [GridStorage::find] rather than by remembered id.
///
/// Storage maintains the hierarchical closure invariant: outside of a bulk
/// mutation, the direct hierarchical parent of every stored point in every
/// dimension is stored as well. [GridStorage::remove] refuses any batch that
/// would strand a retained point.
#[derive(Debug, Clone, Default)]
pub struct GridStorage {
    dim: usize,
    points: Vec<GridPoint>,
    map: HashMap<GridPoint, usize>,
}

impl GridStorage {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            points: Vec::new(),
            map: HashMap::new(),
        }
    }

    /// Dimensionality of the stored points.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored points, equal to the extent of the id space.
    pub fn size(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point and return its assigned id.
    pub fn insert(&mut self, point: GridPoint) -> Result<usize, GridError> {
        debug_assert_eq!(point.dim(), self.dim);
        if self.map.contains_key(&point) {
            return Err(GridError::DuplicatePoint(point));
        }
        let id = self.points.len();
        self.map.insert(point.clone(), id);
        self.points.push(point);
        Ok(id)
    }

    /// The point stored under `id`.
    pub fn get(&self, id: usize) -> Result<&GridPoint, GridError> {
        self.points.get(id).ok_or(GridError::IdOutOfRange {
            id,
            size: self.points.len(),
        })
    }

    /// Hashed lookup of a point's id.
    pub fn find(&self, point: &GridPoint) -> Option<usize> {
        self.map.get(point).copied()
    }

    pub fn contains(&self, point: &GridPoint) -> bool {
        self.map.contains_key(point)
    }

    /// All stored points in id order.
    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &GridPoint)> {
        self.points.iter().enumerate()
    }

    /// True if the point under `id` has no hierarchical child in storage.
    pub fn is_leaf(&self, id: usize) -> Result<bool, GridError> {
        let point = self.get(id)?;
        for d in 0..self.dim {
            for child in [point.left_child(d), point.right_child(d)]
                .into_iter()
                .flatten()
            {
                if self.contains(&child) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Remove a batch of points and compact the id space.
    ///
    /// The batch is validated before anything is mutated: if any retained
    /// point would lose its direct parent in some dimension, the whole
    /// removal fails with [GridError::InvariantViolation] and storage is
    /// left untouched. On success the removed ids are returned in ascending
    /// pre-removal numbering; all previously handed-out ids are invalid
    /// afterwards.
    pub fn remove(&mut self, ids: &BTreeSet<usize>) -> Result<Vec<usize>, GridError> {
        for &id in ids {
            if id >= self.points.len() {
                return Err(GridError::IdOutOfRange {
                    id,
                    size: self.points.len(),
                });
            }
        }

        // Validate-then-commit: every retained point must keep its parents.
        for (id, point) in self.points.iter().enumerate() {
            if ids.contains(&id) {
                continue;
            }
            for d in 0..self.dim {
                if let Some(parent) = point.parent(d) {
                    let stranded = match self.find(&parent) {
                        Some(pid) => ids.contains(&pid),
                        None => true,
                    };
                    if stranded {
                        return Err(GridError::InvariantViolation(format!(
                            "removing the parent of retained point {} in dimension {}",
                            point, d
                        )));
                    }
                }
            }
        }

        let mut removed = Vec::with_capacity(ids.len());
        let mut retained = Vec::with_capacity(self.points.len() - ids.len());
        for (id, point) in self.points.drain(..).enumerate() {
            if ids.contains(&id) {
                removed.push(id);
            } else {
                retained.push(point);
            }
        }
        self.map.clear();
        for (id, point) in retained.iter().enumerate() {
            self.map.insert(point.clone(), id);
        }
        self.points = retained;
        Ok(removed)
    }

    /// Check hierarchical closure over the whole storage.
    ///
    /// Cheap enough for tests and post-mutation assertions; the mutating
    /// operations keep the invariant by construction.
    pub fn validate_closure(&self) -> Result<(), GridError> {
        for point in &self.points {
            for d in 0..self.dim {
                if let Some(parent) = point.parent(d) {
                    if !self.contains(&parent) {
                        return Err(GridError::InvariantViolation(format!(
                            "point {} is missing its parent in dimension {}",
                            point, d
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
