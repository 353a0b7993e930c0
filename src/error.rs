use crate::structs::point::GridPoint;
use thiserror::Error;

/// Errors reported by the grid core.
///
/// All failures are local and synchronous; no operation retries internally,
/// and batch mutations validate the full candidate set before touching
/// storage, so a returned error always leaves the grid unchanged.
#[derive(Error, Debug)]
pub enum GridError {
    /// Insertion of a point whose exact level/index tuple is already stored.
    #[error("grid point {0} is already present in storage")]
    DuplicatePoint(GridPoint),

    /// A point id at or beyond the current storage size.
    #[error("grid point id {id} is out of range for storage of size {size}")]
    IdOutOfRange { id: usize, size: usize },

    /// Coefficient vector not aligned with the storage id space.
    #[error("coefficient vector has {alpha} entries, but storage holds {points} points")]
    SizeMismatch { alpha: usize, points: usize },

    /// A mutation would break hierarchical closure or subspace completeness.
    #[error("hierarchical invariant violated: {0}")]
    InvariantViolation(String),
}
