//! Building blocks for adaptive hierarchical sparse grids.
//!
//! The crate covers the core of a caller-driven adaptivity loop: hashed
//! [GridStorage](structs::storage::GridStorage) over level/index points,
//! the in-place nodal/surplus transform, and surplus-driven refinement and
//! coarsening, including whole-subspace coarsening. The caller owns the
//! loop: resample, [hierarchize](routines::hierarchization::hierarchize),
//! score, mutate, repeat.

pub mod error;
pub mod logger;
pub mod routines;
pub mod structs;

pub mod prelude {
    pub use crate::error::GridError;
    pub use crate::logger::setup_log;
    pub use crate::routines::coarsening::subspace::{
        coarsen_subspaces, ScoreAggregation, SubspacePolicy,
    };
    pub use crate::routines::coarsening::{coarsen, CoarseningFunctor, SurplusCoarseningFunctor};
    pub use crate::routines::generation::{create_regular_grid, insert_with_ancestors};
    pub use crate::routines::hierarchization::{dehierarchize, hierarchize};
    pub use crate::routines::refinement::{refine, RefinementFunctor, SurplusRefinementFunctor};
    pub use crate::routines::settings::{Control, Settings};
    pub use crate::structs::alpha::Alpha;
    pub use crate::structs::point::{GridPoint, LevelIndex};
    pub use crate::structs::storage::GridStorage;
}
