pub mod subspace;

use crate::error::GridError;
use crate::structs::alpha::Alpha;
use crate::structs::point::GridPoint;
use crate::structs::storage::GridStorage;
use std::collections::BTreeSet;

/// Scoring interface of one coarsening step.
///
/// Mirror image of [RefinementFunctor](crate::routines::refinement::RefinementFunctor):
/// lower scores mean higher priority to remove, and a candidate qualifies
/// only with a score strictly below `threshold`.
pub trait CoarseningFunctor {
    fn score(&self, storage: &GridStorage, alpha: &Alpha, id: usize) -> f64;
    fn budget(&self) -> usize;
    fn threshold(&self) -> f64;
}

/// Remove where the absolute hierarchical surplus is smallest.
#[derive(Debug, Clone)]
pub struct SurplusCoarseningFunctor {
    budget: usize,
    threshold: f64,
}

impl SurplusCoarseningFunctor {
    pub fn new(budget: usize, threshold: f64) -> Self {
        Self { budget, threshold }
    }
}

impl CoarseningFunctor for SurplusCoarseningFunctor {
    fn score(&self, _storage: &GridStorage, alpha: &Alpha, id: usize) -> f64 {
        alpha[id].abs()
    }

    fn budget(&self) -> usize {
        self.budget
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// One plain coarsening step: remove the lowest-scored leaf points.
///
/// Only leaves are candidates; removing a point that still has a child
/// would break hierarchical closure, so a non-leaf never qualifies no
/// matter its score. The root subspace is likewise never removed. Scores
/// are snapshotted before mutation, up to `functor.budget()` candidates
/// strictly below `functor.threshold()` are removed as one batch, and
/// `alpha` is compacted so surviving entries stay aligned with the
/// renumbered ids.
///
/// Returns the removed ids in the pre-removal numbering.
pub fn coarsen(
    storage: &mut GridStorage,
    alpha: &mut Alpha,
    functor: &dyn CoarseningFunctor,
) -> Result<Vec<usize>, GridError> {
    if alpha.len() != storage.size() {
        return Err(GridError::SizeMismatch {
            alpha: alpha.len(),
            points: storage.size(),
        });
    }

    let mut candidates: Vec<(f64, u32, GridPoint, usize)> = Vec::new();
    for (id, point) in storage.iter() {
        if point.is_root() || !storage.is_leaf(id)? {
            continue;
        }
        let score = functor.score(storage, alpha, id);
        if score < functor.threshold() {
            candidates.push((score, point.level_sum(), point.clone(), id));
        }
    }
    // Lowest score first; ties prefer deeper points, then the packed
    // point key, so equal inputs always select equal candidate sets.
    candidates.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(b.1.cmp(&a.1))
            .then(a.2.cmp(&b.2))
    });
    candidates.truncate(functor.budget());

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let ids: BTreeSet<usize> = candidates.into_iter().map(|(_, _, _, id)| id).collect();
    let removed = storage.remove(&ids)?;
    alpha.compact(&ids);

    tracing::debug!(
        removed = removed.len(),
        points = storage.size(),
        "coarsening step"
    );
    Ok(removed)
}
