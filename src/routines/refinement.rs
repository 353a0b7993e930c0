use crate::error::GridError;
use crate::routines::generation::insert_with_ancestors;
use crate::structs::alpha::Alpha;
use crate::structs::point::GridPoint;
use crate::structs::storage::GridStorage;

/// Scoring interface of one refinement step.
///
/// A functor is resolved once per step and then queried per point; higher
/// scores mean higher priority to refine. `budget` caps how many candidates
/// are acted on, `threshold` is the strict lower bound a score must exceed
/// to qualify at all.
pub trait RefinementFunctor {
    fn score(&self, storage: &GridStorage, alpha: &Alpha, id: usize) -> f64;
    fn budget(&self) -> usize;
    fn threshold(&self) -> f64;
}

/// Refine where the absolute hierarchical surplus is largest.
///
/// The surplus of a point measures the local interpolation error its basis
/// function corrects, which makes its magnitude the standard refinement
/// indicator.
#[derive(Debug, Clone)]
pub struct SurplusRefinementFunctor {
    budget: usize,
    threshold: f64,
}

impl SurplusRefinementFunctor {
    pub fn new(budget: usize, threshold: f64) -> Self {
        Self { budget, threshold }
    }
}

impl RefinementFunctor for SurplusRefinementFunctor {
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

/// One refinement step: add the hierarchical children of the highest-scored
/// points.
///
/// Scores are snapshotted against the pre-mutation grid, then up to
/// `functor.budget()` points scoring strictly above `functor.threshold()`
/// are selected. For every selected point, all of its missing children in
/// every dimension are inserted together with any missing ancestors, so
/// hierarchical closure survives the step. `alpha` is grown zero-padded to
/// the new size; the new entries are the caller's to populate.
///
/// Returns the ids of the newly created points. When nothing qualifies the
/// step is a no-op and the returned vector is empty.
pub fn refine(
    storage: &mut GridStorage,
    alpha: &mut Alpha,
    functor: &dyn RefinementFunctor,
) -> Result<Vec<usize>, GridError> {
    if alpha.len() != storage.size() {
        return Err(GridError::SizeMismatch {
            alpha: alpha.len(),
            points: storage.size(),
        });
    }

    let selected = select_candidates(storage, alpha, functor);
    if selected.is_empty() {
        return Ok(Vec::new());
    }

    let mut created = Vec::new();
    for point in &selected {
        for d in 0..storage.dim() {
            // Boundary dimensions have no children to add.
            for child in [point.left_child(d), point.right_child(d)]
                .into_iter()
                .flatten()
            {
                created.extend(insert_with_ancestors(storage, child)?);
            }
        }
    }
    alpha.resize(storage.size());

    tracing::debug!(
        refined = selected.len(),
        created = created.len(),
        points = storage.size(),
        "refinement step"
    );
    Ok(created)
}

/// Snapshot scores and pick the points to refine, deterministically.
///
/// Order: score descending, then level sum descending, then the packed
/// point key, so equal inputs always select equal candidate sets.
fn select_candidates(
    storage: &GridStorage,
    alpha: &Alpha,
    functor: &dyn RefinementFunctor,
) -> Vec<GridPoint> {
    let mut candidates: Vec<(f64, u32, GridPoint)> = storage
        .iter()
        .filter_map(|(id, point)| {
            let score = functor.score(storage, alpha, id);
            (score > functor.threshold()).then(|| (score, point.level_sum(), point.clone()))
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then(b.1.cmp(&a.1))
            .then(a.2.cmp(&b.2))
    });
    candidates.truncate(functor.budget());
    candidates.into_iter().map(|(_, _, p)| p).collect()
}
