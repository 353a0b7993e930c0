use crate::error::GridError;
use crate::routines::coarsening::CoarseningFunctor;
use crate::structs::alpha::Alpha;
use crate::structs::storage::GridStorage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// How the per-point scores of a subspace collapse into one subspace score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoreAggregation {
    /// The largest member score; conservative, one significant surplus
    /// protects the whole subspace.
    #[default]
    Max,
    /// The mean member score; tolerates isolated outliers.
    Mean,
}

/// Policy knobs of subspace coarsening.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubspacePolicy {
    #[serde(default)]
    pub aggregation: ScoreAggregation,
}

impl ScoreAggregation {
    fn aggregate(&self, scores: &[f64]) -> f64 {
        match self {
            ScoreAggregation::Max => scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            ScoreAggregation::Mean => scores.iter().sum::<f64>() / scores.len() as f64,
        }
    }
}

/// One subspace coarsening step: remove whole level-subspaces atomically.
///
/// A subspace (all points sharing one level vector) is eligible only if it
/// is complete, has no child subspace present in any dimension, and its
/// aggregated score falls strictly below the functor threshold. Up to
/// `functor.budget()` eligible subspaces are removed, each with every one
/// of its points; a removal that would leave a subspace partially populated
/// fails with [GridError::InvariantViolation] before anything is mutated.
/// The root subspace is never a candidate.
///
/// Returns the removed ids in the pre-removal numbering.
pub fn coarsen_subspaces(
    storage: &mut GridStorage,
    alpha: &mut Alpha,
    functor: &dyn CoarseningFunctor,
    policy: &SubspacePolicy,
) -> Result<Vec<usize>, GridError> {
    if alpha.len() != storage.size() {
        return Err(GridError::SizeMismatch {
            alpha: alpha.len(),
            points: storage.size(),
        });
    }

    let mut members: HashMap<Vec<u32>, Vec<usize>> = HashMap::new();
    for (id, point) in storage.iter() {
        members.entry(point.level_vector()).or_default().push(id);
    }
    let present_levels: HashSet<Vec<u32>> = members.keys().cloned().collect();

    let mut candidates: Vec<(f64, u32, Vec<u32>)> = Vec::new();
    for (levels, ids) in &members {
        if levels.iter().all(|&l| l == 1) {
            continue;
        }
        if !is_complete(levels, ids.len()) {
            continue;
        }
        if has_child_subspace(levels, &present_levels) {
            continue;
        }
        let scores: Vec<f64> = ids
            .iter()
            .map(|&id| functor.score(storage, alpha, id))
            .collect();
        let aggregated = policy.aggregation.aggregate(&scores);
        if aggregated < functor.threshold() {
            candidates.push((aggregated, levels.iter().sum(), levels.clone()));
        }
    }

    // Lowest aggregated score first; ties prefer the deeper subspace, then
    // the level vector itself, keeping selection independent of hash order.
    candidates.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(b.1.cmp(&a.1))
            .then(a.2.cmp(&b.2))
    });
    candidates.truncate(functor.budget());

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    // One closed batch over all selected subspaces; remove() validates the
    // retained set before committing, so a partial removal cannot happen.
    let mut ids: BTreeSet<usize> = BTreeSet::new();
    for (_, _, levels) in &candidates {
        ids.extend(members[levels].iter().copied());
    }
    let removed = storage.remove(&ids)?;
    alpha.compact(&ids);

    tracing::debug!(
        subspaces = candidates.len(),
        removed = removed.len(),
        points = storage.size(),
        "subspace coarsening step"
    );
    Ok(removed)
}

/// A subspace is complete when every interior index combination is present.
/// A level-0 dimension contributes a single combination.
fn is_complete(levels: &[u32], member_count: usize) -> bool {
    let expected: u64 = levels
        .iter()
        .map(|&l| if l == 0 { 1 } else { 1u64 << (l - 1) })
        .product();
    member_count as u64 == expected
}

fn has_child_subspace(levels: &[u32], present: &HashSet<Vec<u32>>) -> bool {
    let mut child = levels.to_vec();
    for d in 0..levels.len() {
        child[d] += 1;
        if present.contains(&child) {
            return true;
        }
        child[d] -= 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::coarsening::SurplusCoarseningFunctor;
    use crate::routines::generation::create_regular_grid;

    #[test]
    fn test_aggregation_rules() {
        let scores = [0.1, 0.4, 0.2];
        assert_eq!(ScoreAggregation::Max.aggregate(&scores), 0.4);
        assert!((ScoreAggregation::Mean.aggregate(&scores) - 0.2333333333333333).abs() < 1e-12);
    }

    #[test]
    fn test_completeness() {
        assert!(is_complete(&[3, 1], 4));
        assert!(!is_complete(&[3, 1], 3));
        assert!(is_complete(&[1, 1], 1));
        assert!(is_complete(&[2, 2], 4));
        assert!(is_complete(&[0, 2], 2));
    }

    #[test]
    fn test_only_quiet_childless_subspace_is_removed() {
        let mut storage = create_regular_grid(2, 3).unwrap();
        // Mark every surplus significant except those of subspace (3,1).
        let mut alpha = Alpha::from_vec(vec![1.0; storage.size()]);
        let target: Vec<usize> = storage
            .iter()
            .filter(|(_, p)| p.level_vector() == vec![3, 1])
            .map(|(id, _)| id)
            .collect();
        assert_eq!(target.len(), 4);
        for &id in &target {
            alpha[id] = 0.01;
        }

        let functor = SurplusCoarseningFunctor::new(10, 0.5);
        let removed =
            coarsen_subspaces(&mut storage, &mut alpha, &functor, &SubspacePolicy::default())
                .unwrap();

        // Exactly the whole subspace went, nothing else.
        assert_eq!(removed.len(), 4);
        assert_eq!(storage.size(), 13);
        assert_eq!(alpha.len(), 13);
        assert!(storage
            .iter()
            .all(|(_, p)| p.level_vector() != vec![3, 1]));
        storage.validate_closure().unwrap();
    }

    #[test]
    fn test_subspace_with_children_is_protected() {
        let mut storage = create_regular_grid(2, 3).unwrap();
        // Subspace (2,1) is complete but has children (3,1) and (2,2).
        let mut alpha = Alpha::from_vec(vec![1.0; storage.size()]);
        for (id, p) in storage.iter().map(|(i, p)| (i, p.clone())).collect::<Vec<_>>() {
            if p.level_vector() == vec![2, 1] {
                alpha[id] = 0.0;
            }
        }

        let functor = SurplusCoarseningFunctor::new(10, 0.5);
        let removed =
            coarsen_subspaces(&mut storage, &mut alpha, &functor, &SubspacePolicy::default())
                .unwrap();
        assert!(storage
            .iter()
            .any(|(_, p)| p.level_vector() == vec![2, 1]));
        assert_eq!(storage.size(), 17 - removed.len());
    }

    #[test]
    fn test_max_aggregation_protects_noisy_subspace() {
        let mut storage = create_regular_grid(2, 3).unwrap();
        let mut alpha = Alpha::from_vec(vec![1.0; storage.size()]);
        // Subspace (1,3): three quiet members, one loud one.
        for (id, p) in storage.iter().map(|(i, p)| (i, p.clone())).collect::<Vec<_>>() {
            if p.level_vector() == vec![1, 3] {
                alpha[id] = 0.01;
            }
        }
        let loud = storage
            .iter()
            .find(|(_, p)| p.level_vector() == vec![1, 3])
            .map(|(id, _)| id)
            .unwrap();
        alpha[loud] = 0.9;

        let functor = SurplusCoarseningFunctor::new(1, 0.5);

        // Max sees 0.9 and keeps the subspace.
        let mut s_max = storage.clone();
        let mut a_max = alpha.clone();
        let removed = coarsen_subspaces(
            &mut s_max,
            &mut a_max,
            &functor,
            &SubspacePolicy {
                aggregation: ScoreAggregation::Max,
            },
        )
        .unwrap();
        assert!(s_max.iter().any(|(_, p)| p.level_vector() == vec![1, 3]));
        // Some other quiet subspace may still have gone.
        assert_eq!(s_max.size(), 17 - removed.len());

        // Mean sees (0.9 + 3 * 0.01) / 4 < 0.5; with every other subspace
        // loud, (1,3) is the only candidate and is removed whole.
        for (id, p) in storage.iter().map(|(i, p)| (i, p.clone())).collect::<Vec<_>>() {
            if p.level_vector() != vec![1, 3] && alpha[id] < 0.5 {
                alpha[id] = 1.0;
            }
        }
        let removed = coarsen_subspaces(
            &mut storage,
            &mut alpha,
            &functor,
            &SubspacePolicy {
                aggregation: ScoreAggregation::Mean,
            },
        )
        .unwrap();
        assert_eq!(removed.len(), 4);
        assert!(storage.iter().all(|(_, p)| p.level_vector() != vec![1, 3]));
    }
}
