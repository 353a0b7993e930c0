use crate::error::GridError;
use crate::structs::alpha::Alpha;
use crate::structs::point::LevelIndex;
use crate::structs::storage::GridStorage;
use std::collections::HashMap;

/// Transform nodal samples into hierarchical surpluses, in place.
///
/// On entry `alpha[i]` holds the sample of the target function at grid
/// point `i`; on return it holds the surplus coefficient of the piecewise
/// linear hierarchical basis, so that the interpolant reproduces the
/// samples exactly at every grid point.
///
/// The transform runs one unidirectional sweep per dimension. Each sweep
/// walks the poles of that dimension from the finest level to the coarsest
/// and subtracts the linear interpolation of the two hierarchical ancestors
/// of each point. A stored level-0 boundary point has no ancestors, so its
/// surplus is its own sample; an ancestor position on the boundary
/// contributes its stored coefficient if such a point exists, and 0 in the
/// boundary-free basis otherwise. Dimensions commute for this basis, so
/// the sweep order is irrelevant.
///
/// Validates alignment and hierarchical closure before the first sweep;
/// on any error `alpha` is untouched.
pub fn hierarchize(storage: &GridStorage, alpha: &mut Alpha) -> Result<(), GridError> {
    check_alignment(storage, alpha)?;
    storage.validate_closure()?;
    for d in 0..storage.dim() {
        sweep(storage, alpha, d, Direction::Hierarchize)?;
    }
    tracing::debug!(points = storage.size(), "hierarchized coefficient vector");
    Ok(())
}

/// Transform hierarchical surpluses back into nodal values, in place.
///
/// Exact inverse of [hierarchize]: per dimension, walk the poles from the
/// coarsest level to the finest and add the ancestor interpolation back.
/// Validates like [hierarchize]; on any error `alpha` is untouched.
pub fn dehierarchize(storage: &GridStorage, alpha: &mut Alpha) -> Result<(), GridError> {
    check_alignment(storage, alpha)?;
    storage.validate_closure()?;
    for d in 0..storage.dim() {
        sweep(storage, alpha, d, Direction::Dehierarchize)?;
    }
    Ok(())
}

fn check_alignment(storage: &GridStorage, alpha: &Alpha) -> Result<(), GridError> {
    if alpha.len() != storage.size() {
        return Err(GridError::SizeMismatch {
            alpha: alpha.len(),
            points: storage.size(),
        });
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Direction {
    Hierarchize,
    Dehierarchize,
}

/// One unidirectional 1-D sweep along dimension `d`.
///
/// Points are grouped into poles (1-D slices fixing every other dimension)
/// keyed by their packed off-dimension coordinates, then each pole is
/// processed level by level. Everything is iterative; grid depth never
/// grows the call stack.
fn sweep(
    storage: &GridStorage,
    alpha: &mut Alpha,
    d: usize,
    direction: Direction,
) -> Result<(), GridError> {
    let mut poles: HashMap<Vec<u64>, Vec<(LevelIndex, usize)>> = HashMap::new();
    for (id, point) in storage.iter() {
        let mut key = Vec::with_capacity(storage.dim() - 1);
        for e in 0..storage.dim() {
            if e != d {
                key.push(point.level_index(e).packed());
            }
        }
        poles.entry(key).or_default().push((point.level_index(d), id));
    }

    for entries in poles.values_mut() {
        match direction {
            // Finest first: ancestors still hold nodal values when read.
            Direction::Hierarchize => entries.sort_by(|a, b| b.0.cmp(&a.0)),
            // Coarsest first: ancestors already hold nodal values again.
            Direction::Dehierarchize => entries.sort_by(|a, b| a.0.cmp(&b.0)),
        }

        let by_li: HashMap<LevelIndex, usize> =
            entries.iter().map(|&(li, id)| (li, id)).collect();

        for &(li, id) in entries.iter() {
            let mut interpolated = 0.0;
            for ancestor in [left_ancestor(li), right_ancestor(li)] {
                let Some(anc) = ancestor else { continue };
                match by_li.get(&anc) {
                    Some(&anc_id) => interpolated += 0.5 * alpha[anc_id],
                    // An absent boundary carries no basis function.
                    None if anc.level == 0 => {}
                    // Unreachable once closure was validated up front.
                    None => {
                        return Err(GridError::InvariantViolation(format!(
                            "point {} of pole in dimension {} is missing ancestor {}",
                            li, d, anc
                        )))
                    }
                }
            }
            match direction {
                Direction::Hierarchize => alpha[id] -= interpolated,
                Direction::Dehierarchize => alpha[id] += interpolated,
            }
        }
    }
    Ok(())
}

/// The nearest coarser pair left of `li`, the left end of its support.
///
/// `None` for level-0 pairs, which are the ends of the hierarchy and carry
/// their own sample. For interior pairs whose support touches the domain
/// boundary, the boundary pair `(0,0)` or `(0,1)` is returned; whether a
/// point actually lives there is decided per pole.
fn left_ancestor(li: LevelIndex) -> Option<LevelIndex> {
    if li.level == 0 {
        return None;
    }
    Some(ancestor_of(li.level, li.index - 1))
}

/// The nearest coarser pair right of `li`; `None` for level-0 pairs.
fn right_ancestor(li: LevelIndex) -> Option<LevelIndex> {
    if li.level == 0 {
        return None;
    }
    Some(ancestor_of(li.level, li.index + 1))
}

fn ancestor_of(mut level: u32, mut index: u32) -> LevelIndex {
    while index % 2 == 0 && level > 0 {
        index /= 2;
        level -= 1;
    }
    LevelIndex::new(level, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::generation::create_regular_grid;

    #[test]
    fn test_ancestors() {
        // (3,5): support [0.5, 0.75] -> ancestors (1,1) and (2,3).
        assert_eq!(
            left_ancestor(LevelIndex::new(3, 5)),
            Some(LevelIndex::new(1, 1))
        );
        assert_eq!(
            right_ancestor(LevelIndex::new(3, 5)),
            Some(LevelIndex::new(2, 3))
        );
        // The root hat spans the whole interval; both ends are boundary
        // positions.
        assert_eq!(
            left_ancestor(LevelIndex::new(1, 1)),
            Some(LevelIndex::new(0, 0))
        );
        assert_eq!(
            right_ancestor(LevelIndex::new(1, 1)),
            Some(LevelIndex::new(0, 1))
        );
        // (3,1) touches the left boundary.
        assert_eq!(
            left_ancestor(LevelIndex::new(3, 1)),
            Some(LevelIndex::new(0, 0))
        );
        assert_eq!(
            right_ancestor(LevelIndex::new(3, 1)),
            Some(LevelIndex::new(2, 1))
        );
        // Level-0 pairs are the ends of the hierarchy.
        assert_eq!(left_ancestor(LevelIndex::new(0, 0)), None);
        assert_eq!(right_ancestor(LevelIndex::new(0, 1)), None);
    }

    #[test]
    fn test_hierarchize_1d_hat() {
        // f is the level-1 hat itself, so every deeper surplus vanishes.
        let storage = create_regular_grid(1, 2).unwrap();
        let mut alpha = Alpha::from_vec(
            storage
                .points()
                .iter()
                .map(|p| {
                    let x = p.coord(0);
                    1.0 - 2.0 * (x - 0.5_f64).abs()
                })
                .collect(),
        );
        hierarchize(&storage, &mut alpha).unwrap();
        for (id, point) in storage.iter() {
            let expected = if point.level_index(0).level == 1 { 1.0 } else { 0.0 };
            assert!((alpha[id] - expected).abs() < 1e-12, "point {}", point);
        }
    }

    #[test]
    fn test_hierarchize_1d_identity() {
        let storage = create_regular_grid(1, 2).unwrap();
        let mut alpha = Alpha::from_vec(
            storage.points().iter().map(|p| p.coord(0)).collect(),
        );
        hierarchize(&storage, &mut alpha).unwrap();

        // x=0.5 has no stored ancestors, its surplus is its own sample.
        let root = storage
            .find(&crate::structs::point::GridPoint::from_level_index(&[1], &[1]))
            .unwrap();
        assert!((alpha[root] - 0.5).abs() < 1e-12);
        // x=0.25 lies on the line between the boundary and the root.
        let left = storage
            .find(&crate::structs::point::GridPoint::from_level_index(&[2], &[1]))
            .unwrap();
        assert!(alpha[left].abs() < 1e-12);
        // x=0.75: the boundary-free basis is 0 at x=1, leaving a surplus.
        let right = storage
            .find(&crate::structs::point::GridPoint::from_level_index(&[2], &[3]))
            .unwrap();
        assert!((alpha[right] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_points_keep_their_own_sample() {
        // Storage holding both boundary points and the level-1 root.
        use crate::structs::point::GridPoint;
        let mut storage = GridStorage::new(1);
        let left = storage
            .insert(GridPoint::from_level_index(&[0], &[0]))
            .unwrap();
        let right = storage
            .insert(GridPoint::from_level_index(&[0], &[1]))
            .unwrap();
        let center = storage
            .insert(GridPoint::from_level_index(&[1], &[1]))
            .unwrap();

        // f(x) = x: the center lies on the boundary interpolation line.
        let mut alpha = Alpha::zeros(3);
        alpha[left] = 0.0;
        alpha[right] = 1.0;
        alpha[center] = 0.5;
        hierarchize(&storage, &mut alpha).unwrap();

        assert_eq!(alpha[left], 0.0);
        assert_eq!(alpha[right], 1.0);
        assert!(alpha[center].abs() < 1e-12);

        dehierarchize(&storage, &mut alpha).unwrap();
        assert!((alpha[center] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unclosed_storage_leaves_alpha_untouched() {
        // (2,1) without its parent (1,1): hierarchically unclosed.
        use crate::structs::point::GridPoint;
        let mut storage = GridStorage::new(1);
        storage
            .insert(GridPoint::from_level_index(&[2], &[1]))
            .unwrap();

        let mut alpha = Alpha::from_vec(vec![5.0]);
        assert!(matches!(
            hierarchize(&storage, &mut alpha),
            Err(GridError::InvariantViolation(_))
        ));
        assert_eq!(alpha.to_vec(), vec![5.0]);

        assert!(matches!(
            dehierarchize(&storage, &mut alpha),
            Err(GridError::InvariantViolation(_))
        ));
        assert_eq!(alpha.to_vec(), vec![5.0]);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let storage = create_regular_grid(2, 2).unwrap();
        let mut alpha = Alpha::zeros(storage.size() + 1);
        assert!(matches!(
            hierarchize(&storage, &mut alpha),
            Err(GridError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_round_trip_2d() {
        let storage = create_regular_grid(2, 3).unwrap();
        let nodal: Vec<f64> = storage
            .points()
            .iter()
            .map(|p| {
                let (x0, x1) = (p.coord(0), p.coord(1));
                (7.3 * x0 - 1.9 * x1) * x1 + x0.sin()
            })
            .collect();
        let mut alpha = Alpha::from_vec(nodal.clone());
        hierarchize(&storage, &mut alpha).unwrap();
        dehierarchize(&storage, &mut alpha).unwrap();
        for (i, &f) in nodal.iter().enumerate() {
            assert!((alpha[i] - f).abs() < 1e-12);
        }
    }
}
