use crate::error::GridError;
use crate::structs::point::{GridPoint, LevelIndex};
use crate::structs::storage::GridStorage;

/// Create the regular boundary-free sparse grid of the given level.
///
/// The grid holds every point whose level vector `l` (with `l_d >= 1`)
/// satisfies `|l|_1 <= level + dim - 1`, with all odd indices per level.
/// For dim 2 and level 3 this yields the familiar 17-point grid.
pub fn create_regular_grid(dim: usize, level: u32) -> Result<GridStorage, GridError> {
    if dim == 0 {
        return Err(GridError::InvariantViolation(
            "a grid needs at least one dimension".to_string(),
        ));
    }
    if level == 0 {
        return Err(GridError::InvariantViolation(
            "a regular grid needs at least level 1".to_string(),
        ));
    }

    let mut storage = GridStorage::new(dim);
    let max_sum = level + dim as u32 - 1;
    for levels in level_vectors(dim, max_sum) {
        insert_subspace(&mut storage, &levels)?;
    }

    tracing::debug!(
        dim,
        level,
        points = storage.size(),
        "created regular sparse grid"
    );
    Ok(storage)
}

/// All level vectors of length `dim` with entries >= 1 and sum <= `max_sum`,
/// in lexicographic order.
fn level_vectors(dim: usize, max_sum: u32) -> Vec<Vec<u32>> {
    let mut result = Vec::new();
    let mut current = vec![1u32; dim];
    collect_level_vectors(dim, max_sum, 0, dim as u32, &mut current, &mut result);
    result
}

fn collect_level_vectors(
    dim: usize,
    max_sum: u32,
    d: usize,
    partial_sum: u32,
    current: &mut Vec<u32>,
    result: &mut Vec<Vec<u32>>,
) {
    if d == dim {
        result.push(current.clone());
        return;
    }
    // partial_sum already counts level 1 for every dimension from d on.
    let headroom = max_sum - partial_sum;
    for l in 1..=(1 + headroom) {
        current[d] = l;
        collect_level_vectors(dim, max_sum, d + 1, partial_sum + l - 1, current, result);
    }
    current[d] = 1;
}

/// Insert every point of the subspace with the given level vector.
fn insert_subspace(storage: &mut GridStorage, levels: &[u32]) -> Result<(), GridError> {
    let dim = levels.len();
    // Odometer over the odd indices of each dimension.
    let mut indices = vec![1u32; dim];
    loop {
        let point = GridPoint::new(
            levels
                .iter()
                .zip(indices.iter())
                .map(|(&l, &i)| LevelIndex::new(l, i))
                .collect(),
        );
        storage.insert(point)?;

        let mut d = 0;
        loop {
            if d == dim {
                return Ok(());
            }
            indices[d] += 2;
            if indices[d] < (1 << levels[d]) {
                break;
            }
            indices[d] = 1;
            d += 1;
        }
    }
}

/// Insert `point` together with every missing hierarchical ancestor.
///
/// Works iteratively over an explicit stack so the depth of the grid never
/// translates into call-stack depth. Points already present are left alone;
/// the ids of all newly created points are returned in insertion order.
pub fn insert_with_ancestors(
    storage: &mut GridStorage,
    point: GridPoint,
) -> Result<Vec<usize>, GridError> {
    let mut created = Vec::new();
    let mut stack = vec![point];
    while let Some(p) = stack.pop() {
        if storage.contains(&p) {
            continue;
        }
        let mut missing_parent = None;
        for d in 0..storage.dim() {
            if let Some(parent) = p.parent(d) {
                if !storage.contains(&parent) {
                    missing_parent = Some(parent);
                    break;
                }
            }
        }
        match missing_parent {
            Some(parent) => {
                // Revisit the point once its parent chain exists.
                stack.push(p);
                stack.push(parent);
            }
            None => created.push(storage.insert(p)?),
        }
    }
    Ok(created)
}
