use crate::{errors::SGError, storage::{GridPoint, SparseGridData}};
use super::{check_empty, check_level, has_no_dimensions, log_generated};

///
/// Children of `point` in `dim`. The level 0 boundary pair has the single
/// child (1, 1), every other node has the two hierarchical children.
/// The leaf flag is carried over.
///
pub(crate) fn refine(point: &GridPoint, dim: usize) -> Vec<GridPoint>
{
    let (level, index) = point.get(dim);
    if level == 0
    {
        vec![point.with(dim, 1, 1)]
    }
    else
    {
        vec![point.with(dim, level + 1, 2 * index - 1), point.with(dim, level + 1, 2 * index + 1)]
    }
}

///
/// Points the recursion continues with in `dim`: both boundary points for a
/// level 0 node, otherwise the point itself.
///
pub(crate) fn boundary_pair(point: &GridPoint, dim: usize) -> Vec<GridPoint>
{
    if point.get(dim).0 == 0
    {
        vec![point.with(dim, 0, 0), point.with(dim, 0, 1)]
    }
    else
    {
        vec![point.clone()]
    }
}

struct SquareRootLevels
{
    level: u32,
    small_level: u32,
    leaf_level_sum: u32,
}

///
/// Once any dimension exceeds `small_level` (the tail), all further
/// dimensions are capped at `small_level`.
///
fn square_root_recursive(storage: &mut SparseGridData, point: &GridPoint, current_dim: usize, levels: &SquareRootLevels, tail: bool, sum: u32)
{
    let source_level = point.get(current_dim).0 as u32;
    let new_tail = tail || source_level > levels.small_level;
    if source_level == 0
    {
        for mut target in boundary_pair(point, current_dim)
        {
            if current_dim == 0
            {
                target.set_is_leaf(false);
                storage.insert_point(target);
            }
            else
            {
                square_root_recursive(storage, &target, current_dim - 1, levels, new_tail, sum);
            }
        }
    }
    else if current_dim == 0
    {
        let mut target = point.clone();
        target.set_is_leaf(sum == levels.leaf_level_sum);
        storage.insert_point(target);
    }
    else
    {
        square_root_recursive(storage, point, current_dim - 1, levels, new_tail, sum);
    }

    if source_level < levels.small_level || (!tail && source_level < levels.level)
    {
        for child in refine(point, current_dim)
        {
            square_root_recursive(storage, &child, current_dim, levels, tail, sum + 1);
        }
    }
}

///
/// Generates a square root grid of level `level`, with boundaries: one
/// dimension may reach `level`, all others are limited to `level / 2`.
///
pub fn square_root(storage: &mut SparseGridData, level: usize) -> Result<(), SGError>
{
    check_empty(storage)?;
    let n = check_level(level)?;
    if has_no_dimensions(storage, "square_root")
    {
        return Ok(());
    }
    let dim = storage.num_inputs();
    let small_level = n / 2;
    let levels = SquareRootLevels { level: n, small_level, leaf_level_sum: small_level * (dim as u32 - 1) + n };
    square_root_recursive(storage, &GridPoint::zero_index(dim), dim - 1, &levels, false, 0);
    storage.has_boundary = true;
    log_generated(storage, "square_root", level);
    Ok(())
}

///
/// `current_level` starts at `dim * min_level` and only grows once a
/// dimension has reached `min_level`, so levels below `min_level` are free.
///
fn truncated_recursive(storage: &mut SparseGridData, point: &GridPoint, current_dim: usize, current_level: u32, level: u32, min_level: u32)
{
    let source_level = point.get(current_dim).0 as u32;
    if current_level <= level
    {
        let mut is_leaf = point.is_leaf() && source_level >= min_level;
        if current_dim == 0 && current_level < level
        {
            is_leaf = false;
        }
        for mut target in boundary_pair(point, current_dim)
        {
            target.set_is_leaf(is_leaf);
            if current_dim == 0
            {
                storage.insert_point(target);
            }
            else
            {
                truncated_recursive(storage, &target, current_dim - 1, current_level, level, min_level);
            }
        }
    }

    let next_level = if source_level < min_level
    {
        current_level
    }
    else if current_level < level
    {
        current_level + 1
    }
    else
    {
        return;
    };
    for child in refine(point, current_dim)
    {
        truncated_recursive(storage, &child, current_dim, next_level, level, min_level);
    }
}

///
/// Generates a truncated grid with boundaries containing all points with
/// `sum(max(0, l_i - k)) <= level - k`: levels below `k` are free in every
/// dimension.
///
pub fn truncated(storage: &mut SparseGridData, level: usize, k: usize) -> Result<(), SGError>
{
    check_empty(storage)?;
    let n = check_level(level)?;
    let k = check_level(k)?;
    if has_no_dimensions(storage, "truncated")
    {
        return Ok(());
    }
    let dim = storage.num_inputs();
    let mut point = GridPoint::zero_index(dim);
    point.set_is_leaf(true);
    truncated_recursive(storage, &point, dim - 1, dim as u32 * k, n + k * (dim as u32 - 1), k);
    storage.has_boundary = true;
    log_generated(storage, "truncated", level);
    Ok(())
}

#[cfg(test)]
fn sorted_nodes(storage: &SparseGridData) -> Vec<GridPoint>
{
    let mut nodes: Vec<GridPoint> = storage.nodes().collect();
    nodes.sort();
    nodes
}

#[test]
fn test_refine()
{
    let boundary = GridPoint::new(&[0, 2], &[0, 3], true);
    let children = refine(&boundary, 0);
    assert_eq!(children, vec![GridPoint::new(&[1, 2], &[1, 3], false)]);
    assert!(children[0].is_leaf());
    let children = refine(&boundary, 1);
    assert_eq!(children, vec![GridPoint::new(&[0, 3], &[0, 5], false), GridPoint::new(&[0, 3], &[0, 7], false)]);
}

#[test]
fn test_square_root()
{
    let mut storage = SparseGridData::new(2);
    square_root(&mut storage, 2).expect("Could not generate grid");
    assert_eq!(storage.len(), 21);
    assert!(storage.has_boundary());
    assert!(storage.contains(&GridPoint::new(&[2, 1], &[3, 1], false)));
    assert!(!storage.contains(&GridPoint::new(&[2, 2], &[1, 1], false)));
    for point in storage.nodes()
    {
        assert_eq!(point.is_leaf(), point.level_sum() == 3);
    }
}

#[test]
fn test_square_root_single_tail()
{
    let level = 4u8;
    let mut storage = SparseGridData::new(3);
    square_root(&mut storage, level as usize).expect("Could not generate grid");
    for point in storage.nodes()
    {
        let tails = point.level.iter().filter(|&&l| l > level / 2).count();
        assert!(tails <= 1);
        assert!(point.level_max() <= level);
    }
    assert!(storage.contains(&GridPoint::new(&[2, 4, 2], &[1, 1, 3], false)));
}

#[test]
fn test_truncated_matches_classic_boundaries()
{
    for dim in 1..=3
    {
        let mut storage = SparseGridData::new(dim);
        truncated(&mut storage, 3, 0).expect("Could not generate grid");
        let mut reference = SparseGridData::new(dim);
        super::regular_with_boundaries(&mut reference, 3, Some(0)).expect("Could not generate grid");
        assert_eq!(sorted_nodes(&storage), sorted_nodes(&reference));
        for point in reference.nodes()
        {
            let seq = storage.index_of(&point).expect("Point missing from truncated grid");
            assert_eq!(storage.is_leaf(seq), point.is_leaf());
        }
    }
}

#[test]
fn test_truncated_matches_truncated_boundaries()
{
    let mut storage = SparseGridData::new(2);
    truncated(&mut storage, 2, 1).expect("Could not generate grid");
    assert_eq!(storage.len(), 21);
    let mut reference = SparseGridData::new(2);
    super::regular_with_boundaries(&mut reference, 2, Some(1)).expect("Could not generate grid");
    assert_eq!(sorted_nodes(&storage), sorted_nodes(&reference));
}

#[test]
fn test_truncated_free_levels()
{
    let (level, k) = (3u8, 2u8);
    let mut storage = SparseGridData::new(3);
    truncated(&mut storage, level as usize, k as usize).expect("Could not generate grid");
    for point in storage.nodes()
    {
        let excess: u8 = point.level.iter().map(|&l| l.saturating_sub(k)).sum();
        assert!(excess <= level - k);
        if point.level.iter().any(|&l| l < k)
        {
            assert!(!point.is_leaf());
        }
    }
    // all levels below k are present in every combination
    assert!(storage.contains(&GridPoint::new(&[2, 2, 2], &[3, 1, 3], false)));
    assert!(storage.contains(&GridPoint::new(&[3, 2, 0], &[7, 1, 1], false)));
    assert!(!storage.contains(&GridPoint::new(&[3, 3, 0], &[1, 1, 1], false)));
}
