use crate::{errors::SGError, storage::{GridPoint, SparseGridData}};
use super::{check_empty, check_level, commit, has_no_dimensions, insert_first_dimension, log_generated, recursive::{boundary_pair, refine}};

///
/// Generate a regular sparse grid iteratively with truncated boundaries.
/// Boundary subspaces are only kept while
/// `|l|_1 <= n + dim - boundary_level - (number of zero levels)`.
///
fn regular_boundary_truncated_iterative(storage: &mut SparseGridData, n: u32, boundary_level: u32) -> Result<(), SGError>
{
    let dim = storage.num_inputs();
    let mut point = GridPoint::placeholder(dim);
    point.push_with_leaf(0, 0, 0, false);
    storage.insert_point(point.clone());
    point.push_with_leaf(0, 0, 1, false);
    storage.insert_point(point.clone());
    insert_first_dimension(storage, &mut point, n);

    for d in 1..dim
    {
        let grid_size = storage.len();
        // dimension of the points once d has been set
        let cur_dim = d as u32 + 1;
        for g in 0..grid_size
        {
            let mut point = storage.point(g);
            let level_sum: u32 = point.level[..d].iter().map(|&l| l as u32).sum();
            let zero_levels = point.level[..d].iter().filter(|&&l| l == 0).count() as u32;
            let mut first = true;

            // the new boundary points add one more zero level in d
            if level_sum + boundary_level + zero_levels + 1 <= n + cur_dim || zero_levels == cur_dim - 1
            {
                point.push_with_leaf(d, 0, 0, false);
                storage.update(point.clone(), g)?;
                point.push_with_leaf(d, 0, 1, false);
                storage.insert_point(point.clone());
                first = false;
            }

            let upper_bound = if zero_levels > 0
            {
                if n + cur_dim < boundary_level + zero_levels
                {
                    continue;
                }
                n + cur_dim - zero_levels - boundary_level
            }
            else
            {
                n + cur_dim - 1
            };
            let level_max = point.level_max() as u32;
            let mut l = 1;
            while l + level_sum <= upper_bound && l.max(level_max) <= n
            {
                let is_leaf = l + level_sum == n + dim as u32 - 1 && zero_levels == 0;
                for i in (1..(1u32 << l)).step_by(2)
                {
                    point.push_with_leaf(d, l as u8, i, is_leaf);
                    commit(storage, &point, g, &mut first)?;
                }
                l += 1;
            }
        }
    }
    Ok(())
}

///
/// Classic boundary grid: all points with `|l|_1 <= level` where the level 0
/// boundary functions count as level 0.
///
fn boundaries_recursive(storage: &mut SparseGridData, point: &GridPoint, current_dim: usize, current_level: u32, level: u32)
{
    if current_level <= level
    {
        let is_leaf = current_level == level;
        for mut target in boundary_pair(point, current_dim)
        {
            target.set_is_leaf(is_leaf);
            if current_dim == 0
            {
                storage.insert_point(target);
            }
            else
            {
                boundaries_recursive(storage, &target, current_dim - 1, current_level, level);
            }
        }
    }
    if current_level < level
    {
        for child in refine(point, current_dim)
        {
            boundaries_recursive(storage, &child, current_dim, current_level + 1, level);
        }
    }
}

///
/// Generates a regular sparse grid of level `level`, with boundaries.
/// `boundary_level` (default 1) is the level at which boundary points are
/// introduced; 0 gives the classic boundary grid where level 0 counts
/// towards the level sum like any other level.
///
pub fn regular_with_boundaries(storage: &mut SparseGridData, level: usize, boundary_level: Option<usize>) -> Result<(), SGError>
{
    check_empty(storage)?;
    let n = check_level(level)?;
    let boundary_level = check_level(boundary_level.unwrap_or(1))?;
    if has_no_dimensions(storage, "regular_with_boundaries")
    {
        return Ok(());
    }
    if boundary_level >= 1
    {
        regular_boundary_truncated_iterative(storage, n, boundary_level)?;
    }
    else
    {
        let dim = storage.num_inputs();
        boundaries_recursive(storage, &GridPoint::zero_index(dim), dim - 1, 0, n);
    }
    storage.has_boundary = true;
    log_generated(storage, "regular_with_boundaries", level);
    Ok(())
}

#[test]
fn test_truncated_boundaries_1d()
{
    let mut storage = SparseGridData::new(1);
    regular_with_boundaries(&mut storage, 2, Some(1)).expect("Could not generate grid");
    assert_eq!(storage.len(), 5);

    let mut storage2 = SparseGridData::new(1);
    regular_with_boundaries(&mut storage2, 1, None).expect("Could not generate grid");
    let mut nodes: Vec<GridPoint> = storage2.nodes().collect();
    nodes.sort();
    assert_eq!(nodes, vec![
        GridPoint::new(&[0], &[0], false),
        GridPoint::new(&[0], &[1], false),
        GridPoint::new(&[1], &[1], false),
    ]);
    assert!(storage2.has_boundary());
}

#[test]
fn test_truncated_boundaries_2d()
{
    let mut storage = SparseGridData::new(2);
    regular_with_boundaries(&mut storage, 2, Some(1)).expect("Could not generate grid");
    assert_eq!(storage.len(), 21);
    let mut storage2 = SparseGridData::new(2);
    regular_with_boundaries(&mut storage2, 3, Some(1)).expect("Could not generate grid");
    assert_eq!(storage2.len(), 49);
    assert!(storage2.contains(&GridPoint::new(&[1, 1], &[1, 1], false)));
    assert!(storage2.contains(&GridPoint::new(&[1, 2], &[1, 1], false)));
    assert!(storage2.contains(&GridPoint::new(&[2, 2], &[3, 1], false)));
    assert!(!storage2.contains(&GridPoint::new(&[3, 2], &[5, 1], false)));
    assert!(storage2.contains(&GridPoint::new(&[3, 1], &[5, 1], false)));
    assert!(storage2.contains(&GridPoint::new(&[3, 0], &[5, 0], false)));
    assert!(storage2.contains(&GridPoint::new(&[0, 0], &[0, 0], false)));
    for point in storage2.nodes()
    {
        assert_eq!(point.is_leaf(), point.is_inner_point() && point.level_sum() == 4);
    }
}

#[test]
fn test_boundary_leaves_have_no_children()
{
    for (dim, n, b) in [(2, 3, 1), (2, 3, 2), (3, 3, 1), (2, 4, 1)]
    {
        let mut storage = SparseGridData::new(dim);
        regular_with_boundaries(&mut storage, n, Some(b)).expect("Could not generate grid");
        super::assert_inner_leaves_not_refinable(&storage);
    }
}

#[test]
fn test_boundary_level_thins_boundary()
{
    let counts: Vec<usize> = (1..=3).map(|b|
    {
        let mut storage = SparseGridData::new(2);
        regular_with_boundaries(&mut storage, 3, Some(b)).expect("Could not generate grid");
        storage.len()
    }).collect();
    assert!(counts[1] < counts[0]);
    assert!(counts[2] < counts[1]);
}

#[test]
fn test_corners_present()
{
    for dim in 2..=3
    {
        for n in 1..=3
        {
            for b in 1..=3
            {
                let mut storage = SparseGridData::new(dim);
                regular_with_boundaries(&mut storage, n, Some(b)).expect("Could not generate grid");
                for corner in 0..(1u32 << dim)
                {
                    let index: Vec<u32> = (0..dim).map(|d| (corner >> d) & 1).collect();
                    assert!(storage.contains(&GridPoint::new(&vec![0; dim], &index, false)));
                }
                let interior = GridPoint::new(&vec![1; dim], &vec![1; dim], false);
                assert!(storage.contains(&interior));
            }
        }
    }
}

#[test]
fn test_classic_boundaries()
{
    let mut storage = SparseGridData::new(2);
    regular_with_boundaries(&mut storage, 1, Some(0)).expect("Could not generate grid");
    assert_eq!(storage.len(), 8);
    assert!(!storage.contains(&GridPoint::new(&[1, 1], &[1, 1], false)));

    let mut storage2 = SparseGridData::new(2);
    regular_with_boundaries(&mut storage2, 2, Some(0)).expect("Could not generate grid");
    assert_eq!(storage2.len(), 17);
    for point in storage2.nodes()
    {
        assert!(point.level_sum() <= 2);
        assert_eq!(point.is_leaf(), point.level_sum() == 2);
    }
}
