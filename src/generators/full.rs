use crate::{errors::SGError, storage::{GridPoint, SparseGridData}};
use super::{check_empty, check_level, commit, has_no_dimensions, log_generated};

///
/// Full tensor product of the interior 1D hierarchies, `levels[d]` giving the
/// finest level in dimension d. Leaves are the points at the finest level in
/// every dimension.
///
fn full_grid_iterative(storage: &mut SparseGridData, levels: &[u32]) -> Result<(), SGError>
{
    let leaf_level_sum: u32 = levels.iter().sum();
    let mut point = GridPoint::placeholder(storage.num_inputs());
    for l in 1..=levels[0]
    {
        for i in (1..(1u32 << l)).step_by(2)
        {
            point.push_with_leaf(0, l as u8, i, l == levels[0]);
            storage.insert_point(point.clone());
        }
    }
    for (d, &n) in levels.iter().enumerate().skip(1)
    {
        let grid_size = storage.len();
        for g in 0..grid_size
        {
            let mut point = storage.point(g);
            let mut first = true;
            for l in 1..=n
            {
                point.push(d, l as u8, 1);
                let is_leaf = point.level_sum() == leaf_level_sum;
                for i in (1..(1u32 << l)).step_by(2)
                {
                    point.push_with_leaf(d, l as u8, i, is_leaf);
                    commit(storage, &point, g, &mut first)?;
                }
            }
        }
    }
    Ok(())
}

///
/// Generates a full grid of level `level` in every dimension, without boundaries.
///
pub fn full(storage: &mut SparseGridData, level: usize) -> Result<(), SGError>
{
    check_empty(storage)?;
    let n = check_level(level)?;
    if has_no_dimensions(storage, "full")
    {
        return Ok(());
    }
    full_grid_iterative(storage, &vec![n; storage.num_inputs()])?;
    log_generated(storage, "full", level);
    Ok(())
}

///
/// Generates a full grid with level `levels[d]` in dimension d, without
/// boundaries. A zero entry makes the tensor product empty, so the grid
/// stays empty. The other dimensions are not kept at (1, 1) in a zero
/// dimension, i.e. `[2, 0]` yields no points rather than the 3 of level 2.
///
pub fn anisotropic_full(storage: &mut SparseGridData, levels: &[usize]) -> Result<(), SGError>
{
    check_empty(storage)?;
    if levels.len() != storage.num_inputs()
    {
        return Err(SGError::LevelVectorMismatch);
    }
    let levels = levels.iter().map(|&l| check_level(l)).collect::<Result<Vec<_>, _>>()?;
    if has_no_dimensions(storage, "anisotropic_full")
    {
        return Ok(());
    }
    if levels.contains(&0)
    {
        log::debug!("anisotropic_full: level vector {levels:?} contains 0, grid is empty");
        return Ok(());
    }
    full_grid_iterative(storage, &levels)?;
    log_generated(storage, "anisotropic_full", *levels.iter().max().unwrap_or(&0) as usize);
    Ok(())
}

///
/// Full grid with both level 0 endpoints in every dimension. The endpoints
/// come with level 1, so level 0 leaves the grid empty.
///
fn full_grid_with_boundaries_iterative(storage: &mut SparseGridData, n: u32) -> Result<(), SGError>
{
    let dim = storage.num_inputs();
    let leaf_level_sum = n * dim as u32;
    let mut point = GridPoint::placeholder(dim);
    for l in 1..=n
    {
        if l == 1
        {
            point.push_with_leaf(0, 0, 0, false);
            storage.insert_point(point.clone());
            point.push_with_leaf(0, 0, 1, false);
            storage.insert_point(point.clone());
        }
        for i in (1..(1u32 << l)).step_by(2)
        {
            point.push_with_leaf(0, l as u8, i, l == n);
            storage.insert_point(point.clone());
        }
    }
    for d in 1..dim
    {
        let grid_size = storage.len();
        for g in 0..grid_size
        {
            let mut point = storage.point(g);
            for l in 1..=n
            {
                if l == 1
                {
                    point.push_with_leaf(d, 0, 0, false);
                    storage.update(point.clone(), g)?;
                    point.push_with_leaf(d, 0, 1, false);
                    storage.insert_point(point.clone());
                }
                point.push(d, l as u8, 1);
                let is_leaf = point.level_sum() == leaf_level_sum;
                for i in (1..(1u32 << l)).step_by(2)
                {
                    point.push_with_leaf(d, l as u8, i, is_leaf);
                    storage.insert_point(point.clone());
                }
            }
        }
    }
    Ok(())
}

///
/// Generates a full grid of level `level`, with boundary grid points.
///
pub fn full_with_boundaries(storage: &mut SparseGridData, level: usize) -> Result<(), SGError>
{
    check_empty(storage)?;
    let n = check_level(level)?;
    if has_no_dimensions(storage, "full_with_boundaries")
    {
        return Ok(());
    }
    full_grid_with_boundaries_iterative(storage, n)?;
    storage.has_boundary = true;
    log_generated(storage, "full_with_boundaries", level);
    Ok(())
}

#[test]
fn test_full()
{
    let mut storage = SparseGridData::new(2);
    full(&mut storage, 2).expect("Could not generate grid");
    assert_eq!(storage.len(), 9);
    assert!(!storage.has_boundary());
    let leaves: Vec<GridPoint> = storage.nodes().filter(|p| p.is_leaf()).collect();
    assert_eq!(leaves.len(), 4);
    assert!(leaves.iter().all(|p| p.level == [2, 2]));

    let mut storage3 = SparseGridData::new(3);
    full(&mut storage3, 3).expect("Could not generate grid");
    assert_eq!(storage3.len(), 7 * 7 * 7);
}

#[test]
fn test_full_level_zero_is_empty()
{
    let mut storage = SparseGridData::new(2);
    full(&mut storage, 0).expect("Could not generate grid");
    assert!(storage.is_empty());
}

#[test]
fn test_anisotropic_full()
{
    let mut storage = SparseGridData::new(3);
    anisotropic_full(&mut storage, &[1, 2, 3]).expect("Could not generate grid");
    assert_eq!(storage.len(), 3 * 7);
    assert!(storage.contains(&GridPoint::new(&[1, 2, 3], &[1, 3, 5], false)));
    assert!(!storage.contains(&GridPoint::new(&[2, 1, 1], &[1, 1, 1], false)));
    for point in storage.nodes()
    {
        assert_eq!(point.is_leaf(), point.level == [1, 2, 3]);
    }
}

#[test]
fn test_anisotropic_full_matches_full()
{
    let mut storage = SparseGridData::new(2);
    anisotropic_full(&mut storage, &[3, 3]).expect("Could not generate grid");
    let mut reference = SparseGridData::new(2);
    full(&mut reference, 3).expect("Could not generate grid");
    assert_eq!(storage.len(), reference.len());
    assert!(reference.nodes().all(|p| storage.contains(&p)));
}

#[test]
fn test_anisotropic_full_invalid_levels()
{
    let mut storage = SparseGridData::new(2);
    assert_eq!(anisotropic_full(&mut storage, &[1, 2, 3]), Err(SGError::LevelVectorMismatch));
    assert_eq!(anisotropic_full(&mut storage, &[1, super::MAX_LEVEL + 1]), Err(SGError::LevelOutOfRange));
    assert_eq!(anisotropic_full(&mut storage, &[2, 0]), Ok(()));
    assert!(storage.is_empty());
}

#[test]
fn test_full_with_boundaries()
{
    let mut storage = SparseGridData::new(2);
    full_with_boundaries(&mut storage, 2).expect("Could not generate grid");
    assert_eq!(storage.len(), 25);
    assert!(storage.has_boundary());
    for (l0, i0) in [(0, 0), (0, 1), (1, 1), (2, 1), (2, 3)]
    {
        for (l1, i1) in [(0, 0), (0, 1), (1, 1), (2, 1), (2, 3)]
        {
            let point = GridPoint::new(&[l0, l1], &[i0, i1], false);
            let seq = storage.index_of(&point).expect("Point missing from full grid");
            assert_eq!(storage.is_leaf(seq), l0 == 2 && l1 == 2);
        }
    }
}

#[test]
fn test_full_with_boundaries_level_zero_is_empty()
{
    for dim in 1..=3
    {
        let mut storage = SparseGridData::new(dim);
        full_with_boundaries(&mut storage, 0).expect("Could not generate grid");
        assert!(storage.is_empty());
    }
    let mut storage = SparseGridData::new(3);
    full_with_boundaries(&mut storage, 1).expect("Could not generate grid");
    assert_eq!(storage.len(), 27);
    assert_eq!(storage.nodes().filter(|p| p.level_max() == 0).count(), 8);
}
