use rustc_hash::FxHashSet;

use crate::{errors::SGError, storage::{GridPoint, SparseGridData}};
use super::{check_empty, check_level, commit, has_no_dimensions, insert_first_dimension, log_generated};

///
/// Allowed interaction patterns for `regular_inter`. Each term is stored as
/// one activity vector over all dimensions (`true` = the dimension
/// participates in the interaction).
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionTerms
{
    terms: FxHashSet<Vec<bool>>,
}

impl InteractionTerms
{
    ///
    /// Builds the activity vectors from sets of dimension indices, e.g.
    /// `[[], [0], [0, 1]]` allows the centre point, points that only vary in
    /// dimension 0 and points that vary in dimensions 0 and 1 together.
    ///
    pub fn new(num_inputs: usize, terms: &[Vec<usize>]) -> Result<Self, SGError>
    {
        let mut set = FxHashSet::default();
        for interaction in terms
        {
            let mut term = vec![false; num_inputs];
            for &dim in interaction
            {
                *term.get_mut(dim).ok_or(SGError::InvalidDimension)? = true;
            }
            set.insert(term);
        }
        Ok(Self { terms: set })
    }

    #[inline]
    pub fn contains(&self, active: &[bool]) -> bool
    {
        self.terms.contains(active)
    }

    pub fn len(&self) -> usize
    {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.terms.is_empty()
    }
}

///
/// Decodes which dimensions of `point` are active: a dimension sitting at
/// the domain centre (coordinate 0.5) does not take part in the interaction.
///
fn active_dimensions(point: &GridPoint) -> Vec<bool>
{
    point.unit_coordinate().iter().map(|&x| x != 0.5).collect()
}

#[derive(Copy, Clone)]
enum Restriction<'a>
{
    None,
    Interactions(&'a InteractionTerms),
    Cliques(usize),
}

///
/// T-weighted level-sum budget of the regular schemes:
/// `(l + level_sum) - T * max(l, level_max) <= (n + dim - 1) - T * n`
/// together with `max(l, level_max) <= n`.
///
#[inline]
fn admissible(l: u32, level_sum: u32, level_max: u32, budget: f64, n: u32, t: f64) -> bool
{
    (l + level_sum) as f64 - (t * l.max(level_max) as f64) <= budget && l.max(level_max) <= n
}

///
/// Generate a regular sparse grid iteratively without grid points on the boundary.
///
fn regular_generator_iterative(storage: &mut SparseGridData, n: u32, t: f64, restriction: Restriction<'_>) -> Result<(), SGError>
{
    let dim = storage.num_inputs();
    let leaf_level_sum = n + dim as u32 - 1;
    let budget = leaf_level_sum as f64 - t * n as f64;
    let mut point = GridPoint::placeholder(dim);
    insert_first_dimension(storage, &mut point, n);

    // Generate grid points in all other dimensions:
    // loop dim times over intermediate grid, take all grid points and
    // modify them in current dimension d
    for d in 1..dim
    {
        // points added while extending d must not be revisited for d
        let grid_size = storage.len();
        let clique_end = match restriction
        {
            Restriction::Cliques(clique_size) => (clique_size * (d / clique_size)).min(d),
            _ => 0,
        };
        for g in 0..grid_size
        {
            let mut point = storage.point(g);
            // points of earlier cliques may only interact at level 1
            if point.level[..clique_end].iter().any(|&l| l > 1)
            {
                continue;
            }
            let level_sum = point.level_sum() - 1;
            let level_max = point.level_max() as u32;
            let mut first = true;
            let mut l = 1;
            while admissible(l, level_sum, level_max, budget, n, t)
            {
                let is_leaf = l + level_sum == leaf_level_sum;
                for i in (1..(1u32 << l)).step_by(2)
                {
                    point.push_with_leaf(d, l as u8, i, is_leaf);
                    if let Restriction::Interactions(terms) = restriction
                    {
                        if !terms.contains(&active_dimensions(&point))
                        {
                            continue;
                        }
                    }
                    commit(storage, &point, g, &mut first)?;
                }
                l += 1;
            }
        }
    }
    Ok(())
}

///
/// Generates a regular sparse grid of level `level`, without boundaries.
/// For details about T, See pages 8-9 of Griebel and Knapek's "Optimized
/// Tensor-Product Approximation Spaces". T defaults to zero (standard sparse grid).
///
#[allow(non_snake_case)]
pub fn regular(storage: &mut SparseGridData, level: usize, T: Option<f64>) -> Result<(), SGError>
{
    check_empty(storage)?;
    let n = check_level(level)?;
    if has_no_dimensions(storage, "regular")
    {
        return Ok(());
    }
    regular_generator_iterative(storage, n, T.unwrap_or(0.0), Restriction::None)?;
    log_generated(storage, "regular", level);
    Ok(())
}

///
/// Generates a regular sparse grid that only keeps points whose active
/// dimensions form one of the interaction `terms`. For example, including
/// `vec![0, 1]` keeps the points modelling an interaction between the first
/// and the second dimension. The empty term keeps the centre point.
///
#[allow(non_snake_case)]
pub fn regular_inter(storage: &mut SparseGridData, level: usize, terms: &[Vec<usize>], T: Option<f64>) -> Result<(), SGError>
{
    check_empty(storage)?;
    let n = check_level(level)?;
    let terms = InteractionTerms::new(storage.num_inputs(), terms)?;
    if has_no_dimensions(storage, "regular_inter")
    {
        return Ok(());
    }
    regular_generator_iterative(storage, n, T.unwrap_or(0.0), Restriction::Interactions(&terms))?;
    log_generated(storage, "regular_inter", level);
    Ok(())
}

///
/// Generates a regular sparse grid where dimensions are split into groups of
/// `clique_size`. Dimensions inside a group interact freely, a point may only
/// be extended into a later group while all dimensions of the earlier groups
/// are at level 1.
///
#[allow(non_snake_case)]
pub fn cliques(storage: &mut SparseGridData, level: usize, clique_size: usize, T: Option<f64>) -> Result<(), SGError>
{
    check_empty(storage)?;
    if clique_size > storage.num_inputs()
    {
        return Err(SGError::CliqueSizeTooLarge);
    }
    if clique_size == 0
    {
        return Err(SGError::InvalidCliqueSize);
    }
    let n = check_level(level)?;
    if has_no_dimensions(storage, "cliques")
    {
        return Ok(());
    }
    regular_generator_iterative(storage, n, T.unwrap_or(0.0), Restriction::Cliques(clique_size))?;
    log_generated(storage, "cliques", level);
    Ok(())
}

///
/// Generate a regular sparse grid iteratively with periodic boundary. Each
/// dimension carries a single level 0 point, which counts as level 1 in the
/// level sum.
///
fn regular_periodic_boundary_iter(storage: &mut SparseGridData, n: u32, t: f64) -> Result<(), SGError>
{
    let dim = storage.num_inputs();
    let leaf_level_sum = n + dim as u32 - 1;
    let budget = leaf_level_sum as f64 - t * n as f64;
    let mut point = GridPoint::placeholder(dim);
    point.push_with_leaf(0, 0, 0, false);
    storage.insert_point(point.clone());
    insert_first_dimension(storage, &mut point, n);

    for d in 1..dim
    {
        let grid_size = storage.len();
        for g in 0..grid_size
        {
            let mut point = storage.point(g);
            let zero_levels = point.level[..d].iter().filter(|&&l| l == 0).count() as u32;
            let level_sum = point.level_sum() - 1 + zero_levels;
            let level_max = point.level_max() as u32;
            let mut first = true;
            let mut l = 1;
            while admissible(l, level_sum, level_max, budget, n, t)
            {
                if l == 1
                {
                    point.push_with_leaf(d, 0, 0, false);
                    storage.insert_point(point.clone());
                }
                let is_leaf = l + level_sum == leaf_level_sum;
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
/// Generates a regular sparse grid of level `level` with periodic
/// boundaries. Level 0 is not supported.
///
#[allow(non_snake_case)]
pub fn regular_with_periodic_boundaries(storage: &mut SparseGridData, level: usize, T: Option<f64>) -> Result<(), SGError>
{
    check_empty(storage)?;
    if level == 0
    {
        return Err(SGError::UnsupportedLevel);
    }
    let n = check_level(level)?;
    if has_no_dimensions(storage, "regular_with_periodic_boundaries")
    {
        return Ok(());
    }
    regular_periodic_boundary_iter(storage, n, T.unwrap_or(0.0))?;
    storage.has_boundary = true;
    log_generated(storage, "regular_with_periodic_boundaries", level);
    Ok(())
}

#[test]
fn test_regular()
{
    let mut storage = SparseGridData::new(2);
    regular(&mut storage, 3, Some(0.0)).expect("Could not generate grid");
    assert_eq!(storage.len(), 17);
}

#[test]
fn test_regular_1d_hierarchy()
{
    for n in 1..=6
    {
        let mut storage = SparseGridData::new(1);
        regular(&mut storage, n, None).expect("Could not generate grid");
        assert_eq!(storage.len(), (1 << n) - 1);
        for l in 1..=n as u8
        {
            let mut indices: Vec<u32> = storage.nodes().filter(|p| p.level[0] == l).map(|p| p.index[0]).collect();
            indices.sort();
            let expected: Vec<u32> = (1..(1u32 << l)).step_by(2).collect();
            assert_eq!(indices, expected);
        }
    }
}

#[test]
fn test_regular_leaves_have_no_children()
{
    let (dim, n) = (2, 3);
    let mut storage = SparseGridData::new(dim);
    regular(&mut storage, n, None).expect("Could not generate grid");
    super::assert_inner_leaves_not_refinable(&storage);
    for seq in 0..storage.len()
    {
        let point = storage.point(seq);
        assert_eq!(point.is_leaf(), point.level_sum() == (n + dim - 1) as u32);
        assert_eq!(storage.is_leaf(seq), point.is_leaf());
    }
}

#[test]
fn test_regular_count_decreases_with_t()
{
    let counts: Vec<usize> = [0.0, 0.25, 0.5, 0.75, 1.0].iter().map(|&t|
    {
        let mut storage = SparseGridData::new(3);
        regular(&mut storage, 5, Some(t)).expect("Could not generate grid");
        storage.len()
    }).collect();
    assert!(counts.windows(2).all(|w| w[1] <= w[0]));
    assert!(counts[4] < counts[0]);
}

#[test]
fn test_regular_inter_additive()
{
    let mut storage = SparseGridData::new(2);
    regular_inter(&mut storage, 3, &[vec![], vec![0], vec![1]], None).expect("Could not generate grid");
    // one 1D hierarchy per axis, sharing the centre point
    assert_eq!(storage.len(), 13);
    for point in storage.nodes()
    {
        assert!(point.get(0) == (1, 1) || point.get(1) == (1, 1));
    }

    let mut storage2 = SparseGridData::new(2);
    regular_inter(&mut storage2, 3, &[vec![], vec![0], vec![1], vec![0, 1]], None).expect("Could not generate grid");
    assert_eq!(storage2.len(), 17);
}

#[test]
fn test_regular_inter_invalid_term()
{
    let mut storage = SparseGridData::new(2);
    assert_eq!(regular_inter(&mut storage, 3, &[vec![2]], None), Err(SGError::InvalidDimension));
}

#[test]
fn test_interaction_terms_normalized()
{
    let terms = InteractionTerms::new(3, &[vec![0, 2], vec![2, 0], vec![]]).unwrap();
    assert_eq!(terms.len(), 2);
    assert!(!terms.is_empty());
    assert!(InteractionTerms::new(3, &[]).unwrap().is_empty());
    assert!(terms.contains(&[true, false, true]));
    assert!(terms.contains(&[false, false, false]));
    assert!(!terms.contains(&[true, false, false]));
}

#[test]
fn test_cliques_full_size_matches_regular()
{
    for dim in 1..=4
    {
        let mut storage = SparseGridData::new(dim);
        cliques(&mut storage, 4, dim, None).expect("Could not generate grid");
        let mut reference = SparseGridData::new(dim);
        regular(&mut reference, 4, None).expect("Could not generate grid");
        assert_eq!(storage.len(), reference.len());
    }
}

#[test]
fn test_cliques_restrict_cross_interaction()
{
    let mut storage = SparseGridData::new(4);
    cliques(&mut storage, 3, 2, None).expect("Could not generate grid");
    let mut reference = SparseGridData::new(4);
    regular(&mut reference, 3, None).expect("Could not generate grid");
    assert!(storage.len() < reference.len());
    for point in storage.nodes()
    {
        let second_clique_refined = point.level[2..].iter().any(|&l| l > 1);
        if second_clique_refined
        {
            assert!(point.level[..2].iter().all(|&l| l == 1));
        }
    }
}

#[test]
fn test_cliques_invalid_size()
{
    let mut storage = SparseGridData::new(2);
    assert_eq!(cliques(&mut storage, 3, 3, None), Err(SGError::CliqueSizeTooLarge));
    assert_eq!(cliques(&mut storage, 3, 0, None), Err(SGError::InvalidCliqueSize));
}

#[test]
fn test_periodic()
{
    let mut storage = SparseGridData::new(1);
    regular_with_periodic_boundaries(&mut storage, 3, None).expect("Could not generate grid");
    assert_eq!(storage.len(), 8);
    assert!(storage.has_boundary());
    assert!(!storage.contains(&GridPoint::new(&[0], &[1], false)));

    let mut storage2 = SparseGridData::new(2);
    regular_with_periodic_boundaries(&mut storage2, 2, None).expect("Could not generate grid");
    assert_eq!(storage2.len(), 12);
    assert!(storage2.contains(&GridPoint::new(&[0, 0], &[0, 0], false)));
    assert!(storage2.contains(&GridPoint::new(&[0, 2], &[0, 3], false)));
    assert!(!storage2.contains(&GridPoint::new(&[2, 2], &[1, 1], false)));
    for point in storage2.nodes()
    {
        let effective: u32 = point.level.iter().map(|&l| (l as u32).max(1)).sum();
        assert!(effective <= 3);
        if point.is_leaf()
        {
            assert_eq!(effective, 3);
        }
        if point.is_inner_point() && effective == 3
        {
            assert!(point.is_leaf());
        }
    }
}

#[test]
fn test_periodic_level_zero()
{
    let mut storage = SparseGridData::new(2);
    assert_eq!(regular_with_periodic_boundaries(&mut storage, 0, None), Err(SGError::UnsupportedLevel));
}
