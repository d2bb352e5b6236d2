//!
//! Generation of the initial point set of a sparse grid. Every scheme
//! requires an empty storage and fills it in place.
//!
//! The iterative schemes (`regular`, `regular_inter`, `cliques`, the
//! periodic and truncated-boundary grids and the full grids) build the
//! one dimensional hierarchy in the first dimension and then extend every
//! existing point dimension by dimension. The recursive schemes (classic
//! boundary grid, square root and truncated grids) walk the hierarchy
//! dimension-major.
//!
pub mod boundary;
pub mod full;
pub mod recursive;
pub mod regular;

pub use boundary::*;
pub use full::*;
pub use recursive::*;
pub use regular::*;

use crate::{errors::SGError, storage::{GridPoint, SparseGridData}};

/// Largest level accepted by the generators (indices are stored as `u32`).
pub const MAX_LEVEL: usize = 31;

pub trait Generator : Default
{
    ///
    /// Generates a regular sparse grid of level `level`, without boundaries.
    /// For details about T, See pages 8-9 of Griebel and Knapek's "Optimized
    /// Tensor-Product Approximation Spaces".
    ///
    #[allow(non_snake_case)]
    fn regular(&self, storage: &mut SparseGridData, level: usize, T: Option<f64>) -> Result<(), SGError>;
    ///
    /// Generates a regular sparse grid that only contains the interactions
    /// between dimensions listed in `terms`.
    ///
    #[allow(non_snake_case)]
    fn regular_inter(&self, storage: &mut SparseGridData, level: usize, terms: &[Vec<usize>], T: Option<f64>) -> Result<(), SGError>;
    ///
    /// Generates a regular sparse grid of level `level`, without boundaries
    /// where dimensions are splitted into a groups with only certain number
    /// of dimensions completely connected in a clique.
    ///
    #[allow(non_snake_case)]
    fn cliques(&self, storage: &mut SparseGridData, level: usize, clique_size: usize, T: Option<f64>) -> Result<(), SGError>;
    ///
    /// Generates a full grid of 2^@level tensors, without boundaries
    ///
    fn full(&self, storage: &mut SparseGridData, level: usize) -> Result<(), SGError>;
    ///
    /// Generates a full grid with a separate level per dimension, without boundaries.
    ///
    fn anisotropic_full(&self, storage: &mut SparseGridData, levels: &[usize]) -> Result<(), SGError>;
    ///
    /// Generates a full grid of level @level, with boundary grid points.
    ///
    fn full_with_boundaries(&self, storage: &mut SparseGridData, level: usize) -> Result<(), SGError>;
    ///
    /// Generates a regular sparse grid of level `level`, with boundaries.
    /// `boundary_level` defaults to 1.
    ///
    fn regular_with_boundaries(&self, storage: &mut SparseGridData, level: usize, boundary_level: Option<usize>) -> Result<(), SGError>;
    ///
    /// Generates a regular sparse grid of level `level` with periodic boundaries.
    ///
    #[allow(non_snake_case)]
    fn regular_with_periodic_boundaries(&self, storage: &mut SparseGridData, level: usize, T: Option<f64>) -> Result<(), SGError>;
    ///
    /// Generates a square root grid of level `level`, with boundaries.
    ///
    fn square_root(&self, storage: &mut SparseGridData, level: usize) -> Result<(), SGError>;
    ///
    /// Generates a truncated grid with boundaries: all levels below `k` are
    /// free, the remaining levels share a budget of `level - k`.
    ///
    fn truncated(&self, storage: &mut SparseGridData, level: usize, k: usize) -> Result<(), SGError>;
}

///
/// Stateless generator that drives the hash map backed `SparseGridData`.
///
#[derive(Copy, Clone, Debug, Default)]
pub struct HashGenerator;

#[allow(non_snake_case)]
impl Generator for HashGenerator
{
    fn regular(&self, storage: &mut SparseGridData, level: usize, T: Option<f64>) -> Result<(), SGError> {
        regular(storage, level, T)
    }

    fn regular_inter(&self, storage: &mut SparseGridData, level: usize, terms: &[Vec<usize>], T: Option<f64>) -> Result<(), SGError> {
        regular_inter(storage, level, terms, T)
    }

    fn cliques(&self, storage: &mut SparseGridData, level: usize, clique_size: usize, T: Option<f64>) -> Result<(), SGError> {
        cliques(storage, level, clique_size, T)
    }

    fn full(&self, storage: &mut SparseGridData, level: usize) -> Result<(), SGError> {
        full(storage, level)
    }

    fn anisotropic_full(&self, storage: &mut SparseGridData, levels: &[usize]) -> Result<(), SGError> {
        anisotropic_full(storage, levels)
    }

    fn full_with_boundaries(&self, storage: &mut SparseGridData, level: usize) -> Result<(), SGError> {
        full_with_boundaries(storage, level)
    }

    fn regular_with_boundaries(&self, storage: &mut SparseGridData, level: usize, boundary_level: Option<usize>) -> Result<(), SGError> {
        regular_with_boundaries(storage, level, boundary_level)
    }

    fn regular_with_periodic_boundaries(&self, storage: &mut SparseGridData, level: usize, T: Option<f64>) -> Result<(), SGError> {
        regular_with_periodic_boundaries(storage, level, T)
    }

    fn square_root(&self, storage: &mut SparseGridData, level: usize) -> Result<(), SGError> {
        square_root(storage, level)
    }

    fn truncated(&self, storage: &mut SparseGridData, level: usize, k: usize) -> Result<(), SGError> {
        truncated(storage, level, k)
    }
}

#[inline]
pub(crate) fn check_empty(storage: &SparseGridData) -> Result<(), SGError>
{
    if storage.is_empty() { Ok(()) } else { Err(SGError::StorageNotEmpty) }
}

#[inline]
pub(crate) fn check_level(level: usize) -> Result<u32, SGError>
{
    if level > MAX_LEVEL
    {
        return Err(SGError::LevelOutOfRange);
    }
    Ok(level as u32)
}

///
/// A storage without dimensions has nothing to generate. Returns true (and
/// logs) in that case so that the caller can return early.
///
pub(crate) fn has_no_dimensions(storage: &SparseGridData, scheme: &str) -> bool
{
    if storage.num_inputs() == 0
    {
        log::warn!("{scheme}: storage has no dimensions, nothing generated");
        return true;
    }
    false
}

pub(crate) fn log_generated(storage: &SparseGridData, scheme: &str, level: usize)
{
    log::debug!("{scheme}: generated {} points (dim = {}, level = {level})", storage.len(), storage.num_inputs());
}

///
/// Inserts the interior 1D hierarchy of levels 1..=n into dimension 0 of
/// `point`. Points at level `n` are marked as leaves.
///
pub(crate) fn insert_first_dimension(storage: &mut SparseGridData, point: &mut GridPoint, n: u32)
{
    for l in 1..=n
    {
        for i in (1..(1u32 << l)).step_by(2)
        {
            point.push_with_leaf(0, l as u8, i, l == n);
            storage.insert_point(point.clone());
        }
    }
}

///
/// The first admissible pair of a base point overwrites it in place, all
/// following pairs become new points.
///
#[inline]
pub(crate) fn commit(storage: &mut SparseGridData, point: &GridPoint, seq: usize, first: &mut bool) -> Result<(), SGError>
{
    if *first
    {
        storage.update(point.clone(), seq)?;
        *first = false;
    }
    else
    {
        storage.insert_point(point.clone());
    }
    Ok(())
}

///
/// Checks that an inner point is a leaf exactly when none of its left
/// children in any dimension is stored.
///
#[cfg(test)]
pub(crate) fn assert_inner_leaves_not_refinable(storage: &SparseGridData)
{
    for seq in 0..storage.len()
    {
        let point = storage.point(seq);
        if !point.is_inner_point()
        {
            continue;
        }
        let refinable = (0..storage.num_inputs()).any(|d|
        {
            let (level, index) = point.get(d);
            storage.contains(&point.with(d, level + 1, 2 * index - 1))
        });
        assert_eq!(point.is_leaf(), !refinable, "leaf flag of {point:?}");
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn all_schemes(storage: &mut SparseGridData) -> Vec<Result<(), SGError>>
    {
        let generator = HashGenerator;
        let dim = storage.num_inputs();
        vec![
            generator.regular(storage, 2, None),
            generator.regular_inter(storage, 2, &[vec![], vec![0]], None),
            generator.cliques(storage, 2, 1, None),
            generator.full(storage, 2),
            generator.anisotropic_full(storage, &vec![2; dim]),
            generator.full_with_boundaries(storage, 2),
            generator.regular_with_boundaries(storage, 2, Some(1)),
            generator.regular_with_boundaries(storage, 2, Some(0)),
            generator.regular_with_periodic_boundaries(storage, 2, None),
            generator.square_root(storage, 2),
            generator.truncated(storage, 2, 1),
        ]
    }

    #[test]
    fn non_empty_storage_is_rejected()
    {
        let mut storage = SparseGridData::new(2);
        regular(&mut storage, 2, None).unwrap();
        let len = storage.len();
        for result in all_schemes(&mut storage)
        {
            assert_eq!(result, Err(SGError::StorageNotEmpty));
            assert_eq!(storage.len(), len);
        }
    }

    #[test]
    fn zero_dimensional_storage_is_a_no_op()
    {
        let generator = HashGenerator;
        for build in 0..10
        {
            let mut storage = SparseGridData::new(0);
            let result = match build
            {
                0 => generator.regular(&mut storage, 3, None),
                1 => generator.full(&mut storage, 3),
                2 => generator.full_with_boundaries(&mut storage, 3),
                3 => generator.regular_with_boundaries(&mut storage, 3, None),
                4 => generator.regular_with_boundaries(&mut storage, 3, Some(0)),
                5 => generator.regular_with_periodic_boundaries(&mut storage, 3, None),
                6 => generator.square_root(&mut storage, 3),
                7 => generator.truncated(&mut storage, 3, 1),
                8 => generator.regular_inter(&mut storage, 3, &[vec![]], None),
                _ => generator.anisotropic_full(&mut storage, &[]),
            };
            assert_eq!(result, Ok(()));
            assert!(storage.is_empty());
        }
        // the clique size is validated against the dimension first
        let mut storage = SparseGridData::new(0);
        assert_eq!(generator.cliques(&mut storage, 3, 1, None), Err(SGError::CliqueSizeTooLarge));
    }

    #[test]
    fn levels_above_max_are_rejected()
    {
        let mut storage = SparseGridData::new(2);
        assert_eq!(regular(&mut storage, MAX_LEVEL + 1, None), Err(SGError::LevelOutOfRange));
        assert_eq!(truncated(&mut storage, 3, MAX_LEVEL + 1), Err(SGError::LevelOutOfRange));
        assert_eq!(anisotropic_full(&mut storage, &[1, MAX_LEVEL + 1]), Err(SGError::LevelOutOfRange));
        assert!(storage.is_empty());
    }

    #[test]
    fn every_scheme_generates_valid_hierarchical_indices()
    {
        for dim in 1..=3
        {
            let generator = HashGenerator;
            let mut grids = Vec::new();
            for build in 0..11
            {
                let mut storage = SparseGridData::new(dim);
                let result = match build
                {
                    0 => generator.regular(&mut storage, 3, None),
                    1 => generator.regular_inter(&mut storage, 3, &[vec![], vec![0], vec![0, dim - 1]], None),
                    2 => generator.cliques(&mut storage, 3, 1, None),
                    3 => generator.full(&mut storage, 2),
                    4 => generator.anisotropic_full(&mut storage, &vec![2; dim]),
                    5 => generator.full_with_boundaries(&mut storage, 2),
                    6 => generator.regular_with_boundaries(&mut storage, 3, Some(2)),
                    7 => generator.regular_with_boundaries(&mut storage, 3, Some(0)),
                    8 => generator.regular_with_periodic_boundaries(&mut storage, 3, None),
                    9 => generator.square_root(&mut storage, 3),
                    _ => generator.truncated(&mut storage, 3, 1),
                };
                result.expect("Could not generate grid");
                grids.push(storage);
            }
            for storage in grids
            {
                assert!(!storage.is_empty());
                assert!(storage.map_initialized());
                for point in storage.nodes()
                {
                    for d in 0..dim
                    {
                        let (level, index) = point.get(d);
                        if level == 0
                        {
                            assert!(index <= 1);
                        }
                        else
                        {
                            assert_eq!(index % 2, 1);
                            assert!(index < 1 << level);
                        }
                    }
                }
            }
        }
    }
}
