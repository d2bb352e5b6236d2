use std::{hash::{Hash, Hasher}, io::{Read, Write}};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use bitfield_struct::bitfield;
use crate::{errors::SGError, serialization::{deserialize, serialize, SerializationFormat}};

#[bitfield(u8, new=false)]
#[derive(Serialize, Deserialize, PartialEq, Eq)]
pub struct GridPointFlags
{
    pub is_leaf: bool,
    pub is_inner: bool,
    #[bits(6)]
    pub _empty: u8
}

impl GridPointFlags
{
    pub fn new(level: &[u8], is_leaf: bool) -> Self
    {
        let mut r = Self::default();
        r.set_is_leaf(is_leaf);
        r.set_is_inner(!level.contains(&0));
        r
    }
    /// update `is_inner` flag...
    pub fn update_is_inner(&mut self, level: &[u8])
    {
        self.set_is_inner(!level.contains(&0));
    }
}

///
/// A single grid point: one (level, index) pair per dimension plus flags.
/// Only the levels and indices take part in hashing and equality, the
/// flags are metadata.
///
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GridPoint
{
    pub level: Vec<u8>,
    pub index: Vec<u32>,
    pub(crate) flags: GridPointFlags,
}
impl Hash for GridPoint
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.level.hash(state);
        self.index.hash(state);
    }
}
impl Default for GridPoint
{
    fn default() -> Self {
        Self { level: vec![], index: vec![], flags: GridPointFlags::default() }
    }
}
impl PartialOrd for GridPoint
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(std::cmp::Ord::cmp(self, other))
    }
}
impl Ord for GridPoint{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.level.cmp(&other.level).then(self.index.cmp(&other.index))
    }
}

impl PartialEq for GridPoint
{
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level && self.index == other.index
    }
}
impl Eq for GridPoint{}

impl GridPoint
{
    pub fn new (level: &[u8], index: &[u32], is_leaf: bool) -> Self
    {
        let flags= GridPointFlags::new(level, is_leaf);
        Self { level: level.to_vec(), index: index.to_vec(), flags }
    }

    ///
    /// Point with every dimension at level 1, index 1. Generators use this as
    /// the "not yet assigned" value for dimensions they have not reached.
    ///
    pub fn placeholder(num_inputs: usize) -> Self
    {
        Self::new(&vec![1; num_inputs], &vec![1; num_inputs], false)
    }

    pub fn zero_index(num_inputs: usize) -> Self
    {
        Self::new(&vec![0; num_inputs], &vec![0; num_inputs], false)
    }

    #[inline]
    pub fn num_inputs(&self) -> usize
    {
        self.level.len()
    }

    #[inline]
    pub fn get(&self, dim: usize) -> (u8, u32)
    {
        (self.level[dim], self.index[dim])
    }

    /// Sets level and index in `dim`, the leaf flag is kept.
    #[inline]
    pub fn push(&mut self, dim: usize, level: u8, index: u32)
    {
        self.level[dim] = level;
        self.index[dim] = index;
    }

    #[inline]
    pub fn push_with_leaf(&mut self, dim: usize, level: u8, index: u32, is_leaf: bool)
    {
        self.push(dim, level, index);
        self.set_is_leaf(is_leaf);
    }

    ///
    /// Copy of this point with `dim` set to (`level`, `index`).
    ///
    pub fn with(&self, dim: usize, level: u8, index: u32) -> GridPoint
    {
        let mut r = self.clone();
        r.push(dim, level, index);
        r
    }

    pub fn is_leaf(&self) -> bool
    {
        self.flags.is_leaf()
    }
    pub fn set_is_leaf(&mut self, is_leaf: bool)
    {
        self.flags.set_is_leaf(is_leaf);
    }

    ///
    /// This is an inner point if no levels are zero...
    ///
    pub fn is_inner_point(&self) -> bool
    {
        !self.level.contains(&0)
    }
    pub fn level_sum(&self) -> u32
    {
        self.level.iter().map(|&l| l as u32).sum()
    }
    #[inline]
    pub fn level_max(&self) -> u8
    {
        *self.level.iter().max().unwrap_or(&0)
    }
    pub fn level_min(&self) -> u8
    {
        *self.level.iter().min().unwrap_or(&0)
    }

    pub fn unit_coordinate(&self) -> Vec<f64>
    {
        let mut coor = vec![0.0; self.index.len()];
        #[allow(clippy::needless_range_loop)]
        for d in 0..self.index.len()
        {
            coor[d] = self.index[d] as f64 / (1u64 << self.level[d]) as f64;
        }
        coor
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox
{
    pub lower: Vec<f64>,
    pub upper: Vec<f64>
}

impl BoundingBox
{
    #[inline]
    pub fn new(lower: &[f64], upper: &[f64]) -> Self
    {
        Self { lower: lower.to_vec(), upper: upper.to_vec() }
    }
    pub fn with_dim(num_inputs: usize) -> Self
    {
        Self { lower: vec![0.0; num_inputs], upper: vec![1.0; num_inputs] }
    }
    #[inline]
    pub fn width(&self, dim: usize) -> f64
    {
        self.upper[dim] - self.lower[dim]
    }
    #[inline]
    pub fn to_real_coordinate_in_place(&self, point: &mut [f64])
    {
        for (i, x) in point.iter_mut().enumerate()
        {
            *x = self.lower[i] + self.width(i) * *x;
        }
    }
    #[inline]
    pub fn contains(&self, point: &[f64]) -> bool
    {
        #[allow(clippy::needless_range_loop)]
        for d in 0..point.len()
        {
            if self.lower[d] > point[d] || self.upper[d] < point[d]
            {
                return false;
            }
        }
        true
    }
}

///
/// Append-only, content addressed point storage. Points live in flat
/// arrays indexed by sequence number, `map` resolves point content back to
/// its sequence number so that inserting an existing point never duplicates it.
///
#[derive(Serialize, Deserialize, Clone)]
pub struct SparseGridData
{
    pub bounding_box: BoundingBox,
    pub(crate) index: Vec<u32>,
    pub(crate) level: Vec<u8>,
    pub(crate) flags: Vec<GridPointFlags>,
    pub(crate) num_inputs: usize,
    #[serde(skip)]
    pub(crate) map: FxHashMap<GridPoint, usize>,
    pub(crate) has_boundary: bool,
}

impl SparseGridData
{
    pub fn new(num_inputs: usize) -> Self
    {
        Self { bounding_box: BoundingBox::with_dim(num_inputs), index: Vec::new(), level: Vec::new(), flags: Vec::new(), num_inputs, map: FxHashMap::default(), has_boundary: false }
    }
    #[inline]
    pub fn num_inputs(&self) -> usize
    {
        self.num_inputs
    }
    #[inline]
    pub fn point(&self, seq: usize) -> GridPoint
    {
        let range = seq*self.num_inputs..(seq+1)*self.num_inputs;
        GridPoint { level: self.level[range.clone()].to_vec(), index: self.index[range].to_vec(), flags: self.flags[seq] }
    }

    #[inline]
    pub fn is_empty(&self) -> bool
    {
        self.flags.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize
    {
        self.flags.len()
    }

    #[inline(always)]
    pub fn has_boundary(&self) -> bool
    {
        self.has_boundary
    }

    #[inline]
    pub fn index(&self, seq: usize, dim: usize) -> u32
    {
        self.index[self.num_inputs*seq + dim]
    }

    #[inline(always)]
    pub fn level(&self, seq: usize, dim: usize) -> u8
    {
        self.level[self.num_inputs*seq + dim]
    }

    #[inline]
    pub fn is_leaf(&self, seq: usize) -> bool
    {
        self.flags[seq].is_leaf()
    }

    #[inline]
    pub fn is_inner_point(&self, seq: usize) -> bool
    {
        self.flags[seq].is_inner()
    }

    #[inline]
    pub fn level_sum(&self, seq: usize) -> u32
    {
        self.level[seq*self.num_inputs..(seq+1)*self.num_inputs].iter().map(|&i| i as u32).sum()
    }

    ///
    /// Inserts a point and returns its sequence number. If an equal point is
    /// already stored, nothing is written and the existing sequence number
    /// is returned.
    ///
    pub fn insert_point(&mut self, mut point: GridPoint) -> usize
    {
        debug_assert_eq!(point.num_inputs(), self.num_inputs);
        if let Some(&seq) = self.map.get(&point)
        {
            return seq;
        }
        // make sure our is_inner flag is up-to-date...
        point.flags.update_is_inner(&point.level);
        let seq = self.flags.len();
        self.flags.push(point.flags);
        self.index.extend_from_slice(&point.index);
        self.level.extend_from_slice(&point.level);
        self.map.insert(point, seq);
        seq
    }

    ///
    /// Overwrites the point stored at `seq`. Fails if the new content is
    /// already stored under another sequence number.
    ///
    pub fn update(&mut self, mut point: GridPoint, seq: usize) -> Result<(), SGError>
    {
        debug_assert_eq!(point.num_inputs(), self.num_inputs);
        if seq >= self.len()
        {
            return Err(SGError::InvalidIndex);
        }
        if let Some(&other) = self.map.get(&point)
        {
            if other != seq
            {
                return Err(SGError::DuplicatePoint);
            }
        }
        let previous = self.point(seq);
        if self.map.get(&previous) == Some(&seq)
        {
            self.map.remove(&previous);
        }
        point.flags.update_is_inner(&point.level);
        let range = seq*self.num_inputs..(seq+1)*self.num_inputs;
        self.index[range.clone()].copy_from_slice(&point.index);
        self.level[range].copy_from_slice(&point.level);
        self.flags[seq] = point.flags;
        self.map.insert(point, seq);
        Ok(())
    }
    ///
    /// Return the nodes in the grid...
    ///
    pub fn nodes(&self) -> NodeIterator<'_> {
        NodeIterator::new(self)
    }

    ///
    /// Return the real coordinates for each node...
    ///
    pub fn points(&self) -> PointIterator<'_>
    {
        PointIterator::new(self)
    }

    pub fn generate_map(&mut self)
    {
        let mut map = FxHashMap::default();
        for seq in 0..self.len()
        {
            map.insert(self.point(seq), seq);
        }
        self.map = map;
    }
    #[inline]
    pub fn map_initialized(&self) -> bool
    {
        self.len() == self.map.len()
    }
    #[inline]
    pub fn contains(&self, point: &GridPoint) -> bool
    {
        self.map.contains_key(point)
    }
    #[inline]
    pub fn index_of(&self, point: &GridPoint) -> Option<usize>
    {
        self.map.get(point).copied()
    }

    #[inline]
    pub fn bounding_box(&self) -> &BoundingBox
    {
        &self.bounding_box
    }
    #[inline]
    pub fn bounding_box_mut(&mut self) -> &mut BoundingBox
    {
        &mut self.bounding_box
    }

    pub fn unit_coordinate(&self, seq: usize) -> Vec<f64>
    {
        let mut coor = vec![0.0; self.num_inputs];
        #[allow(clippy::needless_range_loop)]
        for d in 0..self.num_inputs
        {
            coor[d] = self.index(seq, d) as f64 / (1u64 << self.level(seq, d)) as f64;
        }
        coor
    }

    ///
    /// Saves the point set (compressed using LZ4). The lookup map is not
    /// written, it is rebuilt on read.
    ///
    pub fn save(&self, path: &str) -> Result<(), SGError>
    {
        let file = std::io::BufWriter::new(std::fs::File::create(path).map_err(|_|SGError::FileIOError)?);
        self.write(file, SerializationFormat::default())
    }

    pub fn write<Writer: Write>(&self, mut writer: Writer, format: SerializationFormat) -> Result<(), SGError>
    {
        let buffer = serialize(self, format)?;
        writer.write_all(&buffer).map_err(|_|SGError::WriteBufferFailed)?;
        writer.flush().map_err(|_|SGError::WriteBufferFailed)
    }

    pub fn read_buffer(buffer: &[u8], format: SerializationFormat) -> Result<Self, SGError>
    {
        let mut data: Self = deserialize(buffer, format)?;
        data.generate_map();
        Ok(data)
    }

    pub fn read<Reader: Read>(mut reader: Reader, format: SerializationFormat)  -> Result<Self, SGError>
    {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|_|SGError::ReadBufferFailed)?;
        Self::read_buffer(&bytes, format)
    }
}

pub struct NodeIterator<'a> {
    storage: &'a SparseGridData,
    current_seq: usize,
}
impl<'a> NodeIterator<'a>
{
    pub fn new( storage: &'a SparseGridData) -> Self
    {
        Self { storage, current_seq: 0 }
    }
}

impl Iterator for NodeIterator<'_> {
    type Item = GridPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_seq < self.storage.len() {
            self.current_seq += 1;
            Some(self.storage.point(self.current_seq - 1))
        } else {
            None
        }
    }
}

pub struct PointIterator<'a> {
    pub storage: &'a SparseGridData,
    current_seq: usize,
}
impl<'a> PointIterator<'a>
{
    pub fn new( storage: &'a SparseGridData) -> Self
    {
        Self { storage, current_seq: 0 }
    }
}

impl Iterator for PointIterator<'_> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_seq < self.storage.len() {
            let mut point = self.storage.unit_coordinate(self.current_seq);
            self.storage.bounding_box.to_real_coordinate_in_place(&mut point);
            self.current_seq += 1;
            Some(point)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn insert_is_deduplicated()
    {
        let mut storage = SparseGridData::new(2);
        let a = storage.insert_point(GridPoint::new(&[1, 2], &[1, 3], false));
        let b = storage.insert_point(GridPoint::new(&[2, 1], &[1, 1], true));
        let again = storage.insert_point(GridPoint::new(&[1, 2], &[1, 3], true));
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(again, a);
        assert_eq!(storage.len(), 2);
        // the leaf flag of the stored point is untouched by the duplicate insert
        assert!(!storage.is_leaf(a));
    }

    #[test]
    fn update_replaces_lookup_entry()
    {
        let mut storage = SparseGridData::new(2);
        let old = GridPoint::new(&[1, 1], &[1, 1], false);
        let seq = storage.insert_point(old.clone());
        let new = GridPoint::new(&[1, 0], &[1, 0], false);
        storage.update(new.clone(), seq).expect("update failed");
        assert!(!storage.contains(&old));
        assert_eq!(storage.index_of(&new), Some(seq));
        assert!(!storage.is_inner_point(seq));
        assert!(storage.map_initialized());
        // the old content can now be stored again under a fresh sequence number
        assert_eq!(storage.insert_point(old), 1);
    }

    #[test]
    fn update_to_content_stored_elsewhere_fails()
    {
        let mut storage = SparseGridData::new(2);
        let a = GridPoint::new(&[1, 1], &[1, 1], false);
        let b = GridPoint::new(&[2, 1], &[1, 1], false);
        storage.insert_point(a.clone());
        storage.insert_point(b.clone());
        assert_eq!(storage.update(a.clone(), 1), Err(SGError::DuplicatePoint));
        // nothing was written
        assert_eq!(storage.point(1), b);
        assert_eq!(storage.index_of(&a), Some(0));
        assert_eq!(storage.index_of(&b), Some(1));
        assert!(storage.map_initialized());
        // rewriting a point with its own content only changes the flags
        storage.update(GridPoint::new(&[2, 1], &[1, 1], true), 1).expect("update failed");
        assert!(storage.is_leaf(1));
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn update_of_unassigned_sequence_number_fails()
    {
        let mut storage = SparseGridData::new(1);
        assert_eq!(storage.update(GridPoint::placeholder(1), 0), Err(SGError::InvalidIndex));
    }

    #[test]
    fn level_statistics()
    {
        let point = GridPoint::new(&[3, 0, 2], &[5, 1, 3], false);
        assert_eq!(point.level_sum(), 5);
        assert_eq!(point.level_max(), 3);
        assert_eq!(point.level_min(), 0);
        assert!(!point.is_inner_point());
        assert_eq!(point.unit_coordinate(), vec![0.625, 1.0, 0.75]);
    }

    #[test]
    fn push_keeps_leaf_flag()
    {
        let mut point = GridPoint::placeholder(2);
        point.push_with_leaf(0, 2, 3, true);
        point.push(1, 3, 7);
        assert!(point.is_leaf());
        assert_eq!(point.get(0), (2, 3));
        assert_eq!(point.get(1), (3, 7));
        let copy = point.with(1, 0, 1);
        assert_eq!(copy.get(1), (0, 1));
        assert_eq!(point.get(1), (3, 7));
        assert!(copy.is_leaf());
    }

    #[test]
    fn points_are_mapped_into_bounding_box()
    {
        let mut storage = SparseGridData::new(2);
        storage.insert_point(GridPoint::new(&[1, 0], &[1, 1], false));
        *storage.bounding_box_mut() = BoundingBox::new(&[-1.0, 2.0], &[1.0, 4.0]);
        let points: Vec<_> = storage.points().collect();
        assert_eq!(points, vec![vec![0.0, 4.0]]);
        assert!(storage.bounding_box().contains(&points[0]));
        assert_eq!(storage.nodes().count(), 1);
    }
}
