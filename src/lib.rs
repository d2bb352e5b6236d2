//!
//! Generation of sparse grid point sets.
//!
//! A grid point carries one (level, index) pair per dimension. The
//! generators in [`generators`] fill an empty [`storage::SparseGridData`]
//! with the points of one of the supported schemes, marking the leaves as
//! they go.
//!
//! ```
//! use sggen::{generators::regular, storage::SparseGridData};
//!
//! let mut storage = SparseGridData::new(2);
//! regular(&mut storage, 3, None).unwrap();
//! assert_eq!(storage.len(), 17);
//! ```
//!
pub mod config;
pub mod errors;
pub mod generators;
pub mod serialization;
pub mod storage;
