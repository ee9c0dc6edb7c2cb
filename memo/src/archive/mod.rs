// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # I/O-backed archives
//!
//! The archive backends that need real I/O or an external runtime, kept
//! out of `memo-core` so that crate stays synchronous and dependency-free
//! of a filesystem or database. `memo-core::archive` has the
//! `Archive` trait itself plus the two backends that need neither.

pub mod dataset;
pub mod directory;
pub mod file_blob;
pub mod sqlite;

pub use dataset::{DatasetArchive, DatasetHandle};
pub use directory::DirectoryArchive;
pub use file_blob::FileBlobArchive;
pub use sqlite::{SqliteArchive, SqliteMultiTableArchive, SqliteTableArchive};
