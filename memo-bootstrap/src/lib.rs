// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # memo-bootstrap
//!
//! Process entry-point glue that sits outside the decorator/archive
//! machinery in [`memo`]: a registry that makes named memoized caches
//! discoverable without a process-wide global, signal-driven graceful
//! shutdown, and a platform abstraction for picking a sensible default
//! archive directory. One library crate can host many decorated
//! functions; this crate is where a binary wires them together.
//!
//! ## Module Structure
//!
//! - [`registry`] — [`registry::CacheRegistry`], a name-keyed table of
//!   [`registry::CacheHandle`] trait objects so operator tooling (metrics
//!   scraping, admin dump-on-shutdown) can enumerate every memoized cache
//!   in a process without knowing its concrete argument/result types.
//! - [`shutdown`] — [`shutdown::ShutdownCoordinator`], cancellation
//!   tokens plus a grace period for draining in-flight calls before the
//!   process exits.
//! - [`platform`] — [`platform::Platform`], OS-specific defaults (cache
//!   directory, elevated-privilege check) selected at compile time.

pub mod platform;
pub mod registry;
pub mod shutdown;

pub use platform::{create_platform, Platform};
pub use registry::{CacheHandle, CacheRegistry};
pub use shutdown::{CancellationToken, ShutdownCoordinator};
