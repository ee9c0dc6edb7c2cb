// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Keymap
//!
//! Collapses `(positional_args, named_args)` into a single [`crate::key::Key`]
//! under a selected variant. `canonical` handles the typing/flattening/ignore
//! policy; `variants` picks how the canonical form becomes a key and layers
//! the safe-mode fallback on top.

pub mod canonical;
pub mod variants;

pub use canonical::{contains_unrepresentable, Arg, ArgValue, Call, CanonicalConfig, IgnoreList, SignatureBinder};
pub use variants::{Keymap, SafeKeymap, Variant};
