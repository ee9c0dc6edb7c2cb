// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Ambient infrastructure concerns that sit alongside the memoization
//! domain proper: logging/observability and Prometheus metrics.

pub mod logging;
pub mod metrics;
