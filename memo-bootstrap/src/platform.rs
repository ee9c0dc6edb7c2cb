// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Platform abstraction
//!
//! Compile-time platform selection: a `Platform` trait as the interface,
//! OS-specific implementations in `platform::unix` / `platform::windows`.
//! Trimmed to the handful of facts a memoized cache's archive defaulting
//! actually needs — default archive directory and an elevated-privilege
//! check, nothing a caller here has no use for.

use std::path::PathBuf;

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::UnixPlatform;

#[cfg(windows)]
pub use windows::WindowsPlatform;

/// OS-specific facts a process needs at startup, independent of any
/// particular cache or archive.
pub trait Platform: Send + Sync {
    /// Platform identifier: "linux", "macos", "windows".
    fn platform_name(&self) -> &'static str;

    /// Where to put an archive when a caller didn't name one explicitly:
    /// `$XDG_CACHE_HOME/memo` (or `~/.cache/memo`) on Unix, `%LOCALAPPDATA%\memo`
    /// on Windows, falling back to the system temp directory if neither
    /// environment variable is set.
    fn default_archive_dir(&self) -> PathBuf;

    /// Whether the current process is running with elevated privileges
    /// (root on Unix, Administrator on Windows). A named cache backed by
    /// a shared system directory logs a warning when this is true, since
    /// an elevated process writing world-writable archive files is a
    /// common source of later permission errors for unprivileged readers.
    fn is_elevated(&self) -> bool;
}

#[cfg(unix)]
type PlatformImpl = UnixPlatform;

#[cfg(windows)]
type PlatformImpl = WindowsPlatform;

/// Returns the platform implementation selected at compile time.
pub fn create_platform() -> Box<dyn Platform> {
    Box::new(PlatformImpl::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_a_platform_with_a_nonempty_name() {
        let platform = create_platform();
        assert!(!platform.platform_name().is_empty());
    }

    #[test]
    fn default_archive_dir_ends_in_memo() {
        let platform = create_platform();
        let dir = platform.default_archive_dir();
        assert_eq!(dir.file_name().unwrap(), "memo");
    }
}
