//! Filesystem probing abstractions for testability.
//!
//! Output-path resolution needs to know whether a target names an existing
//! directory. That question goes through [`PathProbe`] so path logic can be
//! exercised against a fake filesystem.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Abstraction over filesystem queries made while resolving output paths.
pub trait PathProbe: Send + Sync {
    /// Returns true if `path` names an existing directory.
    fn is_dir(&self, path: &Path) -> bool;
}

// === Real implementations ===

/// Probe backed by the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl PathProbe for RealFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

// === Mock implementations for testing ===

/// In-memory probe for testing.
///
/// Only paths registered with [`MockFs::with_dir`] are reported as directories.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    dirs: HashSet<PathBuf>,
}

impl MockFs {
    /// Create a mock with no directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directory.
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.insert(path.into());
        self
    }
}

impl PathProbe for MockFs {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }
}
