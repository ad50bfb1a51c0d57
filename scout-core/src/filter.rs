//! Exclusion rules applied to every candidate path.

use std::path::Path;

/// Decides whether a path may appear in a result.
#[derive(Debug, Clone)]
pub struct PathFilter {
    dependency_dir: String,
}

impl PathFilter {
    pub fn new(dependency_dir: impl Into<String>) -> Self {
        Self {
            dependency_dir: dependency_dir.into(),
        }
    }

    pub fn dependency_dir(&self) -> &str {
        &self.dependency_dir
    }

    /// True if any segment of the path is the dependency directory.
    ///
    /// Works on plain strings so it also applies to import specifiers.
    pub fn is_excluded_name(&self, path: &str) -> bool {
        path.split(['/', '\\'])
            .any(|segment| segment == self.dependency_dir)
    }

    /// Excluded by name, or the path resolves to a directory on disk.
    ///
    /// Only the root-relative part is checked by name, so a working
    /// directory that itself lives under a dependency tree still scans.
    pub fn is_excluded_candidate(&self, root: &Path, relative: &str) -> bool {
        if self.is_excluded_name(relative) {
            return true;
        }
        // metadata() follows symlinks, so a link to a directory is caught here
        std::fs::metadata(root.join(relative))
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new("node_modules")
    }
}
