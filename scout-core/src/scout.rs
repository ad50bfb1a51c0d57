//! The query entry point.

use crate::config::Config;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::discovery::{self, Walk};
use crate::error::ScoutError;
use crate::filter::PathFilter;
use crate::outcome::{Outcome, SearchResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runs read-only queries against a working directory.
///
/// Holds configuration and the diagnostics sink only; every call re-scans
/// the tree, so one `Scout` can serve any number of roots concurrently.
#[derive(Clone)]
pub struct Scout {
    pub(crate) config: Config,
    pub(crate) filter: PathFilter,
    pub(crate) diagnostics: Arc<dyn Diagnostics>,
}

impl Default for Scout {
    fn default() -> Self {
        Self::new(Config::default(), Arc::new(TracingDiagnostics))
    }
}

impl Scout {
    pub fn new(config: Config, diagnostics: Arc<dyn Diagnostics>) -> Self {
        let filter = PathFilter::new(config.scan.dependency_dir.clone());
        Self {
            config,
            filter,
            diagnostics,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    /// Files under `root` whose relative path matches the glob `pattern`.
    pub async fn find_files_by_name(&self, pattern: &str, root: &Path) -> SearchResult {
        match self.enumerate(pattern, root).await {
            Ok(walk) => {
                let skipped = self.report_walk_errors(&walk);
                self.diagnostics.progress(&format!(
                    "find_files_by_name: {} file(s) match '{}'",
                    walk.files.len(),
                    pattern
                ));
                Outcome::with_skipped(walk.files, skipped)
            }
            Err(e) => {
                self.diagnostics
                    .tool_error(&format!("find_files_by_name '{}': {}", pattern, e));
                SearchResult::failed()
            }
        }
    }

    /// Walk on the blocking pool; the walker does synchronous directory reads.
    pub(crate) async fn enumerate(&self, pattern: &str, root: &Path) -> crate::Result<Walk> {
        let root = root.to_path_buf();
        let pattern = pattern.to_string();
        let scan = self.config.scan.clone();
        let filter = self.filter.clone();

        tokio::task::spawn_blocking(move || {
            discovery::walk_files(&root, &pattern, &scan, &filter)
        })
        .await
        .map_err(|e| ScoutError::Join(e.to_string()))?
    }

    pub(crate) fn report_walk_errors(&self, walk: &Walk) -> usize {
        for error in &walk.errors {
            self.diagnostics.tool_error(&format!("walk: {}", error));
        }
        walk.errors.len()
    }

    /// Absolute path for a caller-supplied target, which may be relative to `root`
    pub(crate) fn resolve_target(root: &Path, target: &str) -> PathBuf {
        let path = Path::new(target);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}
