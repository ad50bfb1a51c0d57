//! File enumeration: glob patterns expanded against a working directory.

use crate::config::ScanConfig;
use crate::error::ScoutError;
use crate::filter::PathFilter;
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Files found by one walk, plus the per-entry errors that were skipped
#[derive(Debug, Default)]
pub struct Walk {
    pub files: Vec<String>,
    pub errors: Vec<String>,
}

/// Compile a glob so that `*` stays within one segment and `**` spans many
pub fn compile_glob(pattern: &str) -> crate::Result<GlobMatcher> {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| ScoutError::GlobPattern(e.to_string()))
}

/// Walk `root` and return root-relative files matching `pattern`.
///
/// Dependency-directory subtrees are pruned inside the walker; anything the
/// walker hands back anyway (symlinked directories) goes through the filter.
pub fn walk_files(
    root: &Path,
    pattern: &str,
    scan: &ScanConfig,
    filter: &PathFilter,
) -> crate::Result<Walk> {
    let matcher = compile_glob(pattern)?;

    let meta = fs::metadata(root).map_err(|e| ScoutError::io(root, e))?;
    if !meta.is_dir() {
        return Err(ScoutError::InvalidRequest(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    // Surface an unreadable root as a top-level failure, not an empty walk
    fs::read_dir(root).map_err(|e| ScoutError::io(root, e))?;

    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false);
    builder.hidden(!scan.include_hidden);
    builder.git_ignore(scan.respect_gitignore);
    builder.git_global(scan.respect_gitignore);
    builder.git_exclude(scan.respect_gitignore);
    builder.ignore(scan.respect_gitignore);
    builder.parents(scan.respect_gitignore);
    builder.require_git(false);
    builder.follow_links(scan.follow_links);
    builder.sort_by_file_name(|a, b| a.cmp(b));

    let pruned = OsString::from(filter.dependency_dir());
    builder.filter_entry(move |entry| {
        entry.depth() == 0 || entry.file_name() != pruned.as_os_str()
    });

    let mut walk = Walk::default();

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                walk.errors.push(e.to_string());
                continue;
            }
        };

        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(true) {
            continue;
        }

        let Some(relative) = relative_path(root, entry.path()) else {
            continue;
        };

        if !matcher.is_match(&relative) {
            continue;
        }

        if filter.is_excluded_candidate(root, &relative) {
            continue;
        }

        walk.files.push(relative);
    }

    tracing::debug!(
        pattern,
        files = walk.files.len(),
        errors = walk.errors.len(),
        "walk finished"
    );

    Ok(walk)
}

/// Render `path` relative to `root` with `/` separators.
///
/// `.` and `..` are resolved lexically first. Returns `None` when `path` is
/// not under `root` or is `root` itself.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let parts = relative_segments(root, path)?;
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Segments of `path` below `root` after lexical normalisation; empty for
/// the root itself, `None` when `path` climbs out of it
pub(crate) fn relative_segments(root: &Path, path: &Path) -> Option<Vec<String>> {
    let path = normalize(path);
    let rel = path.strip_prefix(normalize(root)).ok()?;
    rel.components()
        .map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Drop `.` and fold `..` into its parent without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
