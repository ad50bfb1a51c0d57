//! Import-statement extraction and the lookups built on it.
//!
//! Everything here is a regex scan over source text, not a parser. An import
//! is reduced to its specifier plus a relative/bare tag; relative specifiers
//! are resolved lexically against the importing file's directory.

use crate::discovery::relative_path;
use crate::error::ScoutError;
use crate::outcome::{Outcome, ScanStatus, SearchResult};
use crate::scout::Scout;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

/// `import ... from '<specifier>'`, single or double quoted, possibly multi-line
fn import_from_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\bimport\b[^;'"]*?\bfrom\s*['"]([^'"\r\n]+)['"]"#)
            .expect("import pattern is valid")
    })
}

/// Like `import_from_pattern`, but also side-effect imports such as `import './a.css'`
fn any_import_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\bimport\b(?:[^;'"()]*?\bfrom)?\s*['"]([^'"\r\n]+)['"]"#)
            .expect("side-effect import pattern is valid")
    })
}

/// `class <Derived> extends <Base>`
fn class_extends_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bclass\s+([A-Za-z_$][\w$]*)\s+extends\s+([A-Za-z_$][\w$.]*)")
            .expect("class pattern is valid")
    })
}

/// Whether a specifier points into this tree or at an external module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Relative,
    Bare,
}

/// Literal specifier text from one import statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReference {
    pub specifier: String,
    pub kind: ImportKind,
}

impl ImportReference {
    pub fn new(specifier: impl Into<String>) -> Self {
        let specifier = specifier.into();
        let kind = if specifier.starts_with('.') {
            ImportKind::Relative
        } else {
            ImportKind::Bare
        };
        Self { specifier, kind }
    }

    pub fn is_relative(&self) -> bool {
        self.kind == ImportKind::Relative
    }

    /// Root-relative path for a relative specifier imported by `importer`.
    ///
    /// `None` for bare specifiers and for paths that climb above the root.
    pub fn resolve(&self, importer: &str) -> Option<String> {
        if !self.is_relative() {
            return None;
        }
        resolve_relative(importer, &self.specifier)
    }
}

/// Every `import ... from` specifier in source order
pub fn extract_imports(text: &str) -> Vec<ImportReference> {
    import_from_pattern()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| ImportReference::new(m.as_str()))
        .collect()
}

/// Specifiers of every import, including side-effect imports
fn extract_all_imports(text: &str) -> Vec<ImportReference> {
    any_import_pattern()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| ImportReference::new(m.as_str()))
        .collect()
}

/// `(derived, base)` for every `class X extends Y` in source order
pub fn extract_class_extensions(text: &str) -> Vec<(String, String)> {
    class_extends_pattern()
        .captures_iter(text)
        .filter_map(|c| {
            let derived = c.get(1)?.as_str().to_string();
            let base = c.get(2)?.as_str().to_string();
            Some((derived, base))
        })
        .collect()
}

/// Join `specifier` onto the directory of `importer`, normalising `.` and `..`.
pub fn resolve_relative(importer: &str, specifier: &str) -> Option<String> {
    let mut parts: Vec<&str> = importer
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    // Drop the importing file's own name
    parts.pop();

    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// True if the last path segment carries an extension
fn has_extension(path: &str) -> bool {
    Path::new(path).extension().is_some()
}

impl Scout {
    /// Read a caller-named file and return its root-relative name and text.
    async fn read_importer(&self, file: &str, root: &Path) -> crate::Result<(String, String)> {
        let path = Scout::resolve_target(root, file);
        let relative = relative_path(root, &path).ok_or_else(|| {
            ScoutError::InvalidRequest(format!("{} is outside the working directory", file))
        })?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ScoutError::io(&path, e))?;
        Ok((relative, text))
    }

    /// Existing, non-excluded regular file at the root-relative `relative`.
    ///
    /// `Ok(false)` when nothing is there, `Err` when the stat itself failed.
    async fn is_result_file(&self, root: &Path, relative: &str) -> crate::Result<bool> {
        if self.filter.is_excluded_name(relative) {
            return Ok(false);
        }
        self.probe_exists(root, relative).await
    }

    /// First existing file for a resolved import: exact, `+.ext`, `/index.ext`
    async fn probe_import(&self, root: &Path, resolved: &str) -> crate::Result<Option<String>> {
        let exts = &self.config.queries.source_extensions;
        let mut candidates = vec![resolved.to_string()];
        candidates.extend(exts.iter().map(|ext| format!("{}.{}", resolved, ext)));
        candidates.extend(exts.iter().map(|ext| format!("{}/index.{}", resolved, ext)));

        for candidate in candidates {
            if self.is_result_file(root, &candidate).await? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Files in this tree imported by `file`, in import order.
    ///
    /// Only existing files are returned, so bare specifiers (installed
    /// packages) are left out. Use `find_dependencies` to get those verbatim.
    /// A stat failure while probing an import is reported and counted as
    /// skipped.
    pub async fn find_imported_files(&self, file: &str, root: &Path) -> SearchResult {
        let (importer, text) = match self.read_importer(file, root).await {
            Ok(read) => read,
            Err(e) => {
                self.diagnostics
                    .tool_error(&format!("find_imported_files: {}", e));
                return SearchResult::failed();
            }
        };

        let mut found = Vec::new();
        let mut skipped = 0;
        for import in extract_imports(&text) {
            let Some(resolved) = import.resolve(&importer) else {
                continue;
            };
            match self.probe_import(root, &resolved).await {
                Ok(Some(path)) => found.push(path),
                Ok(None) => self.diagnostics.progress(&format!(
                    "find_imported_files: '{}' in {} does not resolve to a file",
                    import.specifier, importer
                )),
                Err(e) => {
                    skipped += 1;
                    self.diagnostics
                        .tool_error(&format!("find_imported_files: {}", e));
                }
            }
        }

        self.diagnostics.progress(&format!(
            "find_imported_files: {} import(s) resolved in {}",
            found.len(),
            importer
        ));
        Outcome::with_skipped(found, skipped)
    }

    /// Every import of `file` in order: relative ones as resolved
    /// root-relative paths, bare ones verbatim. Anything pointing into the
    /// dependency directory is dropped.
    pub async fn find_dependencies(&self, file: &str, root: &Path) -> Outcome<Vec<String>> {
        let (importer, text) = match self.read_importer(file, root).await {
            Ok(read) => read,
            Err(e) => {
                self.diagnostics.tool_error(&format!("find_dependencies: {}", e));
                return Outcome::failed();
            }
        };

        let deps: Vec<String> = extract_imports(&text)
            .into_iter()
            .filter(|import| !self.filter.is_excluded_name(&import.specifier))
            .filter_map(|import| match import.kind {
                ImportKind::Relative => import.resolve(&importer),
                ImportKind::Bare => Some(import.specifier),
            })
            .filter(|dep| !self.filter.is_excluded_name(dep))
            .collect();

        self.diagnostics.progress(&format!(
            "find_dependencies: {} dependency(ies) in {}",
            deps.len(),
            importer
        ));
        Outcome::complete(deps)
    }

    /// Files related to `file` through imports or class inheritance.
    ///
    /// Relative imports resolve with `.ts` appended when extension-less; each
    /// `extends Base` pulls in every file containing `class Base`. Duplicates
    /// are removed keeping first-seen order.
    pub async fn find_related_classes(&self, file: &str, root: &Path) -> SearchResult {
        let (importer, text) = match self.read_importer(file, root).await {
            Ok(read) => read,
            Err(e) => {
                self.diagnostics
                    .tool_error(&format!("find_related_classes: {}", e));
                return SearchResult::failed();
            }
        };

        let mut result = SearchResult::complete(Vec::new());
        let mut seen = HashSet::new();

        for import in extract_imports(&text) {
            let Some(mut resolved) = import.resolve(&importer) else {
                continue;
            };
            if !has_extension(&resolved) {
                resolved.push_str(".ts");
            }
            if self
                .keep_result_file("find_related_classes", root, &resolved, &mut result)
                .await
                && seen.insert(resolved.clone())
            {
                result.value.push(resolved);
            }
        }

        for (derived, base) in extract_class_extensions(&text) {
            tracing::debug!(%derived, %base, "looking up base class");
            let needle = format!("class {}", base);
            let hits = self.scan_matching(root, |t| t.contains(&needle)).await;
            result.absorb_status(hits.status);
            for hit in hits.value {
                if seen.insert(hit.clone()) {
                    result.value.push(hit);
                }
            }
        }

        self.diagnostics.progress(&format!(
            "find_related_classes: {} related file(s) for {}",
            result.len(),
            importer
        ));
        result
    }

    /// Style files (`.css`, `.scss`) imported by any source file named
    /// `<component>.{ts,tsx,js,jsx}`.
    pub async fn find_style_dependencies(&self, component: &str, root: &Path) -> SearchResult {
        let pattern = format!(
            "**/{}.{}",
            globset::escape(component),
            self.config.source_extension_set()
        );
        let sources = self.find_files_by_name(&pattern, root).await;
        if sources.status == ScanStatus::Failed {
            return SearchResult::failed();
        }
        let mut result = SearchResult::complete(Vec::new());
        result.absorb_status(sources.status);

        for source in sources.value {
            let path = root.join(&source);
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    result.absorb_status(ScanStatus::Partial { skipped: 1 });
                    self.diagnostics.tool_error(&format!(
                        "find_style_dependencies: {}",
                        ScoutError::io(&path, e)
                    ));
                    continue;
                }
            };

            for import in extract_all_imports(&text) {
                if !self.is_style_specifier(&import.specifier) {
                    continue;
                }
                let Some(resolved) = import.resolve(&source) else {
                    continue;
                };
                if self
                    .keep_result_file("find_style_dependencies", root, &resolved, &mut result)
                    .await
                {
                    result.value.push(resolved);
                }
            }
        }

        self.diagnostics.progress(&format!(
            "find_style_dependencies: {} style file(s) for {}",
            result.len(),
            component
        ));
        result
    }

    /// `is_result_file` for composed queries: a failed stat is reported and
    /// folded into `result` as one skipped item
    async fn keep_result_file(
        &self,
        operation: &str,
        root: &Path,
        relative: &str,
        result: &mut SearchResult,
    ) -> bool {
        match self.is_result_file(root, relative).await {
            Ok(found) => found,
            Err(e) => {
                result.absorb_status(ScanStatus::Partial { skipped: 1 });
                self.diagnostics.tool_error(&format!("{}: {}", operation, e));
                false
            }
        }
    }

    fn is_style_specifier(&self, specifier: &str) -> bool {
        self.config
            .queries
            .style_extensions
            .iter()
            .any(|ext| specifier.ends_with(&format!(".{}", ext)))
    }
}
