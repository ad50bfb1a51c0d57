//! Content scanning: which files contain a pattern.

use crate::error::ScoutError;
use crate::outcome::{Outcome, SearchResult};
use crate::scout::Scout;
use regex::Regex;
use std::path::Path;

/// Catch-all glob used for full-tree scans
pub const ALL_FILES: &str = "**/*";

impl Scout {
    /// Files whose text contains `pattern` as a literal substring.
    pub async fn find_files_by_content(&self, pattern: &str, root: &Path) -> SearchResult {
        let result = self
            .scan_matching(root, |text| text.contains(pattern))
            .await;
        self.diagnostics.progress(&format!(
            "find_files_by_content: {} file(s) contain '{}'",
            result.len(),
            pattern
        ));
        result
    }

    /// Files whose text matches the regular expression `pattern`.
    pub async fn find_files_by_regex(&self, pattern: &str, root: &Path) -> SearchResult {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                self.diagnostics.tool_error(&format!(
                    "find_files_by_regex '{}': {}",
                    pattern,
                    ScoutError::Regex(e.to_string())
                ));
                return SearchResult::failed();
            }
        };
        let result = self.scan_matching(root, |text| re.is_match(text)).await;
        self.diagnostics.progress(&format!(
            "find_files_by_regex: {} file(s) match /{}/",
            result.len(),
            pattern
        ));
        result
    }

    /// Read every enumerated file in order and keep those `matches` accepts.
    ///
    /// A file that cannot be read is reported and skipped; the scan goes on.
    pub(crate) async fn scan_matching<F>(&self, root: &Path, mut matches: F) -> SearchResult
    where
        F: FnMut(&str) -> bool,
    {
        let walk = match self.enumerate(ALL_FILES, root).await {
            Ok(walk) => walk,
            Err(e) => {
                self.diagnostics.tool_error(&format!("content scan: {}", e));
                return SearchResult::failed();
            }
        };
        let mut skipped = self.report_walk_errors(&walk);

        let mut found = Vec::new();
        for file in walk.files {
            let path = root.join(&file);
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => {
                    if matches(&text) {
                        found.push(file);
                    }
                }
                Err(e) => {
                    skipped += 1;
                    self.diagnostics
                        .tool_error(&format!("{}", ScoutError::io(&path, e)));
                }
            }
        }

        Outcome::with_skipped(found, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostics::MemoryDiagnostics;
    use crate::outcome::ScanStatus;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::write(root.join("src/a.ts"), "const token = getToken();").unwrap();
        fs::write(root.join("src/b.ts"), "export const x = 1;").unwrap();
        fs::write(root.join("src/c.ts"), "refreshToken(getToken);").unwrap();
        fs::write(root.join("node_modules/lib/index.js"), "getToken()").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_literal_content_scan() {
        let dir = setup();
        let scout = Scout::default();
        let result = scout.find_files_by_content("getToken", dir.path()).await;
        assert_eq!(result.files(), ["src/a.ts", "src/c.ts"]);
        assert_eq!(result.status, ScanStatus::Complete);
    }

    #[tokio::test]
    async fn test_literal_scan_does_not_interpret_regex() {
        let dir = setup();
        let scout = Scout::default();
        let result = scout.find_files_by_content("getToken()", dir.path()).await;
        assert_eq!(result.files(), ["src/a.ts"]);
    }

    #[tokio::test]
    async fn test_content_results_are_subset_of_enumeration() {
        let dir = setup();
        let scout = Scout::default();
        let all = scout.find_files_by_name(ALL_FILES, dir.path()).await;
        let hits = scout.find_files_by_content("const", dir.path()).await;
        assert!(hits.files().iter().all(|f| all.files().contains(f)));
        assert_eq!(hits.files(), ["src/a.ts", "src/b.ts"]);
    }

    #[tokio::test]
    async fn test_regex_scan() {
        let dir = setup();
        let scout = Scout::default();
        let result = scout
            .find_files_by_regex(r"\w+Token\(", dir.path())
            .await;
        assert_eq!(result.files(), ["src/a.ts", "src/c.ts"]);
    }

    #[tokio::test]
    async fn test_invalid_regex_fails_softly() {
        let dir = setup();
        let diag = Arc::new(MemoryDiagnostics::new());
        let scout = Scout::new(Config::default(), diag.clone());
        let result = scout.find_files_by_regex("(unclosed", dir.path()).await;
        assert!(result.is_empty());
        assert_eq!(result.status, ScanStatus::Failed);
        assert!(diag.errors()[0].contains("Regex error"));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_skipped_not_fatal() {
        let dir = setup();
        // Invalid UTF-8 fails read_to_string
        fs::write(dir.path().join("src/binary.ts"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let diag = Arc::new(MemoryDiagnostics::new());
        let scout = Scout::new(Config::default(), diag.clone());
        let result = scout.find_files_by_content("getToken", dir.path()).await;
        assert_eq!(result.files(), ["src/a.ts", "src/c.ts"]);
        assert_eq!(result.status, ScanStatus::Partial { skipped: 1 });
        assert!(diag.errors()[0].contains("binary.ts"));
    }
}
