//! Higher-level queries composed from enumeration, content scanning and
//! import extraction.

use crate::discovery::relative_segments;
use crate::error::ScoutError;
use crate::outcome::{Outcome, SearchResult};
use crate::scout::Scout;
use regex::Regex;
use std::path::Path;
use std::time::{Duration, SystemTime};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

impl Scout {
    /// Test files for a source file or for everything under a directory.
    ///
    /// For a file, the last extension is stripped and `<base>.test.<ext>` is
    /// searched anywhere in the tree.
    pub async fn find_related_tests(&self, target: &str, root: &Path) -> SearchResult {
        let path = Scout::resolve_target(root, target);
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) => {
                let err = ScoutError::io(&path, e);
                if err.is_not_found() {
                    self.diagnostics.tool_error(&format!(
                        "find_related_tests: target not found: {}",
                        target
                    ));
                } else {
                    self.diagnostics.tool_error(&format!(
                        "find_related_tests: cannot inspect {}: {}",
                        target, err
                    ));
                }
                return SearchResult::failed();
            }
        };

        let tests = format!(
            "*.{}.{}",
            self.config.queries.test_suffix,
            self.config.source_extension_set()
        );

        let pattern = if meta.is_dir() {
            match relative_segments(root, &path) {
                None => {
                    self.diagnostics.tool_error(&format!(
                        "find_related_tests: {} is outside the working directory",
                        target
                    ));
                    return SearchResult::failed();
                }
                Some(dir) if dir.is_empty() => format!("**/{}", tests),
                Some(dir) => format!("{}/**/{}", globset::escape(&dir.join("/")), tests),
            }
        } else {
            let base = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!(
                "**/{}.{}.{}",
                globset::escape(&base),
                self.config.queries.test_suffix,
                self.config.source_extension_set()
            )
        };

        tracing::debug!(%pattern, "related tests pattern");
        self.find_files_by_name(&pattern, root).await
    }

    /// Files that open a markup tag for the component, i.e. contain `<Name`.
    pub async fn find_component_usage(&self, component: &str, root: &Path) -> SearchResult {
        let needle = format!("<{}", component);
        let result = self.scan_matching(root, |text| text.contains(&needle)).await;
        self.report("find_component_usage", component, &result);
        result
    }

    /// Files with a `fetch(` call whose arguments mention the endpoint.
    pub async fn find_api_usage(&self, endpoint: &str, root: &Path) -> SearchResult {
        let pattern = format!(r"fetch\([^)]*{}", regex::escape(endpoint));
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                self.diagnostics.tool_error(&format!(
                    "find_api_usage: {}",
                    ScoutError::Regex(e.to_string())
                ));
                return SearchResult::failed();
            }
        };
        let result = self.scan_matching(root, |text| re.is_match(text)).await;
        self.report("find_api_usage", endpoint, &result);
        result
    }

    /// Files declaring `name` as a function or a function-valued binding.
    pub async fn find_function_definition(&self, name: &str, root: &Path) -> SearchResult {
        let shapes = [
            format!("function {}(", name),
            format!("const {} = (", name),
            format!("let {} = (", name),
            format!("var {} = (", name),
        ];
        let result = self
            .scan_matching(root, |text| shapes.iter().any(|s| text.contains(s.as_str())))
            .await;
        self.report("find_function_definition", name, &result);
        result
    }

    /// Files modified within the last `days` whole days.
    ///
    /// Age is `ceil(elapsed / 24h)`, so a file touched a minute ago is one day
    /// old and `days = 0` only admits modification times at or after now.
    pub async fn find_recently_modified_files(&self, days: u64, root: &Path) -> SearchResult {
        let walk = match self.enumerate(crate::content::ALL_FILES, root).await {
            Ok(walk) => walk,
            Err(e) => {
                self.diagnostics
                    .tool_error(&format!("find_recently_modified_files: {}", e));
                return SearchResult::failed();
            }
        };
        let mut skipped = self.report_walk_errors(&walk);
        let now = SystemTime::now();

        let mut found = Vec::new();
        for file in walk.files {
            let path = root.join(&file);
            let modified = match tokio::fs::metadata(&path).await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    skipped += 1;
                    self.diagnostics.tool_error(&format!(
                        "find_recently_modified_files: {}",
                        ScoutError::io(&path, e)
                    ));
                    continue;
                }
            };
            if age_in_days(now, modified) <= days {
                found.push(file);
            }
        }

        let result = Outcome::with_skipped(found, skipped);
        self.report(
            "find_recently_modified_files",
            &format!("{} day(s)", days),
            &result,
        );
        result
    }

    /// Where an installed module's type declarations or entry file live.
    ///
    /// Probes `@types/<m>/index.d.ts`, `<m>/index.d.ts` and `<m>/index.js`
    /// under the dependency directory concurrently. Missing candidates are
    /// expected and omitted silently; other stat failures are reported.
    pub async fn find_external_dependency(&self, module: &str, root: &Path) -> SearchResult {
        if !is_module_name(module) {
            self.diagnostics.tool_error(&format!(
                "find_external_dependency: invalid module name '{}'",
                module
            ));
            return SearchResult::failed();
        }

        let candidates = external_candidates(self.filter.dependency_dir(), module);
        let (types, declaration, entry) = tokio::join!(
            self.probe_exists(root, &candidates[0]),
            self.probe_exists(root, &candidates[1]),
            self.probe_exists(root, &candidates[2]),
        );

        let mut found = Vec::new();
        let mut skipped = 0;
        for (candidate, probe) in candidates.iter().zip([types, declaration, entry]) {
            match probe {
                Ok(true) => found.push(candidate.clone()),
                Ok(false) => {}
                Err(e) => {
                    skipped += 1;
                    self.diagnostics
                        .tool_error(&format!("find_external_dependency: {}", e));
                }
            }
        }

        let result = Outcome::with_skipped(found, skipped);
        self.report("find_external_dependency", module, &result);
        result
    }

    /// `Ok(false)` when the path does not exist, `Err` for any other failure
    pub(crate) async fn probe_exists(&self, root: &Path, relative: &str) -> crate::Result<bool> {
        let path = root.join(relative);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) => {
                let err = ScoutError::io(&path, e);
                if err.is_not_found() {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }

    fn report(&self, operation: &str, subject: &str, result: &SearchResult) {
        self.diagnostics.progress(&format!(
            "{}: {} file(s) for '{}'",
            operation,
            result.len(),
            subject
        ));
    }
}

/// Whole days between `modified` and `now`, rounded up; future times are 0
fn age_in_days(now: SystemTime, modified: SystemTime) -> u64 {
    let elapsed = now.duration_since(modified).unwrap_or(Duration::ZERO);
    elapsed.as_nanos().div_ceil(DAY.as_nanos()) as u64
}

/// Package names, optionally scoped: `lodash`, `@scope/pkg`
fn is_module_name(module: &str) -> bool {
    if module.is_empty() || module.starts_with('/') || module.contains('\\') {
        return false;
    }
    let segments: Vec<&str> = module.split('/').collect();
    let valid = |s: &&str| !s.is_empty() && *s != "." && *s != "..";
    match segments.as_slice() {
        [name] => valid(name),
        [scope, name] => scope.starts_with('@') && scope.len() > 1 && valid(name),
        _ => false,
    }
}

/// The three fixed probe locations, in reporting order.
///
/// Scoped packages map to `@types/scope__name`, as DefinitelyTyped names them.
fn external_candidates(dependency_dir: &str, module: &str) -> [String; 3] {
    let types_name = match module.strip_prefix('@') {
        Some(scoped) => scoped.replacen('/', "__", 1),
        None => module.to_string(),
    };
    [
        format!("{}/@types/{}/index.d.ts", dependency_dir, types_name),
        format!("{}/{}/index.d.ts", dependency_dir, module),
        format!("{}/{}/index.js", dependency_dir, module),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostics::MemoryDiagnostics;
    use crate::outcome::ScanStatus;
    use filetime::FileTime;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn set_age(root: &Path, rel: &str, age: Duration) {
        let when = SystemTime::now() - age;
        filetime::set_file_mtime(root.join(rel), FileTime::from_system_time(when)).unwrap();
    }

    fn memory_scout() -> (Scout, Arc<MemoryDiagnostics>) {
        let diag = Arc::new(MemoryDiagnostics::new());
        (Scout::new(Config::default(), diag.clone()), diag)
    }

    #[tokio::test]
    async fn test_related_tests_for_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/components/Button.tsx", "");
        write(root, "src/components/Button.test.tsx", "");
        write(root, "tests/Button.test.js", "");
        write(root, "tests/Input.test.js", "");
        write(root, "node_modules/ui/Button.test.js", "");

        let scout = Scout::default();
        let result = scout
            .find_related_tests("src/components/Button.tsx", root)
            .await;
        assert_eq!(
            result.files(),
            ["src/components/Button.test.tsx", "tests/Button.test.js"]
        );
    }

    #[tokio::test]
    async fn test_related_tests_for_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/api/client.ts", "");
        write(root, "src/api/client.test.ts", "");
        write(root, "src/api/nested/retry.test.js", "");
        write(root, "src/ui/view.test.tsx", "");

        let scout = Scout::default();
        let result = scout.find_related_tests("src/api", root).await;
        assert_eq!(
            result.files(),
            ["src/api/client.test.ts", "src/api/nested/retry.test.js"]
        );

        let everything = scout.find_related_tests(".", root).await;
        assert_eq!(everything.len(), 3);
    }

    #[tokio::test]
    async fn test_related_tests_missing_target() {
        let dir = TempDir::new().unwrap();
        let (scout, diag) = memory_scout();
        let result = scout.find_related_tests("src/ghost.ts", dir.path()).await;
        assert!(result.is_empty());
        assert_eq!(result.status, ScanStatus::Failed);
        assert_eq!(
            diag.errors(),
            vec!["find_related_tests: target not found: src/ghost.ts"]
        );
    }

    #[tokio::test]
    async fn test_related_tests_for_directory_with_parent_segments() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "lib/x.test.ts", "");
        write(root, "src/lib/y.test.ts", "");

        let scout = Scout::default();
        let result = scout.find_related_tests("src/../lib", root).await;
        assert_eq!(result.files(), ["lib/x.test.ts"]);

        let everything = scout.find_related_tests("src/..", root).await;
        assert_eq!(everything.files(), ["lib/x.test.ts", "src/lib/y.test.ts"]);
    }

    #[tokio::test]
    async fn test_related_tests_directory_outside_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("repo");
        write(&root, "a.test.ts", "");
        write(dir.path(), "other/b.test.ts", "");

        let (scout, diag) = memory_scout();
        let result = scout.find_related_tests("../other", &root).await;
        assert!(result.is_empty());
        assert_eq!(result.status, ScanStatus::Failed);
        assert!(diag.errors()[0].contains("outside the working directory"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_related_tests_uninspectable_target() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/a.ts", "");

        let (scout, diag) = memory_scout();
        let result = scout.find_related_tests("src/a.ts/x", root).await;
        assert!(result.is_empty());
        assert_eq!(result.status, ScanStatus::Failed);
        let errors = diag.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("find_related_tests: cannot inspect src/a.ts/x"));
        assert!(!errors[0].contains("not found"));
    }

    #[tokio::test]
    async fn test_component_usage() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/App.tsx", "return <Button onClick={go} />;");
        write(root, "src/Form.tsx", "<ButtonGroup>");
        write(root, "src/util.ts", "const label = 'Button';");
        // String literals containing the tag still match
        write(root, "src/docs.ts", "const html = '<Button>';");

        let scout = Scout::default();
        let result = scout.find_component_usage("Button", root).await;
        assert_eq!(
            result.files(),
            ["src/App.tsx", "src/Form.tsx", "src/docs.ts"]
        );
    }

    #[tokio::test]
    async fn test_api_usage() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/a.ts", "await fetch('/api/users?id=1')");
        write(root, "src/b.ts", "await fetch(`${base}/api/users`, { method: 'POST' })");
        write(root, "src/c.ts", "axios.get('/api/users')");
        write(root, "src/d.ts", "fetch('/api/orders')");

        let scout = Scout::default();
        let result = scout.find_api_usage("/api/users", root).await;
        assert_eq!(result.files(), ["src/a.ts", "src/b.ts"]);
    }

    #[tokio::test]
    async fn test_api_usage_escapes_endpoint() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/a.ts", "fetch('/api/items?page=1')");
        write(root, "src/b.ts", "fetch('/api/itemsXpage=1')");

        let scout = Scout::default();
        let result = scout.find_api_usage("/api/items?page", root).await;
        assert_eq!(result.files(), ["src/a.ts"]);
    }

    #[tokio::test]
    async fn test_function_definition_shapes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "a.js", "function login(user) {}");
        write(root, "b.js", "const login = (user) => {}");
        write(root, "c.js", "let login = () => null");
        write(root, "d.js", "var login = (u) => u");
        write(root, "e.js", "login(user);");
        write(root, "f.js", "function loginUser() {}");

        let scout = Scout::default();
        let result = scout.find_function_definition("login", root).await;
        assert_eq!(result.files(), ["a.js", "b.js", "c.js", "d.js"]);
    }

    #[tokio::test]
    async fn test_recently_modified() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "fresh.ts", "");
        write(root, "week.ts", "");
        write(root, "old.ts", "");
        set_age(root, "fresh.ts", Duration::from_secs(60));
        set_age(root, "week.ts", 6 * DAY + Duration::from_secs(3600));
        set_age(root, "old.ts", 40 * DAY);

        let scout = Scout::default();
        let one = scout.find_recently_modified_files(1, root).await;
        assert_eq!(one.files(), ["fresh.ts"]);

        let seven = scout.find_recently_modified_files(7, root).await;
        assert_eq!(seven.files(), ["fresh.ts", "week.ts"]);

        let all = scout.find_recently_modified_files(365, root).await;
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_recently_modified_is_monotonic() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for (i, days) in [0u32, 2, 5, 9].iter().enumerate() {
            let name = format!("f{}.ts", i);
            write(root, &name, "");
            set_age(root, &name, DAY * *days + Duration::from_secs(120));
        }

        let scout = Scout::default();
        let mut previous = 0;
        for n in 0..12 {
            let size = scout.find_recently_modified_files(n, root).await.len();
            assert!(size >= previous, "result shrank at n = {}", n);
            previous = size;
        }
        assert_eq!(previous, 4);
    }

    #[tokio::test]
    async fn test_recently_modified_zero_days() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "past.ts", "");
        write(root, "future.ts", "");
        set_age(root, "past.ts", Duration::from_secs(30));
        let ahead = SystemTime::now() + Duration::from_secs(3600);
        filetime::set_file_mtime(root.join("future.ts"), FileTime::from_system_time(ahead))
            .unwrap();

        let scout = Scout::default();
        let result = scout.find_recently_modified_files(0, root).await;
        assert_eq!(result.files(), ["future.ts"]);
    }

    #[test]
    fn test_age_in_days_rounds_up() {
        let now = SystemTime::now();
        assert_eq!(age_in_days(now, now), 0);
        assert_eq!(age_in_days(now, now - Duration::from_secs(1)), 1);
        assert_eq!(age_in_days(now, now - DAY), 1);
        assert_eq!(age_in_days(now, now - DAY - Duration::from_secs(1)), 2);
        assert_eq!(age_in_days(now, now + DAY), 0);
    }

    #[tokio::test]
    async fn test_external_dependency_entry_only() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "node_modules/lodash/index.js", "");

        let (scout, diag) = memory_scout();
        let result = scout.find_external_dependency("lodash", root).await;
        assert_eq!(result.files(), ["node_modules/lodash/index.js"]);
        assert_eq!(result.status, ScanStatus::Complete);
        assert!(diag.errors().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_dependency_reports_stat_failure() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "node_modules/@types", "not a directory");
        write(root, "node_modules/lodash/index.js", "");

        let (scout, diag) = memory_scout();
        let result = scout.find_external_dependency("lodash", root).await;
        assert_eq!(result.files(), ["node_modules/lodash/index.js"]);
        assert_eq!(result.status, ScanStatus::Partial { skipped: 1 });
        let errors = diag.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("find_external_dependency:"));
    }

    #[tokio::test]
    async fn test_external_dependency_keeps_candidate_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "node_modules/react/index.js", "");
        write(root, "node_modules/@types/react/index.d.ts", "");

        let scout = Scout::default();
        let result = scout.find_external_dependency("react", root).await;
        assert_eq!(
            result.files(),
            [
                "node_modules/@types/react/index.d.ts",
                "node_modules/react/index.js"
            ]
        );
    }

    #[tokio::test]
    async fn test_external_dependency_scoped_package() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "node_modules/@types/babel__core/index.d.ts", "");
        write(root, "node_modules/@babel/core/index.d.ts", "");

        let scout = Scout::default();
        let result = scout.find_external_dependency("@babel/core", root).await;
        assert_eq!(
            result.files(),
            [
                "node_modules/@types/babel__core/index.d.ts",
                "node_modules/@babel/core/index.d.ts"
            ]
        );
    }

    #[tokio::test]
    async fn test_external_dependency_rejects_path_escape() {
        let dir = TempDir::new().unwrap();
        let (scout, diag) = memory_scout();
        let result = scout.find_external_dependency("../secrets", dir.path()).await;
        assert!(result.is_empty());
        assert_eq!(diag.errors().len(), 1);
    }

    #[test]
    fn test_is_module_name() {
        assert!(is_module_name("lodash"));
        assert!(is_module_name("@scope/pkg"));
        assert!(!is_module_name(""));
        assert!(!is_module_name("a/b/c"));
        assert!(!is_module_name("scope/pkg"));
        assert!(!is_module_name(".."));
        assert!(!is_module_name("/etc"));
    }
}
