//! Configuration for scout

use crate::ScoutError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up at the working directory root
pub const CONFIG_FILE_NAME: &str = ".scout.toml";

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# Scout Configuration

[scan]
# Directory holding installed third-party packages; never scanned
dependency_dir = "node_modules"
# Include dotfiles and dot-directories in enumeration
include_hidden = true
# Honour .gitignore / .ignore files while walking
respect_gitignore = false
# Descend into symlinked directories
follow_links = false

[queries]
# Extensions treated as script sources (tests, components, import targets)
source_extensions = ["ts", "tsx", "js", "jsx"]
# Extensions treated as style files
style_extensions = ["css", "scss"]
# Infix marking a test file, as in `button.test.tsx`
test_suffix = "test"
"#;

/// Scout configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub queries: QueriesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_dependency_dir")]
    pub dependency_dir: String,
    #[serde(default = "default_true")]
    pub include_hidden: bool,
    #[serde(default)]
    pub respect_gitignore: bool,
    #[serde(default)]
    pub follow_links: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueriesConfig {
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
    #[serde(default = "default_style_extensions")]
    pub style_extensions: Vec<String>,
    #[serde(default = "default_test_suffix")]
    pub test_suffix: String,
}

// Default value functions
fn default_dependency_dir() -> String {
    "node_modules".to_string()
}
fn default_true() -> bool {
    true
}
fn default_source_extensions() -> Vec<String> {
    ["ts", "tsx", "js", "jsx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_style_extensions() -> Vec<String> {
    vec!["css".to_string(), "scss".to_string()]
}
fn default_test_suffix() -> String {
    "test".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dependency_dir: default_dependency_dir(),
            include_hidden: default_true(),
            respect_gitignore: false,
            follow_links: false,
        }
    }
}

impl Default for QueriesConfig {
    fn default() -> Self {
        Self {
            source_extensions: default_source_extensions(),
            style_extensions: default_style_extensions(),
            test_suffix: default_test_suffix(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ScoutError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| ScoutError::ConfigParse(e.to_string()))
    }

    /// Load `.scout.toml` from the root if present, defaults otherwise
    pub fn discover(root: &Path) -> crate::Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Brace alternation over the source extensions, e.g. `{ts,tsx,js,jsx}`
    pub fn source_extension_set(&self) -> String {
        format!("{{{}}}", self.queries.source_extensions.join(","))
    }
}
