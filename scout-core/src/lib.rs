//! Scout Core - read-only code-intelligence queries
//!
//! Finds files in a source tree by name, by content, or by a shallow
//! structural relationship (imports, tests, class inheritance, style
//! dependencies, installed modules). Every query re-scans the tree, never
//! fails outward, and reports problems through a caller-supplied
//! [`Diagnostics`] sink.

pub mod config;
pub mod content;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod imports;
pub mod outcome;
pub mod queries;
pub mod scout;
pub mod tools;

pub use config::Config;
pub use diagnostics::{Channel, Diagnostics, MemoryDiagnostics, TracingDiagnostics};
pub use error::ScoutError;
pub use filter::PathFilter;
pub use imports::{extract_imports, ImportKind, ImportReference};
pub use outcome::{Outcome, ScanStatus, SearchResult};
pub use scout::Scout;
pub use tools::{tool_definitions, ToolDefinition, ToolRequest};

/// Result type alias for scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;
