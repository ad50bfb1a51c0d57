//! Named tool requests, so agents can drive every query through one entry point.

use crate::error::ScoutError;
use crate::outcome::SearchResult;
use crate::scout::Scout;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

/// One query, as an agent names it: `{"name": "...", "arguments": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolRequest {
    FindFilesByName { pattern: String },
    FindFilesByContent { pattern: String },
    FindFilesByRegex { pattern: String },
    FindImportedFiles { file: String },
    FindDependencies { file: String },
    FindRelatedClasses { file: String },
    FindStyleDependencies { component: String },
    FindRelatedTests { target: String },
    FindComponentUsage { component: String },
    FindApiUsage { endpoint: String },
    FindFunctionDefinition { name: String },
    FindRecentlyModifiedFiles { days: u64 },
    FindExternalDependency { module: String },
}

impl ToolRequest {
    /// Build a request from a tool name and its JSON arguments
    pub fn from_call(name: &str, arguments: Value) -> crate::Result<Self> {
        serde_json::from_value(json!({ "name": name, "arguments": arguments }))
            .map_err(|e| ScoutError::InvalidRequest(format!("{}: {}", name, e)))
    }

    /// Parse a full `{"name": ..., "arguments": ...}` document
    pub fn from_json(text: &str) -> crate::Result<Self> {
        serde_json::from_str(text).map_err(|e| ScoutError::InvalidRequest(e.to_string()))
    }
}

/// Schema entry: (name, description, argument, JSON type, argument description)
const TOOLS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "find_files_by_name",
        "List files whose repo-relative path matches a glob (supports ** and {a,b}).",
        "pattern",
        "string",
        "Glob pattern, e.g. '**/*.{ts,tsx}'",
    ),
    (
        "find_files_by_content",
        "List files whose text contains a literal substring.",
        "pattern",
        "string",
        "Literal text to look for",
    ),
    (
        "find_files_by_regex",
        "List files whose text matches a regular expression.",
        "pattern",
        "string",
        "Regular expression (Rust regex syntax)",
    ),
    (
        "find_imported_files",
        "List the files in this tree that a file imports.",
        "file",
        "string",
        "File path relative to the working directory",
    ),
    (
        "find_dependencies",
        "List a file's imports: relative ones resolved to paths, package names verbatim.",
        "file",
        "string",
        "File path relative to the working directory",
    ),
    (
        "find_related_classes",
        "List files related to a file through imports or class inheritance.",
        "file",
        "string",
        "File path relative to the working directory",
    ),
    (
        "find_style_dependencies",
        "List .css/.scss files imported by a component's source file.",
        "component",
        "string",
        "Component file base name, e.g. 'Button'",
    ),
    (
        "find_related_tests",
        "List test files for a source file or for everything under a directory.",
        "target",
        "string",
        "File or directory path relative to the working directory",
    ),
    (
        "find_component_usage",
        "List files that render a component (contain '<Name').",
        "component",
        "string",
        "Component tag name",
    ),
    (
        "find_api_usage",
        "List files calling fetch() with an endpoint.",
        "endpoint",
        "string",
        "Endpoint text, e.g. '/api/users'",
    ),
    (
        "find_function_definition",
        "List files defining a function by declaration or const/let/var arrow binding.",
        "name",
        "string",
        "Function name",
    ),
    (
        "find_recently_modified_files",
        "List files modified within the last N days.",
        "days",
        "integer",
        "Day threshold",
    ),
    (
        "find_external_dependency",
        "Locate an installed module's type declarations or entry file.",
        "module",
        "string",
        "Package name, e.g. 'lodash' or '@scope/pkg'",
    ),
];

/// Name, description and JSON input schema of one tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Every tool `Scout::dispatch` understands
pub fn tool_definitions() -> Vec<ToolDefinition> {
    TOOLS
        .iter()
        .map(|(name, description, arg, ty, arg_description)| {
            let mut properties = serde_json::Map::new();
            properties.insert(
                arg.to_string(),
                json!({ "type": ty, "description": arg_description }),
            );
            ToolDefinition {
                name: name.to_string(),
                description: description.to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": properties,
                    "required": [arg]
                }),
            }
        })
        .collect()
}

impl Scout {
    /// Run the query a request names.
    pub async fn dispatch(&self, request: &ToolRequest, root: &Path) -> SearchResult {
        tracing::debug!(?request, root = %root.display(), "dispatching tool request");
        match request {
            ToolRequest::FindFilesByName { pattern } => {
                self.find_files_by_name(pattern, root).await
            }
            ToolRequest::FindFilesByContent { pattern } => {
                self.find_files_by_content(pattern, root).await
            }
            ToolRequest::FindFilesByRegex { pattern } => {
                self.find_files_by_regex(pattern, root).await
            }
            ToolRequest::FindImportedFiles { file } => self.find_imported_files(file, root).await,
            ToolRequest::FindDependencies { file } => self.find_dependencies(file, root).await,
            ToolRequest::FindRelatedClasses { file } => {
                self.find_related_classes(file, root).await
            }
            ToolRequest::FindStyleDependencies { component } => {
                self.find_style_dependencies(component, root).await
            }
            ToolRequest::FindRelatedTests { target } => {
                self.find_related_tests(target, root).await
            }
            ToolRequest::FindComponentUsage { component } => {
                self.find_component_usage(component, root).await
            }
            ToolRequest::FindApiUsage { endpoint } => self.find_api_usage(endpoint, root).await,
            ToolRequest::FindFunctionDefinition { name } => {
                self.find_function_definition(name, root).await
            }
            ToolRequest::FindRecentlyModifiedFiles { days } => {
                self.find_recently_modified_files(*days, root).await
            }
            ToolRequest::FindExternalDependency { module } => {
                self.find_external_dependency(module, root).await
            }
        }
    }
}
