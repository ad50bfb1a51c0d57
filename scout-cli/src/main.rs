//! Scout CLI - Command-line interface for read-only code-intelligence queries

use clap::{Parser, Subcommand};
use scout_core::{Config, ScanStatus, Scout, ScoutError, SearchResult, ToolRequest};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Read-only code-intelligence queries over a source tree", long_about = None)]
struct Cli {
    /// Override working directory detection
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (default: <root>/.scout.toml if present)
    #[arg(long, global = true, env = "SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Files whose path matches a glob (e.g. "**/*.{ts,tsx}")
    Files { pattern: String },

    /// Files containing a literal substring
    Grep { pattern: String },

    /// Files matching a regular expression
    Regex { pattern: String },

    /// Files in this tree imported by a file
    Imports { file: String },

    /// A file's imports: resolved relative paths and package names
    Deps { file: String },

    /// Files related to a file through imports or class inheritance
    Classes { file: String },

    /// Style files imported by a component
    Styles { component: String },

    /// Test files for a file or directory
    Tests { target: String },

    /// Files rendering a component (contain "<Name")
    Component { name: String },

    /// Files calling fetch() with an endpoint
    Api { endpoint: String },

    /// Files defining a function
    Function { name: String },

    /// Files modified within the last N days
    Recent {
        /// Day threshold
        #[arg(default_value_t = 7)]
        days: u64,
    },

    /// Installed module type declarations / entry file
    External { module: String },

    /// Run a raw tool request, e.g. '{"name":"find_api_usage","arguments":{"endpoint":"/api"}}'
    Call { request: String },

    /// List the tools available to `call`
    Tools,
}

impl Commands {
    fn into_request(self) -> scout_core::Result<ToolRequest> {
        let request = match self {
            Commands::Files { pattern } => ToolRequest::FindFilesByName { pattern },
            Commands::Grep { pattern } => ToolRequest::FindFilesByContent { pattern },
            Commands::Regex { pattern } => ToolRequest::FindFilesByRegex { pattern },
            Commands::Imports { file } => ToolRequest::FindImportedFiles { file },
            Commands::Deps { file } => ToolRequest::FindDependencies { file },
            Commands::Classes { file } => ToolRequest::FindRelatedClasses { file },
            Commands::Styles { component } => ToolRequest::FindStyleDependencies { component },
            Commands::Tests { target } => ToolRequest::FindRelatedTests { target },
            Commands::Component { name } => ToolRequest::FindComponentUsage { component: name },
            Commands::Api { endpoint } => ToolRequest::FindApiUsage { endpoint },
            Commands::Function { name } => ToolRequest::FindFunctionDefinition { name },
            Commands::Recent { days } => ToolRequest::FindRecentlyModifiedFiles { days },
            Commands::External { module } => ToolRequest::FindExternalDependency { module },
            Commands::Call { request } => ToolRequest::from_json(&request)?,
            Commands::Tools => {
                return Err(ScoutError::InvalidRequest(
                    "`tools` is not a query".to_string(),
                ))
            }
        };
        Ok(request)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let json = cli.json;
    if let Err(e) = run(cli).await {
        if json {
            let error_json = serde_json::json!({ "code": "error", "message": e.to_string() });
            eprintln!("{}", error_json);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scout=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> scout_core::Result<()> {
    if let Commands::Tools = cli.command {
        return cmd_tools(cli.json);
    }

    let root = detect_repo_root(cli.root)?;
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(&root)?,
    };
    let request = cli.command.into_request()?;

    let scout = Scout::new(config, Arc::new(scout_core::TracingDiagnostics));
    tracing::debug!(root = %root.display(), "running query");
    let result = scout.dispatch(&request, &root).await;
    print_result(&result, cli.json)
}

fn cmd_tools(json: bool) -> scout_core::Result<()> {
    use colored::Colorize;

    let tools = scout_core::tool_definitions();
    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
    } else {
        for tool in tools {
            println!("{}: {}", tool.name.cyan(), tool.description);
        }
    }
    Ok(())
}

/// Print result paths, one per line, with a summary on stderr
fn print_result(result: &SearchResult, json: bool) -> scout_core::Result<()> {
    use colored::Colorize;

    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for file in result.files() {
        println!("{}", file);
    }

    match result.status {
        ScanStatus::Complete => eprintln!("({} {})", result.len(), "files".green()),
        ScanStatus::Partial { skipped } => eprintln!(
            "({} files, {})",
            result.len(),
            format!("{} skipped", skipped).yellow()
        ),
        ScanStatus::Failed => eprintln!("({})", "scan failed".red()),
    }
    Ok(())
}

fn detect_repo_root(override_path: Option<PathBuf>) -> scout_core::Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| ScoutError::io(&PathBuf::from("."), e))?;

    if let Some(path) = override_path {
        return Ok(if path.is_absolute() {
            path
        } else {
            cwd.join(path)
        });
    }

    // Walk up from current directory looking for .scout.toml or .git
    let mut current = cwd.clone();
    loop {
        if current.join(scout_core::config::CONFIG_FILE_NAME).exists()
            || current.join(".git").exists()
        {
            return Ok(current);
        }
        if !current.pop() {
            // No parent, use current directory
            return Ok(cwd);
        }
    }
}
