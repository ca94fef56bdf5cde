mod clear;
mod index;
mod outline;
mod query;

use clap::{Parser, Subcommand};
use defscope_core::config::IndexConfig;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "defscope",
    version,
    about = "Scope-aware outlines of Go codebases",
    long_about = "Defscope indexes the top-level definitions of a Go module, resolves which \
                  files use which definitions, and narrows every definition to the smallest \
                  directory that contains all of its users. Outlines then show, per file or \
                  directory, only what the rest of the codebase actually depends on."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a project directory
    #[command(
        long_about = "Extracts definitions, resolves cross-file uses and computes scopes. \
                      By default, the index is stored in ~/.defscope/indices/."
    )]
    Index {
        /// Path to the project root directory to index
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,

        /// Also write a human-readable JSON dump for debugging
        #[arg(long)]
        debug: bool,
    },
    /// Print the outline overview
    Outline {
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,

        /// Directories to expand before rendering (repeatable)
        #[arg(long, value_name = "REL_DIR")]
        open: Vec<String>,

        /// Paths to show as their own entries (repeatable)
        #[arg(long, value_name = "REL_PATH")]
        focus: Vec<String>,
    },
    /// Print every directory with its entries
    Tree {
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,
    },
    /// Find definitions matching a partial identity, as JSON
    Find {
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,

        #[arg(long)]
        file: Option<String>,

        #[arg(long)]
        identifier: Option<String>,

        /// Required keyword (repeatable)
        #[arg(long = "keyword", value_name = "KEYWORD")]
        keywords: Vec<String>,
    },
    /// Resolve exactly one definition
    Def {
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,

        #[arg(long)]
        file: String,

        #[arg(long)]
        identifier: String,

        #[arg(long = "keyword", value_name = "KEYWORD")]
        keywords: Vec<String>,
    },
    /// Show the code that uses a definition
    Refs {
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,

        #[command(flatten)]
        target: query::DefLocation,
    },
    /// Show what a definition uses
    Uses {
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,

        #[command(flatten)]
        target: query::DefLocation,
    },
    /// Clear built indices
    #[command(
        long_about = "Removes built index files. If a path is provided, only that project's index \
                      is removed. Otherwise, all indices are cleared."
    )]
    Clear {
        /// Path to the project root directory to clear (optional)
        #[arg(value_name = "PROJECT_PATH")]
        path: Option<PathBuf>,
    },
}

impl Commands {
    fn project_root(&self) -> Option<&Path> {
        match self {
            Commands::Index { path, .. }
            | Commands::Outline { path, .. }
            | Commands::Tree { path }
            | Commands::Find { path, .. }
            | Commands::Def { path, .. }
            | Commands::Refs { path, .. }
            | Commands::Uses { path, .. } => Some(path.as_path()),
            Commands::Clear { path } => path.as_deref(),
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // reports go to stdout, so logs only reach stderr when asked for
    let verbose = std::env::var_os("RUST_LOG").is_some();
    // a broken project config is reported by the command itself
    let config = cli
        .command
        .project_root()
        .and_then(|root| IndexConfig::load(root).ok())
        .unwrap_or_default();
    let _guard = defscope_core::logging::init_logging("cli", &config.log_dir(), verbose);

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Index { path, debug } => rt.block_on(index::run(path, debug)),
        Commands::Outline { path, open, focus } => rt.block_on(outline::run(path, open, focus)),
        Commands::Tree { path } => outline::tree(path),
        Commands::Find {
            path,
            file,
            identifier,
            keywords,
        } => rt.block_on(query::find(path, file, identifier, keywords)),
        Commands::Def {
            path,
            file,
            identifier,
            keywords,
        } => rt.block_on(query::def(path, file, identifier, keywords)),
        Commands::Refs { path, target } => rt.block_on(query::refs(path, target)),
        Commands::Uses { path, target } => rt.block_on(query::uses(path, target)),
        Commands::Clear { path } => clear::run(path),
    }
}
