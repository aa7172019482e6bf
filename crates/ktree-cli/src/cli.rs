//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ktree - Inspect and grow a Knowledge Tree prerequisite graph.
#[derive(Debug, Parser)]
#[command(name = "ktree")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file (overrides the config file)
    #[arg(long, global = true, env = "KTREE_DB")]
    pub db: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add concept records from a JSON file
    Add(AddArgs),

    /// Record that a concept requires another
    Require(RequireArgs),

    /// Minimum viable graph for a target concept
    Mvg(MvgArgs),

    /// Show one concept with its neighbours
    Show(ShowArgs),

    /// List concepts
    List(ListArgs),

    /// Show the tree of one domain
    Tree(TreeArgs),

    /// Export the whole graph as a JSON document
    Export(ExportArgs),
}

/// Arguments for the add command.
#[derive(Debug, Parser)]
pub struct AddArgs {
    /// JSON file holding one concept or an array of concepts ("-" for stdin)
    pub file: PathBuf,
}

/// Arguments for the require command.
#[derive(Debug, Parser)]
pub struct RequireArgs {
    /// Concept that has the prerequisite
    pub concept: String,

    /// Concept that must be learned first
    pub prerequisite: String,
}

/// Arguments for the mvg command.
#[derive(Debug, Parser)]
pub struct MvgArgs {
    /// Target concept id (or name with --by-name)
    pub target: String,

    /// Concepts already known (comma-separated ids)
    #[arg(short, long, value_delimiter = ',')]
    pub known: Vec<String>,

    /// Treat the target as a concept name
    #[arg(long)]
    pub by_name: bool,

    /// Restrict a name lookup to one domain
    #[arg(short, long, requires = "by_name")]
    pub domain: Option<String>,

    /// Fail if the path contains unverified concepts
    #[arg(long)]
    pub verified_only: bool,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Concept id
    pub id: String,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Filter by domain
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Filter by subfield
    #[arg(short, long)]
    pub subfield: Option<String>,

    /// Only list axioms
    #[arg(long)]
    pub axioms: bool,

    /// Maximum complexity level
    #[arg(long)]
    pub max_complexity: Option<u32>,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the tree command.
#[derive(Debug, Parser)]
pub struct TreeArgs {
    /// Domain (MATH, PHYSICS, CHEMISTRY, BIOLOGY, CS)
    pub domain: String,
}

/// Arguments for the export command.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
