//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

/// Checks JSX class names against the classes your stylesheets define.
#[derive(Debug, Parser)]
#[command(name = "typed-classnames")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Working directory for the check
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Path to typed-classnames.json (defaults to the one in the workspace)
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Entry stylesheet, relative to the workspace (repeatable; overrides the config file)
    #[arg(long = "stylesheet")]
    pub stylesheets: Vec<Utf8PathBuf>,

    /// Attribute holding class names (repeatable; overrides the config file)
    #[arg(long = "attribute")]
    pub attributes: Vec<String>,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Watch mode
    #[arg(long)]
    pub watch: bool,

    /// Preserve watch output (don't clear screen)
    #[arg(long = "preserve-watch-output")]
    pub preserve_watch_output: bool,

    /// Exit with error on warnings
    #[arg(long = "fail-on-warnings")]
    pub fail_on_warnings: bool,

    /// Log indexing details to stderr
    #[arg(long, short)]
    pub verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// Human-readable with code snippets
    HumanVerbose,
    /// JSON output
    Json,
    /// Machine-readable (one line per diagnostic)
    Machine,
}
