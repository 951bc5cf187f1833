//! CLI argument parsing using clap.
//!
//! Contains the Cli struct, Commands enum, and the `bundle`/`check` options.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Bundles a multi-module Python program into a single self-contained file.
#[derive(Parser)]
#[command(
    name = "cribo",
    version = env!("CARGO_PKG_VERSION"),
    about = "Bundle a multi-module Python program into one file",
    long_about = "Resolves a Python program's first-party import graph and emits a single, \
self-contained source file with third-party and stdlib imports left untouched.",
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to a custom cribo.toml file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Bundle an entry file and its first-party imports into one file
    #[command(
        about = "Bundle an entry file into a single self-contained file",
        after_help = "Examples:\n  cribo bundle app/main.py -o dist/bundle.py\n  cribo bundle app/main.py -o dist/bundle.py --source-root app --source-root vendor\n  cribo bundle app/main.py -o dist/bundle.py --strict --emit-requirements"
    )]
    Bundle {
        /// Entry Python file to bundle
        entry: PathBuf,

        /// Where to write the bundled file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Additional first-party source root to search (repeatable)
        #[arg(long = "source-root", value_name = "DIR")]
        source_roots: Vec<PathBuf>,

        /// Write a requirements.txt listing every third-party package used
        #[arg(long)]
        emit_requirements: bool,

        /// Keep every top-level definition instead of dropping unreachable ones
        #[arg(long)]
        no_tree_shake: bool,

        /// Promote semantic warnings to fatal errors
        #[arg(long)]
        strict: bool,
    },

    /// Run classification through semantic analysis without emitting a bundle
    #[command(
        about = "Check an entry file for bundling diagnostics without writing output",
        after_help = "Examples:\n  cribo check app/main.py\n  cribo check app/main.py --source-root app"
    )]
    Check {
        /// Entry Python file to check
        entry: PathBuf,

        /// Additional first-party source root to search (repeatable)
        #[arg(long = "source-root", value_name = "DIR")]
        source_roots: Vec<PathBuf>,
    },

    /// Generate shell completion scripts
    #[command(about = "Install or print shell completion scripts")]
    Completions {
        /// Target shell; detected from the environment if omitted
        shell: Option<CompletionShell>,
    },

    /// Write a default cribo.toml in the current directory
    #[command(about = "Create a default cribo.toml configuration file")]
    Init {
        /// Overwrite an existing cribo.toml
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
