use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::fmt::{FmtArgs, Verbosity};

/// Quill source code formatter.
///
/// Produces a canonical rendering of Quill documents: stable indentation,
/// width-aware line breaking, and comments kept next to the code they
/// describe.
///
/// EXAMPLES:
///     quill fmt main.quill          Format a file in place
///     quill fmt src/ --check        Check formatting recursively
///     quill fmt main.quill --stdout Print the result without writing
#[derive(Parser)]
#[command(name = "quill")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format Quill source files
    ///
    /// Files are rewritten in place unless --check or --stdout is given.
    /// Directories are searched recursively for .quill files.
    #[command(visible_alias = "f")]
    Fmt {
        /// Files or directories to format
        #[arg(required = true)]
        paths: Vec<String>,
        /// Check whether files are formatted without writing
        #[arg(long)]
        check: bool,
        /// Print formatted output to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Spaces per indentation level
        #[arg(long)]
        indent: Option<usize>,
        /// Indent with tabs instead of spaces
        #[arg(long)]
        tabs: bool,
        /// Maximum line width
        #[arg(long)]
        max_width: Option<usize>,
        /// Newline style: lf or crlf
        #[arg(long)]
        newline: Option<String>,
        /// Suppress all non-error output
        #[arg(long, short = 'q')]
        quiet: bool,
        /// Detailed output with timing information
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fmt {
            paths,
            check,
            stdout,
            config,
            indent,
            tabs,
            max_width,
            newline,
            quiet,
            verbose,
        } => {
            let verbosity = if quiet {
                Verbosity::Quiet
            } else if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            commands::fmt::run(FmtArgs {
                paths,
                check,
                stdout,
                config_path: config,
                indent_size: indent,
                tabs,
                max_width,
                newline,
                verbosity,
            })
        }
    }
}
