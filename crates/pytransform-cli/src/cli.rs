//! Command-line interface definitions for `pytransform`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::editor::TextRange;

/// Sends Python code to a local transformation server and writes the result
/// back in place.
#[derive(Parser, Debug)]
#[command(name = "pytransform", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Makes the file, or the selected range, concise.
    Sugarize(TransformArgs),
    /// Expands syntactic sugar in the file, or the selected range.
    Desugarize(TransformArgs),
    /// Reads commands from standard input, keeping the worker alive between
    /// them.
    Session,
    /// Prints instructions for running the transformation server by hand.
    Setup,
}

/// Arguments shared by the transform subcommands.
#[derive(Args, Debug, Clone)]
pub(crate) struct TransformArgs {
    /// Python file to transform in place.
    #[arg(value_name = "FILE")]
    pub(crate) file: PathBuf,
    /// One-based range to transform instead of the whole file.
    #[arg(long, value_name = "LINE:COL-LINE:COL")]
    pub(crate) selection: Option<TextRange>,
    /// Starts the server without asking when it is not running.
    #[arg(short = 'y', long)]
    pub(crate) yes: bool,
}
