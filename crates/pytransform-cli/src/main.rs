//! CLI entrypoint for `pytransform`.
//!
//! Delegates to [`pytransform_cli::run`], which loads configuration, parses
//! the command line and drives the transformation worker.

use std::io::{self, BufReader};
use std::process::ExitCode;

fn main() -> ExitCode {
    pytransform_cli::run(
        std::env::args_os(),
        BufReader::new(io::stdin()),
        io::stdout(),
        io::stderr(),
    )
}
