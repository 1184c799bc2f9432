//! Client-side orchestration for a local Python code-transformation worker.
//!
//! The crate supervises the worker process, talks to it over HTTP, and routes
//! user commands to it, applying the rewritten code back to a document. The
//! `pytransform` binary is a thin terminal host over [`Dispatcher`]; other
//! hosts plug in by implementing [`EditorAdapter`], [`Prompt`] and
//! [`Notify`].

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::error::ErrorKind;
use pytransform_config::Config;
use tracing::info;

mod cli;
pub mod client;
mod config;
pub mod dispatcher;
pub mod editor;
mod errors;
mod host;
pub mod supervisor;
pub mod telemetry;

#[cfg(test)]
mod tests;

use cli::{Cli, CliCommand, TransformArgs};
pub use client::{
    ClientError, ClientInitError, HttpTransformClient, Operation, TransformRequest,
    TransformResult, TransformService,
};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub use dispatcher::{
    Command, CommandReport, DispatchError, DispatchPhase, DispatchSettings, Dispatcher, Notify,
    Prompt, ServerReport, TransformSummary,
};
pub use editor::{
    DocumentVersion, EditError, EditorAdapter, FileDocument, MemoryDocument, Position, TextRange,
};
pub use errors::AppError;
use host::{Terminal, TerminalDispatcher};
pub use supervisor::{Supervisor, WorkerExit, WorkerSnapshot, WorkerSpec, WorkerStatus};

/// Runs the CLI using the provided arguments and IO handles.
///
/// `stdin` feeds session commands and confirmation answers.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: W, stderr: E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
    E: Write + Send + 'static,
{
    run_with_loader(args, stdin, stdout, stderr, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    stdin: R,
    mut stdout: W,
    mut stderr: E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
    E: Write + Send + 'static,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{}", AppError::CliUsage(error));
            return ExitCode::FAILURE;
        }
    };

    let config = match loader.load(&split.config_arguments) {
        Ok(config) => config,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            return ExitCode::FAILURE;
        }
    };

    if let CliCommand::Setup = cli.command {
        let settings = DispatchSettings::from_config(&config);
        let _ = writeln!(
            stdout,
            "{}",
            dispatcher::setup_instructions(&settings.worker, &settings.endpoint.to_string())
        );
        return ExitCode::SUCCESS;
    }

    let assume_yes = config.auto_start()
        || matches!(&cli.command, CliCommand::Sugarize(args) | CliCommand::Desugarize(args) if args.yes);
    let terminal = Arc::new(Terminal::new(stdin, stdout, stderr, assume_yes));
    match execute(cli.command, &config, &terminal) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if !error.is_reported() {
                terminal.error(&error.to_string());
            }
            ExitCode::FAILURE
        }
    }
}

fn execute<R, W, E>(
    command: CliCommand,
    config: &Config,
    terminal: &Arc<Terminal<R, W, E>>,
) -> Result<(), AppError>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
    E: Write + Send + 'static,
{
    telemetry::initialise(config)?;
    let dispatcher = build_dispatcher(config, terminal)?;
    info!(
        target: dispatcher::DISPATCHER_TARGET,
        endpoint = %dispatcher.settings().endpoint,
        "dispatcher ready"
    );

    match command {
        CliCommand::Sugarize(args) => transform(&dispatcher, terminal, Operation::Sugarize, args),
        CliCommand::Desugarize(args) => {
            transform(&dispatcher, terminal, Operation::Desugarize, args)
        }
        CliCommand::Session => host::run_session(&dispatcher, terminal, config.auto_start()),
        CliCommand::Setup => Ok(()),
    }
}

fn build_dispatcher<R, W, E>(
    config: &Config,
    terminal: &Arc<Terminal<R, W, E>>,
) -> Result<TerminalDispatcher<HttpTransformClient, R, W, E>, AppError>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
    E: Write + Send + 'static,
{
    let supervisor = Arc::new(Supervisor::new());
    let listener_terminal = Arc::clone(terminal);
    supervisor.on_exit(Arc::new(move |exit: &WorkerExit| {
        if exit.status == WorkerStatus::Crashed {
            listener_terminal.warn(&dispatcher::exit_notice(exit));
        } else {
            listener_terminal.info(&dispatcher::exit_notice(exit));
        }
    }));
    let service = HttpTransformClient::from_config(config)?;
    Ok(Dispatcher::new(
        supervisor,
        service,
        Arc::clone(terminal),
        Arc::clone(terminal),
        DispatchSettings::from_config(config),
    ))
}

fn transform<S, R, W, E>(
    dispatcher: &TerminalDispatcher<S, R, W, E>,
    terminal: &Terminal<R, W, E>,
    operation: Operation,
    args: TransformArgs,
) -> Result<(), AppError>
where
    S: TransformService,
    R: BufRead + Send,
    W: Write + Send,
    E: Write + Send,
{
    host::transform_file(dispatcher, terminal, operation, &args.file, args.selection).map(|_| ())
}
