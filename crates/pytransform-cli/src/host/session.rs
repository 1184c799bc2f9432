//! Interactive command loop.
//!
//! One supervisor lives for the whole session, so a worker started by one
//! command serves the following ones. The worker is stopped when the session
//! ends.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use tracing::debug;

use super::{Terminal, TerminalDispatcher, transform_file};
use crate::AppError;
use crate::client::{Operation, TransformService};
use crate::dispatcher::{Command, Notify};
use crate::editor::TextRange;

const HELP: &str = "\
Commands:
  sugarize FILE [LINE:COL-LINE:COL]    make code concise
  desugarize FILE [LINE:COL-LINE:COL]  expand syntactic sugar
  start                                start the transformation server
  stop                                 stop the transformation server
  status                               show server status
  help                                 show this help
  quit                                 end the session";

#[derive(Debug, PartialEq, Eq)]
enum SessionCommand {
    Transform {
        operation: Operation,
        file: PathBuf,
        selection: Option<TextRange>,
    },
    Lifecycle(Command),
    Status,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Option<SessionCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    if verb.starts_with('#') {
        return Ok(None);
    }
    let command = match verb.to_ascii_lowercase().as_str() {
        "status" => SessionCommand::Status,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => match other.parse::<Command>().map_err(|error| error.to_string())? {
            command @ (Command::StartServer | Command::StopServer) => {
                SessionCommand::Lifecycle(command)
            }
            command => {
                let operation = command
                    .operation()
                    .ok_or_else(|| format!("'{command}' does not transform code"))?;
                let file = words
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| format!("usage: {command} FILE [LINE:COL-LINE:COL]"))?;
                let selection = words
                    .next()
                    .map(str::parse::<TextRange>)
                    .transpose()
                    .map_err(|error| error.to_string())?;
                SessionCommand::Transform {
                    operation,
                    file,
                    selection,
                }
            }
        },
    };
    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument '{extra}'"));
    }
    Ok(Some(command))
}

/// Runs commands read from the terminal until `quit` or end of input.
pub(crate) fn run_session<S, R, W, E>(
    dispatcher: &TerminalDispatcher<S, R, W, E>,
    terminal: &Terminal<R, W, E>,
    auto_start: bool,
) -> Result<(), AppError>
where
    S: TransformService,
    R: BufRead + Send,
    W: Write + Send,
    E: Write + Send,
{
    if auto_start {
        let _ = dispatcher.start_server();
    }

    while let Some(line) = terminal.read_line().map_err(AppError::SessionInput)? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                terminal.error(&format!("{message}; type `help` for commands"));
                continue;
            }
        };
        debug!(target: crate::dispatcher::DISPATCHER_TARGET, ?command, "session command");
        match command {
            SessionCommand::Transform {
                operation,
                file,
                selection,
            } => match transform_file(dispatcher, terminal, operation, &file, selection) {
                Ok(_) => {}
                Err(error) if error.is_reported() => {}
                Err(error) => terminal.error(&error.to_string()),
            },
            SessionCommand::Lifecycle(command) => {
                let _ = dispatcher.dispatch(command, None);
            }
            SessionCommand::Status => print_status(dispatcher, terminal),
            SessionCommand::Help => terminal.print(HELP),
            SessionCommand::Quit => break,
        }
    }

    if dispatcher.supervisor().status().is_active() {
        let _ = dispatcher.stop_server();
    }
    Ok(())
}

fn print_status<S, R, W, E>(
    dispatcher: &TerminalDispatcher<S, R, W, E>,
    terminal: &Terminal<R, W, E>,
) where
    S: TransformService,
    R: BufRead + Send,
    W: Write + Send,
    E: Write + Send,
{
    let snapshot = dispatcher.supervisor().snapshot();
    let mut worker = format!("worker: {}", snapshot.status);
    if let Some(handle) = snapshot.handle {
        worker.push_str(&format!(" ({handle})"));
    }
    if let Some(code) = snapshot.exit_code {
        worker.push_str(&format!(", last exit code {code}"));
    }
    terminal.print(&worker);

    let endpoint = &dispatcher.settings().endpoint;
    let reachability = if dispatcher.service().probe() {
        "reachable"
    } else {
        "unreachable"
    };
    terminal.print(&format!("endpoint: {endpoint} ({reachability})"));
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::editor::Position;

    #[rstest]
    #[case("", None)]
    #[case("   ", None)]
    #[case("# comment", None)]
    #[case("status", Some(SessionCommand::Status))]
    #[case("QUIT", Some(SessionCommand::Quit))]
    #[case("start", Some(SessionCommand::Lifecycle(Command::StartServer)))]
    #[case("stop", Some(SessionCommand::Lifecycle(Command::StopServer)))]
    fn parses_simple_commands(#[case] line: &str, #[case] expected: Option<SessionCommand>) {
        assert_eq!(parse_line(line), Ok(expected));
    }

    #[test]
    fn parses_transform_with_range() {
        assert_eq!(
            parse_line("desugarize src/app.py 2:1-2:9"),
            Ok(Some(SessionCommand::Transform {
                operation: Operation::Desugarize,
                file: PathBuf::from("src/app.py"),
                selection: Some(TextRange::new(Position::new(1, 0), Position::new(1, 8))),
            }))
        );
    }

    #[rstest]
    #[case::missing_file("sugarize")]
    #[case::bad_range("sugarize a.py 1:1")]
    #[case::extra("stop now")]
    #[case::unknown("reticulate")]
    fn rejects_malformed_lines(#[case] line: &str) {
        assert!(parse_line(line).is_err());
    }
}
