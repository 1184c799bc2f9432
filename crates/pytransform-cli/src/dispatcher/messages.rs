//! User-facing wording.

use crate::client::Operation;
use crate::supervisor::{WorkerExit, WorkerSpec};

pub(super) const START_QUESTION: &str =
    "The Python transformation server is not running. Would you like to start it now?";
pub(super) const SETUP_QUESTION: &str =
    "To use pytransform you need to run the Python code transformation service locally. \
     View setup instructions?";
pub(super) const NOTHING_TO_TRANSFORM: &str = "No code to transform!";
pub(super) const NO_DOCUMENT: &str = "No active document found!";
pub(super) const BUSY: &str = "A transformation is already in progress; try again when it finishes.";
pub(super) const EDIT_CONFLICT: &str =
    "The document changed while the code was being transformed; no changes were applied.";
pub(super) const MALFORMED: &str =
    "The transformation server returned a response that could not be processed.";

pub(super) fn progress_title(operation: Operation) -> &'static str {
    match operation {
        Operation::Sugarize => "Making code concise...",
        Operation::Desugarize => "Expanding code...",
    }
}

pub(super) fn success(operation: Operation) -> &'static str {
    match operation {
        Operation::Sugarize => "Code made concise successfully!",
        Operation::Desugarize => "Code expanded successfully!",
    }
}

pub(super) fn unsupported_language(expected: &str) -> String {
    format!("This command is only available for {expected} files!")
}

pub(super) fn start_declined(worker: &WorkerSpec) -> String {
    format!(
        "The transformation server is not running. Start it with `pytransform session` and the \
         `start` command, or run `{}` in {}.",
        worker.display_command(),
        worker.working_dir().display()
    )
}

pub(super) fn unavailable(endpoint: &str) -> String {
    format!(
        "Could not reach the Python transformation service at {endpoint}. \
         Make sure the service is running locally."
    )
}

pub(super) fn validation_failed(errors: &[String]) -> String {
    if errors.is_empty() {
        String::from("The transformation server could not validate the result; review it carefully.")
    } else {
        format!(
            "The transformation server flagged the result: {}",
            errors.join("; ")
        )
    }
}

/// Notice shown when the worker process exits.
#[must_use]
pub fn exit_notice(exit: &WorkerExit) -> String {
    match exit.exit_code {
        Some(code) => format!("Python server stopped with code {code}"),
        None => String::from("Python server stopped by signal"),
    }
}

/// Step-by-step guidance for running the worker by hand.
#[must_use]
pub fn setup_instructions(worker: &WorkerSpec, endpoint: &str) -> String {
    format!(
        "# Python Code Transformer Service Setup\n\
         \n\
         pytransform needs the Python transformation service running locally.\n\
         \n\
         1. Start the service with `pytransform session` and the `start` command,\n   \
            or let a transform command offer to start it.\n\
         \n\
         2. If the service fails to start automatically:\n   \
            - change into {dir}\n   \
            - run `pip install -r requirements.txt` to install dependencies\n   \
            - run `{command}` to start the server\n\
         \n\
         3. The service should then answer at {endpoint}\n\
         \n\
         4. Once the service is running, `pytransform sugarize FILE` and\n   \
            `pytransform desugarize FILE` transform Python code in place.\n",
        dir = worker.working_dir().display(),
        command = worker.display_command(),
    )
}
