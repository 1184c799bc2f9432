//! Terminal host: the `pytransform` binary's front end over the dispatcher.

mod session;
mod terminal;

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

pub(crate) use session::run_session;
pub(crate) use terminal::Terminal;

use crate::AppError;
use crate::client::{Operation, TransformService};
use crate::dispatcher::{Dispatcher, TransformSummary};
use crate::editor::{FileDocument, TextRange};

/// Dispatcher whose prompt and notifier are the shared terminal.
pub(crate) type TerminalDispatcher<S, R, W, E> =
    Dispatcher<S, Arc<Terminal<R, W, E>>, Arc<Terminal<R, W, E>>>;

/// Transforms `file` in place and prints the worker's explanations.
pub(crate) fn transform_file<S, R, W, E>(
    dispatcher: &TerminalDispatcher<S, R, W, E>,
    terminal: &Terminal<R, W, E>,
    operation: Operation,
    file: &Path,
    selection: Option<TextRange>,
) -> Result<TransformSummary, AppError>
where
    S: TransformService,
    R: BufRead + Send,
    W: Write + Send,
    E: Write + Send,
{
    let mut document = FileDocument::open(file).map_err(AppError::OpenDocument)?;
    if let Some(selection) = selection {
        document = document.with_selection(selection);
    }
    let summary = dispatcher.transform(operation, &mut document)?;
    for explanation in &summary.explanations {
        terminal.print(&format!(
            "- {}: {}",
            explanation.transformation_type.replace('_', " "),
            explanation.explanation
        ));
    }
    Ok(summary)
}
