//! User interaction seams: confirmation prompts, notices and progress.

use std::sync::Arc;

/// Asks the user yes/no questions.
pub trait Prompt: Send + Sync {
    /// Returns `true` when the user accepts.
    fn confirm(&self, question: &str) -> bool;
}

/// Shows notices and progress to the user.
pub trait Notify: Send + Sync {
    /// Informational notice.
    fn info(&self, message: &str);
    /// Something worth attention that did not stop the command.
    fn warn(&self, message: &str);
    /// The command failed.
    fn error(&self, message: &str);
    /// A non-cancellable operation started.
    fn begin_progress(&self, title: &str);
    /// The operation started by [`Notify::begin_progress`] finished.
    fn end_progress(&self);
}

/// Ends a progress indication when dropped.
pub(super) struct ProgressGuard<'a, N: Notify + ?Sized> {
    notifier: &'a N,
}

impl<'a, N: Notify + ?Sized> ProgressGuard<'a, N> {
    pub(super) fn begin(notifier: &'a N, title: &str) -> Self {
        notifier.begin_progress(title);
        Self { notifier }
    }
}

impl<N: Notify + ?Sized> Drop for ProgressGuard<'_, N> {
    fn drop(&mut self) {
        self.notifier.end_progress();
    }
}

impl<T: Prompt + ?Sized> Prompt for Arc<T> {
    fn confirm(&self, question: &str) -> bool {
        (**self).confirm(question)
    }
}

impl<T: Notify + ?Sized> Notify for Arc<T> {
    fn info(&self, message: &str) {
        (**self).info(message);
    }

    fn warn(&self, message: &str) {
        (**self).warn(message);
    }

    fn error(&self, message: &str) {
        (**self).error(message);
    }

    fn begin_progress(&self, title: &str) {
        (**self).begin_progress(title);
    }

    fn end_progress(&self) {
        (**self).end_progress();
    }
}
