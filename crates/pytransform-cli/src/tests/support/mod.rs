//! Shared doubles for unit and behaviour tests.

pub(crate) mod cli;
pub(crate) mod fake_worker;

use std::fs;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use pytransform_config::ServiceEndpoint;
use tempfile::TempDir;

use crate::dispatcher::{DispatchSettings, Notify, Prompt};
use crate::supervisor::{Supervisor, WorkerSpec, WorkerStatus};

/// One notice recorded by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notice {
    Info(String),
    Warn(String),
    Error(String),
    ProgressBegin(String),
    ProgressEnd,
}

/// Notifier that keeps every notice for later assertions.
#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn infos(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Info(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn warnings(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Warn(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

impl Notify for RecordingNotifier {
    fn info(&self, message: &str) {
        self.push(Notice::Info(message.to_owned()));
    }

    fn warn(&self, message: &str) {
        self.push(Notice::Warn(message.to_owned()));
    }

    fn error(&self, message: &str) {
        self.push(Notice::Error(message.to_owned()));
    }

    fn begin_progress(&self, title: &str) {
        self.push(Notice::ProgressBegin(title.to_owned()));
    }

    fn end_progress(&self) {
        self.push(Notice::ProgressEnd);
    }
}

/// Prompt with a fixed answer that records each question.
#[derive(Debug)]
pub(crate) struct RecordingPrompt {
    answer: bool,
    questions: Mutex<Vec<String>>,
}

impl RecordingPrompt {
    pub(crate) fn answering(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            questions: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn questions(&self) -> Vec<String> {
        self.questions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Prompt for RecordingPrompt {
    fn confirm(&self, question: &str) -> bool {
        self.questions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(question.to_owned());
        self.answer
    }
}

/// A worker directory holding a shell script entry point.
pub(crate) struct ScriptWorker {
    _dir: TempDir,
    pub spec: WorkerSpec,
}

impl ScriptWorker {
    pub(crate) fn new(script: &str) -> Result<Self> {
        let dir = TempDir::new().context("create worker dir")?;
        fs::write(dir.path().join("worker.sh"), script).context("write worker script")?;
        let spec = WorkerSpec::new(dir.path(), "sh", "worker.sh");
        Ok(Self { _dir: dir, spec })
    }

    /// A worker that runs until terminated.
    pub(crate) fn long_running() -> Result<Self> {
        Self::new("exec sleep 30\n")
    }
}

/// Settings pointing at `endpoint` with a short startup bound.
pub(crate) fn settings_for(worker: WorkerSpec, endpoint: ServiceEndpoint) -> DispatchSettings {
    DispatchSettings {
        worker,
        endpoint,
        language: String::from("python"),
        startup_timeout: Duration::from_secs(2),
    }
}

/// Settings whose worker cannot be launched.
pub(crate) fn unlaunchable_settings() -> DispatchSettings {
    settings_for(
        WorkerSpec::new("/nonexistent/python-server", "python3", "app.py"),
        ServiceEndpoint::http("127.0.0.1", 9, "/process_code"),
    )
}

/// Polls until the supervisor reports `expected`.
pub(crate) fn wait_for_status(supervisor: &Supervisor, expected: WorkerStatus) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(5);
    while supervisor.status() != expected {
        if Instant::now() >= deadline {
            bail!(
                "supervisor never reached {expected}; last snapshot {:?}",
                supervisor.snapshot()
            );
        }
        thread::sleep(Duration::from_millis(20));
    }
    Ok(())
}

/// Endpoint on a port nothing listens on.
pub(crate) fn closed_endpoint() -> Result<ServiceEndpoint> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).context("bind probe port")?;
    let port = listener.local_addr().context("probe port address")?.port();
    drop(listener);
    Ok(ServiceEndpoint::http("127.0.0.1", port, "/process_code"))
}
