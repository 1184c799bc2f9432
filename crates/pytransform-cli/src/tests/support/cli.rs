//! Harness for running the CLI in-process against captured streams.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use pytransform_config::Config;
use tempfile::TempDir;

use super::fake_worker::FakeWorker;
use crate::{AppError, ConfigLoader, run_with_loader};

/// Loader that ignores arguments and returns a fixed configuration.
pub(crate) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(crate) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Cloneable writer whose contents outlive the CLI run.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn text(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// State shared by CLI-level tests and behaviour scenarios.
pub(crate) struct CliWorld {
    pub(crate) config: Config,
    pub(crate) workspace: TempDir,
    pub(crate) worker: Option<FakeWorker>,
    pub(crate) input: String,
    pub(crate) stdout: SharedBuffer,
    pub(crate) stderr: SharedBuffer,
    pub(crate) exit_code: Option<ExitCode>,
}

impl CliWorld {
    pub(crate) fn new() -> Result<Self> {
        let workspace = TempDir::new().context("create workspace")?;
        let worker_dir = Utf8PathBuf::from_path_buf(workspace.path().join("python-server"))
            .map_err(|path| anyhow::anyhow!("non-UTF-8 workspace {}", path.display()))?;
        let config = Config {
            service_url: super::closed_endpoint()?,
            worker_dir,
            connect_timeout_ms: 500,
            request_timeout_ms: 2_000,
            startup_timeout_ms: 1_000,
            log_filter: String::from("off"),
            ..Config::default()
        };
        Ok(Self {
            config,
            workspace,
            worker: None,
            input: String::new(),
            stdout: SharedBuffer::default(),
            stderr: SharedBuffer::default(),
            exit_code: None,
        })
    }

    /// Points the configuration at `worker` and keeps it alive.
    pub(crate) fn attach(&mut self, worker: FakeWorker) {
        self.config.service_url = worker.endpoint();
        self.worker = Some(worker);
    }

    pub(crate) fn path(&self, name: &str) -> PathBuf {
        self.workspace.path().join(name)
    }

    pub(crate) fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub(crate) fn read_file(&self, name: &str) -> Result<String> {
        let path = self.path(name);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    /// Runs `pytransform` with whitespace-separated `command`; bare file
    /// names resolve inside the workspace.
    pub(crate) fn run(&mut self, command: &str) {
        self.stdout = SharedBuffer::default();
        self.stderr = SharedBuffer::default();
        let mut args = vec![OsString::from("pytransform")];
        args.extend(command.split_whitespace().map(|token| {
            let token = token.trim_matches('"');
            if Path::new(token).extension().is_some() && !token.contains('/') {
                self.path(token).into_os_string()
            } else {
                OsString::from(token)
            }
        }));
        let loader = StaticConfigLoader::new(self.config.clone());
        let exit = run_with_loader(
            args,
            Cursor::new(self.input.clone().into_bytes()),
            self.stdout.clone(),
            self.stderr.clone(),
            &loader,
        );
        self.exit_code = Some(exit);
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.worker
            .as_ref()
            .map(FakeWorker::requests)
            .unwrap_or_default()
    }
}
