//! Maps user commands onto the supervisor, the service client and the
//! document.
//!
//! The dispatcher is the only component with user-facing behaviour. It never
//! mutates supervisor state except through `start` and `stop`, and it treats
//! supervisor status as advisory: liveness is decided by probing the endpoint
//! and by the outcome of the exchange itself.

mod command;
mod error;
mod interaction;
mod messages;
mod phase;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pytransform_config::{Config, ServiceEndpoint};
use tracing::{debug, info, warn};

use crate::client::{ClientError, Operation, TransformRequest, TransformResult, TransformService};
use crate::editor::{DocumentVersion, EditError, EditorAdapter, TextRange};
use crate::supervisor::{StartOutcome, StopOutcome, Supervisor, WorkerSpec, WorkerStatus};

pub use command::{Command, CommandReport, ServerReport, TransformSummary, UnknownCommand};
pub use error::DispatchError;
pub use interaction::{Notify, Prompt};
pub use messages::{exit_notice, setup_instructions};
pub use phase::DispatchPhase;

use interaction::ProgressGuard;
use phase::{PhaseCell, PhaseGuard};

/// Tracing target for dispatcher events.
pub(crate) const DISPATCHER_TARGET: &str = "pytransform::dispatcher";

const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Static inputs of the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    /// How to launch the worker.
    pub worker: WorkerSpec,
    /// Endpoint the worker serves, used in guidance.
    pub endpoint: ServiceEndpoint,
    /// Language a document must have to be transformed.
    pub language: String,
    /// Upper bound on waiting for a freshly started worker to listen.
    pub startup_timeout: Duration,
}

impl DispatchSettings {
    /// Derives the settings from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            worker: WorkerSpec::from_config(config),
            endpoint: config.service_url().clone(),
            language: config.language().to_owned(),
            startup_timeout: config.startup_timeout(),
        }
    }
}

/// Routes commands to the worker and applies results.
pub struct Dispatcher<S, P, N> {
    supervisor: Arc<Supervisor>,
    service: S,
    prompt: P,
    notifier: N,
    settings: DispatchSettings,
    phase: PhaseCell,
}

struct Resolved {
    request: TransformRequest,
    range: TextRange,
    from_selection: bool,
    version: DocumentVersion,
}

impl<S, P, N> Dispatcher<S, P, N>
where
    S: TransformService,
    P: Prompt,
    N: Notify,
{
    /// Builds a dispatcher over a shared supervisor.
    pub fn new(
        supervisor: Arc<Supervisor>,
        service: S,
        prompt: P,
        notifier: N,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            supervisor,
            service,
            prompt,
            notifier,
            settings,
            phase: PhaseCell::default(),
        }
    }

    /// Current transform phase.
    #[must_use]
    pub fn phase(&self) -> DispatchPhase {
        self.phase.get()
    }

    /// Supervisor the dispatcher starts and stops.
    #[must_use]
    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Client used for probes and requests.
    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Static settings.
    #[must_use]
    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Runs `command`, using `editor` for transforms.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the command did not complete. The user
    /// has already been notified of the failure.
    pub fn dispatch(
        &self,
        command: Command,
        editor: Option<&mut dyn EditorAdapter>,
    ) -> Result<CommandReport, DispatchError> {
        debug!(target: DISPATCHER_TARGET, %command, "dispatching command");
        match command.operation() {
            Some(operation) => {
                let Some(editor) = editor else {
                    self.notifier.error(messages::NO_DOCUMENT);
                    return Err(DispatchError::NoDocument);
                };
                self.transform(operation, editor)
                    .map(CommandReport::Transformed)
            }
            None if command == Command::StartServer => {
                self.start_server().map(CommandReport::Server)
            }
            None => self.stop_server().map(CommandReport::Server),
        }
    }

    /// Starts the worker and reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Start`] when the worker cannot be started.
    pub fn start_server(&self) -> Result<ServerReport, DispatchError> {
        match self.supervisor.start(&self.settings.worker) {
            Ok(StartOutcome::Started(handle)) => {
                self.notifier.info("Python transformation server started.");
                Ok(ServerReport::Started(handle))
            }
            Ok(StartOutcome::AlreadyRunning(handle)) => {
                self.notifier
                    .info("Python transformation server is already running.");
                Ok(ServerReport::AlreadyRunning(handle))
            }
            Err(error) => {
                self.notifier
                    .error(&format!("Failed to start Python server: {error}"));
                Err(error.into())
            }
        }
    }

    /// Stops the worker and reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Stop`] when termination cannot be delivered.
    pub fn stop_server(&self) -> Result<ServerReport, DispatchError> {
        match self.supervisor.stop() {
            Ok(StopOutcome::Stopping(handle)) => {
                self.notifier.info("Python transformation server stopped.");
                Ok(ServerReport::Stopping(handle))
            }
            Ok(StopOutcome::AlreadyStopped) => {
                self.notifier
                    .info("Python transformation server is not running.");
                Ok(ServerReport::AlreadyStopped)
            }
            Err(error) => {
                self.notifier
                    .error(&format!("Failed to stop Python server: {error}"));
                Err(error.into())
            }
        }
    }

    /// Transforms the selection, or the whole document, in place.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when no input was found, the service was
    /// unavailable, the worker failed, or the document changed before the
    /// result could be applied. The document is untouched in every error
    /// case.
    pub fn transform(
        &self,
        operation: Operation,
        editor: &mut dyn EditorAdapter,
    ) -> Result<TransformSummary, DispatchError> {
        let Some(phase) = self.phase.claim() else {
            self.notifier.warn(messages::BUSY);
            return Err(DispatchError::Busy);
        };

        let resolved = self.resolve(operation, editor)?;
        let started_worker = self.ensure_service()?;
        phase.advance(DispatchPhase::Ready);

        let result = self.exchange(&phase, &resolved.request)?;
        self.apply(editor, resolved, result, started_worker)
    }

    fn resolve(
        &self,
        operation: Operation,
        editor: &dyn EditorAdapter,
    ) -> Result<Resolved, DispatchError> {
        let expected = self.settings.language.as_str();
        if !editor.language_id().eq_ignore_ascii_case(expected) {
            self.notifier.error(&messages::unsupported_language(expected));
            return Err(DispatchError::UnsupportedLanguage {
                language: editor.language_id().to_owned(),
                expected: expected.to_owned(),
            });
        }

        let selection = editor
            .selection()
            .map(TextRange::normalized)
            .filter(|range| !range.is_empty());
        let from_selection = selection.is_some();
        let range = selection.unwrap_or_else(|| editor.full_range());
        let version = editor.version();
        let code = editor.text(range).inspect_err(|error| {
            self.notifier.error(&error.to_string());
        })?;

        if code.is_empty() {
            self.notifier.error(messages::NOTHING_TO_TRANSFORM);
            return Err(DispatchError::NothingToTransform);
        }

        debug!(
            target: DISPATCHER_TARGET,
            %operation,
            %range,
            from_selection,
            %version,
            "resolved transform input"
        );
        Ok(Resolved {
            request: TransformRequest::new(code, operation),
            range,
            from_selection,
            version,
        })
    }

    /// Makes sure something is serving the endpoint, starting the worker
    /// with the user's consent. Returns whether the worker was started.
    fn ensure_service(&self) -> Result<bool, DispatchError> {
        match self.supervisor.status() {
            WorkerStatus::Running => return Ok(false),
            WorkerStatus::Starting => {
                self.await_readiness();
                return Ok(false);
            }
            WorkerStatus::Stopped | WorkerStatus::Crashed => {}
        }

        if self.service.probe() {
            debug!(
                target: DISPATCHER_TARGET,
                endpoint = %self.settings.endpoint,
                "endpoint already served; using existing worker"
            );
            return Ok(false);
        }

        if !self.prompt.confirm(messages::START_QUESTION) {
            self.notifier
                .info(&messages::start_declined(&self.settings.worker));
            return Err(DispatchError::StartDeclined);
        }

        let started = matches!(self.start_server()?, ServerReport::Started(_));
        self.await_readiness();
        Ok(started)
    }

    /// Waits, bounded by the startup timeout, until the endpoint accepts
    /// connections or the worker exits. Never sends a transform request.
    fn await_readiness(&self) {
        let deadline = Instant::now() + self.settings.startup_timeout;
        loop {
            if self.service.probe() {
                debug!(target: DISPATCHER_TARGET, "worker is accepting connections");
                return;
            }
            if !self.supervisor.status().is_active() {
                warn!(
                    target: DISPATCHER_TARGET,
                    snapshot = ?self.supervisor.snapshot(),
                    "worker exited before accepting connections"
                );
                return;
            }
            if Instant::now() >= deadline {
                warn!(
                    target: DISPATCHER_TARGET,
                    timeout = ?self.settings.startup_timeout,
                    "worker not accepting connections within startup timeout"
                );
                return;
            }
            thread::sleep(READINESS_POLL_INTERVAL);
        }
    }

    fn exchange(
        &self,
        phase: &PhaseGuard<'_>,
        request: &TransformRequest,
    ) -> Result<TransformResult, DispatchError> {
        let _progress =
            ProgressGuard::begin(&self.notifier, messages::progress_title(request.operation()));
        phase.advance(DispatchPhase::InFlight);
        self.service
            .transform(request)
            .inspect_err(|error| self.report_client_error(error))
            .map_err(DispatchError::from)
    }

    fn report_client_error(&self, error: &ClientError) {
        match error {
            ClientError::Unreachable { .. } | ClientError::Timeout { .. } => {
                info!(
                    target: DISPATCHER_TARGET,
                    error = %error,
                    status = %self.supervisor.status(),
                    "transformation service unavailable"
                );
                self.notifier
                    .error(&messages::unavailable(&self.settings.endpoint.to_string()));
                if self.prompt.confirm(messages::SETUP_QUESTION) {
                    self.notifier.info(&setup_instructions(
                        &self.settings.worker,
                        &self.settings.endpoint.to_string(),
                    ));
                }
            }
            ClientError::ServerError { message, .. } => {
                self.notifier.error(&format!("Error: {message}"));
            }
            ClientError::MalformedResponse { detail } => {
                warn!(
                    target: DISPATCHER_TARGET,
                    detail = %detail,
                    "discarding malformed worker response"
                );
                self.notifier.error(messages::MALFORMED);
            }
        }
    }

    fn apply(
        &self,
        editor: &mut dyn EditorAdapter,
        resolved: Resolved,
        result: TransformResult,
        started_worker: bool,
    ) -> Result<TransformSummary, DispatchError> {
        if !result.validation.is_valid {
            self.notifier
                .warn(&messages::validation_failed(&result.validation.errors));
        }

        let operation = resolved.request.operation();
        if let Err(error) = editor.replace(resolved.range, &result.transformed_code, &resolved.version)
        {
            match &error {
                EditError::Conflict { .. } => self.notifier.warn(messages::EDIT_CONFLICT),
                EditError::InvalidRange { .. } | EditError::Io { .. } => {
                    self.notifier.error(&error.to_string());
                }
            }
            return Err(error.into());
        }

        self.notifier.info(messages::success(operation));
        info!(
            target: DISPATCHER_TARGET,
            %operation,
            range = %resolved.range,
            explanations = result.explanations.len(),
            "transformation applied"
        );
        Ok(TransformSummary {
            operation,
            range: resolved.range,
            from_selection: resolved.from_selection,
            started_worker,
            validation: result.validation,
            explanations: result.explanations,
        })
    }
}
