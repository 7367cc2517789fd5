//! Injection coordinator.
//!
//! The coordinator owns everything for one document context: the isolated
//! executor, the lifecycle scheduler, and the response bus. Declared content
//! scripts are matched against the document URL once, when they are
//! registered, and their payloads are bound to the declared phase. Lifecycle
//! failures are logged and never leave this process; ad-hoc failures are
//! returned to the requester.

use std::fmt;
use std::sync::Arc;

use graft_core::{
    ContentScript, DocumentUrl, ExtensionDeclaration, ExtensionId, LateRegistration,
    LifecyclePhase, Payload,
};
use graft_telemetry::{ExecutionContext, ExecutionGuard};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::capability::CapabilityProvider;
use crate::channel::{
    DEFAULT_RESPONSE_CAPACITY, ExecuteScriptRequest, ExecuteScriptResponse, HostMessage,
    ResponseBus, ResponseReceiver,
};
use crate::document::Document;
use crate::error::{InjectorResult, SchedulerError};
use crate::executor::IsolatedExecutor;
use crate::scheduler::{LifecycleScheduler, SchedulerState, Task};

/// Settings fixed when the document context is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectorSettings {
    /// Passed to the capability provider for every execution.
    pub is_background: bool,
    /// Tick once right after the idle phase so deferred work settles.
    pub drain_ticks_on_idle: bool,
    /// Capacity of the response bus.
    pub response_capacity: usize,
    /// Policy for start/end scripts registered after their phase fired.
    pub late_registration: LateRegistration,
}

impl Default for InjectorSettings {
    fn default() -> Self {
        Self {
            is_background: false,
            drain_ticks_on_idle: true,
            response_capacity: DEFAULT_RESPONSE_CAPACITY,
            late_registration: LateRegistration::Reject,
        }
    }
}

/// Running totals for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionReport {
    /// Content scripts whose patterns matched the document.
    pub matched: usize,
    /// Content scripts discarded because no pattern matched.
    pub skipped: usize,
    /// Payloads bound to a lifecycle phase.
    pub scheduled: usize,
    /// Payloads refused because their phase had already fired.
    pub rejected: usize,
    /// Script payloads that ran to completion.
    pub executed: usize,
    /// Script payloads that failed to compile or threw.
    pub failed: usize,
    /// Style elements appended to the document.
    pub styles_injected: usize,
}

fn bump(counter: &mut usize) {
    *counter = counter.saturating_add(1);
}

/// State the lifecycle tasks run against.
pub(crate) struct InjectionContext {
    executor: IsolatedExecutor,
    provider: Arc<dyn CapabilityProvider>,
    settings: InjectorSettings,
    report: InjectionReport,
}

impl InjectionContext {
    fn run_script(&mut self, extension_id: &ExtensionId, payload: &Payload, phase: LifecyclePhase) {
        let mut guard = ExecutionGuard::new(ExecutionContext::lifecycle(
            extension_id.as_str(),
            payload.source.as_str(),
            phase.as_str(),
        ));
        let capability = self
            .provider
            .capability_context(extension_id, self.settings.is_background);
        let result =
            self.executor
                .run_script(extension_id, &payload.source, &payload.code, &capability);
        guard.record(result.is_ok());
        match result {
            Ok(_) => bump(&mut self.report.executed),
            Err(e) => {
                bump(&mut self.report.failed);
                warn!(error = %e, "Content script failed");
            },
        }
    }

    fn run_stylesheet(&mut self, payload: &Payload) {
        self.executor.run_stylesheet(&payload.source, &payload.code);
    }

    fn flush_styles(&mut self) {
        let appended = self.executor.flush_styles();
        self.report.styles_injected = self.report.styles_injected.saturating_add(appended);
    }
}

/// Orchestrates matching, scheduling, and execution for one document.
pub struct Coordinator {
    context: InjectionContext,
    scheduler: LifecycleScheduler<InjectionContext>,
    responses: ResponseBus,
}

impl Coordinator {
    /// Create a coordinator for the document at `url`.
    #[must_use]
    pub fn new(
        settings: InjectorSettings,
        url: DocumentUrl,
        provider: Arc<dyn CapabilityProvider>,
    ) -> Self {
        info!(url = %url, "Creating document context");
        Self {
            context: InjectionContext {
                executor: IsolatedExecutor::new(url),
                provider,
                settings,
                report: InjectionReport::default(),
            },
            scheduler: LifecycleScheduler::with_late_registration(settings.late_registration),
            responses: ResponseBus::with_capacity(settings.response_capacity),
        }
    }

    /// Create a coordinator and register a whole declaration feed.
    #[must_use]
    pub fn with_declarations(
        settings: InjectorSettings,
        url: DocumentUrl,
        provider: Arc<dyn CapabilityProvider>,
        declarations: &[ExtensionDeclaration],
    ) -> Self {
        let mut coordinator = Self::new(settings, url, provider);
        for declaration in declarations {
            coordinator.inject_all(&declaration.extension_id, &declaration.content_scripts);
        }
        coordinator
    }

    /// Register an extension's content scripts against this document.
    ///
    /// Scripts whose patterns do not match are discarded. Every payload of a
    /// matching script is bound to the script's phase. A start or end script
    /// whose phase has already fired is dropped as a whole unless the settings
    /// defer late registrations; the rest are unaffected.
    ///
    /// Returns the number of matching scripts.
    pub fn inject_all(&mut self, extension_id: &ExtensionId, scripts: &[ContentScript]) -> usize {
        let url = self.context.executor.document().url().clone();
        let mut matched = 0_usize;

        for script in scripts {
            if !script.applies_to(&url) {
                bump(&mut self.context.report.skipped);
                continue;
            }
            matched = matched.saturating_add(1);
            bump(&mut self.context.report.matched);

            if let Err(e) = self.schedule_script(extension_id, script) {
                warn!(
                    extension = %extension_id,
                    run_at = script.run_at.as_str(),
                    error = %e,
                    "Dropping content script"
                );
            }
        }

        debug!(extension = %extension_id, declared = scripts.len(), matched, "Content scripts registered");
        matched
    }

    fn schedule_script(
        &mut self,
        extension_id: &ExtensionId,
        script: &ContentScript,
    ) -> Result<(), SchedulerError> {
        let phase = script.run_at.phase();
        let mut tasks: Vec<Task<InjectionContext>> =
            Vec::with_capacity(script.js.len().saturating_add(script.css.len()));

        for payload in &script.js {
            let extension_id = extension_id.clone();
            let payload = payload.clone();
            tasks.push(Box::new(move |ctx: &mut InjectionContext| {
                ctx.run_script(&extension_id, &payload, phase);
            }));
        }
        for payload in &script.css {
            let payload = payload.clone();
            tasks.push(Box::new(move |ctx: &mut InjectionContext| {
                ctx.run_stylesheet(&payload);
            }));
        }

        // All payloads share one phase, so the first refusal covers the rest.
        if !self.scheduler.accepts(phase) {
            self.context.report.rejected = self.context.report.rejected.saturating_add(tasks.len());
            return Err(SchedulerError::PhasePassed { phase });
        }
        for task in tasks {
            self.scheduler.schedule(phase, task)?;
            bump(&mut self.context.report.scheduled);
        }
        Ok(())
    }

    /// Raise a lifecycle event and run everything bound to it.
    ///
    /// Returns the number of tasks run.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::OutOfOrder`] if the event is repeated or
    /// arrives before its predecessor. Nothing runs in that case.
    pub fn fire(&mut self, phase: LifecyclePhase) -> InjectorResult<usize> {
        let tasks = self.scheduler.advance(phase)?;
        self.context.executor.enter_phase(phase);

        let count = tasks.len();
        for task in tasks {
            task(&mut self.context);
        }

        if phase == LifecyclePhase::Idle {
            self.context.flush_styles();
            if self.context.settings.drain_ticks_on_idle {
                self.tick();
            }
        }
        Ok(count)
    }

    /// Run tasks deferred since the last tick and append pending styles.
    ///
    /// Returns the number of tasks run.
    pub fn tick(&mut self) -> usize {
        let tasks = self.scheduler.tick();
        let count = tasks.len();
        for task in tasks {
            task(&mut self.context);
        }
        self.context.flush_styles();
        count
    }

    /// Run an ad-hoc request immediately and publish its response.
    ///
    /// Runs regardless of the lifecycle state.
    pub fn handle_ad_hoc(&mut self, request: &ExecuteScriptRequest) -> ExecuteScriptResponse {
        let mut guard = ExecutionGuard::new(ExecutionContext::request(
            request.extension_id.as_str(),
            request.source_id.as_str(),
            request.request_id.0,
            request.sender.0,
        ));

        let capability = self
            .context
            .provider
            .capability_context(&request.extension_id, self.context.settings.is_background);
        let result = self.context.executor.run_script(
            &request.extension_id,
            &request.source_id,
            &request.code,
            &capability,
        );
        guard.record(result.is_ok());
        if let Err(e) = &result {
            info!(error = %e, "Ad-hoc execution failed");
        }

        let response = ExecuteScriptResponse::for_request(request, &result);
        self.responses.publish(response.clone());
        response
    }

    /// Handle one host message.
    ///
    /// Returns the response for an ad-hoc request. Lifecycle errors are
    /// logged.
    pub fn dispatch(&mut self, message: HostMessage) -> Option<ExecuteScriptResponse> {
        match message {
            HostMessage::Lifecycle { phase } => {
                if let Err(e) = self.fire(phase) {
                    warn!(%phase, error = %e, "Ignoring lifecycle event");
                }
                None
            },
            HostMessage::ExecuteScript(request) => Some(self.handle_ad_hoc(&request)),
        }
    }

    /// Serve host messages until the sender side closes.
    ///
    /// Ticks after every message.
    pub async fn run(&mut self, mut inbound: mpsc::Receiver<HostMessage>) {
        info!("Injector loop started");
        while let Some(message) = inbound.recv().await {
            self.dispatch(message);
            self.tick();
        }
        info!(report = ?self.context.report, "Injector loop stopped");
    }

    /// The document being injected into.
    #[must_use]
    pub fn document(&self) -> &Document {
        self.context.executor.document()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Diagnostic totals so far.
    #[must_use]
    pub fn report(&self) -> InjectionReport {
        self.context.report
    }

    /// Settings this coordinator was created with.
    #[must_use]
    pub fn settings(&self) -> InjectorSettings {
        self.context.settings
    }

    /// The bus ad-hoc responses are published on.
    #[must_use]
    pub fn responses(&self) -> &ResponseBus {
        &self.responses
    }

    /// Subscribe to every ad-hoc response.
    #[must_use]
    pub fn subscribe(&self) -> ResponseReceiver {
        self.responses.subscribe()
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("executor", &self.context.executor)
            .field("scheduler", &self.scheduler)
            .field("settings", &self.context.settings)
            .field("report", &self.context.report)
            .finish_non_exhaustive()
    }
}
