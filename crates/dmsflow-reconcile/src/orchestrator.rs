//! Orchestrator
//!
//! Composes submission and polling into one awaited call with a single
//! deadline. Every stage spends whatever time the previous stages left, and
//! failures come back wrapped with the operation name and the stage.

use crate::classifier::ConflictClassifier;
use crate::config::{PollTiming, ReconcileConfig, deadline_after};
use crate::error::{ReconcileError, Result};
use crate::poll::{self, StateTarget, Task, WaitOptions};
use crate::refresh::{Refresh, Snapshot};
use crate::submit;
use crate::transport::TransportError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};

/// Stage of a reconciled operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Submit,
    WaitState,
    WaitTask,
    WaitReadiness,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Submit => write!(f, "submit"),
            Stage::WaitState => write!(f, "wait for state"),
            Stage::WaitTask => write!(f, "wait for task"),
            Stage::WaitReadiness => write!(f, "wait for readiness"),
        }
    }
}

/// Entry point for reconciled operations
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    classifier: ConflictClassifier,
    config: ReconcileConfig,
}

impl Orchestrator {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            classifier: ConflictClassifier::default(),
            config,
        }
    }

    pub fn with_classifier(mut self, classifier: ConflictClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Start an operation; the deadline is fixed here
    pub fn begin(&self, name: impl Into<String>) -> Operation<'_> {
        let name = name.into();
        let started = Instant::now();
        tracing::info!(
            "Starting {} (timeout {}s)",
            name,
            self.config.timeout.as_secs()
        );
        Operation {
            orchestrator: self,
            name,
            started,
            deadline: deadline_after(started, self.config.timeout),
        }
    }
}

/// One in-flight operation with a fixed deadline
#[derive(Debug)]
pub struct Operation<'a> {
    orchestrator: &'a Orchestrator,
    name: String,
    started: Instant,
    deadline: Instant,
}

impl Operation<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time left before the overall deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn config(&self) -> &ReconcileConfig {
        &self.orchestrator.config
    }

    fn options(&self, timing: PollTiming) -> WaitOptions {
        WaitOptions::new(timing, self.remaining())
            .with_not_found_checks(self.config().not_found_checks)
    }

    fn wrap(&self, stage: Stage) -> impl FnOnce(ReconcileError) -> ReconcileError + '_ {
        move |source| {
            tracing::debug!("{} failed during {}: {}", self.name, stage, source);
            ReconcileError::Stage {
                operation: self.name.clone(),
                stage,
                source: Box::new(source),
            }
        }
    }

    /// Read the current value once, within the deadline
    pub async fn fetch<R>(&self, refresh: &R) -> Result<Snapshot<R::Output>>
    where
        R: Refresh + ?Sized,
    {
        tracing::debug!("{}: fetching current state", self.name);
        let outcome = match timeout_at(self.deadline, refresh.refresh()).await {
            Ok(outcome) => outcome.map_err(|source| ReconcileError::Query {
                state: source.label(),
                source,
            }),
            Err(_) => Err(ReconcileError::Timeout {
                waited: self.elapsed(),
                last_state: "FETCHING".to_string(),
            }),
        };
        outcome.map_err(self.wrap(Stage::Fetch))
    }

    /// Submit a mutating request, retrying conflicts until `stability` is stable
    pub async fn submit<T, F, Fut, R>(
        &self,
        request: F,
        stability: &R,
        stable: &StateTarget,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, TransportError>>,
        R: Refresh + ?Sized,
    {
        self.submit_every(request, stability, stable, self.config().stabilize)
            .await
    }

    /// Submit with use-case specific stability timing
    pub async fn submit_every<T, F, Fut, R>(
        &self,
        request: F,
        stability: &R,
        stable: &StateTarget,
        timing: PollTiming,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, TransportError>>,
        R: Refresh + ?Sized,
    {
        tracing::info!("{}: submitting", self.name);
        submit::submit(
            &self.orchestrator.classifier,
            request,
            stability,
            stable,
            &self.options(timing),
        )
        .await
        .map_err(self.wrap(Stage::Submit))
    }

    /// Wait for a status using the configured state timing
    pub async fn wait_for_state<R>(
        &self,
        refresh: &R,
        states: &StateTarget,
    ) -> Result<Snapshot<R::Output>>
    where
        R: Refresh + ?Sized,
    {
        self.wait_for_state_every(refresh, states, self.config().state)
            .await
    }

    /// Wait for a status with use-case specific timing
    pub async fn wait_for_state_every<R>(
        &self,
        refresh: &R,
        states: &StateTarget,
        timing: PollTiming,
    ) -> Result<Snapshot<R::Output>>
    where
        R: Refresh + ?Sized,
    {
        tracing::info!("{}: waiting for {:?}", self.name, states.target);
        poll::wait_for_state(refresh, states, &self.options(timing))
            .await
            .map_err(self.wrap(Stage::WaitState))
    }

    /// Wait for a job using the configured task timing
    pub async fn wait_for_task<R>(&self, refresh: &R, task_id: &str) -> Result<Task>
    where
        R: Refresh<Output = Task> + ?Sized,
    {
        self.wait_for_task_every(refresh, task_id, self.config().task)
            .await
    }

    pub async fn wait_for_task_every<R>(
        &self,
        refresh: &R,
        task_id: &str,
        timing: PollTiming,
    ) -> Result<Task>
    where
        R: Refresh<Output = Task> + ?Sized,
    {
        tracing::info!("{}: waiting for task {}", self.name, task_id);
        poll::wait_for_task(refresh, task_id, &self.options(timing))
            .await
            .map_err(self.wrap(Stage::WaitTask))
    }

    /// Wait until `is_ready` holds using the configured readiness timing
    pub async fn wait_for_readiness<R, P>(&self, refresh: &R, is_ready: P) -> Result<R::Output>
    where
        R: Refresh + ?Sized,
        P: Fn(&R::Output) -> bool,
    {
        self.wait_for_readiness_every(refresh, is_ready, self.config().readiness)
            .await
    }

    pub async fn wait_for_readiness_every<R, P>(
        &self,
        refresh: &R,
        is_ready: P,
        timing: PollTiming,
    ) -> Result<R::Output>
    where
        R: Refresh + ?Sized,
        P: Fn(&R::Output) -> bool,
    {
        tracing::info!("{}: waiting for readiness", self.name);
        poll::wait_for_readiness(refresh, is_ready, &self.options(timing))
            .await
            .map_err(self.wrap(Stage::WaitReadiness))
    }

    /// Log completion
    pub fn finish(self) {
        tracing::info!(
            "{} completed in {}s",
            self.name,
            self.started.elapsed().as_secs()
        );
    }
}
