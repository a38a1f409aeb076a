//! Instance reconciliation
//!
//! The control plane does not guarantee safe in-place mutation of a
//! running instance's image, command, or ports, so reconciliation is
//! delete-then-recreate: any instance with the target name is removed,
//! absence is confirmed, and a fresh instance is created from the full
//! spec, then polled to readiness.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::deploy::fsm::{ReconcileEvent, ReconcileFsm};
use crate::errors::DeployError;
use crate::models::instance::{InstanceObservation, InstanceSpec, InstanceState};
use crate::provider::CloudProvider;

/// Reconciler options
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Delay between readiness polls
    pub poll_interval: Duration,

    /// Hard cap on readiness polls
    pub max_polls: u32,

    /// Hard cap on deletion-confirmation polls
    pub absence_polls: u32,

    /// Treat an exhausted poll budget as a hard failure instead of a
    /// warning. The instance may still converge after we stop watching,
    /// so the default is the warning.
    pub timeout_is_fatal: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            max_polls: 30,
            absence_polls: 12,
            timeout_is_fatal: false,
        }
    }
}

/// How reconciliation ended when it did not error
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// The instance reached running within the poll budget
    Running(InstanceObservation),

    /// The poll budget ran out while the instance was still pending
    TimedOut(InstanceObservation),
}

impl ReconcileOutcome {
    pub fn observation(&self) -> &InstanceObservation {
        match self {
            ReconcileOutcome::Running(obs) | ReconcileOutcome::TimedOut(obs) => obs,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, ReconcileOutcome::TimedOut(_))
    }
}

pub struct InstanceReconciler<'a> {
    provider: &'a dyn CloudProvider,
    options: ReconcileOptions,
}

impl<'a> InstanceReconciler<'a> {
    pub fn new(provider: &'a dyn CloudProvider, options: ReconcileOptions) -> Self {
        Self { provider, options }
    }

    /// Reconcile with the real clock
    pub async fn reconcile(
        &self,
        group: &str,
        spec: &InstanceSpec,
        shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
    ) -> Result<ReconcileOutcome, DeployError> {
        self.reconcile_with(group, spec, tokio::time::sleep, shutdown_signal)
            .await
    }

    /// Reconcile with an injectable sleep so tests run without waiting.
    ///
    /// The shutdown future is checked at every poll boundary; firing it
    /// aborts with `DeployError::Interrupted` and leaves the remote
    /// state as-is for the next run to reconcile.
    pub async fn reconcile_with<S, F>(
        &self,
        group: &str,
        spec: &InstanceSpec,
        sleep_fn: S,
        mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
    ) -> Result<ReconcileOutcome, DeployError>
    where
        S: Fn(Duration) -> F,
        F: Future<Output = ()>,
    {
        let mut fsm = ReconcileFsm::new();

        match self.provider.instance_show(group, &spec.name).await? {
            Some(existing) => {
                fsm.process(ReconcileEvent::ObservedPresent)
                    .map_err(DeployError::Internal)?;
                info!(
                    "Instance {} already exists (state {}), deleting before recreate",
                    spec.name, existing.state
                );
                self.provider.instance_delete(group, &spec.name).await?;
                self.wait_for_absence(group, spec, &sleep_fn, &mut shutdown_signal)
                    .await?;
                fsm.process(ReconcileEvent::Deleted)
                    .map_err(DeployError::Internal)?;
            }
            None => {
                fsm.process(ReconcileEvent::ObservedAbsent)
                    .map_err(DeployError::Internal)?;
            }
        }

        info!("Creating instance {} with image {}", spec.name, spec.image);
        let mut last = self.provider.instance_create(group, spec).await?;
        fsm.process(ReconcileEvent::Created)
            .map_err(DeployError::Internal)?;

        for attempt in 0..=self.options.max_polls {
            match last.state {
                InstanceState::Running => {
                    fsm.process(ReconcileEvent::PollRunning)
                        .map_err(DeployError::Internal)?;
                    info!("Instance {} is running", spec.name);
                    return Ok(ReconcileOutcome::Running(last));
                }
                InstanceState::Failed => {
                    fsm.process(ReconcileEvent::PollFailed("instance failed".to_string()))
                        .map_err(DeployError::Internal)?;
                    return Err(DeployError::InstanceFailed(format!(
                        "{} reached failed state; inspect it with: az container logs -g {} -n {}",
                        spec.name, group, spec.name
                    )));
                }
                InstanceState::Pending | InstanceState::Unknown => {
                    fsm.process(ReconcileEvent::PollPending)
                        .map_err(DeployError::Internal)?;
                    if attempt == self.options.max_polls {
                        break;
                    }
                    debug!(
                        "Instance {} still {}, poll {}/{}",
                        spec.name,
                        last.state,
                        attempt + 1,
                        self.options.max_polls
                    );
                }
            }

            tokio::select! {
                _ = &mut shutdown_signal => {
                    warn!("Interrupted while waiting for instance {}", spec.name);
                    return Err(DeployError::Interrupted);
                }
                _ = sleep_fn(self.options.poll_interval) => {}
            }

            last = self
                .provider
                .instance_show(group, &spec.name)
                .await?
                .ok_or_else(|| {
                    DeployError::ReconcileError(format!(
                        "instance {} disappeared while waiting for readiness",
                        spec.name
                    ))
                })?;
        }

        let message = format!(
            "instance {} did not reach running within {} polls; it may still converge, check with: az container show -g {} -n {}",
            spec.name, self.options.max_polls, group, spec.name
        );
        if self.options.timeout_is_fatal {
            return Err(DeployError::TimeoutError(message));
        }
        warn!("{}", message);
        Ok(ReconcileOutcome::TimedOut(last))
    }

    /// After a delete, poll until the name is actually gone; creating
    /// over a half-deleted instance is rejected by the provider.
    async fn wait_for_absence<S, F>(
        &self,
        group: &str,
        spec: &InstanceSpec,
        sleep_fn: &S,
        shutdown_signal: &mut Pin<Box<dyn Future<Output = ()> + Send>>,
    ) -> Result<(), DeployError>
    where
        S: Fn(Duration) -> F,
        F: Future<Output = ()>,
    {
        for _ in 0..self.options.absence_polls {
            if self.provider.instance_show(group, &spec.name).await?.is_none() {
                debug!("Instance {} confirmed absent", spec.name);
                return Ok(());
            }
            tokio::select! {
                _ = &mut *shutdown_signal => {
                    warn!("Interrupted while waiting for deletion of {}", spec.name);
                    return Err(DeployError::Interrupted);
                }
                _ = sleep_fn(self.options.poll_interval) => {}
            }
        }

        Err(DeployError::TimeoutError(format!(
            "deletion of instance {} did not complete within {} polls",
            spec.name, self.options.absence_polls
        )))
    }
}
