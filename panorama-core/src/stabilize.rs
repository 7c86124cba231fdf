//! Stabilize - Poll a remote status until it reaches a terminal condition
//!
//! One call to [`Poller::tick`] is one status read. Between ticks the
//! orchestrator suspends and the host re-invokes it after the policy delay,
//! so waiting never happens inside a tick.

use std::fmt::{Debug, Display};
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HandlerError, HandlerResult};
use crate::handler::Snapshot;
use crate::oplog::OperationLog;
use crate::progress::CallbackContext;

/// Delay between ticks and the overall bound on one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilizationPolicy {
    pub delay_seconds: u64,
    pub timeout_seconds: u64,
}

impl StabilizationPolicy {
    pub const fn new(delay_seconds: u64, timeout_seconds: u64) -> Self {
        Self {
            delay_seconds,
            timeout_seconds,
        }
    }

    pub fn is_expired(&self, elapsed_seconds: u64) -> bool {
        elapsed_seconds >= self.timeout_seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        *self != PollState::Polling
    }
}

/// What a NotFound status read means for the operation being stabilized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsentOutcome {
    /// The resource is gone, which is what a delete waits for
    Succeeded,
    /// The resource is not visible yet
    KeepPolling,
    /// NotFound is an error for this operation
    Propagate,
}

/// Statuses that end a stabilization
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTargets<S> {
    pub success: Vec<S>,
    pub failure: Vec<S>,
    pub on_absent: AbsentOutcome,
}

impl<S> StatusTargets<S> {
    pub fn new(success: Vec<S>, failure: Vec<S>, on_absent: AbsentOutcome) -> Self {
        Self {
            success,
            failure,
            on_absent,
        }
    }
}

/// Result of one tick that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum Tick<M, S> {
    /// Still polling; suspend and tick again later
    Pending,
    /// Reached success. Carries the snapshot that was read, if the resource
    /// was still visible.
    Settled(Option<Snapshot<M, S>>),
}

pub struct Poller<'a, S> {
    targets: &'a StatusTargets<S>,
    policy: StabilizationPolicy,
    log: &'a OperationLog,
    identifier: &'a str,
}

impl<'a, S> Poller<'a, S>
where
    S: PartialEq + Display + Debug,
{
    pub fn new(
        targets: &'a StatusTargets<S>,
        policy: StabilizationPolicy,
        log: &'a OperationLog,
        identifier: &'a str,
    ) -> Self {
        Self {
            targets,
            policy,
            log,
            identifier,
        }
    }

    /// Classify one observed status. Failure statuses win over success ones.
    pub fn classify(&self, status: Option<&S>) -> PollState {
        match status {
            Some(s) if self.targets.failure.contains(s) => PollState::Failed,
            Some(s) if self.targets.success.contains(s) => PollState::Succeeded,
            _ => PollState::Polling,
        }
    }

    /// Perform one status read and decide what happens next.
    ///
    /// `Failed` and `TimedOut` come back as NotStabilized errors.
    pub async fn tick<M, F>(
        &self,
        context: &mut CallbackContext,
        now: DateTime<Utc>,
        read: F,
    ) -> HandlerResult<Tick<M, S>>
    where
        F: Future<Output = HandlerResult<Snapshot<M, S>>>,
    {
        context.begin_tick(now);

        let (mut state, snapshot) = match read.await {
            Ok(snapshot) => (self.classify(snapshot.status.as_ref()), Some(snapshot)),
            Err(err) if err.is_not_found() => match self.targets.on_absent {
                AbsentOutcome::Succeeded => (PollState::Succeeded, None),
                AbsentOutcome::KeepPolling => (PollState::Polling, None),
                AbsentOutcome::Propagate => return Err(err),
            },
            Err(err) => return Err(err),
        };

        let elapsed = context.elapsed_seconds(now);
        if state == PollState::Polling && self.policy.is_expired(elapsed) {
            state = PollState::TimedOut;
        }

        let status = snapshot
            .as_ref()
            .and_then(|s| s.status.as_ref())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "<absent>".to_string());

        match state {
            PollState::Polling => {
                self.log.info(format!(
                    "waiting for stabilization (attempt {}, status {}, {}s elapsed)",
                    context.attempts, status, elapsed
                ));
                Ok(Tick::Pending)
            }
            PollState::Succeeded => {
                self.log.info(format!(
                    "stabilized after {} attempt(s) with status {}",
                    context.attempts, status
                ));
                Ok(Tick::Settled(snapshot))
            }
            PollState::Failed => Err(HandlerError::not_stabilized(
                self.log.type_name(),
                self.identifier,
                &format!("reached failure status {}", status),
            )),
            PollState::TimedOut => Err(HandlerError::not_stabilized(
                self.log.type_name(),
                self.identifier,
                &format!(
                    "timed out after {}s waiting on status {}",
                    elapsed, status
                ),
            )),
        }
    }
}
