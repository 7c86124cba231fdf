//! Progress - The unit of result and resumption returned by every handler step

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, HandlerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    InProgress,
    Success,
    Failed,
}

/// Where a resumable operation left off
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// The mutating call has not been issued yet
    #[default]
    Start,
    /// The mutating call was accepted; only status ticks remain
    Stabilizing,
}

/// State threaded through suspension/resumption of one operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackContext {
    #[serde(default)]
    pub stage: Stage,
    /// Status ticks performed so far
    #[serde(default)]
    pub attempts: u32,
    /// When the first tick ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl CallbackContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stabilizing(&self) -> bool {
        self.stage == Stage::Stabilizing
    }

    /// Record the start of a tick
    pub fn begin_tick(&mut self, now: DateTime<Utc>) {
        self.stage = Stage::Stabilizing;
        self.attempts = self.attempts.saturating_add(1);
        self.started_at.get_or_insert(now);
    }

    /// Seconds since the first tick, zero before any tick ran
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.started_at
            .map(|start| (now - start).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent<M> {
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_model: Option<M>,
    /// List results only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_models: Option<Vec<M>>,
    /// List results only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(default)]
    pub callback_delay_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_context: Option<CallbackContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<M> ProgressEvent<M> {
    fn with_status(status: OperationStatus) -> Self {
        Self {
            status,
            resource_model: None,
            resource_models: None,
            next_token: None,
            callback_delay_seconds: 0,
            callback_context: None,
            error_code: None,
            message: None,
        }
    }

    /// Ask the host to call back after `delay_seconds` (at least one second)
    pub fn in_progress(model: M, context: CallbackContext, delay_seconds: u64) -> Self {
        Self {
            resource_model: Some(model),
            callback_delay_seconds: delay_seconds.max(1),
            callback_context: Some(context),
            ..Self::with_status(OperationStatus::InProgress)
        }
    }

    pub fn success(model: Option<M>) -> Self {
        Self {
            resource_model: model,
            ..Self::with_status(OperationStatus::Success)
        }
    }

    pub fn listed(models: Vec<M>, next_token: Option<String>) -> Self {
        Self {
            resource_models: Some(models),
            next_token,
            ..Self::with_status(OperationStatus::Success)
        }
    }

    pub fn failed(error: &HandlerError) -> Self {
        Self {
            error_code: Some(error.kind),
            message: Some(error.message.clone()),
            ..Self::with_status(OperationStatus::Failed)
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == OperationStatus::InProgress
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_in_progress()
    }
}
