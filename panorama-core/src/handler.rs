//! Handler - The per-resource-type strategy driven by the orchestrator
//!
//! A [`ResourceHandler`] knows how to translate its model into remote calls and
//! which statuses end a stabilization. Everything else (suspension, timeouts,
//! delete idempotence, removed-state filtering) is the orchestrator's job.

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{HandlerError, HandlerResult};
use crate::gateway::Gateway;
use crate::stabilize::{StabilizationPolicy, StatusTargets};

/// A model as read from the remote service, with its status if it has one
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<M, S> {
    pub model: M,
    pub status: Option<S>,
}

impl<M, S> Snapshot<M, S> {
    pub fn new(model: M, status: Option<S>) -> Self {
        Self { model, status }
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<M, S> {
    pub entries: Vec<Snapshot<M, S>>,
    pub next_token: Option<String>,
}

/// What remains after an update call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePlan {
    /// Nothing to wait for; read back and finish
    Settled,
    /// Wait on the creation status pair, then read back
    Stabilize,
}

#[async_trait]
pub trait ResourceHandler: Send + Sync {
    type Model: Clone + Debug + Serialize + DeserializeOwned + Send + Sync;
    type Status: Clone + Debug + Display + PartialEq + Send + Sync;

    /// CloudFormation type name, e.g. "AWS::Panorama::Package"
    fn type_name(&self) -> &'static str;

    /// Primary identifier of `model`, if it is known yet
    fn identifier(&self, model: &Self::Model) -> Option<String>;

    fn policy(&self) -> StabilizationPolicy;

    fn create_targets(&self) -> StatusTargets<Self::Status>;

    fn delete_targets(&self) -> StatusTargets<Self::Status>;

    /// Issue the create call and record server-assigned fields on `model`
    async fn create(&self, gw: &Gateway<'_>, model: &mut Self::Model) -> HandlerResult<()>;

    /// Read the resource's core description
    async fn describe(
        &self,
        gw: &Gateway<'_>,
        model: &Self::Model,
    ) -> HandlerResult<Snapshot<Self::Model, Self::Status>>;

    async fn delete(&self, gw: &Gateway<'_>, model: &Self::Model) -> HandlerResult<()>;

    async fn update(
        &self,
        gw: &Gateway<'_>,
        desired: &mut Self::Model,
        previous: Option<&Self::Model>,
    ) -> HandlerResult<UpdatePlan>;

    /// Whether `status` means the resource has been removed for good
    fn is_terminal_removed(&self, _status: &Self::Status) -> bool {
        false
    }

    /// Merge secondary reads (details, tags) into a described model
    async fn enrich(&self, _gw: &Gateway<'_>, model: Self::Model) -> HandlerResult<Self::Model> {
        Ok(model)
    }

    async fn list(
        &self,
        _gw: &Gateway<'_>,
        _filter: &Self::Model,
        _next_token: Option<String>,
    ) -> HandlerResult<ListPage<Self::Model, Self::Status>> {
        Err(HandlerError::invalid_request(format!(
            "List is not supported for {}",
            self.type_name()
        )))
    }
}
