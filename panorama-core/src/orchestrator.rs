//! Orchestrator - Run one lifecycle step for a resource handler
//!
//! Each call to [`Orchestrator::handle`] is one invocation from the host. Long
//! operations return IN_PROGRESS with a callback context; the host calls back
//! with that context and the returned model, and the pipeline resumes at the
//! next status tick.

use chrono::{DateTime, Utc};

use crate::error::{ErrorKind, HandlerError, HandlerResult};
use crate::gateway::Gateway;
use crate::handler::{ResourceHandler, UpdatePlan};
use crate::oplog::OperationLog;
use crate::progress::{CallbackContext, ProgressEvent};
use crate::request::{Action, HandlerRequest};
use crate::stabilize::{Poller, StatusTargets, Tick};

pub struct Orchestrator<H: ResourceHandler> {
    handler: H,
}

impl<H: ResourceHandler> Orchestrator<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub async fn handle(&self, request: HandlerRequest<H::Model>) -> ProgressEvent<H::Model> {
        self.handle_at(request, Utc::now()).await
    }

    /// Run one step as if the current time were `now`
    pub async fn handle_at(
        &self,
        request: HandlerRequest<H::Model>,
        now: DateTime<Utc>,
    ) -> ProgressEvent<H::Model> {
        let identifier = self
            .handler
            .identifier(&request.desired_resource_state)
            .unwrap_or_default();
        let log =
            OperationLog::new(self.handler.type_name(), request.action).with_identifier(identifier);
        let gw = Gateway::new(&log);

        let HandlerRequest {
            action,
            desired_resource_state: model,
            previous_resource_state: previous,
            callback_context,
            next_token,
        } = request;
        let context = callback_context.unwrap_or_default();

        if context.is_stabilizing() {
            let attempt = context.attempts.saturating_add(1);
            log.debug(format!("resuming at attempt {}", attempt));
        }

        let result = match action {
            Action::Create => self.create(&gw, model, context, now).await,
            Action::Read => self.read(&gw, model).await,
            Action::Update => self.update(&gw, model, previous, context, now).await,
            Action::Delete => self.delete(&gw, model, context, now).await,
            Action::List => self.list(&gw, model, next_token).await,
        };

        match result {
            Ok(event) => {
                if event.is_terminal() {
                    log.info("completed");
                }
                event
            }
            Err(err) => {
                log.error(format!("failed with {}: {}", err.kind, err));
                ProgressEvent::failed(&err)
            }
        }
    }

    async fn create(
        &self,
        gw: &Gateway<'_>,
        mut model: H::Model,
        context: CallbackContext,
        now: DateTime<Utc>,
    ) -> HandlerResult<ProgressEvent<H::Model>> {
        if !context.is_stabilizing() {
            self.handler.create(gw, &mut model).await?;
            gw.log().info(format!(
                "create accepted for {}",
                self.handler.identifier(&model).unwrap_or_default()
            ));
        }
        let targets = self.handler.create_targets();
        self.settle(gw, model, context, now, &targets).await
    }

    async fn read(
        &self,
        gw: &Gateway<'_>,
        model: H::Model,
    ) -> HandlerResult<ProgressEvent<H::Model>> {
        let identifier = self.require_identifier(&model)?;
        let snapshot = self.handler.describe(gw, &model).await?;
        if let Some(status) = &snapshot.status
            && self.handler.is_terminal_removed(status)
        {
            gw.log().info(format!("status {} means removed", status));
            return Err(HandlerError::not_found(
                self.handler.type_name(),
                &identifier,
            ));
        }
        let model = self.handler.enrich(gw, snapshot.model).await?;
        Ok(ProgressEvent::success(Some(model)))
    }

    async fn update(
        &self,
        gw: &Gateway<'_>,
        mut model: H::Model,
        previous: Option<H::Model>,
        context: CallbackContext,
        now: DateTime<Utc>,
    ) -> HandlerResult<ProgressEvent<H::Model>> {
        self.require_identifier(&model)?;
        if !context.is_stabilizing() {
            let plan = self
                .handler
                .update(gw, &mut model, previous.as_ref())
                .await?;
            if plan == UpdatePlan::Settled {
                return self.read(gw, model).await;
            }
        }
        let targets = self.handler.create_targets();
        self.settle(gw, model, context, now, &targets).await
    }

    async fn delete(
        &self,
        gw: &Gateway<'_>,
        model: H::Model,
        mut context: CallbackContext,
        now: DateTime<Utc>,
    ) -> HandlerResult<ProgressEvent<H::Model>> {
        let identifier = self.require_identifier(&model)?;
        if !context.is_stabilizing() {
            match self.handler.delete(gw, &model).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    gw.log().info("already deleted");
                    return Ok(ProgressEvent::success(None));
                }
                Err(err) => return Err(err),
            }
        }

        let targets = self.handler.delete_targets();
        let policy = self.handler.policy();
        let poller = Poller::new(&targets, policy, gw.log(), &identifier);
        let tick = poller
            .tick(&mut context, now, self.handler.describe(gw, &model))
            .await?;

        match tick {
            Tick::Pending => Ok(ProgressEvent::in_progress(
                model,
                context,
                policy.delay_seconds,
            )),
            Tick::Settled(_) => Ok(ProgressEvent::success(None)),
        }
    }

    async fn list(
        &self,
        gw: &Gateway<'_>,
        filter: H::Model,
        next_token: Option<String>,
    ) -> HandlerResult<ProgressEvent<H::Model>> {
        let page = self.handler.list(gw, &filter, next_token).await?;
        let total = page.entries.len();
        let models: Vec<H::Model> = page
            .entries
            .into_iter()
            .filter(|entry| {
                !entry
                    .status
                    .as_ref()
                    .is_some_and(|s| self.handler.is_terminal_removed(s))
            })
            .map(|entry| entry.model)
            .collect();
        gw.log().debug(format!(
            "listed {} of {} entries (more: {})",
            models.len(),
            total,
            page.next_token.is_some()
        ));
        Ok(ProgressEvent::listed(models, page.next_token))
    }

    /// Tick once against `targets`; on success, read back the full model.
    async fn settle(
        &self,
        gw: &Gateway<'_>,
        model: H::Model,
        mut context: CallbackContext,
        now: DateTime<Utc>,
        targets: &StatusTargets<H::Status>,
    ) -> HandlerResult<ProgressEvent<H::Model>> {
        let identifier = self.require_identifier(&model)?;
        let policy = self.handler.policy();
        let poller = Poller::new(targets, policy, gw.log(), &identifier);
        let tick = poller
            .tick(&mut context, now, self.handler.describe(gw, &model))
            .await?;

        match tick {
            Tick::Pending => Ok(ProgressEvent::in_progress(
                model,
                context,
                policy.delay_seconds,
            )),
            Tick::Settled(Some(snapshot)) => {
                let model = self.handler.enrich(gw, snapshot.model).await?;
                Ok(ProgressEvent::success(Some(model)))
            }
            Tick::Settled(None) => self.read(gw, model).await,
        }
    }

    fn require_identifier(&self, model: &H::Model) -> HandlerResult<String> {
        self.handler.identifier(model).ok_or_else(|| {
            HandlerError::new(
                ErrorKind::NotFound,
                format!(
                    "Resource of type '{}' has no primary identifier",
                    self.handler.type_name()
                ),
            )
        })
    }
}
