//! AWS::Panorama::ApplicationInstance
//!
//! Deployments and removals are long-running on the device side, so both are
//! stabilized against the instance status. A removed instance lingers with
//! status REMOVAL_SUCCEEDED and is treated as gone.

use std::sync::Arc;

use async_trait::async_trait;
use panorama_core::{
    AbsentOutcome, Call, Gateway, HandlerError, HandlerResult, ListPage, ResourceHandler,
    Snapshot, StabilizationPolicy, StatusTargets, Tag, UpdatePlan,
};
use serde::{Deserialize, Serialize};

use super::{APPLICATION_INSTANCE, sync_tags};
use crate::api::{ApplicationInstanceQuery, PanoramaApi};

/// Deployments can sit on an offline device for a long time
pub const DEFAULT_POLICY: StabilizationPolicy = StabilizationPolicy::new(300, 365 * 24 * 60 * 60);

define_status!(ApplicationInstanceStatus {
    DeploymentPending => "DEPLOYMENT_PENDING",
    DeploymentRequested => "DEPLOYMENT_REQUESTED",
    DeploymentInProgress => "DEPLOYMENT_IN_PROGRESS",
    DeploymentError => "DEPLOYMENT_ERROR",
    DeploymentSucceeded => "DEPLOYMENT_SUCCEEDED",
    DeploymentFailed => "DEPLOYMENT_FAILED",
    RemovalPending => "REMOVAL_PENDING",
    RemovalRequested => "REMOVAL_REQUESTED",
    RemovalInProgress => "REMOVAL_IN_PROGRESS",
    RemovalFailed => "REMOVAL_FAILED",
    RemovalSucceeded => "REMOVAL_SUCCEEDED",
});

/// Inline manifest content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_data: Option<String>,
}

/// Manifests returned by DescribeApplicationInstanceDetails
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestDetails {
    pub manifest_payload: Option<Payload>,
    pub manifest_overrides_payload: Option<Payload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ApplicationInstance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_payload: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_overrides_payload: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_runtime_context_device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_instance_id_to_replace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,

    // Read-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_runtime_context_device_name: Option<String>,
    /// Epoch seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,
    /// Epoch seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_time: Option<i64>,

    // List filters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_filter: Option<String>,
}

impl ApplicationInstance {
    pub fn remote_status(&self) -> Option<ApplicationInstanceStatus> {
        self.status.as_deref().map(ApplicationInstanceStatus::from)
    }
}

pub struct ApplicationInstanceHandler {
    api: Arc<dyn PanoramaApi>,
    policy: StabilizationPolicy,
}

impl ApplicationInstanceHandler {
    pub fn new(api: Arc<dyn PanoramaApi>, policy: StabilizationPolicy) -> Self {
        Self { api, policy }
    }

    fn id_of(model: &ApplicationInstance) -> HandlerResult<&str> {
        model
            .application_instance_id
            .as_deref()
            .ok_or_else(|| HandlerError::invalid_request("ApplicationInstanceId is required"))
    }
}

#[async_trait]
impl ResourceHandler for ApplicationInstanceHandler {
    type Model = ApplicationInstance;
    type Status = ApplicationInstanceStatus;

    fn type_name(&self) -> &'static str {
        APPLICATION_INSTANCE
    }

    fn identifier(&self, model: &ApplicationInstance) -> Option<String> {
        model.application_instance_id.clone()
    }

    fn policy(&self) -> StabilizationPolicy {
        self.policy
    }

    fn create_targets(&self) -> StatusTargets<ApplicationInstanceStatus> {
        StatusTargets::new(
            vec![ApplicationInstanceStatus::DeploymentSucceeded],
            vec![ApplicationInstanceStatus::DeploymentFailed],
            AbsentOutcome::Propagate,
        )
    }

    fn delete_targets(&self) -> StatusTargets<ApplicationInstanceStatus> {
        StatusTargets::new(
            vec![ApplicationInstanceStatus::RemovalSucceeded],
            vec![ApplicationInstanceStatus::RemovalFailed],
            AbsentOutcome::Succeeded,
        )
    }

    async fn create(&self, gw: &Gateway<'_>, model: &mut ApplicationInstance) -> HandlerResult<()> {
        let call = Call::new(
            "CreateApplicationInstance",
            model.name.clone().unwrap_or_default(),
        )
        .with_request(&*model);
        let id = gw
            .invoke(call, self.api.create_application_instance(model))
            .await?;
        model.application_instance_id = Some(id);
        Ok(())
    }

    async fn describe(
        &self,
        gw: &Gateway<'_>,
        model: &ApplicationInstance,
    ) -> HandlerResult<Snapshot<ApplicationInstance, ApplicationInstanceStatus>> {
        let id = Self::id_of(model)?;
        let call = Call::new("DescribeApplicationInstance", id).with_request(&id);
        let remote = gw
            .invoke(call, self.api.describe_application_instance(id))
            .await?;
        let status = remote.remote_status();
        Ok(Snapshot::new(remote, status))
    }

    async fn delete(&self, gw: &Gateway<'_>, model: &ApplicationInstance) -> HandlerResult<()> {
        let id = Self::id_of(model)?;
        let api = &self.api;
        let call = Call::new("RemoveApplicationInstance", id).with_request(&id);
        gw.invoke_delete(call, api.remove_application_instance(id), || async move {
            api.describe_application_instance(id).await.map(|current| {
                current.remote_status() == Some(ApplicationInstanceStatus::RemovalSucceeded)
            })
        })
        .await
    }

    async fn update(
        &self,
        gw: &Gateway<'_>,
        desired: &mut ApplicationInstance,
        previous: Option<&ApplicationInstance>,
    ) -> HandlerResult<UpdatePlan> {
        let id = Self::id_of(desired)?.to_string();
        let call = Call::new("DescribeApplicationInstance", &id).with_request(&id);
        let current = gw
            .invoke(call, self.api.describe_application_instance(&id))
            .await?;
        if let Some(status) = current.remote_status()
            && self.is_terminal_removed(&status)
        {
            return Err(HandlerError::not_found(APPLICATION_INSTANCE, &id));
        }

        let arn = current.arn.clone().ok_or_else(|| {
            HandlerError::not_found(APPLICATION_INSTANCE, &id)
                .for_operation("DescribeApplicationInstance")
        })?;
        let previous_tags = match previous {
            Some(previous) => previous.tags.clone(),
            None => current.tags.clone(),
        }
        .unwrap_or_default();
        let desired_tags = desired.tags.clone().unwrap_or_default();

        sync_tags(
            gw,
            self.api.as_ref(),
            &arn,
            &id,
            &desired_tags,
            &previous_tags,
        )
        .await?;
        Ok(UpdatePlan::Settled)
    }

    fn is_terminal_removed(&self, status: &ApplicationInstanceStatus) -> bool {
        *status == ApplicationInstanceStatus::RemovalSucceeded
    }

    async fn enrich(
        &self,
        gw: &Gateway<'_>,
        mut model: ApplicationInstance,
    ) -> HandlerResult<ApplicationInstance> {
        let id = Self::id_of(&model)?.to_string();
        let call = Call::new("DescribeApplicationInstanceDetails", &id).with_request(&id);
        let details = gw
            .invoke(call, self.api.describe_application_instance_details(&id))
            .await?;
        model.manifest_payload = details.manifest_payload;
        model.manifest_overrides_payload = details.manifest_overrides_payload;
        Ok(model)
    }

    async fn list(
        &self,
        gw: &Gateway<'_>,
        filter: &ApplicationInstance,
        next_token: Option<String>,
    ) -> HandlerResult<ListPage<ApplicationInstance, ApplicationInstanceStatus>> {
        let query = ApplicationInstanceQuery {
            device_id: filter.device_id.clone(),
            status_filter: filter.status_filter.clone(),
            next_token,
        };
        let call = Call::new(
            "ListApplicationInstances",
            filter.device_id.clone().unwrap_or_default(),
        )
        .with_request(&query);
        let page = gw
            .invoke(call, self.api.list_application_instances(&query))
            .await?;

        let entries = page
            .items
            .into_iter()
            .map(|instance| {
                let status = instance.remote_status();
                Snapshot::new(instance, status)
            })
            .collect();
        Ok(ListPage {
            entries,
            next_token: page.next_token,
        })
    }
}
