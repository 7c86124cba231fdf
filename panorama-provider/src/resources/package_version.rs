//! AWS::Panorama::PackageVersion
//!
//! A version is addressed by package ID, version and patch version. Updating
//! registers the desired patch again, except on the latest patch, which is
//! protected.

use std::sync::Arc;

use async_trait::async_trait;
use panorama_core::{
    AbsentOutcome, Call, Gateway, HandlerError, HandlerResult, ResourceHandler, Snapshot,
    StabilizationPolicy, StatusTargets, UpdatePlan,
};
use serde::{Deserialize, Serialize};

use super::PACKAGE_VERSION;
use crate::api::PanoramaApi;

pub const DEFAULT_POLICY: StabilizationPolicy = StabilizationPolicy::new(60, 24 * 60 * 60);

define_status!(PackageVersionStatus {
    RegisterPending => "REGISTER_PENDING",
    RegisterCompleted => "REGISTER_COMPLETED",
    Failed => "FAILED",
    Deleting => "DELETING",
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageVersion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_latest: Option<bool>,
    /// Write-only; used when deregistering the latest patch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_latest_patch_version: Option<String>,

    // Read-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_latest_patch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    /// Epoch seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_time: Option<i64>,
}

impl PackageVersion {
    /// "<package id>-<version>-<patch version>", once all three are known
    pub fn key(&self) -> Option<String> {
        match (&self.package_id, &self.package_version, &self.patch_version) {
            (Some(id), Some(version), Some(patch)) => Some(format!("{}-{}-{}", id, version, patch)),
            _ => None,
        }
    }

    pub fn remote_status(&self) -> Option<PackageVersionStatus> {
        self.status.as_deref().map(PackageVersionStatus::from)
    }
}

pub struct PackageVersionHandler {
    api: Arc<dyn PanoramaApi>,
    policy: StabilizationPolicy,
}

impl PackageVersionHandler {
    pub fn new(api: Arc<dyn PanoramaApi>, policy: StabilizationPolicy) -> Self {
        Self { api, policy }
    }

    fn key_of(model: &PackageVersion) -> HandlerResult<String> {
        model.key().ok_or_else(|| {
            HandlerError::invalid_request("PackageId, PackageVersion and PatchVersion are required")
        })
    }

    async fn register(
        &self,
        gw: &Gateway<'_>,
        model: &PackageVersion,
        key: &str,
    ) -> HandlerResult<()> {
        let call = Call::new("RegisterPackageVersion", key).with_request(model);
        gw.invoke(call, self.api.register_package_version(model))
            .await
    }
}

#[async_trait]
impl ResourceHandler for PackageVersionHandler {
    type Model = PackageVersion;
    type Status = PackageVersionStatus;

    fn type_name(&self) -> &'static str {
        PACKAGE_VERSION
    }

    fn identifier(&self, model: &PackageVersion) -> Option<String> {
        model.key()
    }

    fn policy(&self) -> StabilizationPolicy {
        self.policy
    }

    fn create_targets(&self) -> StatusTargets<PackageVersionStatus> {
        StatusTargets::new(
            vec![PackageVersionStatus::RegisterCompleted],
            vec![PackageVersionStatus::Failed],
            AbsentOutcome::Propagate,
        )
    }

    fn delete_targets(&self) -> StatusTargets<PackageVersionStatus> {
        StatusTargets::new(vec![], vec![], AbsentOutcome::Succeeded)
    }

    async fn create(&self, gw: &Gateway<'_>, model: &mut PackageVersion) -> HandlerResult<()> {
        let key = Self::key_of(model)?;
        let call = Call::new("DescribePackageVersion", &key).with_request(&*model);
        let existing = gw
            .invoke(call, self.api.describe_package_version(model))
            .await;
        match existing {
            Ok(_) => return Err(HandlerError::already_exists(PACKAGE_VERSION, &key)),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }
        self.register(gw, model, &key).await
    }

    async fn describe(
        &self,
        gw: &Gateway<'_>,
        model: &PackageVersion,
    ) -> HandlerResult<Snapshot<PackageVersion, PackageVersionStatus>> {
        let key = Self::key_of(model)?;
        let call = Call::new("DescribePackageVersion", &key).with_request(model);
        let mut remote = gw
            .invoke(call, self.api.describe_package_version(model))
            .await?;
        remote.mark_latest = model.mark_latest;
        remote.updated_latest_patch_version = model.updated_latest_patch_version.clone();
        let status = remote.remote_status();
        Ok(Snapshot::new(remote, status))
    }

    async fn delete(&self, gw: &Gateway<'_>, model: &PackageVersion) -> HandlerResult<()> {
        let key = Self::key_of(model)?;
        let api = &self.api;
        let call = Call::new("DeregisterPackageVersion", &key).with_request(model);
        gw.invoke_delete(call, api.deregister_package_version(model), || async move {
            api.describe_package_version(model).await.map(|_| false)
        })
        .await
    }

    async fn update(
        &self,
        gw: &Gateway<'_>,
        desired: &mut PackageVersion,
        _previous: Option<&PackageVersion>,
    ) -> HandlerResult<UpdatePlan> {
        let key = Self::key_of(desired)?;
        let call = Call::new("DescribePackageVersion", &key).with_request(&*desired);
        let current = gw
            .invoke(call, self.api.describe_package_version(desired))
            .await?;
        if current.is_latest_patch == Some(true) {
            return Err(HandlerError::not_updatable(
                PACKAGE_VERSION,
                &key,
                "the latest patch version cannot be updated",
            ));
        }

        self.register(gw, desired, &key).await?;
        Ok(UpdatePlan::Stabilize)
    }
}
