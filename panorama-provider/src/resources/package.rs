//! AWS::Panorama::Package
//!
//! Packages carry no status. A package is ready once describe can see it, and
//! gone once describe reports it missing.

use std::sync::Arc;

use async_trait::async_trait;
use panorama_core::{
    AbsentOutcome, Call, Gateway, HandlerError, HandlerResult, ListPage, ResourceHandler,
    Snapshot, StabilizationPolicy, StatusTargets, Tag, UpdatePlan,
};
use serde::{Deserialize, Serialize};

use super::{PACKAGE, sync_tags};
use crate::api::PanoramaApi;

pub const DEFAULT_POLICY: StabilizationPolicy = StabilizationPolicy::new(60, 24 * 60 * 60);

pub const DEFAULT_PAGE_SIZE: i32 = 10;

/// Observed state of a package. Only visibility is observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    Available,
}

impl std::fmt::Display for PackageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AVAILABLE")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StorageLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_prefix_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_prefix_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_prefix_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_prefix_location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Package {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,

    // Read-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Epoch seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<StorageLocation>,
}

pub struct PackageHandler {
    api: Arc<dyn PanoramaApi>,
    policy: StabilizationPolicy,
    page_size: i32,
}

impl PackageHandler {
    pub fn new(api: Arc<dyn PanoramaApi>, policy: StabilizationPolicy) -> Self {
        Self {
            api,
            policy,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    fn id_of(model: &Package) -> HandlerResult<&str> {
        model
            .package_id
            .as_deref()
            .ok_or_else(|| HandlerError::invalid_request("PackageId is required"))
    }
}

#[async_trait]
impl ResourceHandler for PackageHandler {
    type Model = Package;
    type Status = PackageState;

    fn type_name(&self) -> &'static str {
        PACKAGE
    }

    fn identifier(&self, model: &Package) -> Option<String> {
        model.package_id.clone()
    }

    fn policy(&self) -> StabilizationPolicy {
        self.policy
    }

    /// A freshly created package may not be visible yet
    fn create_targets(&self) -> StatusTargets<PackageState> {
        StatusTargets::new(
            vec![PackageState::Available],
            vec![],
            AbsentOutcome::KeepPolling,
        )
    }

    fn delete_targets(&self) -> StatusTargets<PackageState> {
        StatusTargets::new(vec![], vec![], AbsentOutcome::Succeeded)
    }

    async fn create(&self, gw: &Gateway<'_>, model: &mut Package) -> HandlerResult<()> {
        let name = model.package_name.clone().unwrap_or_default();
        let call = Call::new("CreatePackage", name).with_request(&*model);
        let id = gw.invoke(call, self.api.create_package(model)).await?;
        model.package_id = Some(id);
        Ok(())
    }

    async fn describe(
        &self,
        gw: &Gateway<'_>,
        model: &Package,
    ) -> HandlerResult<Snapshot<Package, PackageState>> {
        let id = Self::id_of(model)?;
        let call = Call::new("DescribePackage", id).with_request(&id);
        let remote = gw.invoke(call, self.api.describe_package(id)).await?;
        Ok(Snapshot::new(remote, Some(PackageState::Available)))
    }

    async fn delete(&self, gw: &Gateway<'_>, model: &Package) -> HandlerResult<()> {
        let id = Self::id_of(model)?;
        let api = &self.api;
        let call = Call::new("DeletePackage", id).with_request(&id);
        gw.invoke_delete(call, api.delete_package(id), || async move {
            api.describe_package(id).await.map(|_| false)
        })
        .await
    }

    async fn update(
        &self,
        gw: &Gateway<'_>,
        desired: &mut Package,
        previous: Option<&Package>,
    ) -> HandlerResult<UpdatePlan> {
        let id = Self::id_of(desired)?.to_string();
        let call = Call::new("DescribePackage", &id).with_request(&id);
        let current = gw.invoke(call, self.api.describe_package(&id)).await?;

        let arn = current.arn.clone().ok_or_else(|| {
            HandlerError::not_found(PACKAGE, &id).for_operation("DescribePackage")
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

    async fn list(
        &self,
        gw: &Gateway<'_>,
        _filter: &Package,
        next_token: Option<String>,
    ) -> HandlerResult<ListPage<Package, PackageState>> {
        let call = Call::new("ListPackages", "").with_request(&next_token);
        let token = next_token.as_deref();
        let page = gw
            .invoke(call, self.api.list_packages(self.page_size, token))
            .await?;

        let entries = page
            .items
            .into_iter()
            .map(|package| Snapshot::new(package, Some(PackageState::Available)))
            .collect();
        Ok(ListPage {
            entries,
            next_token: page.next_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Page;
    use crate::testing::MockPanorama;
    use panorama_core::{Action, ErrorKind, Fault, HandlerRequest, OperationStatus, Orchestrator};

    fn orchestrator(mock: &Arc<MockPanorama>) -> Orchestrator<PackageHandler> {
        Orchestrator::new(PackageHandler::new(mock.clone(), DEFAULT_POLICY))
    }

    fn package(id: &str) -> Package {
        Package {
            package_id: Some(id.to_string()),
            package_name: Some("detector".to_string()),
            arn: Some(format!(
                "arn:aws:panorama:us-east-1:123456789012:package/{}",
                id
            )),
            ..Package::default()
        }
    }

    #[tokio::test]
    async fn create_keeps_polling_until_visible() {
        let mock = Arc::new(MockPanorama::new());
        mock.on("CreatePackage", Ok("package-1".to_string()));
        mock.on::<Package>("DescribePackage", Err(Fault::not_found("not yet")));
        mock.on("DescribePackage", Ok(package("package-1")));
        let orchestrator = orchestrator(&mock);

        let desired = Package {
            package_name: Some("detector".to_string()),
            ..Package::default()
        };
        let first = orchestrator
            .handle(HandlerRequest::new(Action::Create, desired))
            .await;
        assert!(first.is_in_progress());
        assert_eq!(first.callback_delay_seconds, 60);

        let second = orchestrator
            .handle(
                HandlerRequest::new(Action::Create, first.resource_model.unwrap())
                    .with_callback_context(first.callback_context.unwrap()),
            )
            .await;
        assert_eq!(second.status, OperationStatus::Success);
        assert_eq!(
            second.resource_model.unwrap().arn.as_deref(),
            Some("arn:aws:panorama:us-east-1:123456789012:package/package-1")
        );
        assert_eq!(mock.count("CreatePackage"), 1);
        assert_eq!(mock.count("DescribePackage"), 2);
    }

    #[tokio::test]
    async fn delete_polls_until_missing() {
        let mock = Arc::new(MockPanorama::new());
        mock.on("DeletePackage", Ok(()));
        mock.on::<Package>("DescribePackage", Err(Fault::not_found("gone")));

        let event = orchestrator(&mock)
            .handle(HandlerRequest::new(Action::Delete, package("package-1")))
            .await;
        assert_eq!(event.status, OperationStatus::Success);
        assert!(event.resource_model.is_none());
    }

    #[tokio::test]
    async fn delete_of_missing_package_succeeds() {
        let mock = Arc::new(MockPanorama::new());
        mock.on::<()>("DeletePackage", Err(Fault::not_found("no such package")));

        let event = orchestrator(&mock)
            .handle(HandlerRequest::new(Action::Delete, package("package-1")))
            .await;
        assert_eq!(event.status, OperationStatus::Success);
        assert_eq!(mock.count("DescribePackage"), 0);
    }

    #[tokio::test]
    async fn delete_conflict_on_live_package_is_conflict() {
        let mock = Arc::new(MockPanorama::new());
        mock.on::<()>(
            "DeletePackage",
            Err(Fault::conflict("package has versions")),
        );
        mock.on("DescribePackage", Ok(package("package-1")));

        let event = orchestrator(&mock)
            .handle(HandlerRequest::new(Action::Delete, package("package-1")))
            .await;
        assert_eq!(event.error_code, Some(ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn update_adds_tags_without_previous_removals() {
        let mock = Arc::new(MockPanorama::new());
        mock.on("DescribePackage", Ok(package("package-1")));
        mock.on("DescribePackage", Ok(package("package-1")));

        let desired = Package {
            tags: Some(vec![Tag::new("stage", "beta")]),
            ..package("package-1")
        };
        let previous = package("package-1");
        let request = HandlerRequest::new(Action::Update, desired).with_previous(previous);
        let event = orchestrator(&mock).handle(request).await;
        assert_eq!(event.status, OperationStatus::Success);
        assert_eq!(mock.count("TagResource"), 1);
        assert_eq!(mock.count("UntagResource"), 0);
    }

    #[tokio::test]
    async fn list_uses_page_size() {
        let mock = Arc::new(MockPanorama::new());
        mock.on(
            "ListPackages",
            Ok(Page {
                items: vec![package("package-1"), package("package-2")],
                next_token: None,
            }),
        );

        let orchestrator =
            Orchestrator::new(PackageHandler::new(mock.clone(), DEFAULT_POLICY).with_page_size(25));
        let event = orchestrator
            .handle(HandlerRequest::new(Action::List, Package::default()))
            .await;
        assert_eq!(event.resource_models.unwrap().len(), 2);
        assert!(event.next_token.is_none());
        assert_eq!(mock.last_page_size(), Some(25));
    }
}
