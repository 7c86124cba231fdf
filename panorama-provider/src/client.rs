//! AWS SDK implementation of [`PanoramaApi`]
//!
//! Translates resource models to SDK requests and SDK responses back to
//! models. SDK errors become [`Fault`]s carrying the service error code and
//! HTTP status.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_panorama::Client;
use aws_sdk_panorama::config::http::HttpResponse;
use aws_sdk_panorama::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_panorama::primitives::DateTime;
use aws_sdk_panorama::types::{self as sdk, StatusFilter};
use panorama_core::{Fault, tags};

use crate::api::{ApplicationInstanceQuery, Page, PanoramaApi};
use crate::resources::application_instance::{ApplicationInstance, ManifestDetails, Payload};
use crate::resources::package::{Package, StorageLocation};
use crate::resources::package_version::PackageVersion;

pub struct PanoramaClient {
    client: Client,
}

impl PanoramaClient {
    /// Build a client from the default credential chain. `region` overrides the
    /// region from the environment.
    pub async fn new(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;
        log::debug!(
            "panorama client configured for region {}",
            config.region().map(|r| r.as_ref()).unwrap_or("<default>")
        );

        Self {
            client: Client::new(&config),
        }
    }
}

/// Convert an SDK error into a fault
fn fault<E>(err: SdkError<E, HttpResponse>) -> Fault
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|raw| raw.status().as_u16());
    let code = err.code().map(str::to_string);
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    Fault::from_response(code.as_deref(), status, message)
}

fn missing(operation: &str, field: &str) -> Fault {
    let message = format!("{} response has no {}", operation, field);
    Fault::from_response(None, None, message)
}

// SDK accessors return bare values for required members and options for the
// rest. These traits read both the same way.

trait SdkField {
    fn field(self) -> Option<String>;
}

impl<T: AsRef<str> + ?Sized> SdkField for &T {
    fn field(self) -> Option<String> {
        Some(self.as_ref().to_string())
    }
}

impl<T: AsRef<str> + ?Sized> SdkField for Option<&T> {
    fn field(self) -> Option<String> {
        self.map(|v| v.as_ref().to_string())
    }
}

trait SdkTime {
    fn epoch_seconds(self) -> Option<i64>;
}

impl SdkTime for &DateTime {
    fn epoch_seconds(self) -> Option<i64> {
        Some(self.secs())
    }
}

impl SdkTime for Option<&DateTime> {
    fn epoch_seconds(self) -> Option<i64> {
        self.map(DateTime::secs)
    }
}

trait SdkFlag {
    fn flag(self) -> Option<bool>;
}

impl SdkFlag for bool {
    fn flag(self) -> Option<bool> {
        Some(self)
    }
}

impl SdkFlag for Option<bool> {
    fn flag(self) -> Option<bool> {
        self
    }
}

trait SdkList<'a, T> {
    fn items(self) -> &'a [T];
}

impl<'a, T> SdkList<'a, T> for &'a [T] {
    fn items(self) -> &'a [T] {
        self
    }
}

impl<'a, T> SdkList<'a, T> for Option<&'a [T]> {
    fn items(self) -> &'a [T] {
        self.unwrap_or_default()
    }
}

trait SdkTags {
    fn model_tags(self) -> Option<Vec<panorama_core::Tag>>;
}

impl SdkTags for &HashMap<String, String> {
    fn model_tags(self) -> Option<Vec<panorama_core::Tag>> {
        tags::from_map(self.clone())
    }
}

impl SdkTags for Option<&HashMap<String, String>> {
    fn model_tags(self) -> Option<Vec<panorama_core::Tag>> {
        self.and_then(SdkTags::model_tags)
    }
}

fn request_tags(model_tags: &Option<Vec<panorama_core::Tag>>) -> Option<HashMap<String, String>> {
    model_tags
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(tags::to_map)
}

fn payload_data(payload: &Option<Payload>) -> Option<String> {
    payload.as_ref().and_then(|p| p.payload_data.clone())
}

fn instance_from_list(item: &sdk::ApplicationInstance) -> ApplicationInstance {
    ApplicationInstance {
        name: item.name().field(),
        description: item.description().field(),
        default_runtime_context_device: item.default_runtime_context_device().field(),
        default_runtime_context_device_name: item.default_runtime_context_device_name().field(),
        application_instance_id: item.application_instance_id().field(),
        arn: item.arn().field(),
        status: item.status().field(),
        health_status: item.health_status().field(),
        status_description: item.status_description().field(),
        created_time: item.created_time().epoch_seconds(),
        tags: item.tags().model_tags(),
        ..ApplicationInstance::default()
    }
}

fn package_from_list(item: &sdk::PackageListItem) -> Package {
    Package {
        package_id: item.package_id().field(),
        package_name: item.package_name().field(),
        arn: item.arn().field(),
        created_time: item.created_time().epoch_seconds(),
        tags: item.tags().model_tags(),
        storage_location: None,
    }
}

#[async_trait]
impl PanoramaApi for PanoramaClient {
    async fn create_application_instance(
        &self,
        model: &ApplicationInstance,
    ) -> Result<String, Fault> {
        let mut request = self
            .client
            .create_application_instance()
            .set_name(model.name.clone())
            .set_description(model.description.clone())
            .set_runtime_role_arn(model.runtime_role_arn.clone())
            .set_default_runtime_context_device(model.default_runtime_context_device.clone())
            .set_application_instance_id_to_replace(
                model.application_instance_id_to_replace.clone(),
            )
            .set_tags(request_tags(&model.tags));
        if let Some(data) = payload_data(&model.manifest_payload) {
            request = request.manifest_payload(sdk::ManifestPayload::PayloadData(data));
        }
        if let Some(data) = payload_data(&model.manifest_overrides_payload) {
            request = request
                .manifest_overrides_payload(sdk::ManifestOverridesPayload::PayloadData(data));
        }

        let output = request.send().await.map_err(fault)?;
        output
            .application_instance_id()
            .field()
            .ok_or_else(|| missing("CreateApplicationInstance", "ApplicationInstanceId"))
    }

    async fn describe_application_instance(&self, id: &str) -> Result<ApplicationInstance, Fault> {
        let output = self
            .client
            .describe_application_instance()
            .application_instance_id(id)
            .send()
            .await
            .map_err(fault)?;

        Ok(ApplicationInstance {
            name: output.name().field(),
            description: output.description().field(),
            runtime_role_arn: output.runtime_role_arn().field(),
            default_runtime_context_device: output.default_runtime_context_device().field(),
            default_runtime_context_device_name: output
                .default_runtime_context_device_name()
                .field(),
            application_instance_id_to_replace: output.application_instance_id_to_replace().field(),
            application_instance_id: output.application_instance_id().field(),
            arn: output.arn().field(),
            status: output.status().field(),
            health_status: output.health_status().field(),
            status_description: output.status_description().field(),
            created_time: output.created_time().epoch_seconds(),
            last_updated_time: output.last_updated_time().epoch_seconds(),
            tags: output.tags().model_tags(),
            ..ApplicationInstance::default()
        })
    }

    async fn describe_application_instance_details(
        &self,
        id: &str,
    ) -> Result<ManifestDetails, Fault> {
        let output = self
            .client
            .describe_application_instance_details()
            .application_instance_id(id)
            .send()
            .await
            .map_err(fault)?;

        let manifest_payload = output
            .manifest_payload()
            .and_then(|p| p.as_payload_data().ok())
            .map(|data| Payload {
                payload_data: Some(data.clone()),
            });
        let manifest_overrides_payload = output
            .manifest_overrides_payload()
            .and_then(|p| p.as_payload_data().ok())
            .map(|data| Payload {
                payload_data: Some(data.clone()),
            });

        Ok(ManifestDetails {
            manifest_payload,
            manifest_overrides_payload,
        })
    }

    async fn remove_application_instance(&self, id: &str) -> Result<(), Fault> {
        self.client
            .remove_application_instance()
            .application_instance_id(id)
            .send()
            .await
            .map_err(fault)?;
        Ok(())
    }

    async fn list_application_instances(
        &self,
        query: &ApplicationInstanceQuery,
    ) -> Result<Page<ApplicationInstance>, Fault> {
        let output = self
            .client
            .list_application_instances()
            .set_device_id(query.device_id.clone())
            .set_status_filter(query.status_filter.as_deref().map(StatusFilter::from))
            .set_next_token(query.next_token.clone())
            .send()
            .await
            .map_err(fault)?;

        Ok(Page {
            items: output
                .application_instances()
                .items()
                .iter()
                .map(instance_from_list)
                .collect(),
            next_token: output.next_token().field(),
        })
    }

    async fn create_package(&self, model: &Package) -> Result<String, Fault> {
        let output = self
            .client
            .create_package()
            .set_package_name(model.package_name.clone())
            .set_tags(request_tags(&model.tags))
            .send()
            .await
            .map_err(fault)?;
        output
            .package_id()
            .field()
            .ok_or_else(|| missing("CreatePackage", "PackageId"))
    }

    async fn describe_package(&self, id: &str) -> Result<Package, Fault> {
        let output = self
            .client
            .describe_package()
            .package_id(id)
            .send()
            .await
            .map_err(fault)?;

        let storage_location = output.storage_location().map(|location| StorageLocation {
            bucket: location.bucket().field(),
            repo_prefix_location: location.repo_prefix_location().field(),
            generated_prefix_location: location.generated_prefix_location().field(),
            binary_prefix_location: location.binary_prefix_location().field(),
            manifest_prefix_location: location.manifest_prefix_location().field(),
        });

        Ok(Package {
            package_id: output.package_id().field(),
            package_name: output.package_name().field(),
            arn: output.arn().field(),
            created_time: output.created_time().epoch_seconds(),
            tags: output.tags().model_tags(),
            storage_location,
        })
    }

    async fn delete_package(&self, id: &str) -> Result<(), Fault> {
        self.client
            .delete_package()
            .package_id(id)
            .force_delete(false)
            .send()
            .await
            .map_err(fault)?;
        Ok(())
    }

    async fn list_packages(
        &self,
        max_results: i32,
        next_token: Option<&str>,
    ) -> Result<Page<Package>, Fault> {
        let output = self
            .client
            .list_packages()
            .max_results(max_results)
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(fault)?;

        Ok(Page {
            items: output
                .packages()
                .items()
                .iter()
                .map(package_from_list)
                .collect(),
            next_token: output.next_token().field(),
        })
    }

    async fn describe_package_version(
        &self,
        model: &PackageVersion,
    ) -> Result<PackageVersion, Fault> {
        let output = self
            .client
            .describe_package_version()
            .set_owner_account(model.owner_account.clone())
            .set_package_id(model.package_id.clone())
            .set_package_version(model.package_version.clone())
            .set_patch_version(model.patch_version.clone())
            .send()
            .await
            .map_err(fault)?;

        Ok(PackageVersion {
            owner_account: output.owner_account().field(),
            package_id: output.package_id().field(),
            package_version: output.package_version().field(),
            patch_version: output.patch_version().field(),
            package_arn: output.package_arn().field(),
            package_name: output.package_name().field(),
            is_latest_patch: output.is_latest_patch().flag(),
            status: output.status().field(),
            status_description: output.status_description().field(),
            registered_time: output.registered_time().epoch_seconds(),
            ..PackageVersion::default()
        })
    }

    async fn register_package_version(&self, model: &PackageVersion) -> Result<(), Fault> {
        self.client
            .register_package_version()
            .set_owner_account(model.owner_account.clone())
            .set_package_id(model.package_id.clone())
            .set_package_version(model.package_version.clone())
            .set_patch_version(model.patch_version.clone())
            .set_mark_latest(model.mark_latest)
            .send()
            .await
            .map_err(fault)?;
        Ok(())
    }

    async fn deregister_package_version(&self, model: &PackageVersion) -> Result<(), Fault> {
        self.client
            .deregister_package_version()
            .set_owner_account(model.owner_account.clone())
            .set_package_id(model.package_id.clone())
            .set_package_version(model.package_version.clone())
            .set_patch_version(model.patch_version.clone())
            .set_updated_latest_patch_version(model.updated_latest_patch_version.clone())
            .send()
            .await
            .map_err(fault)?;
        Ok(())
    }

    async fn tag_resource(&self, arn: &str, tags: HashMap<String, String>) -> Result<(), Fault> {
        self.client
            .tag_resource()
            .resource_arn(arn)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(fault)?;
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> Result<(), Fault> {
        self.client
            .untag_resource()
            .resource_arn(arn)
            .set_tag_keys(Some(keys))
            .send()
            .await
            .map_err(fault)?;
        Ok(())
    }
}
