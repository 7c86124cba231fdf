//! Panorama API - The remote calls the resource handlers depend on
//!
//! Responses come back already translated into resource models. Failures are
//! raw [`Fault`]s; classification happens in the gateway.

use std::collections::HashMap;

use async_trait::async_trait;
use panorama_core::Fault;

use crate::resources::application_instance::{ApplicationInstance, ManifestDetails};
use crate::resources::package::Package;
use crate::resources::package_version::PackageVersion;

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

/// Filters for listing application instances
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationInstanceQuery {
    pub device_id: Option<String>,
    pub status_filter: Option<String>,
    pub next_token: Option<String>,
}

#[async_trait]
pub trait PanoramaApi: Send + Sync {
    /// Returns the new application instance ID
    async fn create_application_instance(
        &self,
        model: &ApplicationInstance,
    ) -> Result<String, Fault>;

    async fn describe_application_instance(&self, id: &str) -> Result<ApplicationInstance, Fault>;

    async fn describe_application_instance_details(
        &self,
        id: &str,
    ) -> Result<ManifestDetails, Fault>;

    async fn remove_application_instance(&self, id: &str) -> Result<(), Fault>;

    async fn list_application_instances(
        &self,
        query: &ApplicationInstanceQuery,
    ) -> Result<Page<ApplicationInstance>, Fault>;

    /// Returns the new package ID
    async fn create_package(&self, model: &Package) -> Result<String, Fault>;

    async fn describe_package(&self, id: &str) -> Result<Package, Fault>;

    async fn delete_package(&self, id: &str) -> Result<(), Fault>;

    async fn list_packages(
        &self,
        max_results: i32,
        next_token: Option<&str>,
    ) -> Result<Page<Package>, Fault>;

    /// Describe the version named by the key fields of `model`
    async fn describe_package_version(
        &self,
        model: &PackageVersion,
    ) -> Result<PackageVersion, Fault>;

    async fn register_package_version(&self, model: &PackageVersion) -> Result<(), Fault>;

    async fn deregister_package_version(&self, model: &PackageVersion) -> Result<(), Fault>;

    async fn tag_resource(&self, arn: &str, tags: HashMap<String, String>) -> Result<(), Fault>;

    async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> Result<(), Fault>;
}
