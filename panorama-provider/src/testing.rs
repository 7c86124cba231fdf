//! Scripted in-memory PanoramaApi for tests

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use panorama_core::Fault;

use crate::api::{ApplicationInstanceQuery, Page, PanoramaApi};
use crate::resources::application_instance::{ApplicationInstance, ManifestDetails};
use crate::resources::package::Package;
use crate::resources::package_version::PackageVersion;

type Scripted = Box<dyn Any + Send>;

/// Responses are queued per operation name and consumed in order.
/// Operations returning `()` succeed when nothing is queued.
#[derive(Default)]
pub struct MockPanorama {
    responses: Mutex<HashMap<&'static str, VecDeque<Scripted>>>,
    calls: Mutex<Vec<&'static str>>,
    tagged: Mutex<Vec<HashMap<String, String>>>,
    untagged: Mutex<Vec<Vec<String>>>,
    instance_queries: Mutex<Vec<ApplicationInstanceQuery>>,
    page_sizes: Mutex<Vec<i32>>,
}

impl MockPanorama {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<T: Send + 'static>(&self, operation: &'static str, response: Result<T, Fault>) {
        self.responses
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(Box::new(response));
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == operation)
            .count()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tagged(&self) -> Vec<HashMap<String, String>> {
        self.tagged.lock().unwrap().clone()
    }

    pub fn untagged(&self) -> Vec<Vec<String>> {
        self.untagged.lock().unwrap().clone()
    }

    pub fn last_instance_query(&self) -> Option<ApplicationInstanceQuery> {
        self.instance_queries.lock().unwrap().last().cloned()
    }

    pub fn last_page_size(&self) -> Option<i32> {
        self.page_sizes.lock().unwrap().last().copied()
    }

    fn pop(&self, operation: &'static str) -> Option<Scripted> {
        self.calls.lock().unwrap().push(operation);
        self.responses
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
    }

    fn next<T: 'static>(&self, operation: &'static str) -> Result<T, Fault> {
        let scripted = self
            .pop(operation)
            .unwrap_or_else(|| panic!("no scripted response for {}", operation));
        downcast(operation, scripted)
    }

    fn next_unit(&self, operation: &'static str) -> Result<(), Fault> {
        match self.pop(operation) {
            Some(scripted) => downcast(operation, scripted),
            None => Ok(()),
        }
    }
}

fn downcast<T: 'static>(operation: &str, scripted: Scripted) -> Result<T, Fault> {
    match scripted.downcast::<Result<T, Fault>>() {
        Ok(response) => *response,
        Err(_) => panic!("scripted response for {} has the wrong type", operation),
    }
}

#[async_trait]
impl PanoramaApi for MockPanorama {
    async fn create_application_instance(
        &self,
        _model: &ApplicationInstance,
    ) -> Result<String, Fault> {
        self.next("CreateApplicationInstance")
    }

    async fn describe_application_instance(&self, _id: &str) -> Result<ApplicationInstance, Fault> {
        self.next("DescribeApplicationInstance")
    }

    async fn describe_application_instance_details(
        &self,
        _id: &str,
    ) -> Result<ManifestDetails, Fault> {
        self.next("DescribeApplicationInstanceDetails")
    }

    async fn remove_application_instance(&self, _id: &str) -> Result<(), Fault> {
        self.next_unit("RemoveApplicationInstance")
    }

    async fn list_application_instances(
        &self,
        query: &ApplicationInstanceQuery,
    ) -> Result<Page<ApplicationInstance>, Fault> {
        self.instance_queries.lock().unwrap().push(query.clone());
        self.next("ListApplicationInstances")
    }

    async fn create_package(&self, _model: &Package) -> Result<String, Fault> {
        self.next("CreatePackage")
    }

    async fn describe_package(&self, _id: &str) -> Result<Package, Fault> {
        self.next("DescribePackage")
    }

    async fn delete_package(&self, _id: &str) -> Result<(), Fault> {
        self.next_unit("DeletePackage")
    }

    async fn list_packages(
        &self,
        max_results: i32,
        _next_token: Option<&str>,
    ) -> Result<Page<Package>, Fault> {
        self.page_sizes.lock().unwrap().push(max_results);
        self.next("ListPackages")
    }

    async fn describe_package_version(
        &self,
        _model: &PackageVersion,
    ) -> Result<PackageVersion, Fault> {
        self.next("DescribePackageVersion")
    }

    async fn register_package_version(&self, _model: &PackageVersion) -> Result<(), Fault> {
        self.next_unit("RegisterPackageVersion")
    }

    async fn deregister_package_version(&self, _model: &PackageVersion) -> Result<(), Fault> {
        self.next_unit("DeregisterPackageVersion")
    }

    async fn tag_resource(&self, _arn: &str, tags: HashMap<String, String>) -> Result<(), Fault> {
        self.tagged.lock().unwrap().push(tags);
        self.next_unit("TagResource")
    }

    async fn untag_resource(&self, _arn: &str, keys: Vec<String>) -> Result<(), Fault> {
        self.untagged.lock().unwrap().push(keys);
        self.next_unit("UntagResource")
    }
}
