//! Panorama provider - Dispatch handler requests by resource type name
//!
//! Requests and progress events cross this boundary as JSON so the host does
//! not need to know the per-type models.

use std::sync::Arc;

use panorama_core::{HandlerConfig, HandlerRequest, Orchestrator, ResourceHandler};
use serde_json::Value;
use thiserror::Error;

use crate::api::PanoramaApi;
use crate::client::PanoramaClient;
use crate::resources::{
    APPLICATION_INSTANCE, ApplicationInstanceHandler, PACKAGE, PACKAGE_VERSION, PackageHandler,
    PackageVersionHandler, application_instance, package, package_version,
};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unknown resource type: {0}")]
    UnknownType(String),

    #[error("Malformed handler request: {0}")]
    MalformedRequest(#[source] serde_json::Error),

    #[error("Failed to serialize progress event: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Handlers for every supported Panorama resource type
pub struct PanoramaProvider {
    application_instance: Orchestrator<ApplicationInstanceHandler>,
    package: Orchestrator<PackageHandler>,
    package_version: Orchestrator<PackageVersionHandler>,
}

impl PanoramaProvider {
    /// Create a provider backed by the AWS SDK
    pub async fn new(config: &HandlerConfig) -> Self {
        let client = PanoramaClient::new(config.region.as_deref()).await;
        Self::with_api(Arc::new(client), config)
    }

    pub fn with_api(api: Arc<dyn PanoramaApi>, config: &HandlerConfig) -> Self {
        let mut package_handler = PackageHandler::new(
            api.clone(),
            config.policy_or(PACKAGE, package::DEFAULT_POLICY),
        );
        if let Some(page_size) = config.list_page_size {
            package_handler = package_handler.with_page_size(page_size);
        }

        Self {
            application_instance: Orchestrator::new(ApplicationInstanceHandler::new(
                api.clone(),
                config.policy_or(APPLICATION_INSTANCE, application_instance::DEFAULT_POLICY),
            )),
            package: Orchestrator::new(package_handler),
            package_version: Orchestrator::new(PackageVersionHandler::new(
                api,
                config.policy_or(PACKAGE_VERSION, package_version::DEFAULT_POLICY),
            )),
        }
    }

    /// Run one handler step for `type_name`
    pub async fn handle(&self, type_name: &str, request: Value) -> ProviderResult<Value> {
        log::debug!("dispatching {} request", type_name);
        match type_name {
            APPLICATION_INSTANCE => run(&self.application_instance, request).await,
            PACKAGE => run(&self.package, request).await,
            PACKAGE_VERSION => run(&self.package_version, request).await,
            other => Err(ProviderError::UnknownType(other.to_string())),
        }
    }
}

async fn run<H: ResourceHandler>(
    orchestrator: &Orchestrator<H>,
    request: Value,
) -> ProviderResult<Value> {
    let request: HandlerRequest<H::Model> =
        serde_json::from_value(request).map_err(ProviderError::MalformedRequest)?;
    let event = orchestrator.handle(request).await;
    serde_json::to_value(&event).map_err(ProviderError::Serialize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::package::Package;
    use crate::testing::MockPanorama;
    use panorama_core::Fault;
    use serde_json::json;

    fn provider(mock: &Arc<MockPanorama>) -> PanoramaProvider {
        PanoramaProvider::with_api(mock.clone(), &HandlerConfig::default())
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let mock = Arc::new(MockPanorama::new());
        let err = provider(&mock)
            .handle("AWS::Panorama::Device", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownType(_)));
    }

    #[tokio::test]
    async fn malformed_request_is_rejected() {
        let mock = Arc::new(MockPanorama::new());
        let err = provider(&mock)
            .handle(PACKAGE, json!({"action": "EXPLODE"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRequest(_)));
    }

    #[tokio::test]
    async fn read_package_over_json() {
        let mock = Arc::new(MockPanorama::new());
        mock.on(
            "DescribePackage",
            Ok(Package {
                package_id: Some("package-1".to_string()),
                package_name: Some("detector".to_string()),
                ..Package::default()
            }),
        );

        let event = provider(&mock)
            .handle(
                PACKAGE,
                json!({
                    "action": "READ",
                    "desiredResourceState": {"PackageId": "package-1"}
                }),
            )
            .await
            .unwrap();
        assert_eq!(event["status"], "SUCCESS");
        assert_eq!(event["resourceModel"]["PackageName"], "detector");
    }

    #[tokio::test]
    async fn failures_carry_handler_error_codes() {
        let mock = Arc::new(MockPanorama::new());
        mock.on::<()>(
            "RemoveApplicationInstance",
            Err(Fault::from_response(
                Some("AccessDeniedException"),
                Some(403),
                "not allowed",
            )),
        );

        let event = provider(&mock)
            .handle(
                APPLICATION_INSTANCE,
                json!({
                    "action": "DELETE",
                    "desiredResourceState": {"ApplicationInstanceId": "ai-1"}
                }),
            )
            .await
            .unwrap();
        assert_eq!(event["status"], "FAILED");
        assert_eq!(event["errorCode"], "AccessDenied");
    }

    #[tokio::test]
    async fn configured_policy_sets_callback_delay() {
        let mock = Arc::new(MockPanorama::new());
        mock.on("CreatePackage", Ok("package-1".to_string()));
        mock.on::<Package>("DescribePackage", Err(Fault::not_found("not yet")));
        let config = HandlerConfig::from_json(
            r#"{"stabilization": {"AWS::Panorama::Package": {"delaySeconds": 5, "timeoutSeconds": 100}}}"#,
        )
        .unwrap();

        let event = PanoramaProvider::with_api(mock.clone(), &config)
            .handle(
                PACKAGE,
                json!({"action": "CREATE", "desiredResourceState": {"PackageName": "detector"}}),
            )
            .await
            .unwrap();
        assert_eq!(event["status"], "IN_PROGRESS");
        assert_eq!(event["callbackDelaySeconds"], 5);
        assert_eq!(event["callbackContext"]["stage"], "STABILIZING");
    }
}
