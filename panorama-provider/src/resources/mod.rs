//! Resource handlers for the Panorama resource types
//!
//! Each submodule defines the resource model, its remote status enumeration,
//! and the [`panorama_core::ResourceHandler`] that drives it.

use std::collections::HashMap;

use panorama_core::{Call, Gateway, HandlerResult, Tag, TagDelta};

use crate::api::PanoramaApi;

/// Defines a remote status enumeration parsed from the service's string form.
/// Values the service adds later land in `Unknown`.
macro_rules! define_status {
    ($name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
            Unknown(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $value,)+
                    $name::Unknown(s) => s.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($value => $name::$variant,)+
                    other => $name::Unknown(other.to_string()),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod application_instance;
pub mod package;
pub mod package_version;

pub use application_instance::ApplicationInstanceHandler;
pub use package::PackageHandler;
pub use package_version::PackageVersionHandler;

pub const APPLICATION_INSTANCE: &str = "AWS::Panorama::ApplicationInstance";
pub const PACKAGE: &str = "AWS::Panorama::Package";
pub const PACKAGE_VERSION: &str = "AWS::Panorama::PackageVersion";

/// Returns all type names supported by this provider
pub fn type_names() -> &'static [&'static str] {
    &[APPLICATION_INSTANCE, PACKAGE, PACKAGE_VERSION]
}

/// Move the tags on `arn` from `previous` to `desired` with at most one
/// untag call followed by at most one tag call
pub(crate) async fn sync_tags(
    gw: &Gateway<'_>,
    api: &dyn PanoramaApi,
    arn: &str,
    identifier: &str,
    desired: &[Tag],
    previous: &[Tag],
) -> HandlerResult<()> {
    let delta = TagDelta::between(desired, previous);
    if delta.is_empty() {
        gw.log().debug("tags unchanged");
        return Ok(());
    }

    if !delta.to_remove.is_empty() {
        let keys: Vec<String> = delta.to_remove.into_iter().collect();
        let call = Call::new("UntagResource", identifier).with_request(&keys);
        gw.invoke(call, api.untag_resource(arn, keys)).await?;
    }

    if !delta.to_add.is_empty() {
        let tags: HashMap<String, String> = delta.to_add.into_iter().collect();
        let call = Call::new("TagResource", identifier).with_request(&tags);
        gw.invoke(call, api.tag_resource(arn, tags)).await?;
    }

    Ok(())
}
