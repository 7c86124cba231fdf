//! Panorama Provider
//!
//! CloudFormation resource handlers for AWS Panorama.
//!
//! ## Module Structure
//!
//! - `api` - The remote calls handlers depend on
//! - `client` - AWS SDK implementation of the API
//! - `resources` - Models and handlers per resource type
//! - `provider` - Dispatch by resource type name

pub mod api;
pub mod client;
pub mod provider;
pub mod resources;

#[cfg(test)]
mod testing;

pub use api::PanoramaApi;
pub use client::PanoramaClient;
pub use provider::{PanoramaProvider, ProviderError, ProviderResult};
pub use resources::type_names;
