//! Panorama Core
//!
//! Resource-handler core for CloudFormation-managed Panorama resources: fault
//! classification, single-shot remote calls, resumable status polling and the
//! lifecycle pipelines built on them.

pub mod classify;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod oplog;
pub mod orchestrator;
pub mod progress;
pub mod request;
pub mod stabilize;
pub mod tags;

pub use config::HandlerConfig;
pub use error::{ErrorKind, Fault, FaultKind, HandlerError, HandlerResult};
pub use gateway::{Call, Gateway};
pub use handler::{ListPage, ResourceHandler, Snapshot, UpdatePlan};
pub use oplog::OperationLog;
pub use orchestrator::Orchestrator;
pub use progress::{CallbackContext, OperationStatus, ProgressEvent};
pub use request::{Action, HandlerRequest};
pub use stabilize::{AbsentOutcome, StabilizationPolicy, StatusTargets};
pub use tags::{Tag, TagDelta};
