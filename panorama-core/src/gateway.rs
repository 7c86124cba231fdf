//! Gateway - Execute one remote call and classify its failure
//!
//! Calls are single-shot. Nothing here retries; repeated status reads are the
//! poller's business.

use std::fmt::Debug;
use std::future::Future;

use crate::classify::{FaultContext, classify};
use crate::error::{Fault, FaultKind, HandlerError, HandlerResult};
use crate::oplog::OperationLog;

/// Description of a remote call, used when classifying its failure
#[derive(Debug, Clone)]
pub struct Call {
    pub operation: &'static str,
    pub identifier: String,
    pub request: String,
}

impl Call {
    pub fn new(operation: &'static str, identifier: impl Into<String>) -> Self {
        Self {
            operation,
            identifier: identifier.into(),
            request: String::new(),
        }
    }

    pub fn with_request(mut self, request: &impl Debug) -> Self {
        self.request = format!("{:?}", request);
        self
    }
}

pub struct Gateway<'a> {
    log: &'a OperationLog,
}

impl<'a> Gateway<'a> {
    pub fn new(log: &'a OperationLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &'a OperationLog {
        self.log
    }

    pub fn type_name(&self) -> &'static str {
        self.log.type_name()
    }

    /// Run `remote` once, classifying any fault
    pub async fn invoke<T, F>(&self, call: Call, remote: F) -> HandlerResult<T>
    where
        F: Future<Output = Result<T, Fault>>,
    {
        self.log.debug(format!("calling {}", call.operation));
        match remote.await {
            Ok(response) => Ok(response),
            Err(fault) => Err(self.classify(&call, &fault)),
        }
    }

    /// Run a delete call once.
    ///
    /// A Conflict is re-checked with `confirm_removed`: when the follow-up read
    /// shows the resource already removed (or gone), the outcome becomes
    /// NotFound instead of Conflict.
    pub async fn invoke_delete<T, F, C, CF>(
        &self,
        call: Call,
        remote: F,
        confirm_removed: C,
    ) -> HandlerResult<T>
    where
        F: Future<Output = Result<T, Fault>>,
        C: FnOnce() -> CF,
        CF: Future<Output = Result<bool, Fault>>,
    {
        self.log.debug(format!("calling {}", call.operation));
        let fault = match remote.await {
            Ok(response) => return Ok(response),
            Err(fault) => fault,
        };

        if fault.kind != FaultKind::Conflict {
            return Err(self.classify(&call, &fault));
        }

        let removed = match confirm_removed().await {
            Ok(removed) => removed,
            Err(read_fault) if read_fault.is_not_found() => true,
            Err(read_fault) => {
                self.log.warn(format!(
                    "could not confirm removal after conflict: {}",
                    read_fault
                ));
                false
            }
        };

        if removed {
            self.log
                .info("delete conflicted but the resource is already removed");
            Err(self.classify(
                &call,
                &Fault::not_found(format!("already removed: {}", fault.message)),
            ))
        } else {
            Err(self.classify(&call, &fault))
        }
    }

    fn classify(&self, call: &Call, fault: &Fault) -> HandlerError {
        let ctx = FaultContext {
            operation: call.operation,
            type_name: self.type_name(),
            identifier: &call.identifier,
            request: &call.request,
        };
        classify(fault, &ctx, self.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::request::Action;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn log() -> OperationLog {
        OperationLog::new("AWS::Panorama::ApplicationInstance", Action::Delete)
    }

    #[tokio::test]
    async fn invoke_passes_response_through() {
        let log = log();
        let gw = Gateway::new(&log);
        let result = gw
            .invoke(Call::new("DescribeApplicationInstance", "ai-1"), async {
                Ok::<_, Fault>(42)
            })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn invoke_classifies_fault() {
        let log = log();
        let gw = Gateway::new(&log);
        let result: HandlerResult<()> = gw
            .invoke(
                Call::new("DescribeApplicationInstance", "ai-1"),
                async { Err(Fault::new(FaultKind::AccessDenied, "no")) },
            )
            .await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::AccessDenied);
    }

    #[tokio::test]
    async fn delete_conflict_on_removed_resource_becomes_not_found() {
        let log = log();
        let gw = Gateway::new(&log);
        let result: HandlerResult<()> = gw
            .invoke_delete(
                Call::new("RemoveApplicationInstance", "ai-1"),
                async { Err(Fault::conflict("already removing")) },
                || async { Ok(true) },
            )
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.identifier.as_deref(), Some("ai-1"));
    }

    #[tokio::test]
    async fn delete_conflict_on_gone_resource_becomes_not_found() {
        let log = log();
        let gw = Gateway::new(&log);
        let result: HandlerResult<()> = gw
            .invoke_delete(
                Call::new("RemoveApplicationInstance", "ai-1"),
                async { Err(Fault::conflict("busy")) },
                || async { Err(Fault::not_found("missing")) },
            )
            .await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn delete_conflict_on_live_resource_stays_conflict() {
        let log = log();
        let gw = Gateway::new(&log);
        let result: HandlerResult<()> = gw
            .invoke_delete(
                Call::new("RemoveApplicationInstance", "ai-1"),
                async { Err(Fault::conflict("removal in progress")) },
                || async { Ok(false) },
            )
            .await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn delete_only_confirms_on_conflict() {
        let log = log();
        let gw = Gateway::new(&log);
        let confirms = AtomicUsize::new(0);
        let result: HandlerResult<()> = gw
            .invoke_delete(
                Call::new("RemoveApplicationInstance", "ai-1"),
                async { Err(Fault::new(FaultKind::Validation, "bad id")) },
                || async {
                    confirms.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                },
            )
            .await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::InvalidRequest);
        assert_eq!(confirms.load(Ordering::SeqCst), 0);
    }
}
