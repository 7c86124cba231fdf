//! Classify - Translate remote faults into the caller-facing taxonomy
//!
//! Priority is fixed and the first match wins: validation, access denied,
//! not found, conflict, quota, server fault, then the general catch-all.

use crate::error::{ErrorKind, Fault, FaultKind, HandlerError};
use crate::oplog::OperationLog;

/// Longest request dump written to the log
pub const MAX_REQUEST_DUMP: usize = 1024;

/// Where a fault happened
#[derive(Debug, Clone, Copy)]
pub struct FaultContext<'a> {
    /// Remote operation name (e.g. "CreatePackage")
    pub operation: &'a str,
    /// Resource type name (e.g. "AWS::Panorama::Package")
    pub type_name: &'a str,
    pub identifier: &'a str,
    /// Debug rendering of the request that failed
    pub request: &'a str,
}

/// Classify a fault and log it.
pub fn classify(fault: &Fault, ctx: &FaultContext<'_>, log: &OperationLog) -> HandlerError {
    log.error(format!(
        "{} failed for {} '{}': {}. Request: {}",
        ctx.operation,
        ctx.type_name,
        ctx.identifier,
        fault,
        truncate(ctx.request, MAX_REQUEST_DUMP)
    ));

    let (kind, message) = match fault.kind {
        FaultKind::Validation => (
            ErrorKind::InvalidRequest,
            format!(
                "Invalid request provided to {} for '{}': {}",
                ctx.operation, ctx.identifier, fault.message
            ),
        ),
        FaultKind::AccessDenied => (
            ErrorKind::AccessDenied,
            format!(
                "Access denied for operation '{}' on '{}': {}",
                ctx.operation, ctx.identifier, fault.message
            ),
        ),
        FaultKind::ResourceNotFound => (
            ErrorKind::NotFound,
            format!(
                "Resource of type '{}' with identifier '{}' was not found during {}.",
                ctx.type_name, ctx.identifier, ctx.operation
            ),
        ),
        FaultKind::Conflict => (
            ErrorKind::Conflict,
            format!(
                "Resource of type '{}' with identifier '{}' has a conflict during {}: {}",
                ctx.type_name, ctx.identifier, ctx.operation, fault.message
            ),
        ),
        FaultKind::ServiceQuotaExceeded => (
            ErrorKind::ServiceLimitExceeded,
            format!(
                "Limit exceeded for resource of type '{}' during {} on '{}': {}",
                ctx.type_name, ctx.operation, ctx.identifier, fault.message
            ),
        ),
        FaultKind::InternalServer => (
            ErrorKind::InternalFailure,
            format!(
                "Internal error reported from downstream service during operation '{}' on '{}': {}",
                ctx.operation, ctx.identifier, fault.message
            ),
        ),
        FaultKind::Other => (
            ErrorKind::GeneralServiceFailure,
            format!(
                "Error occurred during operation '{}' on '{}': {}",
                ctx.operation, ctx.identifier, fault
            ),
        ),
    };

    HandlerError::new(kind, message)
        .for_operation(ctx.operation)
        .for_resource(ctx.identifier)
}

/// Cut `s` to at most `max` bytes on a char boundary.
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...<{} bytes truncated>", &s[..end], s.len() - end)
}
