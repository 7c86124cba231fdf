//! Error - Remote faults and the caller-facing error taxonomy
//!
//! A [`Fault`] is what the remote service reported. A [`HandlerError`] is what
//! the host scheduler sees. The classifier in [`crate::classify`] is the only
//! place one turns into the other.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of fault reported by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    Validation,
    AccessDenied,
    ResourceNotFound,
    Conflict,
    ServiceQuotaExceeded,
    InternalServer,
    /// Any other service error (throttling, unmodeled exceptions, transport)
    Other,
}

impl FaultKind {
    /// Map a service error code (e.g. "ConflictException") to a fault kind
    pub fn from_code(code: &str) -> Self {
        match code {
            "ValidationException" => FaultKind::Validation,
            "AccessDeniedException" => FaultKind::AccessDenied,
            "ResourceNotFoundException" => FaultKind::ResourceNotFound,
            "ConflictException" => FaultKind::Conflict,
            "ServiceQuotaExceededException" => FaultKind::ServiceQuotaExceeded,
            "InternalServerException" => FaultKind::InternalServer,
            _ => FaultKind::Other,
        }
    }
}

/// A raw failure returned by one remote call
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub kind: FaultKind,
    /// Service error code, when the service sent one
    pub code: Option<String>,
    /// HTTP status of the response, when there was one
    pub status: Option<u16>,
    pub message: String,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            status: None,
            message: message.into(),
        }
    }

    /// Build a fault from the service error code and HTTP status.
    ///
    /// An unrecognised code on a 5xx response is treated as a server fault.
    pub fn from_response(
        code: Option<&str>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        let mut kind = code.map(FaultKind::from_code).unwrap_or(FaultKind::Other);
        if kind == FaultKind::Other && status.is_some_and(|s| s >= 500) {
            kind = FaultKind::InternalServer;
        }
        Self {
            kind,
            code: code.map(str::to_string),
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FaultKind::ResourceNotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Conflict, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == FaultKind::ResourceNotFound
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, self.status) {
            (Some(code), Some(status)) => write!(f, "{} ({}): {}", code, status, self.message),
            (Some(code), None) => write!(f, "{}: {}", code, self.message),
            (None, Some(status)) => write!(f, "HTTP {}: {}", status, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

/// Classified outcome of a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidRequest,
    AccessDenied,
    NotFound,
    #[serde(rename = "ResourceConflict")]
    Conflict,
    ServiceLimitExceeded,
    InternalFailure,
    NotStabilized,
    #[serde(rename = "GeneralServiceException")]
    GeneralServiceFailure,
    AlreadyExists,
    NotUpdatable,
}

impl ErrorKind {
    /// CloudFormation handler error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::AccessDenied => "AccessDenied",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "ResourceConflict",
            ErrorKind::ServiceLimitExceeded => "ServiceLimitExceeded",
            ErrorKind::InternalFailure => "InternalFailure",
            ErrorKind::NotStabilized => "NotStabilized",
            ErrorKind::GeneralServiceFailure => "GeneralServiceException",
            ErrorKind::AlreadyExists => "AlreadyExists",
            ErrorKind::NotUpdatable => "NotUpdatable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Error surfaced to the host scheduler
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub kind: ErrorKind,
    pub message: String,
    /// Remote operation that failed, if any
    pub operation: Option<String>,
    /// Identifier of the resource the failure concerns
    pub identifier: Option<String>,
}

impl HandlerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: None,
            identifier: None,
        }
    }

    pub fn for_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn for_resource(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn not_found(type_name: &str, identifier: &str) -> Self {
        Self::new(
            ErrorKind::NotFound,
            format!(
                "Resource of type '{}' with identifier '{}' was not found.",
                type_name, identifier
            ),
        )
        .for_resource(identifier)
    }

    pub fn not_stabilized(type_name: &str, identifier: &str, reason: &str) -> Self {
        Self::new(
            ErrorKind::NotStabilized,
            format!(
                "Resource of type '{}' with identifier '{}' did not stabilize: {}",
                type_name, identifier, reason
            ),
        )
        .for_resource(identifier)
    }

    pub fn already_exists(type_name: &str, identifier: &str) -> Self {
        Self::new(
            ErrorKind::AlreadyExists,
            format!(
                "Resource of type '{}' with identifier '{}' already exists.",
                type_name, identifier
            ),
        )
        .for_resource(identifier)
    }

    pub fn not_updatable(type_name: &str, identifier: &str, reason: &str) -> Self {
        Self::new(
            ErrorKind::NotUpdatable,
            format!(
                "Resource of type '{}' with identifier '{}' is not updatable: {}",
                type_name, identifier, reason
            ),
        )
        .for_resource(identifier)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
