//! Error types for the KerbalStuff API client.
//!
//! # Design
//! The service reports failures inside a `200 OK` JSON body
//! (`{"error": true, "reason": "..."}`), so `Domain` is the variant callers
//! see most. `InvalidArgument` and `NotAuthenticated` are raised before a
//! request is built and therefore never reach the network.

use thiserror::Error;

/// Errors returned by `ApiClient` and the facades built on it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A caller-supplied parameter violates a documented constraint.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A session operation was attempted without logging in first.
    #[error("not authenticated: log in before publishing")]
    NotAuthenticated,

    /// The service answered with an `error` envelope.
    #[error("service error: {reason}")]
    Domain { reason: String },

    /// The transport failed before a response was received.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server returned a non-2xx status with a body that is not an error envelope.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Login succeeded but the response carried no session cookie.
    #[error("login response did not set a session cookie")]
    MissingCookie,

    /// The upload file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument(message.into())
    }

    /// True when the failure happened before anything was sent.
    pub fn is_client_side(&self) -> bool {
        matches!(self, ApiError::InvalidArgument(_) | ApiError::NotAuthenticated)
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
