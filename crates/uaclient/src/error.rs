// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client error types.
//!
//! Inside the callback plane every outcome is a [`StatusCode`]; this module
//! provides the structured error hierarchy used at the API surface
//! (configuration, connect, service submission) and for logging.
//!
//! # Error Categories
//!
//! ```text
//! ClientError
//! ├── Transport      - channel down, submission refused, timeout
//! ├── Service        - bad ServiceResult in a response header
//! ├── Operation      - per-item status in a batch response is bad
//! ├── Protocol       - response shape violates OPC UA
//! └── Configuration  - invalid settings
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::status::StatusCode;

/// Convenience result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

// =============================================================================
// ClientError
// =============================================================================

/// The main error type for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level errors.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Service-level errors reported by the server.
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// Per-item errors in a batch response.
    #[error("{0}")]
    Operation(#[from] OperationError),

    /// Responses that violate the protocol.
    #[error("{0}")]
    Protocol(#[from] ProtocolViolation),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
}

impl ClientError {
    /// Creates a transport error.
    #[inline]
    pub fn transport(error: TransportError) -> Self {
        Self::Transport(error)
    }

    /// Creates a service error.
    #[inline]
    pub fn service(error: ServiceError) -> Self {
        Self::Service(error)
    }

    /// Creates an operation error.
    #[inline]
    pub fn operation(error: OperationError) -> Self {
        Self::Operation(error)
    }

    /// Creates a protocol violation error.
    #[inline]
    pub fn protocol(error: ProtocolViolation) -> Self {
        Self::Protocol(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Creates the error corresponding to a bad status code at
    /// session scope.
    pub fn from_status(status: StatusCode) -> Self {
        debug_assert!(status.is_bad());
        match status {
            StatusCode::BAD_SERVER_NOT_CONNECTED | StatusCode::BAD_CONNECTION_CLOSED => {
                Self::Transport(TransportError::ChannelDown { status })
            }
            StatusCode::BAD_TIMEOUT => Self::Transport(TransportError::Timeout {
                duration: Duration::ZERO,
            }),
            _ => Self::Service(ServiceError::BadServiceResult { status }),
        }
    }

    /// Returns the error category for logging and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Service(_) => "service",
            Self::Operation(_) => "operation",
            Self::Protocol(_) => "protocol",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Returns `true` if a retry may succeed.
    ///
    /// Transport errors are transient by nature; protocol violations and
    /// configuration errors never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Service(e) => e.is_retryable(),
            Self::Operation(_) | Self::Protocol(_) | Self::Configuration(_) => false,
        }
    }

    /// Returns the status code this error maps to in the callback plane.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Transport(e) => e.status(),
            Self::Service(e) => e.status(),
            Self::Operation(e) => e.status,
            Self::Protocol(e) => e.status(),
            Self::Configuration(_) => StatusCode::BAD_INVALID_ARGUMENT,
        }
    }

    /// Logs this error with category context.
    pub fn log(&self, context: &str) {
        tracing::error!(
            category = self.category(),
            context = context,
            retryable = self.is_retryable(),
            "{self}"
        );
    }
}

// =============================================================================
// TransportError
// =============================================================================

/// Transport-level errors: channel down, submission refused, timeout.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The secure channel is not connected.
    #[error("Secure channel is not connected ({status})")]
    ChannelDown {
        /// The channel status at the time of submission.
        status: StatusCode,
    },

    /// The transport refused a request submission synchronously.
    #[error("Request submission refused ({status})")]
    SubmissionRefused {
        /// The status returned by the transport.
        status: StatusCode,
    },

    /// The operation timed out.
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        /// The elapsed time.
        duration: Duration,
    },
}

impl TransportError {
    /// Creates a channel-down error.
    pub fn channel_down(status: StatusCode) -> Self {
        Self::ChannelDown { status }
    }

    /// Creates a submission-refused error.
    pub fn submission_refused(status: StatusCode) -> Self {
        Self::SubmissionRefused { status }
    }

    /// Returns the status code this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ChannelDown { status } | Self::SubmissionRefused { status } => *status,
            Self::Timeout { .. } => StatusCode::BAD_TIMEOUT,
        }
    }
}

// =============================================================================
// ServiceError
// =============================================================================

/// A server returned a bad `ServiceResult` in a response header.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service call failed as a whole.
    #[error("Service call failed ({status})")]
    BadServiceResult {
        /// The service result from the response header.
        status: StatusCode,
    },

    /// The session has faulted; no further service calls will succeed.
    #[error("Session faulted ({status})")]
    SessionFaulted {
        /// The status that faulted the session.
        status: StatusCode,
    },
}

impl ServiceError {
    /// Creates a bad-service-result error.
    pub fn bad_service_result(status: StatusCode) -> Self {
        Self::BadServiceResult { status }
    }

    /// Creates a session-faulted error.
    pub fn session_faulted(status: StatusCode) -> Self {
        Self::SessionFaulted { status }
    }

    /// Returns the underlying status code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadServiceResult { status } | Self::SessionFaulted { status } => *status,
        }
    }

    /// Returns `true` if a retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.status(),
            StatusCode::BAD_TIMEOUT | StatusCode::BAD_SERVER_NOT_CONNECTED
        )
    }
}

// =============================================================================
// OperationError
// =============================================================================

/// A per-item status in a batch response is bad.
#[derive(Debug, Error)]
#[error("Operation {index} failed ({status})")]
pub struct OperationError {
    /// Index of the failed item in the request batch.
    pub index: usize,

    /// The per-item status code.
    pub status: StatusCode,
}

impl OperationError {
    /// Creates an operation error.
    pub fn new(index: usize, status: StatusCode) -> Self {
        Self { index, status }
    }
}

// =============================================================================
// ProtocolViolation
// =============================================================================

/// The server returned a response shape that violates OPC UA.
#[derive(Debug, Error)]
pub enum ProtocolViolation {
    /// A publish response referenced a subscription this session does
    /// not own.
    #[error("Publish response for unknown subscription {subscription_id}")]
    UnknownSubscription {
        /// The offending subscription id.
        subscription_id: u32,
    },

    /// The server rejected a previously delivered acknowledgement.
    #[error("Server rejected acknowledgement ({status})")]
    AcknowledgementRejected {
        /// The per-acknowledgement result.
        status: StatusCode,
    },

    /// A response carried a shape the protocol does not allow.
    #[error("Malformed response: {detail}")]
    MalformedResponse {
        /// Human-readable description of the violation.
        detail: String,
    },
}

impl ProtocolViolation {
    /// Creates an unknown-subscription violation.
    pub fn unknown_subscription(subscription_id: u32) -> Self {
        Self::UnknownSubscription { subscription_id }
    }

    /// Creates an acknowledgement-rejected violation.
    pub fn ack_rejected(status: StatusCode) -> Self {
        Self::AcknowledgementRejected { status }
    }

    /// Creates a malformed-response violation.
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            detail: detail.into(),
        }
    }

    /// Returns the status code this violation maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownSubscription { .. } => StatusCode::BAD_SUBSCRIPTION_ID_INVALID,
            Self::AcknowledgementRejected { status } => *status,
            Self::MalformedResponse { .. } => StatusCode::BAD_UNEXPECTED_ERROR,
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The endpoint URL is invalid.
    #[error("Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A node id string could not be parsed.
    #[error("Invalid node id '{input}': {reason}")]
    InvalidNodeId {
        /// The offending input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The security mode string is not recognized.
    #[error("Invalid security mode '{input}'")]
    InvalidSecurityMode {
        /// The offending input.
        input: String,
    },

    /// The security policy requires certificates that were not provided.
    #[error("Security policy {policy} requires a client certificate and private key")]
    MissingCertificates {
        /// The policy name.
        policy: String,
    },
}

impl ConfigurationError {
    /// Creates an invalid-endpoint error.
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-node-id error.
    pub fn invalid_node_id(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-security-mode error.
    pub fn invalid_security_mode(input: impl Into<String>) -> Self {
        Self::InvalidSecurityMode {
            input: input.into(),
        }
    }

    /// Creates a missing-certificates error.
    pub fn missing_certificates(policy: impl Into<String>) -> Self {
        Self::MissingCertificates {
            policy: policy.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category() {
        let e = ClientError::transport(TransportError::channel_down(
            StatusCode::BAD_SERVER_NOT_CONNECTED,
        ));
        assert_eq!(e.category(), "transport");
        assert!(e.is_retryable());

        let e = ClientError::protocol(ProtocolViolation::unknown_subscription(7));
        assert_eq!(e.category(), "protocol");
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_status_mapping() {
        let e = ClientError::from_status(StatusCode::BAD_CONNECTION_CLOSED);
        assert!(matches!(
            e,
            ClientError::Transport(TransportError::ChannelDown { .. })
        ));
        assert_eq!(e.status(), StatusCode::BAD_CONNECTION_CLOSED);

        let e = ClientError::from_status(StatusCode::BAD_SESSION_ID_INVALID);
        assert!(matches!(e, ClientError::Service(_)));
        assert_eq!(e.status(), StatusCode::BAD_SESSION_ID_INVALID);
    }

    #[test]
    fn test_operation_error_display() {
        let e = OperationError::new(2, StatusCode::BAD_SEQUENCE_NUMBER_UNKNOWN);
        assert_eq!(
            e.to_string(),
            "Operation 2 failed (BadSequenceNumberUnknown)"
        );
    }

    #[test]
    fn test_protocol_violation_status() {
        assert_eq!(
            ProtocolViolation::unknown_subscription(3).status(),
            StatusCode::BAD_SUBSCRIPTION_ID_INVALID
        );
        assert_eq!(
            ProtocolViolation::ack_rejected(StatusCode::BAD_SEQUENCE_NUMBER_UNKNOWN).status(),
            StatusCode::BAD_SEQUENCE_NUMBER_UNKNOWN
        );
    }
}
