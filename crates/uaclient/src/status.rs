// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA status codes.
//!
//! A [`StatusCode`] is a 32-bit value whose top two bits encode severity:
//! `00` good, `01` uncertain, `10` bad. The remaining bits identify the
//! specific condition. This module defines the subset of named codes the
//! client core produces or inspects; any other code received from a server
//! is carried through unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// StatusCode
// =============================================================================

/// A 32-bit OPC UA status code.
///
/// `StatusCode::GOOD` (zero) means success. Severity is tested with
/// [`is_good`](Self::is_good), [`is_uncertain`](Self::is_uncertain) and
/// [`is_bad`](Self::is_bad).
///
/// # Examples
///
/// ```
/// use uaclient::StatusCode;
///
/// assert!(StatusCode::GOOD.is_good());
/// assert!(StatusCode::BAD_TIMEOUT.is_bad());
/// assert!(!StatusCode::BAD_TIMEOUT.is_good());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct StatusCode(u32);

impl StatusCode {
    // =========================================================================
    // Severity masks
    // =========================================================================

    const SEVERITY_MASK: u32 = 0xC000_0000;
    const SEVERITY_UNCERTAIN: u32 = 0x4000_0000;
    const SEVERITY_BAD: u32 = 0x8000_0000;

    // =========================================================================
    // Named codes
    // =========================================================================

    /// The operation succeeded.
    pub const GOOD: StatusCode = StatusCode(0x0000_0000);

    /// The operation outcome is uncertain.
    pub const UNCERTAIN: StatusCode = StatusCode(0x4000_0000);

    /// The operation failed (generic).
    pub const BAD: StatusCode = StatusCode(0x8000_0000);

    /// An unexpected error occurred.
    pub const BAD_UNEXPECTED_ERROR: StatusCode = StatusCode(0x8001_0000);

    /// A low-level communication error occurred.
    pub const BAD_COMMUNICATION_ERROR: StatusCode = StatusCode(0x8005_0000);

    /// The operation timed out.
    pub const BAD_TIMEOUT: StatusCode = StatusCode(0x800A_0000);

    /// The server is shutting down.
    pub const BAD_SHUTDOWN: StatusCode = StatusCode(0x800C_0000);

    /// There is no connection to the server.
    pub const BAD_SERVER_NOT_CONNECTED: StatusCode = StatusCode(0x800D_0000);

    /// The session id is not valid.
    pub const BAD_SESSION_ID_INVALID: StatusCode = StatusCode(0x8025_0000);

    /// The session was closed by the client.
    pub const BAD_SESSION_CLOSED: StatusCode = StatusCode(0x8026_0000);

    /// The session cannot be used because activation has not completed.
    pub const BAD_SESSION_NOT_ACTIVATED: StatusCode = StatusCode(0x8027_0000);

    /// The subscription id is not valid.
    pub const BAD_SUBSCRIPTION_ID_INVALID: StatusCode = StatusCode(0x8028_0000);

    /// There is no subscription available for this session.
    pub const BAD_NO_SUBSCRIPTION: StatusCode = StatusCode(0x8079_0000);

    /// The sequence number is unknown to the server.
    pub const BAD_SEQUENCE_NUMBER_UNKNOWN: StatusCode = StatusCode(0x807A_0000);

    /// The secure channel has been closed.
    pub const BAD_SECURE_CHANNEL_CLOSED: StatusCode = StatusCode(0x8086_0000);

    /// One or more arguments are invalid.
    pub const BAD_INVALID_ARGUMENT: StatusCode = StatusCode(0x80AB_0000);

    /// The network connection has been closed.
    pub const BAD_CONNECTION_CLOSED: StatusCode = StatusCode(0x80AE_0000);

    /// The operation cannot be completed in the current state.
    pub const BAD_INVALID_STATE: StatusCode = StatusCode(0x80AF_0000);

    // =========================================================================
    // Construction and access
    // =========================================================================

    /// Creates a status code from its raw 32-bit value.
    #[inline]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Returns the raw 32-bit value.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    // =========================================================================
    // Severity
    // =========================================================================

    /// Returns `true` if the severity is good.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & Self::SEVERITY_MASK == 0
    }

    /// Returns `true` if the severity is uncertain.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & Self::SEVERITY_MASK == Self::SEVERITY_UNCERTAIN
    }

    /// Returns `true` if the severity is bad.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & Self::SEVERITY_BAD != 0
    }

    /// Returns the symbolic name for known codes.
    pub const fn name(&self) -> Option<&'static str> {
        match *self {
            Self::GOOD => Some("Good"),
            Self::UNCERTAIN => Some("Uncertain"),
            Self::BAD => Some("Bad"),
            Self::BAD_UNEXPECTED_ERROR => Some("BadUnexpectedError"),
            Self::BAD_COMMUNICATION_ERROR => Some("BadCommunicationError"),
            Self::BAD_TIMEOUT => Some("BadTimeout"),
            Self::BAD_SHUTDOWN => Some("BadShutdown"),
            Self::BAD_SERVER_NOT_CONNECTED => Some("BadServerNotConnected"),
            Self::BAD_SESSION_ID_INVALID => Some("BadSessionIdInvalid"),
            Self::BAD_SESSION_CLOSED => Some("BadSessionClosed"),
            Self::BAD_SESSION_NOT_ACTIVATED => Some("BadSessionNotActivated"),
            Self::BAD_SUBSCRIPTION_ID_INVALID => Some("BadSubscriptionIdInvalid"),
            Self::BAD_NO_SUBSCRIPTION => Some("BadNoSubscription"),
            Self::BAD_SEQUENCE_NUMBER_UNKNOWN => Some("BadSequenceNumberUnknown"),
            Self::BAD_SECURE_CHANNEL_CLOSED => Some("BadSecureChannelClosed"),
            Self::BAD_INVALID_ARGUMENT => Some("BadInvalidArgument"),
            Self::BAD_CONNECTION_CLOSED => Some("BadConnectionClosed"),
            Self::BAD_INVALID_STATE => Some("BadInvalidState"),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

impl From<u32> for StatusCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl From<StatusCode> for u32 {
    fn from(code: StatusCode) -> Self {
        code.0
    }
}

// =============================================================================
// Tests
// =============================================================================
