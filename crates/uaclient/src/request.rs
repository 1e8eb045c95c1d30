// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! One-shot request continuations.
//!
//! An [`AsyncRequest`] carries the handler for exactly one service call.
//! It is handed to the transport together with the request payload; the
//! transport completes it exactly once, on one of its worker threads, with
//! either the decoded response or a transport-level status code.
//!
//! If the transport refuses a submission synchronously (the `begin_*` call
//! returns a bad status), the continuation must be dropped without being
//! invoked; the submitter reports the failure itself. There is no
//! per-request cancellation: tearing down the channel makes the transport
//! complete every pending continuation with a bad status.

use crate::status::StatusCode;

/// Outcome of a service call: the decoded response, or the transport-level
/// status code that ended it.
pub type ServiceResult<R> = Result<R, StatusCode>;

// =============================================================================
// AsyncRequest
// =============================================================================

/// A one-shot continuation for a single service call.
///
/// Completion consumes the request, so the exactly-once contract is
/// enforced by the type system: a completed request cannot be completed
/// again, and a dropped request never fires its handler.
///
/// # Examples
///
/// ```
/// use uaclient::{AsyncRequest, StatusCode};
///
/// let request = AsyncRequest::new(|result: Result<u32, StatusCode>| {
///     assert_eq!(result, Ok(42));
/// });
/// request.succeed(42);
/// ```
pub struct AsyncRequest<R> {
    handler: Box<dyn FnOnce(ServiceResult<R>) + Send>,
}

impl<R> AsyncRequest<R> {
    /// Creates a continuation from a handler.
    ///
    /// The handler receives ownership of the response buffer for the
    /// duration of the call; any fields it wishes to retain must be moved
    /// out before it returns.
    pub fn new(handler: impl FnOnce(ServiceResult<R>) + Send + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Completes the continuation with the given outcome.
    pub fn complete(self, result: ServiceResult<R>) {
        (self.handler)(result);
    }

    /// Completes the continuation with a decoded response.
    #[inline]
    pub fn succeed(self, response: R) {
        self.complete(Ok(response));
    }

    /// Completes the continuation with a transport-level status code.
    #[inline]
    pub fn fail(self, status: StatusCode) {
        self.complete(Err(status));
    }
}

impl<R> std::fmt::Debug for AsyncRequest<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncRequest")
            .field("response", &std::any::type_name::<R>())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_success_invokes_handler_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let request = {
            let calls = calls.clone();
            AsyncRequest::new(move |result: ServiceResult<&'static str>| {
                calls.fetch_add(1, Ordering::SeqCst);
                assert_eq!(result, Ok("response"));
            })
        };

        request.succeed("response");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_carries_status() {
        let request = AsyncRequest::new(|result: ServiceResult<u8>| {
            assert_eq!(result, Err(StatusCode::BAD_CONNECTION_CLOSED));
        });
        request.fail(StatusCode::BAD_CONNECTION_CLOSED);
    }

    #[test]
    fn test_dropping_never_fires_handler() {
        let calls = Arc::new(AtomicU32::new(0));
        let request = {
            let calls = calls.clone();
            AsyncRequest::new(move |_: ServiceResult<u8>| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        drop(request);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_completion_from_another_thread() {
        let calls = Arc::new(AtomicU32::new(0));
        let request = {
            let calls = calls.clone();
            AsyncRequest::new(move |result: ServiceResult<u32>| {
                calls.fetch_add(1, Ordering::SeqCst);
                assert_eq!(result, Ok(9));
            })
        };

        std::thread::spawn(move || request.succeed(9))
            .join()
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
