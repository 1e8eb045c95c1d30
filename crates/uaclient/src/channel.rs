// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Secure channel handling.
//!
//! A [`Channel`] owns one secure channel to one endpoint and publishes its
//! up/down status. It is the submission point for every outbound request:
//! submissions are accepted only while the status is good and fail
//! synchronously otherwise. The channel never retries; reconnect behavior
//! belongs to the transport, and sessions react to the resulting
//! transitions through [`status_changed`](Channel::status_changed).

use std::sync::{Arc, Mutex, Weak};

use crate::error::{ClientError, ClientResult, TransportError};
use crate::signal::Signal;
use crate::status::StatusCode;
use crate::transport::{ChannelEvent, ClientTransport};
use crate::types::ClientConfig;

// =============================================================================
// ChannelCore
// =============================================================================

/// Shared channel state referenced by sessions.
///
/// Sessions hold a non-owning reference to this core; the channel must
/// outlive every session built on it.
pub(crate) struct ChannelCore {
    transport: Arc<dyn ClientTransport>,
    status: Mutex<StatusCode>,
    status_changed: Signal<StatusCode>,
}

impl ChannelCore {
    /// Returns the current channel status.
    pub(crate) fn status(&self) -> StatusCode {
        *self.status.lock().expect("channel status poisoned")
    }

    /// Returns the status transition signal.
    pub(crate) fn status_changed(&self) -> &Signal<StatusCode> {
        &self.status_changed
    }

    /// Submits a request if the channel is up.
    ///
    /// `submit` is invoked with the transport only while the status is
    /// good; otherwise the submission fails synchronously and the request
    /// (with its continuation) is dropped unused.
    pub(crate) fn submit(
        &self,
        submit: impl FnOnce(&dyn ClientTransport) -> StatusCode,
    ) -> StatusCode {
        if !self.status().is_good() {
            return StatusCode::BAD_SERVER_NOT_CONNECTED;
        }
        submit(self.transport.as_ref())
    }

    fn apply_event(&self, status: StatusCode, event: ChannelEvent) {
        let new_status = if event.is_up() {
            status
        } else if status.is_bad() {
            status
        } else {
            StatusCode::BAD_CONNECTION_CLOSED
        };

        {
            let mut guard = self.status.lock().expect("channel status poisoned");
            *guard = new_status;
        }

        tracing::info!(status = %new_status, event = %event, "Channel transition");
        self.status_changed.emit(&new_status);
    }
}

// =============================================================================
// Channel
// =============================================================================

/// A secure channel to one OPC UA endpoint.
///
/// # Examples
///
/// ```rust,ignore
/// use uaclient::{Channel, ClientConfig};
///
/// let channel = Channel::new(transport);
/// channel.connect(&config, |status, event| {
///     println!("channel {event}: {status}");
/// })?;
/// ```
pub struct Channel {
    core: Arc<ChannelCore>,
}

impl Channel {
    /// Creates a channel over the given transport.
    ///
    /// The channel starts disconnected; call [`connect`](Self::connect) to
    /// bring it up.
    pub fn new(transport: Arc<dyn ClientTransport>) -> Self {
        Self {
            core: Arc::new(ChannelCore {
                transport,
                status: Mutex::new(StatusCode::BAD_SERVER_NOT_CONNECTED),
                status_changed: Signal::new(),
            }),
        }
    }

    /// Initiates an asynchronous connect.
    ///
    /// `event_handler` receives `(status, event)` for every transport
    /// event. The channel updates its own status and fires
    /// [`status_changed`](Self::status_changed) before the handler runs,
    /// so a handler that submits requests observes the new status.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the transport refuses the connect
    /// synchronously.
    pub fn connect(
        &self,
        config: &ClientConfig,
        event_handler: impl Fn(StatusCode, ChannelEvent) + Send + Sync + 'static,
    ) -> ClientResult<()> {
        let core = Arc::downgrade(&self.core);
        let handler: Arc<dyn Fn(StatusCode, ChannelEvent) + Send + Sync> =
            Arc::new(move |status, event| {
                if let Some(core) = Weak::upgrade(&core) {
                    core.apply_event(status, event);
                }
                event_handler(status, event);
            });

        tracing::info!(endpoint = %config.endpoint_url, "Connecting channel");

        let status = self.core.transport.connect(config, handler);
        if status.is_bad() {
            let error = ClientError::transport(TransportError::submission_refused(status));
            error.log("channel connect");
            return Err(error);
        }
        Ok(())
    }

    /// Tears the channel down.
    ///
    /// The transport completes every pending continuation with a bad
    /// status; sessions built on this channel absorb those completions and
    /// fault.
    pub fn disconnect(&self) {
        tracing::info!("Disconnecting channel");
        self.core.transport.disconnect();
    }

    /// Returns the current channel status. Good only while connected.
    pub fn status(&self) -> StatusCode {
        self.core.status()
    }

    /// Returns the status transition signal.
    ///
    /// Fires with the new status on every transition. Observers may
    /// connect and disconnect freely and must not block.
    pub fn status_changed(&self) -> &Signal<StatusCode> {
        self.core.status_changed()
    }

    /// Returns the transport handle.
    ///
    /// The handle is only valid for submissions while
    /// [`status`](Self::status) is good.
    pub fn transport(&self) -> Arc<dyn ClientTransport> {
        Arc::clone(&self.core.transport)
    }

    pub(crate) fn core(&self) -> &Arc<ChannelCore> {
        &self.core
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("status", &self.status())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AsyncRequest;
    use crate::service::*;
    use crate::transport::ChannelEventHandler;
    use std::sync::Mutex;

    /// Stub transport that records the event handler for manual firing.
    #[derive(Default)]
    struct StubTransport {
        events: Mutex<Option<ChannelEventHandler>>,
        refuse_connect: bool,
    }

    impl StubTransport {
        fn fire(&self, status: StatusCode, event: ChannelEvent) {
            let handler = self.events.lock().unwrap().clone();
            handler.expect("connect not called")(status, event);
        }
    }

    impl ClientTransport for StubTransport {
        fn connect(&self, _config: &ClientConfig, events: ChannelEventHandler) -> StatusCode {
            if self.refuse_connect {
                return StatusCode::BAD_COMMUNICATION_ERROR;
            }
            *self.events.lock().unwrap() = Some(events);
            StatusCode::GOOD
        }

        fn disconnect(&self) {}

        fn begin_create_session(
            &self,
            _request: CreateSessionRequest,
            _completion: AsyncRequest<CreateSessionResponse>,
        ) -> StatusCode {
            StatusCode::GOOD
        }

        fn begin_activate_session(
            &self,
            _request: ActivateSessionRequest,
            _completion: AsyncRequest<ActivateSessionResponse>,
        ) -> StatusCode {
            StatusCode::GOOD
        }

        fn begin_browse(
            &self,
            _request: BrowseRequest,
            _completion: AsyncRequest<BrowseResponse>,
        ) -> StatusCode {
            StatusCode::GOOD
        }

        fn begin_read(
            &self,
            _request: ReadRequest,
            _completion: AsyncRequest<ReadResponse>,
        ) -> StatusCode {
            StatusCode::GOOD
        }

        fn begin_publish(
            &self,
            _request: PublishRequest,
            _completion: AsyncRequest<PublishResponse>,
        ) -> StatusCode {
            StatusCode::GOOD
        }

        fn begin_create_subscription(
            &self,
            _request: CreateSubscriptionRequest,
            _completion: AsyncRequest<CreateSubscriptionResponse>,
        ) -> StatusCode {
            StatusCode::GOOD
        }

        fn begin_delete_subscriptions(
            &self,
            _request: DeleteSubscriptionsRequest,
            _completion: AsyncRequest<DeleteSubscriptionsResponse>,
        ) -> StatusCode {
            StatusCode::GOOD
        }

        fn begin_create_monitored_items(
            &self,
            _request: CreateMonitoredItemsRequest,
            _completion: AsyncRequest<CreateMonitoredItemsResponse>,
        ) -> StatusCode {
            StatusCode::GOOD
        }
    }

    fn test_config() -> ClientConfig {
        ClientConfig::builder()
            .endpoint_url("opc.tcp://localhost:4840")
            .build()
            .unwrap()
    }

    #[test]
    fn test_starts_disconnected() {
        let channel = Channel::new(Arc::new(StubTransport::default()));
        assert_eq!(channel.status(), StatusCode::BAD_SERVER_NOT_CONNECTED);
    }

    #[test]
    fn test_connect_event_updates_status_and_signals() {
        let transport = Arc::new(StubTransport::default());
        let channel = Channel::new(transport.clone());

        let transitions = Arc::new(Mutex::new(Vec::new()));
        let _connection = {
            let transitions = transitions.clone();
            channel
                .status_changed()
                .connect(move |s| transitions.lock().unwrap().push(*s))
        };

        channel.connect(&test_config(), |_, _| {}).unwrap();
        transport.fire(StatusCode::GOOD, ChannelEvent::Connected);

        assert_eq!(channel.status(), StatusCode::GOOD);
        assert_eq!(*transitions.lock().unwrap(), vec![StatusCode::GOOD]);

        transport.fire(
            StatusCode::BAD_CONNECTION_CLOSED,
            ChannelEvent::Disconnected,
        );
        assert_eq!(channel.status(), StatusCode::BAD_CONNECTION_CLOSED);
        assert_eq!(
            *transitions.lock().unwrap(),
            vec![StatusCode::GOOD, StatusCode::BAD_CONNECTION_CLOSED]
        );
    }

    #[test]
    fn test_status_is_updated_before_user_handler_runs() {
        let transport = Arc::new(StubTransport::default());
        let channel = Channel::new(transport.clone());
        let core = Arc::clone(channel.core());

        let observed = Arc::new(Mutex::new(None));
        let sink = observed.clone();
        channel
            .connect(&test_config(), move |_, _| {
                *sink.lock().unwrap() = Some(core.status());
            })
            .unwrap();

        transport.fire(StatusCode::GOOD, ChannelEvent::Connected);
        assert_eq!(*observed.lock().unwrap(), Some(StatusCode::GOOD));
    }

    #[test]
    fn test_refused_connect_is_an_error() {
        let transport = Arc::new(StubTransport {
            refuse_connect: true,
            ..Default::default()
        });
        let channel = Channel::new(transport);
        assert!(channel.connect(&test_config(), |_, _| {}).is_err());
    }

    #[test]
    fn test_submit_fails_synchronously_while_down() {
        let transport = Arc::new(StubTransport::default());
        let channel = Channel::new(transport.clone());

        let status = channel.core().submit(|_| StatusCode::GOOD);
        assert_eq!(status, StatusCode::BAD_SERVER_NOT_CONNECTED);

        channel.connect(&test_config(), |_, _| {}).unwrap();
        transport.fire(StatusCode::GOOD, ChannelEvent::Connected);

        let status = channel.core().submit(|_| StatusCode::GOOD);
        assert_eq!(status, StatusCode::GOOD);
    }

    #[test]
    fn test_disconnected_event_with_good_status_still_goes_bad() {
        let transport = Arc::new(StubTransport::default());
        let channel = Channel::new(transport.clone());
        channel.connect(&test_config(), |_, _| {}).unwrap();

        transport.fire(StatusCode::GOOD, ChannelEvent::Connected);
        transport.fire(StatusCode::GOOD, ChannelEvent::Disconnected);
        assert_eq!(channel.status(), StatusCode::BAD_CONNECTION_CLOSED);
    }
}
