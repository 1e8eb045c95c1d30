// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session lifecycle and the publish loop.
//!
//! A [`Session`] layers an OPC UA session on top of a [`Channel`]: it
//! performs CreateSession/ActivateSession, issues Browse and Read calls,
//! and runs the publish loop that delivers subscription notifications.
//!
//! # State machine
//!
//! ```text
//! Idle ──create()──▶ Requested ──channel up──▶ Creating ──▶ Activating ──▶ Active
//!                                                  │             │           │
//!                                                  ▼             ▼           ▼
//!                                               Faulted ◀── fatal error ◀────┘
//! ```
//!
//! Reconnects re-enter Activating: when the channel reports good again and
//! the session was already created, ActivateSession is re-submitted on the
//! new channel.
//!
//! # Locking
//!
//! One mutex guards all mutable session state. It is never held across a
//! transport submission or a user callback; signals and handlers always
//! fire outside the lock, so callbacks may re-enter the session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use uuid::Uuid;

use crate::channel::{Channel, ChannelCore};
use crate::error::{ClientError, ProtocolViolation};
use crate::request::{AsyncRequest, ServiceResult};
use crate::service::{
    ActivateSessionRequest, ActivateSessionResponse, ApplicationType, BrowseDescription,
    BrowseRequest, BrowseResponse, BrowseResult, ClientDescription, CreateSessionRequest,
    CreateSessionResponse, DataValue, NotificationData, PublishRequest, PublishResponse,
    ReadRequest, ReadResponse, ReadValueId, RequestHeader, SubscriptionAcknowledgement,
    SubscriptionId, TimestampsToReturn,
};
use crate::signal::{Signal, SignalConnection};
use crate::status::StatusCode;
use crate::types::ClientConfig;

/// Timeout hint stamped on every request header, in milliseconds.
const REQUEST_TIMEOUT_HINT_MS: u32 = 60_000;

/// Handler receiving the notification batches of one subscription.
pub type NotificationHandler = Arc<dyn Fn(Vec<NotificationData>) + Send + Sync>;

// =============================================================================
// SessionInfo
// =============================================================================

/// Security material and identifiers returned by CreateSession.
#[derive(Debug, Clone, Default)]
pub struct SessionInfo {
    /// Server-assigned session identifier.
    pub session_id: crate::types::NodeId,

    /// Token attached to every subsequent request header.
    pub authentication_token: crate::types::NodeId,

    /// Server-revised session timeout in milliseconds.
    pub revised_timeout: f64,

    /// Server nonce, refreshed on every activation.
    pub server_nonce: Vec<u8>,

    /// Server certificate (DER).
    pub server_certificate: Vec<u8>,
}

// =============================================================================
// Session
// =============================================================================

/// An OPC UA session on a [`Channel`].
///
/// The session is exclusively owned by the code that constructs it and
/// holds a non-owning reference to its channel; construct channels before
/// sessions and keep them alive for at least as long.
///
/// # Examples
///
/// ```rust,ignore
/// let session = Session::new(&channel, config);
/// session.create(|status| println!("session created: {status}"));
/// ```
pub struct Session {
    core: Arc<SessionCore>,
    _channel_status: SignalConnection,
}

impl Session {
    /// Creates a session bound to `channel`.
    ///
    /// Nothing is sent until [`create`](Self::create) is called. The
    /// session reacts to every channel-up transition: a requested session
    /// is created, a created session is re-activated.
    pub fn new(channel: &Channel, config: ClientConfig) -> Self {
        let core = Arc::new(SessionCore {
            channel: Arc::clone(channel.core()),
            config,
            next_request_handle: AtomicU32::new(1),
            status_changed: Signal::new(),
            shared: Mutex::new(Shared::default()),
        });

        let weak = Arc::downgrade(&core);
        let connection = channel.status_changed().connect(move |status| {
            if !status.is_good() {
                return;
            }
            if let Some(core) = Weak::upgrade(&weak) {
                core.on_channel_up();
            }
        });

        Self {
            core,
            _channel_status: connection,
        }
    }

    /// Returns the session status. Good only while activated.
    pub fn status(&self) -> StatusCode {
        self.core.shared.lock().expect("session state poisoned").status
    }

    /// Returns the status transition signal.
    ///
    /// Emits `Good` exactly once per completed CreateSession/
    /// ActivateSession pair and the faulting status exactly once per
    /// fault.
    pub fn status_changed(&self) -> &Signal<StatusCode> {
        &self.core.status_changed
    }

    /// Returns the session information once the session is created.
    pub fn info(&self) -> Option<SessionInfo> {
        let shared = self.core.shared.lock().expect("session state poisoned");
        shared.created.then(|| shared.info.clone())
    }

    /// Requests session creation.
    ///
    /// If the channel is already connected, CreateSession is submitted
    /// immediately; otherwise it is deferred until the channel reports
    /// good. Idempotent: only the first call starts a creation, and its
    /// callback receives the terminal CreateSession outcome. A repeated
    /// call while creation is pending gets `BadInvalidState`; a call after
    /// the session was created gets `Good`.
    pub fn create(&self, on_created: impl FnOnce(StatusCode) + Send + 'static) {
        self.core.create(Box::new(on_created));
    }

    /// Forgets all subscriptions and acknowledgement bookkeeping.
    ///
    /// Locally infallible: the channel is left untouched and no service
    /// call is made. Responses still in flight when this runs are dropped
    /// safely. The caller must stop using the session afterwards.
    pub fn delete(&self) {
        self.core.delete();
    }

    /// Submits a Browse request.
    ///
    /// The callback receives the service status and one result per
    /// description, in request order; the results are empty when the
    /// status is bad. Browse failures never fault the session.
    pub fn browse(
        &self,
        descriptions: Vec<BrowseDescription>,
        callback: impl FnOnce(StatusCode, Vec<BrowseResult>) + Send + 'static,
    ) {
        self.core.browse(descriptions, Box::new(callback));
    }

    /// Submits a Read request.
    ///
    /// Symmetric to [`browse`](Self::browse): per-request error reporting,
    /// request-ordered results, no session fault.
    pub fn read(
        &self,
        read_ids: Vec<ReadValueId>,
        callback: impl FnOnce(StatusCode, Vec<DataValue>) + Send + 'static,
    ) {
        self.core.read(read_ids, Box::new(callback));
    }

    pub(crate) fn core(&self) -> &Arc<SessionCore> {
        &self.core
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status())
            .finish()
    }
}

// =============================================================================
// SessionCore
// =============================================================================

type CreatedCallback = Box<dyn FnOnce(StatusCode) + Send>;

#[derive(Default)]
struct Shared {
    created: bool,
    creation_requested: bool,
    creating: bool,
    activating: bool,
    status: StatusCode,
    info: SessionInfo,
    on_created: Option<CreatedCallback>,
    subscriptions: HashMap<SubscriptionId, NotificationHandler>,
    pending_acks: Vec<SubscriptionAcknowledgement>,
    inflight_acks: Vec<SubscriptionAcknowledgement>,
    publishing: bool,
}

pub(crate) struct SessionCore {
    pub(crate) channel: Arc<ChannelCore>,
    config: ClientConfig,
    next_request_handle: AtomicU32,
    status_changed: Signal<StatusCode>,
    shared: Mutex<Shared>,
}

impl SessionCore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().expect("session state poisoned")
    }

    pub(crate) fn status_signal(&self) -> &Signal<StatusCode> {
        &self.status_changed
    }

    /// Builds a request header, copying the authentication token.
    pub(crate) fn request_header(&self) -> RequestHeader {
        let shared = self.lock();
        RequestHeader {
            authentication_token: shared.info.authentication_token.clone(),
            timestamp: Some(Utc::now()),
            request_handle: self.next_request_handle.fetch_add(1, Ordering::Relaxed),
            timeout_hint: REQUEST_TIMEOUT_HINT_MS,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn on_channel_up(self: &Arc<Self>) {
        enum Reaction {
            Create,
            Activate,
            Nothing,
        }

        let reaction = {
            let shared = self.lock();
            if shared.created {
                Reaction::Activate
            } else if shared.creation_requested {
                Reaction::Create
            } else {
                Reaction::Nothing
            }
        };

        match reaction {
            Reaction::Create => self.commit_create(),
            Reaction::Activate => self.activate(),
            Reaction::Nothing => {}
        }
    }

    fn create(self: &Arc<Self>, on_created: CreatedCallback) {
        let reply_now = {
            let mut shared = self.lock();
            if shared.created {
                Some((on_created, StatusCode::GOOD))
            } else if shared.creation_requested {
                Some((on_created, StatusCode::BAD_INVALID_STATE))
            } else {
                shared.creation_requested = true;
                shared.on_created = Some(on_created);
                None
            }
        };

        if let Some((callback, status)) = reply_now {
            callback(status);
            return;
        }
        if self.channel.status().is_good() {
            self.commit_create();
        }
    }

    fn commit_create(self: &Arc<Self>) {
        {
            let mut shared = self.lock();
            if shared.creating {
                return;
            }
            shared.creating = true;
        }

        let request = CreateSessionRequest {
            header: RequestHeader {
                timestamp: Some(Utc::now()),
                request_handle: self.next_request_handle.fetch_add(1, Ordering::Relaxed),
                timeout_hint: REQUEST_TIMEOUT_HINT_MS,
                ..Default::default()
            },
            client_description: ClientDescription {
                application_uri: self.config.effective_application_uri(),
                product_uri: self.config.product_uri.clone().unwrap_or_default(),
                application_name: self.config.application_name.clone(),
                application_type: ApplicationType::Client,
            },
            server_uri: String::new(),
            endpoint_url: self.config.endpoint_url.clone(),
            session_name: self.config.effective_session_name(),
            client_nonce: new_nonce(),
            client_certificate: Vec::new(),
            requested_session_timeout: self.config.session_timeout.as_millis() as f64,
            max_response_message_size: self.config.max_response_message_size,
        };

        tracing::debug!(endpoint = %self.config.endpoint_url, "Submitting CreateSession");

        let weak = Arc::downgrade(self);
        let completion = AsyncRequest::new(move |result| {
            if let Some(core) = Weak::upgrade(&weak) {
                core.on_create_session_response(result);
            }
        });

        let status = self
            .channel
            .submit(|transport| transport.begin_create_session(request, completion));
        if status.is_bad() {
            self.finish_create(status);
        }
    }

    fn on_create_session_response(self: &Arc<Self>, result: ServiceResult<CreateSessionResponse>) {
        let response = match result {
            Ok(response) => response,
            Err(status) => return self.finish_create(status),
        };
        if response.service_result.is_bad() {
            return self.finish_create(response.service_result);
        }

        let callback = {
            let mut shared = self.lock();
            shared.creating = false;
            shared.created = true;
            shared.info = SessionInfo {
                session_id: response.session_id,
                authentication_token: response.authentication_token,
                revised_timeout: response.revised_session_timeout,
                server_nonce: response.server_nonce,
                server_certificate: response.server_certificate,
            };
            shared.on_created.take()
        };

        tracing::info!(
            endpoint = %self.config.endpoint_url,
            "Session created"
        );

        if let Some(callback) = callback {
            callback(StatusCode::GOOD);
        }
        self.activate();
    }

    /// Terminal CreateSession failure: report and fault.
    fn finish_create(self: &Arc<Self>, status: StatusCode) {
        let callback = {
            let mut shared = self.lock();
            shared.creating = false;
            shared.on_created.take()
        };
        if let Some(callback) = callback {
            callback(status);
        }
        self.fault(status);
    }

    fn activate(self: &Arc<Self>) {
        {
            let mut shared = self.lock();
            if shared.activating {
                return;
            }
            shared.activating = true;

            // Acknowledgements in flight at disconnect are dropped, not
            // replayed; the server re-sends unacked notifications on the
            // reactivated session.
            shared.pending_acks.clear();
            shared.inflight_acks.clear();
            shared.publishing = false;
        }

        let request = ActivateSessionRequest {
            header: self.request_header(),
            ..Default::default()
        };

        tracing::debug!(endpoint = %self.config.endpoint_url, "Submitting ActivateSession");

        let weak = Arc::downgrade(self);
        let completion = AsyncRequest::new(move |result| {
            if let Some(core) = Weak::upgrade(&weak) {
                core.on_activate_session_response(result);
            }
        });

        let status = self
            .channel
            .submit(|transport| transport.begin_activate_session(request, completion));
        if status.is_bad() {
            self.lock().activating = false;
            self.fault(status);
        }
    }

    fn on_activate_session_response(
        self: &Arc<Self>,
        result: ServiceResult<ActivateSessionResponse>,
    ) {
        let response = match result {
            Ok(response) => response,
            Err(status) => {
                self.lock().activating = false;
                return self.fault(status);
            }
        };
        if response.service_result.is_bad() {
            self.lock().activating = false;
            return self.fault(response.service_result);
        }

        self.on_activated(response.server_nonce);
    }

    fn on_activated(self: &Arc<Self>, server_nonce: Vec<u8>) {
        let has_subscriptions = {
            let mut shared = self.lock();
            shared.activating = false;
            shared.status = StatusCode::GOOD;
            shared.info.server_nonce = server_nonce;
            !shared.subscriptions.is_empty()
        };

        tracing::info!(
            endpoint = %self.config.endpoint_url,
            "Session activated"
        );
        self.status_changed.emit(&StatusCode::GOOD);

        if has_subscriptions {
            self.publish();
        }
    }

    fn delete(&self) {
        {
            let mut shared = self.lock();
            shared.subscriptions.clear();
            shared.pending_acks.clear();
            shared.inflight_acks.clear();
            shared.publishing = false;
        }
        tracing::info!(endpoint = %self.config.endpoint_url, "Session deleted");
    }

    /// Faults the session: records the status and fires `status_changed`
    /// once per transition. Never retries.
    fn fault(&self, status: StatusCode) {
        let changed = {
            let mut shared = self.lock();
            let changed = shared.status != status;
            shared.status = status;
            changed
        };

        if changed {
            tracing::warn!(
                endpoint = %self.config.endpoint_url,
                status = %status,
                "Session faulted"
            );
            self.status_changed.emit(&status);
        }
    }

    // =========================================================================
    // Request-scoped operations
    // =========================================================================

    fn browse(
        self: &Arc<Self>,
        descriptions: Vec<BrowseDescription>,
        callback: Box<dyn FnOnce(StatusCode, Vec<BrowseResult>) + Send>,
    ) {
        let request = BrowseRequest {
            header: self.request_header(),
            requested_max_references_per_node: 0,
            nodes_to_browse: descriptions,
        };

        // The callback slot is shared between the continuation and the
        // synchronous failure path; whichever runs takes it.
        let slot = Arc::new(Mutex::new(Some(callback)));
        let completion = {
            let slot = Arc::clone(&slot);
            AsyncRequest::new(move |result: ServiceResult<BrowseResponse>| {
                let Some(callback) = slot.lock().expect("callback slot poisoned").take() else {
                    return;
                };
                match result {
                    Err(status) => callback(status, Vec::new()),
                    Ok(response) if response.service_result.is_bad() => {
                        callback(response.service_result, Vec::new())
                    }
                    Ok(response) => callback(response.service_result, response.results),
                }
            })
        };

        let status = self
            .channel
            .submit(|transport| transport.begin_browse(request, completion));
        if status.is_bad() {
            if let Some(callback) = slot.lock().expect("callback slot poisoned").take() {
                callback(status, Vec::new());
            }
        }
    }

    fn read(
        self: &Arc<Self>,
        read_ids: Vec<ReadValueId>,
        callback: Box<dyn FnOnce(StatusCode, Vec<DataValue>) + Send>,
    ) {
        let request = ReadRequest {
            header: self.request_header(),
            max_age: 0.0,
            timestamps_to_return: TimestampsToReturn::Both,
            nodes_to_read: read_ids,
        };

        let slot = Arc::new(Mutex::new(Some(callback)));
        let completion = {
            let slot = Arc::clone(&slot);
            AsyncRequest::new(move |result: ServiceResult<ReadResponse>| {
                let Some(callback) = slot.lock().expect("callback slot poisoned").take() else {
                    return;
                };
                match result {
                    Err(status) => callback(status, Vec::new()),
                    Ok(response) if response.service_result.is_bad() => {
                        callback(response.service_result, Vec::new())
                    }
                    Ok(response) => callback(response.service_result, response.results),
                }
            })
        };

        let status = self
            .channel
            .submit(|transport| transport.begin_read(request, completion));
        if status.is_bad() {
            if let Some(callback) = slot.lock().expect("callback slot poisoned").take() {
                callback(status, Vec::new());
            }
        }
    }

    // =========================================================================
    // Publish loop
    // =========================================================================

    pub(crate) fn start_publishing(
        self: &Arc<Self>,
        subscription_id: SubscriptionId,
        handler: NotificationHandler,
    ) {
        let publishing = {
            let mut shared = self.lock();
            shared.subscriptions.insert(subscription_id, handler);
            shared.publishing
        };

        if !publishing {
            self.publish();
        }
    }

    pub(crate) fn stop_publishing(&self, subscription_id: SubscriptionId) {
        // The in-flight publish, if any, completes naturally; the loop
        // parks once no subscriptions remain.
        self.lock().subscriptions.remove(&subscription_id);
    }

    /// Issues the next Publish request unless one is already in flight or
    /// no subscription needs one.
    fn publish(self: &Arc<Self>) {
        let acknowledgements = {
            let mut shared = self.lock();
            if shared.publishing {
                return;
            }
            if shared.subscriptions.is_empty() {
                return;
            }
            shared.publishing = true;
            let acknowledgements = std::mem::take(&mut shared.pending_acks);
            shared.inflight_acks = acknowledgements.clone();
            acknowledgements
        };

        tracing::trace!(
            acknowledgements = acknowledgements.len(),
            "Submitting Publish"
        );

        let request = PublishRequest {
            header: self.request_header(),
            subscription_acknowledgements: acknowledgements,
        };

        let weak = Arc::downgrade(self);
        let completion = AsyncRequest::new(move |result| {
            if let Some(core) = Weak::upgrade(&weak) {
                core.on_publish_response(result);
            }
        });

        let status = self
            .channel
            .submit(|transport| transport.begin_publish(request, completion));
        if status.is_bad() {
            {
                let mut shared = self.lock();
                shared.publishing = false;
                shared.inflight_acks.clear();
            }
            self.fault(status);
        }
    }

    fn on_publish_response(self: &Arc<Self>, result: ServiceResult<PublishResponse>) {
        let response = match result {
            Ok(response) => response,
            Err(status) => return self.finish_publish_bad(status),
        };
        if response.service_result.is_bad() {
            return self.finish_publish_bad(response.service_result);
        }

        // A rejected acknowledgement cannot be re-sent; treat it as fatal.
        if let Some(bad) = response.results.iter().find(|r| r.is_bad()).copied() {
            ClientError::protocol(ProtocolViolation::ack_rejected(bad)).log("publish");
            return self.finish_publish_bad(bad);
        }

        let (handler, notifications) = {
            let mut shared = self.lock();
            if !shared.publishing {
                // Late completion after delete(); drop it.
                return;
            }
            shared.publishing = false;
            shared.inflight_acks.clear();

            if response.notification_message.is_keep_alive() {
                (None, Vec::new())
            } else {
                let acknowledgement = SubscriptionAcknowledgement {
                    subscription_id: response.subscription_id,
                    sequence_number: response.notification_message.sequence_number,
                };
                if !shared.pending_acks.contains(&acknowledgement) {
                    shared.pending_acks.push(acknowledgement);
                }
                (
                    shared.subscriptions.get(&response.subscription_id).cloned(),
                    response.notification_message.notification_data,
                )
            }
        };

        // Keep exactly one Publish outstanding: the next request goes out
        // before the notification handler runs.
        self.publish();

        if let Some(handler) = handler {
            handler(notifications);
        }
    }

    /// Ends the current publish cycle with a fatal status.
    fn finish_publish_bad(self: &Arc<Self>, status: StatusCode) {
        {
            let mut shared = self.lock();
            if !shared.publishing {
                // Late completion after delete(); drop it.
                return;
            }
            shared.publishing = false;
            shared.inflight_acks.clear();
        }
        self.fault(status);
    }
}

/// Generates a 32-byte client nonce.
fn new_nonce() -> Vec<u8> {
    let mut nonce = Vec::with_capacity(32);
    nonce.extend_from_slice(Uuid::new_v4().as_bytes());
    nonce.extend_from_slice(Uuid::new_v4().as_bytes());
    nonce
}

// =============================================================================
// Tests
// =============================================================================
