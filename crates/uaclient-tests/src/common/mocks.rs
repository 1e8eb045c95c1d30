// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! A scripted [`MockTransport`] for testing the client core in isolation.
//!
//! ## Design Principles
//!
//! - Every submission is parked with its continuation for explicit,
//!   test-driven completion
//! - All requests are recorded for verification
//! - Error injection per service for refusal paths
//! - Thread-safe, so completions can be driven from spawned threads

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use uaclient::{
    AsyncRequest, ChannelEvent, ChannelEventHandler, ClientConfig, ClientTransport, StatusCode,
};
use uaclient::service::{
    ActivateSessionRequest, ActivateSessionResponse, BrowseRequest, BrowseResponse,
    CreateMonitoredItemsRequest, CreateMonitoredItemsResponse, CreateSessionRequest,
    CreateSessionResponse, CreateSubscriptionRequest, CreateSubscriptionResponse,
    DeleteSubscriptionsRequest, DeleteSubscriptionsResponse, PublishRequest, PublishResponse,
    ReadRequest, ReadResponse,
};

type Pending<Req, Resp> = Mutex<VecDeque<(Req, AsyncRequest<Resp>)>>;

/// A scripted OPC UA transport.
///
/// Each `begin_*` call parks the request and its continuation; the test
/// completes them explicitly with `take_*` followed by
/// [`AsyncRequest::succeed`] or [`AsyncRequest::fail`]. Channel events are
/// fired manually with [`fire_event`](Self::fire_event).
pub struct MockTransport {
    events: Mutex<Option<ChannelEventHandler>>,

    create_session: Pending<CreateSessionRequest, CreateSessionResponse>,
    activate_session: Pending<ActivateSessionRequest, ActivateSessionResponse>,
    browse: Pending<BrowseRequest, BrowseResponse>,
    read: Pending<ReadRequest, ReadResponse>,
    publish: Pending<PublishRequest, PublishResponse>,
    create_subscription: Pending<CreateSubscriptionRequest, CreateSubscriptionResponse>,
    delete_subscriptions: Pending<DeleteSubscriptionsRequest, DeleteSubscriptionsResponse>,
    create_monitored_items: Pending<CreateMonitoredItemsRequest, CreateMonitoredItemsResponse>,

    /// Ack lists of every publish request ever submitted, in order.
    publish_ack_history: Mutex<Vec<Vec<uaclient::SubscriptionAcknowledgement>>>,

    /// Total publish submissions.
    publish_count: AtomicU64,

    /// Refuse the next publish submission synchronously.
    refuse_next_publish: AtomicBool,

    /// Refuse every submission synchronously (channel half-dead).
    refuse_all: AtomicBool,
}

impl MockTransport {
    /// Creates a fresh mock.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(None),
            create_session: Mutex::new(VecDeque::new()),
            activate_session: Mutex::new(VecDeque::new()),
            browse: Mutex::new(VecDeque::new()),
            read: Mutex::new(VecDeque::new()),
            publish: Mutex::new(VecDeque::new()),
            create_subscription: Mutex::new(VecDeque::new()),
            delete_subscriptions: Mutex::new(VecDeque::new()),
            create_monitored_items: Mutex::new(VecDeque::new()),
            publish_ack_history: Mutex::new(Vec::new()),
            publish_count: AtomicU64::new(0),
            refuse_next_publish: AtomicBool::new(false),
            refuse_all: AtomicBool::new(false),
        }
    }

    // =========================================================================
    // Event injection
    // =========================================================================

    /// Fires a channel event as the transport would.
    pub fn fire_event(&self, status: StatusCode, event: ChannelEvent) {
        let handler = self.events.lock().unwrap().clone();
        handler.expect("connect was not called")(status, event);
    }

    /// Simulates a disconnect: flushes every pending continuation with
    /// `status`, then reports the transition.
    pub fn drop_connection(&self, status: StatusCode) {
        self.flush_pending(status);
        self.fire_event(status, ChannelEvent::Disconnected);
    }

    /// Completes every parked continuation with `status`.
    pub fn flush_pending(&self, status: StatusCode) {
        fn flush<Req, Resp>(pending: &Pending<Req, Resp>, status: StatusCode) {
            let drained: Vec<_> = pending.lock().unwrap().drain(..).collect();
            for (_, completion) in drained {
                completion.fail(status);
            }
        }

        flush(&self.create_session, status);
        flush(&self.activate_session, status);
        flush(&self.browse, status);
        flush(&self.read, status);
        flush(&self.publish, status);
        flush(&self.create_subscription, status);
        flush(&self.delete_subscriptions, status);
        flush(&self.create_monitored_items, status);
    }

    // =========================================================================
    // Error injection
    // =========================================================================

    /// Makes the next publish submission fail synchronously.
    pub fn refuse_next_publish(&self) {
        self.refuse_next_publish.store(true, Ordering::SeqCst);
    }

    /// Makes every submission fail synchronously.
    pub fn refuse_all(&self, refuse: bool) {
        self.refuse_all.store(refuse, Ordering::SeqCst);
    }

    // =========================================================================
    // Takers
    // =========================================================================

    /// Takes the oldest parked CreateSession submission.
    pub fn take_create_session(
        &self,
    ) -> (CreateSessionRequest, AsyncRequest<CreateSessionResponse>) {
        self.create_session
            .lock()
            .unwrap()
            .pop_front()
            .expect("no CreateSession pending")
    }

    /// Takes the oldest parked ActivateSession submission.
    pub fn take_activate_session(
        &self,
    ) -> (ActivateSessionRequest, AsyncRequest<ActivateSessionResponse>) {
        self.activate_session
            .lock()
            .unwrap()
            .pop_front()
            .expect("no ActivateSession pending")
    }

    /// Takes the oldest parked Browse submission.
    pub fn take_browse(&self) -> (BrowseRequest, AsyncRequest<BrowseResponse>) {
        self.browse.lock().unwrap().pop_front().expect("no Browse pending")
    }

    /// Takes the oldest parked Read submission.
    pub fn take_read(&self) -> (ReadRequest, AsyncRequest<ReadResponse>) {
        self.read.lock().unwrap().pop_front().expect("no Read pending")
    }

    /// Takes the oldest parked Publish submission.
    pub fn take_publish(&self) -> (PublishRequest, AsyncRequest<PublishResponse>) {
        self.publish.lock().unwrap().pop_front().expect("no Publish pending")
    }

    /// Takes the oldest parked CreateSubscription submission.
    pub fn take_create_subscription(
        &self,
    ) -> (CreateSubscriptionRequest, AsyncRequest<CreateSubscriptionResponse>) {
        self.create_subscription
            .lock()
            .unwrap()
            .pop_front()
            .expect("no CreateSubscription pending")
    }

    /// Takes the oldest parked DeleteSubscriptions submission.
    pub fn take_delete_subscriptions(
        &self,
    ) -> (DeleteSubscriptionsRequest, AsyncRequest<DeleteSubscriptionsResponse>) {
        self.delete_subscriptions
            .lock()
            .unwrap()
            .pop_front()
            .expect("no DeleteSubscriptions pending")
    }

    /// Takes the oldest parked CreateMonitoredItems submission.
    pub fn take_create_monitored_items(
        &self,
    ) -> (CreateMonitoredItemsRequest, AsyncRequest<CreateMonitoredItemsResponse>) {
        self.create_monitored_items
            .lock()
            .unwrap()
            .pop_front()
            .expect("no CreateMonitoredItems pending")
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Returns the number of Publish submissions currently parked.
    pub fn pending_publish_count(&self) -> usize {
        self.publish.lock().unwrap().len()
    }

    /// Returns the number of CreateSession submissions currently parked.
    pub fn pending_create_session_count(&self) -> usize {
        self.create_session.lock().unwrap().len()
    }

    /// Returns the number of ActivateSession submissions currently parked.
    pub fn pending_activate_session_count(&self) -> usize {
        self.activate_session.lock().unwrap().len()
    }

    /// Returns the total number of Publish submissions ever made.
    pub fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::SeqCst)
    }

    /// Returns the acknowledgement lists of every Publish submission, in
    /// submission order.
    pub fn publish_ack_history(&self) -> Vec<Vec<uaclient::SubscriptionAcknowledgement>> {
        self.publish_ack_history.lock().unwrap().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientTransport for MockTransport {
    fn connect(&self, _config: &ClientConfig, events: ChannelEventHandler) -> StatusCode {
        if self.refuse_all.load(Ordering::SeqCst) {
            return StatusCode::BAD_COMMUNICATION_ERROR;
        }
        *self.events.lock().unwrap() = Some(events);
        StatusCode::GOOD
    }

    fn disconnect(&self) {
        self.drop_connection(StatusCode::BAD_CONNECTION_CLOSED);
    }

    fn begin_create_session(
        &self,
        request: CreateSessionRequest,
        completion: AsyncRequest<CreateSessionResponse>,
    ) -> StatusCode {
        if self.refuse_all.load(Ordering::SeqCst) {
            return StatusCode::BAD_COMMUNICATION_ERROR;
        }
        self.create_session.lock().unwrap().push_back((request, completion));
        StatusCode::GOOD
    }

    fn begin_activate_session(
        &self,
        request: ActivateSessionRequest,
        completion: AsyncRequest<ActivateSessionResponse>,
    ) -> StatusCode {
        if self.refuse_all.load(Ordering::SeqCst) {
            return StatusCode::BAD_COMMUNICATION_ERROR;
        }
        self.activate_session.lock().unwrap().push_back((request, completion));
        StatusCode::GOOD
    }

    fn begin_browse(
        &self,
        request: BrowseRequest,
        completion: AsyncRequest<BrowseResponse>,
    ) -> StatusCode {
        if self.refuse_all.load(Ordering::SeqCst) {
            return StatusCode::BAD_COMMUNICATION_ERROR;
        }
        self.browse.lock().unwrap().push_back((request, completion));
        StatusCode::GOOD
    }

    fn begin_read(
        &self,
        request: ReadRequest,
        completion: AsyncRequest<ReadResponse>,
    ) -> StatusCode {
        if self.refuse_all.load(Ordering::SeqCst) {
            return StatusCode::BAD_COMMUNICATION_ERROR;
        }
        self.read.lock().unwrap().push_back((request, completion));
        StatusCode::GOOD
    }

    fn begin_publish(
        &self,
        request: PublishRequest,
        completion: AsyncRequest<PublishResponse>,
    ) -> StatusCode {
        if self.refuse_all.load(Ordering::SeqCst) {
            return StatusCode::BAD_COMMUNICATION_ERROR;
        }
        if self.refuse_next_publish.swap(false, Ordering::SeqCst) {
            return StatusCode::BAD_COMMUNICATION_ERROR;
        }
        self.publish_count.fetch_add(1, Ordering::SeqCst);
        self.publish_ack_history
            .lock()
            .unwrap()
            .push(request.subscription_acknowledgements.clone());
        self.publish.lock().unwrap().push_back((request, completion));
        StatusCode::GOOD
    }

    fn begin_create_subscription(
        &self,
        request: CreateSubscriptionRequest,
        completion: AsyncRequest<CreateSubscriptionResponse>,
    ) -> StatusCode {
        if self.refuse_all.load(Ordering::SeqCst) {
            return StatusCode::BAD_COMMUNICATION_ERROR;
        }
        self.create_subscription.lock().unwrap().push_back((request, completion));
        StatusCode::GOOD
    }

    fn begin_delete_subscriptions(
        &self,
        request: DeleteSubscriptionsRequest,
        completion: AsyncRequest<DeleteSubscriptionsResponse>,
    ) -> StatusCode {
        if self.refuse_all.load(Ordering::SeqCst) {
            return StatusCode::BAD_COMMUNICATION_ERROR;
        }
        self.delete_subscriptions.lock().unwrap().push_back((request, completion));
        StatusCode::GOOD
    }

    fn begin_create_monitored_items(
        &self,
        request: CreateMonitoredItemsRequest,
        completion: AsyncRequest<CreateMonitoredItemsResponse>,
    ) -> StatusCode {
        if self.refuse_all.load(Ordering::SeqCst) {
            return StatusCode::BAD_COMMUNICATION_ERROR;
        }
        self.create_monitored_items.lock().unwrap().push_back((request, completion));
        StatusCode::GOOD
    }
}

/// Counting notification sink for dispatch verification.
pub struct RecordingSink {
    /// Notifications received, with their subscription ids.
    pub notifications: Mutex<Vec<(uaclient::SubscriptionId, uaclient::DataChangeNotification)>>,

    /// Status reports received.
    pub statuses: Mutex<Vec<(uaclient::SubscriptionId, StatusCode)>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            notifications: Mutex::new(Vec::new()),
            statuses: Mutex::new(Vec::new()),
        })
    }

    /// Returns the number of notifications received.
    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

impl uaclient::NotificationSink for RecordingSink {
    fn on_notification(
        &self,
        subscription_id: uaclient::SubscriptionId,
        notification: uaclient::DataChangeNotification,
    ) {
        self.notifications
            .lock()
            .unwrap()
            .push((subscription_id, notification));
    }

    fn on_status(&self, subscription_id: uaclient::SubscriptionId, status: StatusCode) {
        self.statuses.lock().unwrap().push((subscription_id, status));
    }
}
