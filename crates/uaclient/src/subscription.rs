// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscriptions and monitored items.
//!
//! A [`Subscription`] is driven externally: construct it with a
//! notification sink, call [`create`](Subscription::create) to issue
//! CreateSubscription, then add items with
//! [`create_monitored_items`](Subscription::create_monitored_items). On
//! successful creation the subscription registers itself with its
//! session's publish loop; from then on the session dispatches every
//! notification batch for the server-assigned id to this subscription's
//! sink. The session never inspects monitored-item state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::service::{
    CreateMonitoredItemsRequest, CreateMonitoredItemsResponse, CreateSubscriptionRequest,
    CreateSubscriptionResponse, DeleteSubscriptionsRequest, DeleteSubscriptionsResponse,
    MonitoredItemCreateRequest, MonitoredItemCreateResult, NotificationData, SubscriptionId,
    TimestampsToReturn,
};
use crate::session::{Session, SessionCore};
use crate::signal::SignalConnection;
use crate::sink::NotificationSink;
use crate::request::{AsyncRequest, ServiceResult};
use crate::status::StatusCode;
use crate::types::{MonitoringMode, NodeId, SubscriptionParams};

// =============================================================================
// MonitoredItem
// =============================================================================

/// A live monitored item, keyed by its client handle.
#[derive(Debug, Clone)]
pub struct MonitoredItem {
    /// Client-assigned handle echoed in notifications.
    pub client_handle: u32,

    /// The monitored node.
    pub node_id: NodeId,

    /// Server-assigned monitored item id.
    pub monitored_item_id: u32,

    /// Monitoring mode.
    pub monitoring_mode: MonitoringMode,

    /// Revised sampling interval in milliseconds.
    pub revised_sampling_interval: f64,

    /// Revised queue size.
    pub revised_queue_size: u32,
}

// =============================================================================
// Subscription
// =============================================================================

/// A server-side subscription owned by a session.
///
/// # Examples
///
/// ```rust,ignore
/// let sink = Arc::new(FnSink::new(|id, notification| {
///     for item in &notification.monitored_items {
///         println!("{id} handle {} changed", item.client_handle);
///     }
/// }));
/// let subscription = Subscription::new(&session, sink);
/// subscription.create(SubscriptionParams::default(), |status| {
///     println!("subscription: {status}");
/// });
/// ```
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

struct State {
    id: Option<SubscriptionId>,
    creating: bool,
    revised_publishing_interval: f64,
    revised_lifetime_count: u32,
    revised_max_keep_alive_count: u32,
    monitored_items: HashMap<u32, MonitoredItem>,

    // Keeps the session-status observer registered for the life of the
    // subscription.
    _status_forward: Option<SignalConnection>,
}

struct SubscriptionInner {
    session: Arc<SessionCore>,
    sink: Arc<dyn NotificationSink>,
    state: Mutex<State>,
}

impl Subscription {
    /// Creates a subscription bound to `session`, delivering to `sink`.
    ///
    /// Nothing is sent until [`create`](Self::create) is called. The
    /// session must outlive the subscription.
    pub fn new(session: &Session, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                session: Arc::clone(session.core()),
                sink,
                state: Mutex::new(State {
                    id: None,
                    creating: false,
                    revised_publishing_interval: 0.0,
                    revised_lifetime_count: 0,
                    revised_max_keep_alive_count: 0,
                    monitored_items: HashMap::new(),
                    _status_forward: None,
                }),
            }),
        }
    }

    /// Returns the server-assigned id once created.
    pub fn id(&self) -> Option<SubscriptionId> {
        self.inner.state.lock().expect("subscription state poisoned").id
    }

    /// Returns the server-revised publishing interval in milliseconds.
    pub fn revised_publishing_interval(&self) -> f64 {
        self.inner
            .state
            .lock()
            .expect("subscription state poisoned")
            .revised_publishing_interval
    }

    /// Returns the server-revised lifetime count.
    pub fn revised_lifetime_count(&self) -> u32 {
        self.inner
            .state
            .lock()
            .expect("subscription state poisoned")
            .revised_lifetime_count
    }

    /// Returns the server-revised maximum keep-alive count.
    pub fn revised_max_keep_alive_count(&self) -> u32 {
        self.inner
            .state
            .lock()
            .expect("subscription state poisoned")
            .revised_max_keep_alive_count
    }

    /// Returns the live monitored items.
    pub fn monitored_items(&self) -> Vec<MonitoredItem> {
        self.inner
            .state
            .lock()
            .expect("subscription state poisoned")
            .monitored_items
            .values()
            .cloned()
            .collect()
    }

    /// Issues CreateSubscription.
    ///
    /// On success the subscription holds its server-assigned id, the
    /// revised parameters, and is registered with the session's publish
    /// loop; the callback then receives `Good`. A subscription can only be
    /// created once.
    pub fn create(
        &self,
        params: SubscriptionParams,
        callback: impl FnOnce(StatusCode) + Send + 'static,
    ) {
        self.inner.create(params, Box::new(callback));
    }

    /// Issues CreateMonitoredItems for this subscription.
    ///
    /// The callback receives the service status and one result per item,
    /// in request order. Items whose per-item status is good become live;
    /// bad per-item results are the caller's to handle.
    pub fn create_monitored_items(
        &self,
        items: Vec<MonitoredItemCreateRequest>,
        timestamps_to_return: TimestampsToReturn,
        callback: impl FnOnce(StatusCode, Vec<MonitoredItemCreateResult>) + Send + 'static,
    ) {
        self.inner
            .create_monitored_items(items, timestamps_to_return, Box::new(callback));
    }

    /// Issues DeleteSubscriptions and unregisters from the publish loop.
    pub fn delete(&self, callback: impl FnOnce(StatusCode) + Send + 'static) {
        self.inner.delete(Box::new(callback));
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id()).finish()
    }
}

// =============================================================================
// SubscriptionInner
// =============================================================================

type StatusCallback = Box<dyn FnOnce(StatusCode) + Send>;
type ItemsCallback = Box<dyn FnOnce(StatusCode, Vec<MonitoredItemCreateResult>) + Send>;

impl SubscriptionInner {
    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("subscription state poisoned")
    }

    fn create(self: &Arc<Self>, params: SubscriptionParams, callback: StatusCallback) {
        {
            let mut state = self.lock();
            if state.creating || state.id.is_some() {
                drop(state);
                callback(StatusCode::BAD_INVALID_STATE);
                return;
            }
            state.creating = true;
        }

        let request = CreateSubscriptionRequest {
            header: self.session.request_header(),
            requested_publishing_interval: params.publishing_interval.as_secs_f64() * 1000.0,
            requested_lifetime_count: params.lifetime_count,
            requested_max_keep_alive_count: params.max_keepalive_count,
            max_notifications_per_publish: params.max_notifications_per_publish,
            publishing_enabled: params.publishing_enabled,
            priority: params.priority,
        };

        let slot = Arc::new(Mutex::new(Some(callback)));
        let completion = {
            let slot = Arc::clone(&slot);
            let weak = Arc::downgrade(self);
            AsyncRequest::new(move |result: ServiceResult<CreateSubscriptionResponse>| {
                let Some(callback) = slot.lock().expect("callback slot poisoned").take() else {
                    return;
                };
                let status = match Weak::upgrade(&weak) {
                    Some(inner) => inner.on_created(result),
                    None => StatusCode::BAD_SESSION_CLOSED,
                };
                callback(status);
            })
        };

        let status = self
            .session
            .channel
            .submit(|transport| transport.begin_create_subscription(request, completion));
        if status.is_bad() {
            self.lock().creating = false;
            if let Some(callback) = slot.lock().expect("callback slot poisoned").take() {
                callback(status);
            }
        }
    }

    /// Applies a CreateSubscription outcome and returns the status to
    /// report.
    fn on_created(self: &Arc<Self>, result: ServiceResult<CreateSubscriptionResponse>) -> StatusCode {
        let response = match result {
            Ok(response) => response,
            Err(status) => {
                self.lock().creating = false;
                return status;
            }
        };
        if response.service_result.is_bad() {
            self.lock().creating = false;
            return response.service_result;
        }

        let subscription_id = response.subscription_id;
        {
            let mut state = self.lock();
            state.creating = false;
            state.id = Some(subscription_id);
            state.revised_publishing_interval = response.revised_publishing_interval;
            state.revised_lifetime_count = response.revised_lifetime_count;
            state.revised_max_keep_alive_count = response.revised_max_keep_alive_count;
        }

        // Dispatch notification batches to the sink; the handler owns only
        // the sink, never the subscription, so dropping the subscription
        // unregisters cleanly.
        let sink = Arc::clone(&self.sink);
        let handler: Arc<dyn Fn(Vec<NotificationData>) + Send + Sync> =
            Arc::new(move |notifications| {
                for notification in notifications {
                    match notification {
                        NotificationData::DataChange(data_change) => {
                            sink.on_notification(subscription_id, data_change);
                        }
                        NotificationData::StatusChange(status) => {
                            sink.on_status(subscription_id, status);
                        }
                    }
                }
            });
        self.session.start_publishing(subscription_id, handler);

        // Session-level faults are reported to the sink as well.
        let sink = Arc::clone(&self.sink);
        let forward = self.session.status_signal().connect(move |status| {
            if status.is_bad() {
                sink.on_status(subscription_id, *status);
            }
        });
        self.lock()._status_forward = Some(forward);

        tracing::info!(
            subscription_id = subscription_id.value(),
            publishing_interval_ms = response.revised_publishing_interval,
            "Subscription created"
        );

        StatusCode::GOOD
    }

    fn create_monitored_items(
        self: &Arc<Self>,
        items: Vec<MonitoredItemCreateRequest>,
        timestamps_to_return: TimestampsToReturn,
        callback: ItemsCallback,
    ) {
        let subscription_id = { self.lock().id };
        let Some(subscription_id) = subscription_id else {
            callback(StatusCode::BAD_INVALID_STATE, Vec::new());
            return;
        };

        // Remember what was requested so good results can be recorded.
        let requested: Vec<(u32, NodeId, MonitoringMode)> = items
            .iter()
            .map(|item| {
                (
                    item.requested_parameters.client_handle,
                    item.item_to_monitor.node_id.clone(),
                    item.monitoring_mode,
                )
            })
            .collect();

        let request = CreateMonitoredItemsRequest {
            header: self.session.request_header(),
            subscription_id,
            timestamps_to_return,
            items_to_create: items,
        };

        let slot = Arc::new(Mutex::new(Some(callback)));
        let completion = {
            let slot = Arc::clone(&slot);
            let weak = Arc::downgrade(self);
            AsyncRequest::new(move |result: ServiceResult<CreateMonitoredItemsResponse>| {
                let Some(callback) = slot.lock().expect("callback slot poisoned").take() else {
                    return;
                };
                match result {
                    Err(status) => callback(status, Vec::new()),
                    Ok(response) if response.service_result.is_bad() => {
                        callback(response.service_result, Vec::new())
                    }
                    Ok(response) => {
                        if let Some(inner) = Weak::upgrade(&weak) {
                            inner.record_items(&requested, &response.results);
                        }
                        callback(response.service_result, response.results)
                    }
                }
            })
        };

        let status = self
            .session
            .channel
            .submit(|transport| transport.begin_create_monitored_items(request, completion));
        if status.is_bad() {
            if let Some(callback) = slot.lock().expect("callback slot poisoned").take() {
                callback(status, Vec::new());
            }
        }
    }

    fn record_items(
        &self,
        requested: &[(u32, NodeId, MonitoringMode)],
        results: &[MonitoredItemCreateResult],
    ) {
        let mut state = self.lock();
        for ((client_handle, node_id, monitoring_mode), result) in
            requested.iter().zip(results.iter())
        {
            if result.status_code.is_bad() {
                continue;
            }
            state.monitored_items.insert(
                *client_handle,
                MonitoredItem {
                    client_handle: *client_handle,
                    node_id: node_id.clone(),
                    monitored_item_id: result.monitored_item_id,
                    monitoring_mode: *monitoring_mode,
                    revised_sampling_interval: result.revised_sampling_interval,
                    revised_queue_size: result.revised_queue_size,
                },
            );
        }
    }

    fn delete(self: &Arc<Self>, callback: StatusCallback) {
        let subscription_id = {
            let mut state = self.lock();
            let Some(subscription_id) = state.id.take() else {
                drop(state);
                callback(StatusCode::BAD_INVALID_STATE);
                return;
            };
            state.monitored_items.clear();
            state._status_forward = None;
            subscription_id
        };

        self.session.stop_publishing(subscription_id);

        let request = DeleteSubscriptionsRequest {
            header: self.session.request_header(),
            subscription_ids: vec![subscription_id],
        };

        let slot = Arc::new(Mutex::new(Some(callback)));
        let completion = {
            let slot = Arc::clone(&slot);
            AsyncRequest::new(move |result: ServiceResult<DeleteSubscriptionsResponse>| {
                let Some(callback) = slot.lock().expect("callback slot poisoned").take() else {
                    return;
                };
                let status = match result {
                    Err(status) => status,
                    Ok(response) if response.service_result.is_bad() => response.service_result,
                    Ok(response) => response
                        .results
                        .first()
                        .copied()
                        .unwrap_or(StatusCode::GOOD),
                };
                callback(status);
            })
        };

        let status = self
            .session
            .channel
            .submit(|transport| transport.begin_delete_subscriptions(request, completion));
        if status.is_bad() {
            if let Some(callback) = slot.lock().expect("callback slot poisoned").take() {
                callback(status);
            }
        }

        tracing::info!(
            subscription_id = subscription_id.value(),
            "Subscription deleted"
        );
    }
}

impl Drop for SubscriptionInner {
    fn drop(&mut self) {
        // Dropping without delete() still unregisters locally; the server
        // side expires through its lifetime count.
        let id = self.state.lock().expect("subscription state poisoned").id;
        if let Some(subscription_id) = id {
            self.session.stop_publishing(subscription_id);
        }
    }
}
