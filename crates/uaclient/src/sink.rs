// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Notification delivery.
//!
//! A [`NotificationSink`] receives the data-change batches and status
//! reports of one subscription. Sinks are invoked synchronously on
//! transport threads and must not block; the channel-backed adapters in
//! this module hand notifications off to async consumers instead.

use tokio::sync::{broadcast, mpsc};

use crate::service::{DataChangeNotification, SubscriptionId};
use crate::status::StatusCode;

// =============================================================================
// NotificationSink
// =============================================================================

/// Consumer of one subscription's notifications.
pub trait NotificationSink: Send + Sync {
    /// Called for every data-change notification delivered by a publish
    /// response.
    fn on_notification(&self, subscription_id: SubscriptionId, notification: DataChangeNotification);

    /// Called when the subscription's session reports a failure status.
    fn on_status(&self, _subscription_id: SubscriptionId, _status: StatusCode) {}
}

// =============================================================================
// FnSink
// =============================================================================

/// Closure-backed sink.
///
/// # Examples
///
/// ```
/// use uaclient::sink::FnSink;
///
/// let sink = FnSink::new(|subscription_id, notification| {
///     println!("{subscription_id}: {} items", notification.monitored_items.len());
/// });
/// ```
pub struct FnSink<F> {
    on_notification: F,
}

impl<F> FnSink<F>
where
    F: Fn(SubscriptionId, DataChangeNotification) + Send + Sync,
{
    /// Creates a sink from a data-change closure.
    pub fn new(on_notification: F) -> Self {
        Self { on_notification }
    }
}

impl<F> NotificationSink for FnSink<F>
where
    F: Fn(SubscriptionId, DataChangeNotification) + Send + Sync,
{
    fn on_notification(
        &self,
        subscription_id: SubscriptionId,
        notification: DataChangeNotification,
    ) {
        (self.on_notification)(subscription_id, notification);
    }
}

// =============================================================================
// DataChangeEvent
// =============================================================================

/// One event carried by the channel-backed sinks.
#[derive(Debug, Clone)]
pub struct DataChangeEvent {
    /// The subscription that produced the notification.
    pub subscription_id: SubscriptionId,

    /// The notification payload.
    pub notification: DataChangeNotification,
}

// =============================================================================
// MpscSink
// =============================================================================

/// Sink that forwards events into a bounded mpsc channel.
///
/// Delivery is best effort: when the receiver falls behind and the channel
/// is full, the event is dropped and counted in the log.
pub struct MpscSink {
    sender: mpsc::Sender<DataChangeEvent>,
}

impl MpscSink {
    /// Creates a sink over an existing sender.
    pub fn new(sender: mpsc::Sender<DataChangeEvent>) -> Self {
        Self { sender }
    }

    /// Creates a sink together with its receiver.
    pub fn with_channel(capacity: usize) -> (Self, mpsc::Receiver<DataChangeEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }
}

impl NotificationSink for MpscSink {
    fn on_notification(
        &self,
        subscription_id: SubscriptionId,
        notification: DataChangeNotification,
    ) {
        let event = DataChangeEvent {
            subscription_id,
            notification,
        };
        if self.sender.try_send(event).is_err() {
            tracing::warn!(%subscription_id, "Notification dropped, receiver behind");
        }
    }
}

// =============================================================================
// BroadcastSink
// =============================================================================

/// Sink that fans events out to any number of broadcast receivers.
///
/// Lossy by design: events sent while no receiver exists are discarded.
pub struct BroadcastSink {
    sender: broadcast::Sender<DataChangeEvent>,
}

impl BroadcastSink {
    /// Creates a sink with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes a new receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<DataChangeEvent> {
        self.sender.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn on_notification(
        &self,
        subscription_id: SubscriptionId,
        notification: DataChangeNotification,
    ) {
        let _ = self.sender.send(DataChangeEvent {
            subscription_id,
            notification,
        });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MonitoredItemNotification;

    fn sample_notification() -> DataChangeNotification {
        DataChangeNotification {
            monitored_items: vec![MonitoredItemNotification {
                client_handle: 1,
                value: Default::default(),
            }],
        }
    }

    #[test]
    fn test_fn_sink_invokes_closure() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicU32::new(0));
        let sink = {
            let calls = calls.clone();
            FnSink::new(move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        sink.on_notification(SubscriptionId::new(1), sample_notification());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mpsc_sink_delivers() {
        let (sink, mut receiver) = MpscSink::with_channel(4);
        sink.on_notification(SubscriptionId::new(7), sample_notification());

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.subscription_id, SubscriptionId::new(7));
        assert_eq!(event.notification.monitored_items.len(), 1);
    }

    #[tokio::test]
    async fn test_mpsc_sink_drops_when_full() {
        let (sink, mut receiver) = MpscSink::with_channel(1);
        sink.on_notification(SubscriptionId::new(1), sample_notification());
        sink.on_notification(SubscriptionId::new(1), sample_notification());

        assert!(receiver.recv().await.is_some());
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_sink_fans_out() {
        let sink = BroadcastSink::new(4);
        let mut a = sink.subscribe();
        let mut b = sink.subscribe();

        sink.on_notification(SubscriptionId::new(3), sample_notification());

        assert_eq!(a.recv().await.unwrap().subscription_id, SubscriptionId::new(3));
        assert_eq!(b.recv().await.unwrap().subscription_id, SubscriptionId::new(3));
    }
}
