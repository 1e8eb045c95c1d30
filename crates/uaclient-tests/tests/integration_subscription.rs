// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Subscription Integration Tests
//!
//! Covers subscription creation, monitored item bookkeeping, and
//! notification sink dispatch:
//!
//! - `test_subscription_*`: lifecycle and registration
//! - `test_monitored_items_*`: item creation and recording
//! - `test_sink_*`: delivery adapters

use std::sync::Arc;

use uaclient::service::CreateMonitoredItemsResponse;
use uaclient::{
    MpscSink, NodeId, StatusCode, Subscription, SubscriptionId, SubscriptionParams,
    TimestampsToReturn,
};

use uaclient_tests::common::{
    active_session, builders, connected_channel, mocks::RecordingSink,
};

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_subscription_create_records_revised_parameters() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let sink = RecordingSink::new();
    let subscription = Subscription::new(&session, sink);
    assert!(subscription.id().is_none());

    subscription.create(
        SubscriptionParams::with_interval(std::time::Duration::from_millis(250)),
        |status| assert!(status.is_good()),
    );

    let (request, completion) = transport.take_create_subscription();
    assert_eq!(request.requested_publishing_interval, 250.0);
    assert!(request.publishing_enabled);
    completion.succeed(builders::good_create_subscription_response(
        SubscriptionId::new(42),
    ));

    assert_eq!(subscription.id(), Some(SubscriptionId::new(42)));
    assert_eq!(subscription.revised_publishing_interval(), 500.0);
    assert_eq!(subscription.revised_lifetime_count(), 3000);
    assert_eq!(subscription.revised_max_keep_alive_count(), 10);

    // Registration with the publish loop happened.
    assert_eq!(transport.publish_count(), 1);
}

#[test]
fn test_subscription_create_twice_is_rejected() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let subscription = Subscription::new(&session, RecordingSink::new());
    subscription.create(SubscriptionParams::default(), |status| {
        assert!(status.is_good())
    });
    let (_, completion) = transport.take_create_subscription();
    completion.succeed(builders::good_create_subscription_response(
        SubscriptionId::new(1),
    ));

    subscription.create(SubscriptionParams::default(), |status| {
        assert_eq!(status, StatusCode::BAD_INVALID_STATE)
    });
}

#[test]
fn test_subscription_create_failure_reports_status() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let subscription = Subscription::new(&session, RecordingSink::new());
    subscription.create(SubscriptionParams::default(), |status| {
        assert_eq!(status, StatusCode::BAD_NO_SUBSCRIPTION)
    });

    let (_, completion) = transport.take_create_subscription();
    completion.succeed(uaclient::service::CreateSubscriptionResponse {
        service_result: StatusCode::BAD_NO_SUBSCRIPTION,
        ..Default::default()
    });

    assert!(subscription.id().is_none());
    // No publish loop registration on failure.
    assert_eq!(transport.publish_count(), 0);
}

#[test]
fn test_subscription_delete_unregisters() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let subscription = Subscription::new(&session, RecordingSink::new());
    subscription.create(SubscriptionParams::default(), |_| {});
    let (_, completion) = transport.take_create_subscription();
    completion.succeed(builders::good_create_subscription_response(
        SubscriptionId::new(5),
    ));

    subscription.delete(|status| assert!(status.is_good()));
    let (request, completion) = transport.take_delete_subscriptions();
    assert_eq!(request.subscription_ids, vec![SubscriptionId::new(5)]);
    completion.succeed(uaclient::service::DeleteSubscriptionsResponse {
        service_result: StatusCode::GOOD,
        results: vec![StatusCode::GOOD],
    });

    assert!(subscription.id().is_none());
    subscription.delete(|status| assert_eq!(status, StatusCode::BAD_INVALID_STATE));
}

#[test]
fn test_subscription_drop_stops_publishing() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let subscription = Subscription::new(&session, RecordingSink::new());
    subscription.create(SubscriptionParams::default(), |_| {});
    let (_, completion) = transport.take_create_subscription();
    completion.succeed(builders::good_create_subscription_response(
        SubscriptionId::new(1),
    ));
    assert_eq!(transport.pending_publish_count(), 1);

    drop(subscription);

    // The in-flight Publish completes; with no registration left, the
    // loop parks.
    let (_, completion) = transport.take_publish();
    completion.succeed(builders::keep_alive_publish_response(
        SubscriptionId::new(1),
        1,
    ));
    assert_eq!(transport.pending_publish_count(), 0);
}

// =============================================================================
// Monitored items
// =============================================================================

#[test]
fn test_monitored_items_require_created_subscription() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let subscription = Subscription::new(&session, RecordingSink::new());
    subscription.create_monitored_items(
        vec![builders::monitored_item_request(NodeId::numeric(2, 1001), 1)],
        TimestampsToReturn::Both,
        |status, results| {
            assert_eq!(status, StatusCode::BAD_INVALID_STATE);
            assert!(results.is_empty());
        },
    );
}

#[test]
fn test_monitored_items_created_and_recorded() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let subscription = Subscription::new(&session, RecordingSink::new());
    subscription.create(SubscriptionParams::default(), |_| {});
    let (_, completion) = transport.take_create_subscription();
    completion.succeed(builders::good_create_subscription_response(
        SubscriptionId::new(3),
    ));

    subscription.create_monitored_items(
        vec![
            builders::monitored_item_request(NodeId::numeric(2, 1001), 1),
            builders::monitored_item_request(NodeId::string(2, "Pump.Speed"), 2),
        ],
        TimestampsToReturn::Both,
        |status, results| {
            assert!(status.is_good());
            assert_eq!(results.len(), 2);
        },
    );

    let (request, completion) = transport.take_create_monitored_items();
    assert_eq!(request.subscription_id, SubscriptionId::new(3));
    assert_eq!(request.items_to_create.len(), 2);
    completion.succeed(CreateMonitoredItemsResponse {
        service_result: StatusCode::GOOD,
        results: vec![
            builders::good_monitored_item_result(501),
            builders::good_monitored_item_result(502),
        ],
    });

    let mut items = subscription.monitored_items();
    items.sort_by_key(|item| item.client_handle);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].client_handle, 1);
    assert_eq!(items[0].monitored_item_id, 501);
    assert_eq!(items[1].node_id, NodeId::string(2, "Pump.Speed"));
}

#[test]
fn test_monitored_items_bad_result_not_recorded() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let subscription = Subscription::new(&session, RecordingSink::new());
    subscription.create(SubscriptionParams::default(), |_| {});
    let (_, completion) = transport.take_create_subscription();
    completion.succeed(builders::good_create_subscription_response(
        SubscriptionId::new(3),
    ));

    subscription.create_monitored_items(
        vec![
            builders::monitored_item_request(NodeId::numeric(2, 1001), 1),
            builders::monitored_item_request(NodeId::numeric(2, 9999), 2),
        ],
        TimestampsToReturn::Both,
        |status, results| {
            assert!(status.is_good());
            assert_eq!(results[1].status_code, StatusCode::BAD_SUBSCRIPTION_ID_INVALID);
        },
    );

    let (_, completion) = transport.take_create_monitored_items();
    completion.succeed(CreateMonitoredItemsResponse {
        service_result: StatusCode::GOOD,
        results: vec![
            builders::good_monitored_item_result(501),
            uaclient::MonitoredItemCreateResult {
                status_code: StatusCode::BAD_SUBSCRIPTION_ID_INVALID,
                ..Default::default()
            },
        ],
    });

    let items = subscription.monitored_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].client_handle, 1);
}

// =============================================================================
// Sinks
// =============================================================================

#[test]
fn test_sink_receives_only_matching_subscription() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let sink1 = RecordingSink::new();
    let sub1 = Subscription::new(&session, sink1.clone());
    sub1.create(SubscriptionParams::default(), |_| {});
    let (_, completion) = transport.take_create_subscription();
    completion.succeed(builders::good_create_subscription_response(
        SubscriptionId::new(1),
    ));

    let sink2 = RecordingSink::new();
    let sub2 = Subscription::new(&session, sink2.clone());
    sub2.create(SubscriptionParams::default(), |_| {});
    let (_, completion) = transport.take_create_subscription();
    completion.succeed(builders::good_create_subscription_response(
        SubscriptionId::new(2),
    ));

    let (_, completion) = transport.take_publish();
    completion.succeed(builders::data_publish_response(SubscriptionId::new(2), 1));

    assert_eq!(sink1.notification_count(), 0);
    assert_eq!(sink2.notification_count(), 1);
}

#[test]
fn test_sink_hears_session_fault() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let sink = RecordingSink::new();
    let subscription = Subscription::new(&session, sink.clone());
    subscription.create(SubscriptionParams::default(), |_| {});
    let (_, completion) = transport.take_create_subscription();
    completion.succeed(builders::good_create_subscription_response(
        SubscriptionId::new(1),
    ));

    let (_, completion) = transport.take_publish();
    completion.fail(StatusCode::BAD_SECURE_CHANNEL_CLOSED);

    assert_eq!(
        sink.statuses.lock().unwrap().as_slice(),
        &[(
            SubscriptionId::new(1),
            StatusCode::BAD_SECURE_CHANNEL_CLOSED
        )]
    );
}

#[tokio::test]
async fn test_sink_mpsc_delivers_to_async_consumer() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let (sink, mut receiver) = MpscSink::with_channel(16);
    let subscription = Subscription::new(&session, Arc::new(sink));
    subscription.create(SubscriptionParams::default(), |_| {});
    let (_, completion) = transport.take_create_subscription();
    completion.succeed(builders::good_create_subscription_response(
        SubscriptionId::new(8),
    ));

    let (_, completion) = transport.take_publish();
    completion.succeed(builders::data_publish_response(SubscriptionId::new(8), 1));

    let event = receiver.recv().await.expect("event must arrive");
    assert_eq!(event.subscription_id, SubscriptionId::new(8));
    assert_eq!(event.notification.monitored_items.len(), 1);
    assert_eq!(
        event.notification.monitored_items[0]
            .value
            .value
            .as_ref()
            .and_then(|v| v.as_f64()),
        Some(21.5)
    );
}
