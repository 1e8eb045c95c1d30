// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Data Builders
//!
//! Canned requests and responses for driving the mock transport.

use uaclient::service::{
    ActivateSessionResponse, BrowseResult, CreateSessionResponse, CreateSubscriptionResponse,
    DataChangeNotification, MonitoredItemCreateRequest, MonitoredItemCreateResult,
    MonitoredItemNotification, MonitoringParameters, NotificationData, NotificationMessage,
    PublishResponse, ReadValueId, ReferenceDescription, SequenceNumber,
};
use uaclient::{DataValue, NodeId, StatusCode, SubscriptionId, Variant};

/// A good CreateSession response with the canonical test identifiers
/// (`i=100` session, `i=101` token, 60 s revised timeout).
pub fn good_create_session_response() -> CreateSessionResponse {
    CreateSessionResponse {
        service_result: StatusCode::GOOD,
        session_id: NodeId::numeric(0, 100),
        authentication_token: NodeId::numeric(0, 101),
        revised_session_timeout: 60_000.0,
        server_nonce: vec![0xA5; 32],
        server_certificate: Vec::new(),
    }
}

/// A good ActivateSession response with a fresh nonce.
pub fn good_activate_session_response() -> ActivateSessionResponse {
    ActivateSessionResponse {
        service_result: StatusCode::GOOD,
        server_nonce: vec![0x5A; 32],
        results: Vec::new(),
    }
}

/// A publish response carrying one data-change notification.
pub fn data_publish_response(
    subscription_id: SubscriptionId,
    sequence_number: SequenceNumber,
) -> PublishResponse {
    PublishResponse {
        service_result: StatusCode::GOOD,
        subscription_id,
        available_sequence_numbers: vec![sequence_number],
        more_notifications: false,
        notification_message: NotificationMessage {
            sequence_number,
            publish_time: None,
            notification_data: vec![NotificationData::DataChange(DataChangeNotification {
                monitored_items: vec![MonitoredItemNotification {
                    client_handle: 1,
                    value: DataValue::good(Variant::Double(21.5)),
                }],
            })],
        },
        results: Vec::new(),
    }
}

/// A publish response with ack results attached.
pub fn data_publish_response_with_results(
    subscription_id: SubscriptionId,
    sequence_number: SequenceNumber,
    results: Vec<StatusCode>,
) -> PublishResponse {
    PublishResponse {
        results,
        ..data_publish_response(subscription_id, sequence_number)
    }
}

/// A keep-alive publish response (no notification data).
pub fn keep_alive_publish_response(
    subscription_id: SubscriptionId,
    sequence_number: SequenceNumber,
) -> PublishResponse {
    PublishResponse {
        service_result: StatusCode::GOOD,
        subscription_id,
        available_sequence_numbers: Vec::new(),
        more_notifications: false,
        notification_message: NotificationMessage {
            sequence_number,
            publish_time: None,
            notification_data: Vec::new(),
        },
        results: Vec::new(),
    }
}

/// A good CreateSubscription response.
pub fn good_create_subscription_response(
    subscription_id: SubscriptionId,
) -> CreateSubscriptionResponse {
    CreateSubscriptionResponse {
        service_result: StatusCode::GOOD,
        subscription_id,
        revised_publishing_interval: 500.0,
        revised_lifetime_count: 3000,
        revised_max_keep_alive_count: 10,
    }
}

/// A browse result with one reference to `target`.
pub fn browse_result_with_reference(target: NodeId, browse_name: &str) -> BrowseResult {
    BrowseResult {
        status_code: StatusCode::GOOD,
        continuation_point: Vec::new(),
        references: vec![ReferenceDescription {
            node_id: target,
            browse_name: browse_name.to_string(),
            display_name: browse_name.to_string(),
            node_class: 1,
            reference_type_id: NodeId::numeric(0, 35),
            is_forward: true,
            type_definition: NodeId::null(),
        }],
    }
}

/// A monitored item create request for the Value attribute of `node_id`.
pub fn monitored_item_request(node_id: NodeId, client_handle: u32) -> MonitoredItemCreateRequest {
    MonitoredItemCreateRequest {
        item_to_monitor: ReadValueId::value_of(node_id),
        monitoring_mode: Default::default(),
        requested_parameters: MonitoringParameters {
            client_handle,
            sampling_interval: 250.0,
            queue_size: 10,
            discard_oldest: true,
        },
    }
}

/// A good monitored item create result.
pub fn good_monitored_item_result(monitored_item_id: u32) -> MonitoredItemCreateResult {
    MonitoredItemCreateResult {
        status_code: StatusCode::GOOD,
        monitored_item_id,
        revised_sampling_interval: 250.0,
        revised_queue_size: 10,
    }
}
