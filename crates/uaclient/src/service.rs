// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service request and response structures.
//!
//! These are owned Rust counterparts of the OPC UA service structures the
//! transport encodes and decodes. The core populates requests and consumes
//! responses; response buffers are moved into the request continuation and
//! any retained subfields are moved out before the buffer is dropped.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::StatusCode;
use crate::types::{MonitoringMode, NodeId};

/// Per-subscription sequence number used for acknowledgements.
pub type SequenceNumber = u32;

// =============================================================================
// SubscriptionId
// =============================================================================

/// Server-assigned subscription identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

impl SubscriptionId {
    /// Creates a subscription id.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

impl From<u32> for SubscriptionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self(0)
    }
}

// =============================================================================
// RequestHeader
// =============================================================================

/// Common header attached to every service request.
#[derive(Debug, Clone, Default)]
pub struct RequestHeader {
    /// Authentication token from CreateSession (null before a session
    /// exists).
    pub authentication_token: NodeId,

    /// Time the request was issued.
    pub timestamp: Option<DateTime<Utc>>,

    /// Client-assigned handle for correlating diagnostics.
    pub request_handle: u32,

    /// Hint to the server for how long to keep processing, in
    /// milliseconds.
    pub timeout_hint: u32,
}

// =============================================================================
// ClientDescription
// =============================================================================

/// Application type reported in the client description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplicationType {
    /// A client application.
    #[default]
    Client,

    /// A combined client and server.
    ClientAndServer,
}

/// Description of the client application sent in CreateSession.
#[derive(Debug, Clone, Default)]
pub struct ClientDescription {
    /// Globally unique application URI.
    pub application_uri: String,

    /// Product URI.
    pub product_uri: String,

    /// Human-readable application name.
    pub application_name: String,

    /// Application type.
    pub application_type: ApplicationType,
}

// =============================================================================
// Variant
// =============================================================================

/// A typed value carried in data values and notifications.
///
/// This is the subset of the OPC UA variant model the client core needs to
/// pass values through; it does not attempt full variant semantics.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    /// Empty value.
    #[default]
    Null,
    /// Boolean.
    Boolean(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
    /// GUID.
    Guid(Uuid),
    /// Byte string.
    ByteString(Vec<u8>),
}

impl Variant {
    /// Returns `true` if the value is empty.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as an f64 when numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Int32(v) => Some(*v as f64),
            Self::UInt32(v) => Some(*v as f64),
            Self::Int64(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice when textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

// =============================================================================
// DataValue
// =============================================================================

/// A value with its quality and timestamps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    /// The value, absent when the status is bad.
    pub value: Option<Variant>,

    /// Quality of the value.
    pub status: StatusCode,

    /// Timestamp assigned by the data source.
    pub source_timestamp: Option<DateTime<Utc>>,

    /// Timestamp assigned by the server.
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    /// Creates a good data value.
    pub fn good(value: Variant) -> Self {
        Self {
            value: Some(value),
            status: StatusCode::GOOD,
            source_timestamp: None,
            server_timestamp: Some(Utc::now()),
        }
    }

    /// Creates a bad data value.
    pub fn bad(status: StatusCode) -> Self {
        Self {
            value: None,
            status,
            source_timestamp: None,
            server_timestamp: Some(Utc::now()),
        }
    }
}

// =============================================================================
// CreateSession
// =============================================================================

/// CreateSession service request.
#[derive(Debug, Clone, Default)]
pub struct CreateSessionRequest {
    /// Request header (authentication token is null here).
    pub header: RequestHeader,

    /// Client application description.
    pub client_description: ClientDescription,

    /// URI of the server the client intends to talk to.
    pub server_uri: String,

    /// Endpoint URL the secure channel was opened to.
    pub endpoint_url: String,

    /// Human-readable session name.
    pub session_name: String,

    /// Client nonce for the activation signature.
    pub client_nonce: Vec<u8>,

    /// Client certificate (DER), empty without security.
    pub client_certificate: Vec<u8>,

    /// Requested session timeout in milliseconds.
    pub requested_session_timeout: f64,

    /// Maximum response message size the client accepts (0 = unlimited).
    pub max_response_message_size: u32,
}

/// CreateSession service response.
#[derive(Debug, Clone, Default)]
pub struct CreateSessionResponse {
    /// Service result from the response header.
    pub service_result: StatusCode,

    /// Server-assigned session identifier.
    pub session_id: NodeId,

    /// Token to attach to every subsequent request header.
    pub authentication_token: NodeId,

    /// Server-revised session timeout in milliseconds.
    pub revised_session_timeout: f64,

    /// Server nonce for the activation signature.
    pub server_nonce: Vec<u8>,

    /// Server certificate (DER).
    pub server_certificate: Vec<u8>,
}

// =============================================================================
// ActivateSession
// =============================================================================

/// A signature created with a certificate's private key.
#[derive(Debug, Clone, Default)]
pub struct SignatureData {
    /// URI of the signature algorithm.
    pub algorithm: String,

    /// The signature bytes.
    pub signature: Vec<u8>,
}

/// ActivateSession service request.
#[derive(Debug, Clone, Default)]
pub struct ActivateSessionRequest {
    /// Request header.
    pub header: RequestHeader,

    /// Signature over the server certificate and nonce.
    pub client_signature: SignatureData,

    /// Requested locales, in preference order.
    pub locale_ids: Vec<String>,

    /// Identity token signature (empty for anonymous).
    pub user_token_signature: SignatureData,
}

/// ActivateSession service response.
#[derive(Debug, Clone, Default)]
pub struct ActivateSessionResponse {
    /// Service result from the response header.
    pub service_result: StatusCode,

    /// Fresh server nonce.
    pub server_nonce: Vec<u8>,

    /// Per-software-certificate results.
    pub results: Vec<StatusCode>,
}

// =============================================================================
// Browse
// =============================================================================

/// Direction of a browse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowseDirection {
    /// Follow references forward.
    #[default]
    Forward,
    /// Follow references backward.
    Inverse,
    /// Follow references in both directions.
    Both,
}

/// One node to browse.
#[derive(Debug, Clone, Default)]
pub struct BrowseDescription {
    /// The node to browse from.
    pub node_id: NodeId,

    /// Browse direction.
    pub browse_direction: BrowseDirection,

    /// Reference type to follow (null = all).
    pub reference_type_id: NodeId,

    /// Whether subtypes of the reference type are included.
    pub include_subtypes: bool,

    /// Node class filter bitmask (0 = all).
    pub node_class_mask: u32,

    /// Result field bitmask.
    pub result_mask: u32,
}

impl BrowseDescription {
    /// Creates a forward browse of all references from `node_id`.
    pub fn forward(node_id: NodeId) -> Self {
        Self {
            node_id,
            include_subtypes: true,
            result_mask: 0x3F,
            ..Default::default()
        }
    }
}

/// A reference returned by browse.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDescription {
    /// Target node.
    pub node_id: NodeId,

    /// Browse name of the target.
    pub browse_name: String,

    /// Display name of the target.
    pub display_name: String,

    /// Node class of the target.
    pub node_class: u32,

    /// The reference type followed.
    pub reference_type_id: NodeId,

    /// Whether the reference was followed forward.
    pub is_forward: bool,

    /// Type definition of the target, when applicable.
    pub type_definition: NodeId,
}

/// Result for one browse description.
#[derive(Debug, Clone, Default)]
pub struct BrowseResult {
    /// Status for this description.
    pub status_code: StatusCode,

    /// Continuation point when the result set was truncated.
    pub continuation_point: Vec<u8>,

    /// The references found.
    pub references: Vec<ReferenceDescription>,
}

/// Browse service request.
#[derive(Debug, Clone, Default)]
pub struct BrowseRequest {
    /// Request header.
    pub header: RequestHeader,

    /// Maximum references to return per node (0 = no limit).
    pub requested_max_references_per_node: u32,

    /// The nodes to browse.
    pub nodes_to_browse: Vec<BrowseDescription>,
}

/// Browse service response. Results match the request order.
#[derive(Debug, Clone, Default)]
pub struct BrowseResponse {
    /// Service result from the response header.
    pub service_result: StatusCode,

    /// One result per browse description, in request order.
    pub results: Vec<BrowseResult>,
}

// =============================================================================
// Read
// =============================================================================

/// Which timestamps the server should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampsToReturn {
    /// Source timestamps only.
    Source,
    /// Server timestamps only.
    Server,
    /// Both timestamps.
    #[default]
    Both,
    /// No timestamps.
    Neither,
}

/// One attribute to read.
#[derive(Debug, Clone, Default)]
pub struct ReadValueId {
    /// The node to read.
    pub node_id: NodeId,

    /// The attribute to read (13 = Value).
    pub attribute_id: u32,
}

impl ReadValueId {
    /// Creates a read of the Value attribute of `node_id`.
    pub fn value_of(node_id: NodeId) -> Self {
        Self {
            node_id,
            attribute_id: crate::types::AttributeId::Value.value(),
        }
    }
}

/// Read service request.
#[derive(Debug, Clone, Default)]
pub struct ReadRequest {
    /// Request header.
    pub header: RequestHeader,

    /// Maximum age of cached values the server may return, in
    /// milliseconds.
    pub max_age: f64,

    /// Timestamps to return.
    pub timestamps_to_return: TimestampsToReturn,

    /// The attributes to read.
    pub nodes_to_read: Vec<ReadValueId>,
}

/// Read service response. Results match the request order.
#[derive(Debug, Clone, Default)]
pub struct ReadResponse {
    /// Service result from the response header.
    pub service_result: StatusCode,

    /// One data value per read id, in request order.
    pub results: Vec<DataValue>,
}

// =============================================================================
// Publish
// =============================================================================

/// Acknowledgement of a received notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionAcknowledgement {
    /// The subscription the message belonged to.
    pub subscription_id: SubscriptionId,

    /// The sequence number being acknowledged.
    pub sequence_number: SequenceNumber,
}

/// Publish service request.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    /// Request header.
    pub header: RequestHeader,

    /// Acknowledgements for previously received notification messages.
    pub subscription_acknowledgements: Vec<SubscriptionAcknowledgement>,
}

/// A notification of changed monitored item values.
#[derive(Debug, Clone, Default)]
pub struct DataChangeNotification {
    /// The changed items.
    pub monitored_items: Vec<MonitoredItemNotification>,
}

/// One changed monitored item value.
#[derive(Debug, Clone, Default)]
pub struct MonitoredItemNotification {
    /// The client handle assigned at item creation.
    pub client_handle: u32,

    /// The new value.
    pub value: DataValue,
}

/// Payload of one entry in a notification message.
#[derive(Debug, Clone)]
pub enum NotificationData {
    /// Data change notifications.
    DataChange(DataChangeNotification),

    /// A status change for the subscription itself.
    StatusChange(StatusCode),
}

/// The notification message carried by a publish response.
#[derive(Debug, Clone, Default)]
pub struct NotificationMessage {
    /// Sequence number of this message.
    pub sequence_number: SequenceNumber,

    /// Time the message was created.
    pub publish_time: Option<DateTime<Utc>>,

    /// The notifications; empty for a keep-alive.
    pub notification_data: Vec<NotificationData>,
}

impl NotificationMessage {
    /// Returns `true` if this message is a keep-alive.
    #[inline]
    pub fn is_keep_alive(&self) -> bool {
        self.notification_data.is_empty()
    }
}

/// Publish service response.
#[derive(Debug, Clone, Default)]
pub struct PublishResponse {
    /// Service result from the response header.
    pub service_result: StatusCode,

    /// The subscription this response delivers for.
    pub subscription_id: SubscriptionId,

    /// Sequence numbers the server still holds for retransmission.
    pub available_sequence_numbers: Vec<SequenceNumber>,

    /// Whether more notifications are queued than fit this message.
    pub more_notifications: bool,

    /// The notification message.
    pub notification_message: NotificationMessage,

    /// One result per acknowledgement sent in the request.
    pub results: Vec<StatusCode>,
}

// =============================================================================
// CreateSubscription / DeleteSubscriptions
// =============================================================================

/// CreateSubscription service request.
#[derive(Debug, Clone, Default)]
pub struct CreateSubscriptionRequest {
    /// Request header.
    pub header: RequestHeader,

    /// Requested publishing interval in milliseconds.
    pub requested_publishing_interval: f64,

    /// Requested lifetime count.
    pub requested_lifetime_count: u32,

    /// Requested maximum keep-alive count.
    pub requested_max_keep_alive_count: u32,

    /// Maximum notifications per publish (0 = unlimited).
    pub max_notifications_per_publish: u32,

    /// Whether publishing starts enabled.
    pub publishing_enabled: bool,

    /// Relative priority.
    pub priority: u8,
}

/// CreateSubscription service response.
#[derive(Debug, Clone, Default)]
pub struct CreateSubscriptionResponse {
    /// Service result from the response header.
    pub service_result: StatusCode,

    /// Server-assigned subscription id.
    pub subscription_id: SubscriptionId,

    /// Revised publishing interval in milliseconds.
    pub revised_publishing_interval: f64,

    /// Revised lifetime count.
    pub revised_lifetime_count: u32,

    /// Revised maximum keep-alive count.
    pub revised_max_keep_alive_count: u32,
}

/// DeleteSubscriptions service request.
#[derive(Debug, Clone, Default)]
pub struct DeleteSubscriptionsRequest {
    /// Request header.
    pub header: RequestHeader,

    /// The subscriptions to delete.
    pub subscription_ids: Vec<SubscriptionId>,
}

/// DeleteSubscriptions service response.
#[derive(Debug, Clone, Default)]
pub struct DeleteSubscriptionsResponse {
    /// Service result from the response header.
    pub service_result: StatusCode,

    /// One result per subscription id, in request order.
    pub results: Vec<StatusCode>,
}

// =============================================================================
// CreateMonitoredItems
// =============================================================================

/// Requested monitoring parameters for one item.
#[derive(Debug, Clone, Default)]
pub struct MonitoringParameters {
    /// Client-assigned handle, echoed in notifications.
    pub client_handle: u32,

    /// Requested sampling interval in milliseconds (-1 = publishing
    /// interval).
    pub sampling_interval: f64,

    /// Requested queue size.
    pub queue_size: u32,

    /// Whether the oldest value is discarded on queue overflow.
    pub discard_oldest: bool,
}

/// One monitored item to create.
#[derive(Debug, Clone, Default)]
pub struct MonitoredItemCreateRequest {
    /// The node attribute to monitor.
    pub item_to_monitor: ReadValueId,

    /// Initial monitoring mode.
    pub monitoring_mode: MonitoringMode,

    /// Requested parameters.
    pub requested_parameters: MonitoringParameters,
}

/// Result for one created monitored item.
#[derive(Debug, Clone, Default)]
pub struct MonitoredItemCreateResult {
    /// Status for this item.
    pub status_code: StatusCode,

    /// Server-assigned monitored item id.
    pub monitored_item_id: u32,

    /// Revised sampling interval in milliseconds.
    pub revised_sampling_interval: f64,

    /// Revised queue size.
    pub revised_queue_size: u32,
}

/// CreateMonitoredItems service request.
#[derive(Debug, Clone, Default)]
pub struct CreateMonitoredItemsRequest {
    /// Request header.
    pub header: RequestHeader,

    /// The owning subscription.
    pub subscription_id: SubscriptionId,

    /// Timestamps to return in notifications.
    pub timestamps_to_return: TimestampsToReturn,

    /// The items to create.
    pub items_to_create: Vec<MonitoredItemCreateRequest>,
}

/// CreateMonitoredItems service response. Results match the request
/// order.
#[derive(Debug, Clone, Default)]
pub struct CreateMonitoredItemsResponse {
    /// Service result from the response header.
    pub service_result: StatusCode,

    /// One result per item, in request order.
    pub results: Vec<MonitoredItemCreateResult>,
}

// =============================================================================
// Tests
// =============================================================================
