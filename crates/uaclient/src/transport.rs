// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transport abstraction.
//!
//! The [`ClientTransport`] trait is the boundary to the secure-channel and
//! codec layer. It follows a begin/continuation contract: every `begin_*`
//! method takes a fully populated request and an [`AsyncRequest`]
//! continuation, returns a [`StatusCode`] describing the submission, and
//! completes the continuation exactly once from a transport worker thread.
//!
//! # Contract
//!
//! - A good return value means the request was accepted; the continuation
//!   WILL be completed, with the decoded response or a transport error.
//! - A bad return value means the submission was refused; the continuation
//!   MUST be dropped without being invoked.
//! - Responses for requests submitted on one channel are delivered in
//!   submission order.
//! - [`disconnect`](ClientTransport::disconnect) completes every pending
//!   continuation with a bad status.

use std::fmt;
use std::sync::Arc;

use crate::request::AsyncRequest;
use crate::service::{
    ActivateSessionRequest, ActivateSessionResponse, BrowseRequest, BrowseResponse,
    CreateMonitoredItemsRequest, CreateMonitoredItemsResponse, CreateSessionRequest,
    CreateSessionResponse, CreateSubscriptionRequest, CreateSubscriptionResponse,
    DeleteSubscriptionsRequest, DeleteSubscriptionsResponse, PublishRequest, PublishResponse,
    ReadRequest, ReadResponse,
};
use crate::status::StatusCode;
use crate::types::ClientConfig;

// =============================================================================
// ChannelEvent
// =============================================================================

/// Transport-level events reported for a secure channel.
///
/// Multiple transitions are possible over the life of a channel; in
/// particular `Disconnected` followed by `Reconnected` when the transport
/// re-establishes the connection on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelEvent {
    /// The channel connected for the first time.
    Connected,

    /// The channel reconnected after a failure.
    Reconnected,

    /// The channel lost its connection.
    Disconnected,
}

impl ChannelEvent {
    /// Returns `true` if the channel is usable after this event.
    #[inline]
    pub const fn is_up(&self) -> bool {
        matches!(self, Self::Connected | Self::Reconnected)
    }
}

impl fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "Connected"),
            Self::Reconnected => write!(f, "Reconnected"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Handler invoked for every channel event with the accompanying status.
pub type ChannelEventHandler = Arc<dyn Fn(StatusCode, ChannelEvent) + Send + Sync>;

// =============================================================================
// ClientTransport
// =============================================================================

/// The secure-channel and codec layer underneath the client core.
///
/// Implementations own the wire protocol: connection establishment,
/// security negotiation, and binary (de)serialization of the service
/// structures. The core populates request structs and consumes response
/// structs; it never touches bytes.
pub trait ClientTransport: Send + Sync {
    /// Starts an asynchronous connect to the configured endpoint.
    ///
    /// `events` receives every subsequent channel transition. Reconnecting
    /// after a failure is the transport's responsibility; each attempt is
    /// reported through `events`.
    fn connect(&self, config: &ClientConfig, events: ChannelEventHandler) -> StatusCode;

    /// Tears the channel down.
    ///
    /// Every pending continuation is completed with a bad status and a
    /// final `Disconnected` event is delivered.
    fn disconnect(&self);

    /// Submits a CreateSession request.
    fn begin_create_session(
        &self,
        request: CreateSessionRequest,
        completion: AsyncRequest<CreateSessionResponse>,
    ) -> StatusCode;

    /// Submits an ActivateSession request.
    fn begin_activate_session(
        &self,
        request: ActivateSessionRequest,
        completion: AsyncRequest<ActivateSessionResponse>,
    ) -> StatusCode;

    /// Submits a Browse request.
    fn begin_browse(
        &self,
        request: BrowseRequest,
        completion: AsyncRequest<BrowseResponse>,
    ) -> StatusCode;

    /// Submits a Read request.
    fn begin_read(&self, request: ReadRequest, completion: AsyncRequest<ReadResponse>)
        -> StatusCode;

    /// Submits a Publish request.
    fn begin_publish(
        &self,
        request: PublishRequest,
        completion: AsyncRequest<PublishResponse>,
    ) -> StatusCode;

    /// Submits a CreateSubscription request.
    fn begin_create_subscription(
        &self,
        request: CreateSubscriptionRequest,
        completion: AsyncRequest<CreateSubscriptionResponse>,
    ) -> StatusCode;

    /// Submits a DeleteSubscriptions request.
    fn begin_delete_subscriptions(
        &self,
        request: DeleteSubscriptionsRequest,
        completion: AsyncRequest<DeleteSubscriptionsResponse>,
    ) -> StatusCode;

    /// Submits a CreateMonitoredItems request.
    fn begin_create_monitored_items(
        &self,
        request: CreateMonitoredItemsRequest,
        completion: AsyncRequest<CreateMonitoredItemsResponse>,
    ) -> StatusCode;
}
