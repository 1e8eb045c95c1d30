// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session-oriented asynchronous OPC UA client core.
//!
//! This crate manages the lifecycle of a secure channel to an OPC UA
//! server, maintains sessions over that channel, and drives the
//! server-initiated notification delivery (the publish loop) required for
//! subscriptions. OPC UA servers never push unsolicited data; a client
//! keeps one Publish request outstanding per session so the server can
//! deliver change notifications.
//!
//! The wire codec, security negotiation, and certificate handling live
//! behind the [`ClientTransport`] trait; this crate populates request
//! structures, consumes responses, and owns the control plane:
//!
//! - ordering between channel-connected events and session
//!   creation/activation,
//! - a single-flight publish loop with acknowledgement bookkeeping that
//!   survives reconnects,
//! - error propagation across callbacks fired on transport threads.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Subscription                        │
//! │        (CreateSubscription, monitored items, sink)      │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Session                          │
//! │   (CreateSession/ActivateSession, Browse/Read, Publish) │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Channel                          │
//! │         (secure channel status, request submission)     │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                     ClientTransport                     │
//! │          (codec, security, begin_*/continuation)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use uaclient::{Channel, ClientConfig, Session, Subscription, SubscriptionParams};
//! use uaclient::sink::FnSink;
//!
//! let platform = uaclient::Platform::acquire();
//! let config = ClientConfig::builder()
//!     .endpoint_url("opc.tcp://localhost:4840")
//!     .build()?;
//!
//! let channel = Channel::new(transport);
//! channel.connect(&config, |status, event| {
//!     println!("channel {event}: {status}");
//! })?;
//!
//! let session = Session::new(&channel, config);
//! session.create(|status| println!("session: {status}"));
//!
//! let sink = Arc::new(FnSink::new(|id, notification| {
//!     println!("{id}: {} changed items", notification.monitored_items.len());
//! }));
//! let subscription = Subscription::new(&session, sink);
//! subscription.create(SubscriptionParams::default(), |status| {
//!     println!("subscription: {status}");
//! });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod channel;
pub mod error;
pub mod platform;
pub mod request;
pub mod service;
pub mod session;
pub mod signal;
pub mod sink;
pub mod status;
pub mod subscription;
pub mod transport;
pub mod types;

// Re-export the primary surface.
pub use channel::Channel;
pub use error::{
    ClientError, ClientResult, ConfigurationError, OperationError, ProtocolViolation,
    ServiceError, TransportError,
};
pub use platform::Platform;
pub use request::{AsyncRequest, ServiceResult};
pub use service::{
    BrowseDescription, BrowseResult, DataChangeNotification, DataValue,
    MonitoredItemCreateRequest, MonitoredItemCreateResult, MonitoredItemNotification,
    MonitoringParameters, NotificationData, NotificationMessage, PublishRequest, PublishResponse,
    ReadValueId, ReferenceDescription, RequestHeader, SequenceNumber,
    SubscriptionAcknowledgement, SubscriptionId, TimestampsToReturn, Variant,
};
pub use session::{NotificationHandler, Session, SessionInfo};
pub use signal::{Signal, SignalConnection};
pub use sink::{BroadcastSink, DataChangeEvent, FnSink, MpscSink, NotificationSink};
pub use status::StatusCode;
pub use subscription::{MonitoredItem, Subscription};
pub use transport::{ChannelEvent, ChannelEventHandler, ClientTransport};
pub use types::{
    AttributeId, ClientConfig, ClientConfigBuilder, MonitoringMode, NodeId, NodeIdentifier,
    PkiConfig, SecurityMode, SecurityPolicy, SubscriptionParams,
};
