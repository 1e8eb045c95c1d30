// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared test utilities.

pub mod assertions;
pub mod builders;
pub mod mocks;

use std::sync::Arc;

use uaclient::{Channel, ChannelEvent, ClientConfig, Session, StatusCode};

use self::mocks::MockTransport;

/// Builds the standard test configuration.
pub fn test_config() -> ClientConfig {
    ClientConfig::builder()
        .endpoint_url("opc.tcp://localhost:4840")
        .application_name("Test Client")
        .build()
        .expect("test config must build")
}

/// Creates a connected channel over a fresh mock transport.
pub fn connected_channel() -> (Arc<MockTransport>, Channel) {
    let transport = Arc::new(MockTransport::new());
    let channel = Channel::new(transport.clone());
    channel
        .connect(&test_config(), |_, _| {})
        .expect("connect must be accepted");
    transport.fire_event(StatusCode::GOOD, ChannelEvent::Connected);
    (transport, channel)
}

/// Creates a session and drives it to Active over `channel`.
pub fn active_session(transport: &Arc<MockTransport>, channel: &Channel) -> Session {
    let session = Session::new(channel, test_config());
    session.create(|status| assert!(status.is_good(), "create failed: {status}"));

    let (_, completion) = transport.take_create_session();
    completion.succeed(builders::good_create_session_response());

    let (_, completion) = transport.take_activate_session();
    completion.succeed(builders::good_activate_session_response());

    assert!(session.status().is_good(), "session must be active");
    session
}

/// Enables tracing output for a test when diagnosing failures.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("uaclient=trace")
        .with_test_writer()
        .try_init();
}
