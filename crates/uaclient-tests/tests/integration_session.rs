// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Session Integration Tests
//!
//! Covers channel bring-up ordering, session creation and activation,
//! Browse/Read scoping, reconnect handling, and callback delivery:
//!
//! - `test_session_*`: lifecycle and state machine
//! - `test_browse_*` / `test_read_*`: request-scoped operations
//! - `test_reconnect_*`: channel bounce handling

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use uaclient::service::{BrowseResponse, ReadResponse};
use uaclient::{
    BrowseDescription, ChannelEvent, Channel, DataValue, NodeId, ReadValueId, Session, StatusCode,
    Variant,
};

use uaclient_tests::common::{
    active_session, assertions::assert_statuses, builders, connected_channel, mocks::MockTransport,
    test_config,
};

/// Records every session status transition.
fn record_statuses(session: &Session) -> (Arc<Mutex<Vec<StatusCode>>>, uaclient::SignalConnection) {
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let sink = statuses.clone();
    let connection = session
        .status_changed()
        .connect(move |status| sink.lock().unwrap().push(*status));
    (statuses, connection)
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_session_happy_path() {
    let (transport, channel) = connected_channel();
    let session = Session::new(&channel, test_config());
    let (statuses, _connection) = record_statuses(&session);

    let created = Arc::new(AtomicU32::new(0));
    {
        let created = created.clone();
        session.create(move |status| {
            assert!(status.is_good());
            created.fetch_add(1, Ordering::SeqCst);
        });
    }

    let (request, completion) = transport.take_create_session();
    assert_eq!(request.endpoint_url, "opc.tcp://localhost:4840");
    assert!(!request.session_name.is_empty());
    completion.succeed(builders::good_create_session_response());
    assert_eq!(created.load(Ordering::SeqCst), 1);

    let (request, completion) = transport.take_activate_session();
    assert_eq!(request.header.authentication_token, NodeId::numeric(0, 101));
    completion.succeed(builders::good_activate_session_response());

    assert!(session.status().is_good());
    assert_statuses(&statuses.lock().unwrap(), &[StatusCode::GOOD]);

    let info = session.info().unwrap();
    assert_eq!(info.session_id, NodeId::numeric(0, 100));
    assert_eq!(info.authentication_token, NodeId::numeric(0, 101));
    assert_eq!(info.revised_timeout, 60_000.0);
    assert_eq!(info.server_nonce, vec![0x5A; 32]);
}

#[test]
fn test_session_create_before_channel_up_is_deferred() {
    let transport = Arc::new(MockTransport::new());
    let channel = Channel::new(transport.clone());
    channel.connect(&test_config(), |_, _| {}).unwrap();

    let session = Session::new(&channel, test_config());
    session.create(|status| assert!(status.is_good()));
    assert_eq!(transport.pending_create_session_count(), 0);

    transport.fire_event(StatusCode::GOOD, ChannelEvent::Connected);
    assert_eq!(transport.pending_create_session_count(), 1);
}

#[test]
fn test_session_create_failure_faults_session() {
    let (transport, channel) = connected_channel();
    let session = Session::new(&channel, test_config());
    let (statuses, _connection) = record_statuses(&session);

    let reported = Arc::new(Mutex::new(None));
    {
        let reported = reported.clone();
        session.create(move |status| *reported.lock().unwrap() = Some(status));
    }

    let (_, completion) = transport.take_create_session();
    completion.succeed(uaclient::service::CreateSessionResponse {
        service_result: StatusCode::BAD_SESSION_ID_INVALID,
        ..Default::default()
    });

    assert_eq!(
        *reported.lock().unwrap(),
        Some(StatusCode::BAD_SESSION_ID_INVALID)
    );
    assert_eq!(session.status(), StatusCode::BAD_SESSION_ID_INVALID);
    assert_statuses(
        &statuses.lock().unwrap(),
        &[StatusCode::BAD_SESSION_ID_INVALID],
    );
    // No activation is attempted after a failed creation.
    assert_eq!(transport.pending_activate_session_count(), 0);
}

#[test]
fn test_session_activation_failure_faults_session() {
    let (transport, channel) = connected_channel();
    let session = Session::new(&channel, test_config());
    let (statuses, _connection) = record_statuses(&session);

    session.create(|status| assert!(status.is_good()));
    let (_, completion) = transport.take_create_session();
    completion.succeed(builders::good_create_session_response());

    let (_, completion) = transport.take_activate_session();
    completion.fail(StatusCode::BAD_CONNECTION_CLOSED);

    assert_eq!(session.status(), StatusCode::BAD_CONNECTION_CLOSED);
    assert_statuses(
        &statuses.lock().unwrap(),
        &[StatusCode::BAD_CONNECTION_CLOSED],
    );
}

#[test]
fn test_session_delete_then_operations_do_not_crash() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    session.delete();

    // Operations after delete still complete through their callbacks.
    let called = Arc::new(AtomicU32::new(0));
    {
        let called = called.clone();
        session.read(
            vec![ReadValueId::value_of(NodeId::SERVER_STATUS)],
            move |_, _| {
                called.fetch_add(1, Ordering::SeqCst);
            },
        );
    }
    let (_, completion) = transport.take_read();
    completion.succeed(ReadResponse {
        service_result: StatusCode::GOOD,
        results: vec![DataValue::good(Variant::Boolean(true))],
    });
    assert_eq!(called.load(Ordering::SeqCst), 1);

    session.delete();
}

// =============================================================================
// Browse / Read
// =============================================================================

#[test]
fn test_browse_results_match_input_order() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let reported = Arc::new(Mutex::new(None));
    {
        let reported = reported.clone();
        session.browse(
            vec![
                BrowseDescription::forward(NodeId::SERVER),
                BrowseDescription::forward(NodeId::OBJECTS_FOLDER),
            ],
            move |status, results| {
                *reported.lock().unwrap() = Some((status, results));
            },
        );
    }

    let (request, completion) = transport.take_browse();
    assert_eq!(request.nodes_to_browse.len(), 2);
    assert_eq!(request.nodes_to_browse[0].node_id, NodeId::SERVER);
    assert_eq!(request.nodes_to_browse[1].node_id, NodeId::OBJECTS_FOLDER);

    completion.succeed(BrowseResponse {
        service_result: StatusCode::GOOD,
        results: vec![
            builders::browse_result_with_reference(NodeId::numeric(0, 2256), "ServerStatus"),
            builders::browse_result_with_reference(NodeId::numeric(2, 1), "Plant"),
        ],
    });

    let guard = reported.lock().unwrap();
    let (status, results) = guard.as_ref().unwrap();
    assert!(status.is_good());
    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].references[0].node_id,
        NodeId::numeric(0, 2256),
        "first result must correspond to the first description"
    );
}

#[test]
fn test_browse_bad_service_result_yields_empty_results() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let reported = Arc::new(Mutex::new(None));
    {
        let reported = reported.clone();
        session.browse(
            vec![BrowseDescription::forward(NodeId::SERVER)],
            move |status, results| {
                *reported.lock().unwrap() = Some((status, results.len()));
            },
        );
    }

    let (_, completion) = transport.take_browse();
    completion.succeed(BrowseResponse {
        service_result: StatusCode::BAD_TIMEOUT,
        results: vec![builders::browse_result_with_reference(
            NodeId::numeric(0, 1),
            "ShouldNotSurface",
        )],
    });

    assert_eq!(
        *reported.lock().unwrap(),
        Some((StatusCode::BAD_TIMEOUT, 0))
    );
}

#[test]
fn test_read_service_fault_does_not_fault_session() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);
    let (statuses, _connection) = record_statuses(&session);

    let reported = Arc::new(Mutex::new(None));
    {
        let reported = reported.clone();
        session.read(
            vec![ReadValueId::value_of(NodeId::SERVER_STATUS)],
            move |status, results| {
                assert!(results.is_empty());
                *reported.lock().unwrap() = Some(status);
            },
        );
    }

    let (_, completion) = transport.take_read();
    completion.succeed(ReadResponse {
        service_result: StatusCode::BAD_SESSION_ID_INVALID,
        results: Vec::new(),
    });

    assert_eq!(
        *reported.lock().unwrap(),
        Some(StatusCode::BAD_SESSION_ID_INVALID)
    );
    // Request-scoped errors leave the session alone.
    assert!(session.status().is_good());
    assert!(statuses.lock().unwrap().is_empty());
}

#[test]
fn test_every_operation_callback_fires_exactly_once() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);

    let calls = Arc::new(AtomicU32::new(0));
    for _ in 0..4 {
        let calls = calls.clone();
        session.read(
            vec![ReadValueId::value_of(NodeId::SERVER_STATUS)],
            move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
            },
        );
    }

    // Two complete normally, the rest are flushed by a disconnect.
    for _ in 0..2 {
        let (_, completion) = transport.take_read();
        completion.succeed(ReadResponse {
            service_result: StatusCode::GOOD,
            results: Vec::new(),
        });
    }
    transport.drop_connection(StatusCode::BAD_CONNECTION_CLOSED);

    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_operations_fail_synchronously_while_channel_down() {
    let transport = Arc::new(MockTransport::new());
    let channel = Channel::new(transport.clone());
    channel.connect(&test_config(), |_, _| {}).unwrap();

    let session = Session::new(&channel, test_config());
    let reported = Arc::new(Mutex::new(None));
    {
        let reported = reported.clone();
        session.read(
            vec![ReadValueId::value_of(NodeId::SERVER_STATUS)],
            move |status, results| {
                assert!(results.is_empty());
                *reported.lock().unwrap() = Some(status);
            },
        );
    }

    assert_eq!(
        *reported.lock().unwrap(),
        Some(StatusCode::BAD_SERVER_NOT_CONNECTED)
    );
}

// =============================================================================
// Reconnect
// =============================================================================

#[test]
fn test_reconnect_reactivates_instead_of_recreating() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);
    let (statuses, _connection) = record_statuses(&session);

    transport.fire_event(StatusCode::BAD_CONNECTION_CLOSED, ChannelEvent::Disconnected);
    transport.fire_event(StatusCode::GOOD, ChannelEvent::Reconnected);

    // The created session re-activates; no second CreateSession.
    assert_eq!(transport.pending_create_session_count(), 0);
    assert_eq!(transport.pending_activate_session_count(), 1);

    let (_, completion) = transport.take_activate_session();
    completion.succeed(builders::good_activate_session_response());

    assert!(session.status().is_good());
    assert_statuses(&statuses.lock().unwrap(), &[StatusCode::GOOD]);
}

#[test]
fn test_channel_flush_with_only_reads_inflight_does_not_fault() {
    let (transport, channel) = connected_channel();
    let session = active_session(&transport, &channel);
    let (statuses, _connection) = record_statuses(&session);

    // An operation is in flight when the connection drops.
    session.read(vec![ReadValueId::value_of(NodeId::SERVER_STATUS)], |status, _| {
        assert!(status.is_bad());
    });
    transport.drop_connection(StatusCode::BAD_CONNECTION_CLOSED);

    // Reads are request-scoped, so the session did not fault yet.
    assert!(session.status().is_good());

    transport.fire_event(StatusCode::GOOD, ChannelEvent::Reconnected);
    let (_, completion) = transport.take_activate_session();
    completion.succeed(builders::good_activate_session_response());

    assert_statuses(&statuses.lock().unwrap(), &[StatusCode::GOOD]);
}
