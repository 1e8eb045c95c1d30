// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # uaclient Integration Tests
//!
//! Integration tests for the OPC UA client core. The [`common`] module
//! provides the shared test infrastructure:
//!
//! - `mocks`: a scripted transport that parks every submission for
//!   explicit completion and records everything it sees
//! - `builders`: canned requests and responses
//! - `assertions`: assertion helpers for recorded traffic
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p uaclient-tests
//!
//! # Run a specific suite
//! cargo test -p uaclient-tests --test integration_session
//! cargo test -p uaclient-tests --test integration_publish
//! cargo test -p uaclient-tests --test integration_subscription
//! ```
//!
//! ## Test Categories
//!
//! ### Session Tests (`integration_session.rs`)
//! - Channel bring-up and session creation ordering
//! - Browse/Read request scoping
//! - Reconnect handling
//!
//! ### Publish Tests (`integration_publish.rs`)
//! - Single-flight publish invariant
//! - Acknowledgement ledger progression
//! - Keep-alive flow control and fault paths
//!
//! ### Subscription Tests (`integration_subscription.rs`)
//! - Subscription creation and publish-loop registration
//! - Monitored item bookkeeping
//! - Notification sink dispatch

pub mod common;
