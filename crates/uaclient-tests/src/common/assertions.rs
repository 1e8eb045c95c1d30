// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Assertion Helpers
//!
//! Custom assertions over recorded transport traffic.

use uaclient::{StatusCode, SubscriptionAcknowledgement, SubscriptionId};

/// Asserts that an ack list contains exactly the given `(id, sequence)`
/// pairs, in order.
pub fn assert_acks(
    actual: &[SubscriptionAcknowledgement],
    expected: &[(u32, u32)],
) {
    let actual_pairs: Vec<(u32, u32)> = actual
        .iter()
        .map(|ack| (ack.subscription_id.value(), ack.sequence_number))
        .collect();
    assert_eq!(
        actual_pairs, expected,
        "acknowledgement list mismatch: {actual:?}"
    );
}

/// Asserts that every `(id, sequence)` pair appears exactly once across
/// the whole publish history.
pub fn assert_each_ack_sent_once(history: &[Vec<SubscriptionAcknowledgement>]) {
    let mut seen: Vec<(SubscriptionId, u32)> = Vec::new();
    for acks in history {
        for ack in acks {
            let pair = (ack.subscription_id, ack.sequence_number);
            assert!(
                !seen.contains(&pair),
                "acknowledgement {pair:?} sent more than once"
            );
            seen.push(pair);
        }
    }
}

/// Asserts that a recorded status sequence equals the expectation.
pub fn assert_statuses(actual: &[StatusCode], expected: &[StatusCode]) {
    assert_eq!(actual, expected, "status sequence mismatch");
}
