// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Observer signals.
//!
//! A [`Signal`] is a registration list of observers keyed by a connection
//! token. [`connect`](Signal::connect) returns a [`SignalConnection`] that
//! removes the observer when dropped. Delivery is synchronous on the thread
//! that emits; observers must not block. Observers may connect or
//! disconnect freely, including from inside an emission.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SignalInner<T> {
    next_token: AtomicU64,
    observers: Mutex<Vec<(u64, Observer<T>)>>,
}

// =============================================================================
// Signal
// =============================================================================

/// A multi-observer notification signal.
///
/// # Examples
///
/// ```
/// use uaclient::signal::Signal;
///
/// let signal: Signal<u32> = Signal::new();
/// let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let connection = signal.connect(move |v| sink.lock().unwrap().push(*v));
///
/// signal.emit(&7);
/// drop(connection);
/// signal.emit(&8);
///
/// assert_eq!(*seen.lock().unwrap(), vec![7]);
/// ```
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T: 'static> Signal<T> {
    /// Creates an empty signal.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                next_token: AtomicU64::new(1),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Registers an observer and returns its connection.
    ///
    /// The observer stays registered until the returned connection is
    /// dropped or [`SignalConnection::disconnect`] is called.
    pub fn connect(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> SignalConnection {
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        self.inner
            .observers
            .lock()
            .expect("signal observer list poisoned")
            .push((token, Arc::new(observer)));

        let inner = Arc::downgrade(&self.inner);
        SignalConnection {
            disconnect: Some(Box::new(move || {
                if let Some(inner) = Weak::upgrade(&inner) {
                    inner
                        .observers
                        .lock()
                        .expect("signal observer list poisoned")
                        .retain(|(t, _)| *t != token);
                }
            })),
        }
    }

    /// Delivers `value` to every registered observer.
    ///
    /// Observers are invoked outside the registration lock, so an observer
    /// may connect or disconnect (including itself) without deadlocking.
    pub fn emit(&self, value: &T) {
        let observers: Vec<Observer<T>> = {
            let guard = self
                .inner
                .observers
                .lock()
                .expect("signal observer list poisoned");
            guard.iter().map(|(_, o)| Arc::clone(o)).collect()
        };

        for observer in observers {
            observer(value);
        }
    }

    /// Returns the number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .lock()
            .expect("signal observer list poisoned")
            .len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("observers", &self.observer_count())
            .finish()
    }
}

// =============================================================================
// SignalConnection
// =============================================================================

/// Scoped registration of a signal observer.
///
/// Dropping the connection removes the observer from the signal.
pub struct SignalConnection {
    disconnect: Option<Box<dyn FnOnce() + Send>>,
}

impl SignalConnection {
    /// Removes the observer now instead of at drop time.
    pub fn disconnect(mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for SignalConnection {
    fn drop(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl std::fmt::Debug for SignalConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalConnection")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
