// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Process-wide transport initialization.
//!
//! Some transport stacks require one-time process setup before the first
//! secure channel and teardown after the last. [`Platform`] models that as
//! a reference-counted guard: acquire one before constructing channels and
//! keep it alive until all channels are gone.

use std::sync::atomic::{AtomicUsize, Ordering};

static PLATFORM_REFS: AtomicUsize = AtomicUsize::new(0);

// =============================================================================
// Platform
// =============================================================================

/// RAII guard for process-wide transport state.
///
/// Guards are cheap and reference counted; the first acquisition
/// initializes, the last drop releases.
///
/// # Examples
///
/// ```
/// use uaclient::Platform;
///
/// let platform = Platform::acquire();
/// // construct channels and sessions here
/// drop(platform);
/// ```
#[derive(Debug)]
pub struct Platform(());

impl Platform {
    /// Acquires a reference to the process-wide platform state.
    pub fn acquire() -> Self {
        if PLATFORM_REFS.fetch_add(1, Ordering::SeqCst) == 0 {
            tracing::debug!("Platform initialized");
        }
        Self(())
    }

    /// Returns the number of live guards.
    pub fn reference_count() -> usize {
        PLATFORM_REFS.load(Ordering::SeqCst)
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        if PLATFORM_REFS.fetch_sub(1, Ordering::SeqCst) == 1 {
            tracing::debug!("Platform released");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_counting() {
        let before = Platform::reference_count();
        let a = Platform::acquire();
        let b = Platform::acquire();
        assert_eq!(Platform::reference_count(), before + 2);

        drop(a);
        assert_eq!(Platform::reference_count(), before + 1);
        drop(b);
        assert_eq!(Platform::reference_count(), before);
    }
}
