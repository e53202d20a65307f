// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Latest-wins result mailbox shared by the reader task and the job runner.

use parking_lot::Mutex;
use std::time::Instant;
use tokio::sync::Notify;

/// One decoded inbound chunk with its receipt time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionResult {
    pub text: String,
    pub received_at: Instant,
}

/// Single-slot mailbox: every publish overwrites, only the newest value
/// matters. Correlation to an attempt is restored by the staleness check in
/// [`take_newer_than`](ResultSlot::take_newer_than), not by queuing.
#[derive(Debug, Default)]
pub struct ResultSlot {
    value: Mutex<Option<InspectionResult>>,
    notify: Notify,
}

impl ResultSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a fresh result and wake the consumer.
    pub fn publish(&self, text: String, received_at: Instant) {
        *self.value.lock() = Some(InspectionResult { text, received_at });
        // notify_one stores a permit, so a publish between the consumer's
        // empty check and its wait is never lost
        self.notify.notify_one();
    }

    /// Consume the slot value iff it was received strictly after `since`.
    ///
    /// A stale value (received at or before `since`) is evidence for some
    /// previous attempt; it is discarded here so it can never be
    /// misattributed to the current one.
    pub fn take_newer_than(&self, since: Instant) -> Option<InspectionResult> {
        let mut slot = self.value.lock();
        match slot.take() {
            Some(result) if result.received_at > since => Some(result),
            _ => None,
        }
    }

    /// Wait until the next publish (or a stored permit from a recent one).
    pub async fn published(&self) {
        self.notify.notified().await;
    }

    /// Drop any unconsumed value without classifying it.
    pub fn clear(&self) {
        *self.value.lock() = None;
    }
}

#[cfg(test)]
#[path = "slot_tests.rs"]
mod tests;
