//! Version counter with broadcast wake-up, the building block of long polls.
//!
//! Every observable mutation calls [`ChangeSignal::bump`] once, after the
//! mutation is complete. Observers hold the last version they saw and call
//! [`ChangeSignal::await_change`], which returns at once when that version is
//! stale and otherwise parks the task until the next bump or the timeout.

use std::time::Duration;

use tokio::sync::watch;

/// Result of a long-poll wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observed {
    /// Version current when the wait ended.
    pub version: u64,
    /// `true` when the timeout elapsed without a bump.
    pub timed_out: bool,
}

#[derive(Debug)]
pub struct ChangeSignal {
    tx: watch::Sender<u64>,
}

impl ChangeSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Current version. Never blocks.
    pub fn version(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Increment the version and wake every waiter. Returns the new version.
    pub fn bump(&self) -> u64 {
        let mut next = 0;
        self.tx.send_modify(|v| {
            *v += 1;
            next = *v;
        });
        next
    }

    /// Wait for a version newer than `known`.
    ///
    /// `None` or a stale `known` returns immediately. Dropping the returned
    /// future abandons the wait without touching the version.
    pub async fn await_change(&self, known: Option<u64>, timeout: Duration) -> Observed {
        // Subscribe before comparing so a bump in between is not lost.
        let mut rx = self.tx.subscribe();
        let current = *rx.borrow_and_update();
        if known != Some(current) {
            return Observed {
                version: current,
                timed_out: false,
            };
        }
        let timed_out = tokio::time::timeout(timeout, rx.changed()).await.is_err();
        let version = *rx.borrow();
        Observed { version, timed_out }
    }
}

impl Default for ChangeSignal {
    fn default() -> Self {
        Self::new()
    }
}
