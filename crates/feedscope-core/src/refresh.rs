//! Refresh trigger shared by the dashboard and its views.
//!
//! The dashboard owns the counter. Children hold a [`RefreshTrigger`] and bump it when their
//! work changed the backend's product set; the list view holds the [`RefreshListener`] and
//! re-fetches whenever the value moves.

use std::sync::Arc;

use tokio::sync::watch;

/// Create a trigger starting at zero and its listener.
#[must_use]
pub fn refresh_channel() -> (RefreshTrigger, RefreshListener) {
    let (tx, rx) = watch::channel(0_u64);
    (
        RefreshTrigger { tx: Arc::new(tx) },
        RefreshListener { rx },
    )
}

/// Write side of the refresh counter. Clones bump the same counter.
#[derive(Clone, Debug)]
pub struct RefreshTrigger {
    tx: Arc<watch::Sender<u64>>,
}

impl RefreshTrigger {
    /// Increment the counter and return the new value.
    pub fn bump(&self) -> u64 {
        let mut next = 0;
        self.tx.send_modify(|value| {
            *value += 1;
            next = *value;
        });
        tracing::debug!(refresh = next, "refresh requested");
        next
    }

    /// Current counter value.
    #[must_use]
    pub fn value(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Additional listener observing the same counter.
    #[must_use]
    pub fn subscribe(&self) -> RefreshListener {
        RefreshListener {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the refresh counter.
#[derive(Debug)]
pub struct RefreshListener {
    rx: watch::Receiver<u64>,
}

impl RefreshListener {
    /// Return the latest value if it changed since the last observation.
    pub fn take_change(&mut self) -> Option<u64> {
        match self.rx.has_changed() {
            Ok(true) => Some(*self.rx.borrow_and_update()),
            Ok(false) | Err(_) => None,
        }
    }

    /// Wait for the next change. Returns `None` once every trigger is gone.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Current counter value without marking it seen.
    #[must_use]
    pub fn current(&self) -> u64 {
        *self.rx.borrow()
    }
}
