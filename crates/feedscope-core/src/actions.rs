//! Per-row action status tracking.
//!
//! # Design
//! - One map keyed by `(product id, action kind)` so the three kinds never drift apart.
//! - A row is busy while any of its kinds is pending; other rows are unaffected.
//! - Starting an action hands out a guard; an unsettled guard resets its entry on drop.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// Row-scoped actions exposed by the product list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Ask the backend to (re)collect feedback data.
    Scrape,
    /// Ask the backend to synthesize and email a report.
    Report,
    /// Remove the product.
    Delete,
}

impl ActionKind {
    /// Every action kind, in display order.
    pub const ALL: [Self; 3] = [Self::Scrape, Self::Report, Self::Delete];

    /// Name used in notifications.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scrape => "Ingestion",
            Self::Report => "Report Generation",
            Self::Delete => "Delete",
        }
    }

    /// Short progress label shown on a busy row.
    #[must_use]
    pub const fn progress_label(self) -> &'static str {
        match self {
            Self::Scrape | Self::Report => "Queuing...",
            Self::Delete => "Deleting...",
        }
    }

    /// Machine-friendly name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Report => "report",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend jobs a row can queue. Deletion is not a queued job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Feedback collection.
    Scrape,
    /// Report synthesis and email delivery.
    Report,
}

impl QueueKind {
    /// Row action tracked while the job is being queued.
    #[must_use]
    pub const fn action(self) -> ActionKind {
        match self {
            Self::Scrape => ActionKind::Scrape,
            Self::Report => ActionKind::Report,
        }
    }
}

impl From<QueueKind> for ActionKind {
    fn from(kind: QueueKind) -> Self {
        kind.action()
    }
}

/// Status of a single `(row, action)` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ActionStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Invoked and not yet settled.
    Pending,
    /// The last attempt failed; the row stays actionable.
    Error,
}

/// Reasons an action was refused before any work started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ActionRejected {
    /// Another action is already running on the same row.
    #[error("product {product_id} is busy with {active}")]
    RowBusy {
        /// Row that refused the action.
        product_id: i64,
        /// Action currently pending on that row.
        active: ActionKind,
    },
}

type StatusMap = HashMap<(i64, ActionKind), ActionStatus>;

/// Shared store of per-row action statuses. Clones observe the same entries.
#[derive(Clone, Debug, Default)]
pub struct ActionStore {
    inner: Arc<Mutex<StatusMap>>,
}

impl ActionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, StatusMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current status for one entry.
    #[must_use]
    pub fn status(&self, product_id: i64, kind: ActionKind) -> ActionStatus {
        self.entries()
            .get(&(product_id, kind))
            .copied()
            .unwrap_or_default()
    }

    /// Pending action on the row, if any.
    #[must_use]
    pub fn active(&self, product_id: i64) -> Option<ActionKind> {
        let entries = self.entries();
        ActionKind::ALL
            .into_iter()
            .find(|kind| entries.get(&(product_id, *kind)) == Some(&ActionStatus::Pending))
    }

    /// Whether every action button on the row is disabled.
    #[must_use]
    pub fn is_row_busy(&self, product_id: i64) -> bool {
        self.active(product_id).is_some()
    }

    /// Mark an action pending, refusing when the row already has one in flight.
    ///
    /// # Errors
    ///
    /// Returns [`ActionRejected::RowBusy`] when any action on the row is pending.
    pub fn begin(
        &self,
        product_id: i64,
        kind: ActionKind,
    ) -> Result<PendingAction, ActionRejected> {
        let mut entries = self.entries();
        if let Some(active) = ActionKind::ALL
            .into_iter()
            .find(|other| entries.get(&(product_id, *other)) == Some(&ActionStatus::Pending))
        {
            return Err(ActionRejected::RowBusy { product_id, active });
        }
        entries.insert((product_id, kind), ActionStatus::Pending);
        drop(entries);
        tracing::debug!(product_id, action = %kind, "action pending");
        Ok(PendingAction {
            store: self.clone(),
            product_id,
            kind,
            settled: false,
        })
    }

    /// Forget settled entries for rows that are no longer listed.
    pub fn retain_rows(&self, product_ids: &[i64]) {
        self.entries().retain(|(id, _), status| {
            *status == ActionStatus::Pending || product_ids.contains(id)
        });
    }

    fn settle(&self, product_id: i64, kind: ActionKind, status: ActionStatus) {
        let mut entries = self.entries();
        if status == ActionStatus::Idle {
            entries.remove(&(product_id, kind));
        } else {
            entries.insert((product_id, kind), status);
        }
    }
}

/// Guard for an in-flight action. Settle it explicitly; dropping it unsettled resets the entry.
#[derive(Debug)]
#[must_use = "dropping the guard immediately resets the action to idle"]
pub struct PendingAction {
    store: ActionStore,
    product_id: i64,
    kind: ActionKind,
    settled: bool,
}

impl PendingAction {
    /// Row this action belongs to.
    #[must_use]
    pub const fn product_id(&self) -> i64 {
        self.product_id
    }

    /// Kind of action in flight.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Settle as successful; the entry returns to idle.
    pub fn succeed(mut self) {
        self.finish(ActionStatus::Idle);
    }

    /// Settle as failed; the entry records the error and the row is re-enabled.
    pub fn fail(mut self) {
        self.finish(ActionStatus::Error);
    }

    fn finish(&mut self, status: ActionStatus) {
        self.settled = true;
        self.store.settle(self.product_id, self.kind, status);
        tracing::debug!(
            product_id = self.product_id,
            action = %self.kind,
            ?status,
            "action settled"
        );
    }
}

impl Drop for PendingAction {
    fn drop(&mut self) {
        if !self.settled {
            self.store.settle(self.product_id, self.kind, ActionStatus::Idle);
        }
    }
}

/// Loading notification for a queued job.
#[must_use]
pub fn queue_loading_message(kind: QueueKind) -> String {
    format!("Sending {} request...", kind.action().label())
}

/// Success notification for a queued job, preferring the backend's wording.
#[must_use]
pub fn queue_success_message(kind: QueueKind, backend_message: &str) -> String {
    let mut message = if backend_message.trim().is_empty() {
        format!("{} task queued!", kind.action().label())
    } else {
        backend_message.trim().to_string()
    };
    match kind {
        QueueKind::Scrape => message.push_str(" Scraping may take several minutes."),
        QueueKind::Report => message.push_str(" Check your email in a few minutes."),
    }
    message
}

/// Failure notification for a queued job.
#[must_use]
pub fn queue_failure_message(error: &str) -> String {
    format!("Error: {error}")
}

/// Loading notification for a delete.
#[must_use]
pub fn delete_loading_message(name: &str) -> String {
    format!("Deleting \"{name}\"...")
}

/// Success notification for a delete.
#[must_use]
pub fn delete_success_message(name: &str) -> String {
    format!("Product \"{name}\" deleted successfully!")
}

/// Failure notification for a delete.
#[must_use]
pub fn delete_failure_message(error: &str) -> String {
    format!("Error deleting product: {error}")
}

/// Confirmation prompt shown before a delete.
#[must_use]
pub fn delete_confirmation_prompt(name: &str) -> String {
    format!("Are you sure you want to delete \"{name}\"? This action cannot be undone.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_flag_is_scoped_to_invocation() {
        let store = ActionStore::new();
        assert_eq!(store.status(1, ActionKind::Scrape), ActionStatus::Idle);

        let pending = store.begin(1, ActionKind::Scrape).expect("row idle");
        assert_eq!(store.status(1, ActionKind::Scrape), ActionStatus::Pending);
        assert!(store.is_row_busy(1));

        pending.succeed();
        assert_eq!(store.status(1, ActionKind::Scrape), ActionStatus::Idle);
        assert!(!store.is_row_busy(1));
    }

    #[test]
    fn busy_row_refuses_every_kind() {
        let store = ActionStore::new();
        let _report = store.begin(4, ActionKind::Report).expect("row idle");
        for kind in ActionKind::ALL {
            assert_eq!(
                store.begin(4, kind).expect_err("row busy"),
                ActionRejected::RowBusy {
                    product_id: 4,
                    active: ActionKind::Report
                }
            );
        }
        assert_eq!(store.status(4, ActionKind::Scrape), ActionStatus::Idle);
    }

    #[test]
    fn rows_do_not_interfere() {
        let store = ActionStore::new();
        let a = store.begin(1, ActionKind::Delete).expect("row 1 idle");
        let b = store.begin(2, ActionKind::Scrape).expect("row 2 idle");
        assert_eq!(store.active(1), Some(ActionKind::Delete));
        assert_eq!(store.active(2), Some(ActionKind::Scrape));
        assert_eq!(store.active(3), None);

        b.fail();
        assert_eq!(store.status(2, ActionKind::Scrape), ActionStatus::Error);
        assert!(!store.is_row_busy(2));
        assert!(store.is_row_busy(1));
        a.succeed();
        assert!(!store.is_row_busy(1));
    }

    #[test]
    fn failed_row_can_retry() {
        let store = ActionStore::new();
        store.begin(9, ActionKind::Report).expect("idle").fail();
        let retry = store.begin(9, ActionKind::Report).expect("error is not busy");
        assert_eq!(store.status(9, ActionKind::Report), ActionStatus::Pending);
        retry.succeed();
        assert_eq!(store.status(9, ActionKind::Report), ActionStatus::Idle);
    }

    #[test]
    fn dropped_guard_resets_entry() {
        let store = ActionStore::new();
        {
            let _pending = store.begin(5, ActionKind::Delete).expect("idle");
            assert!(store.is_row_busy(5));
        }
        assert_eq!(store.status(5, ActionKind::Delete), ActionStatus::Idle);
        assert!(!store.is_row_busy(5));
    }

    #[test]
    fn retain_rows_keeps_pending_entries() {
        let store = ActionStore::new();
        store.begin(1, ActionKind::Scrape).expect("idle").fail();
        let pending = store.begin(2, ActionKind::Report).expect("idle");
        store.retain_rows(&[3]);
        assert_eq!(store.status(1, ActionKind::Scrape), ActionStatus::Idle);
        assert_eq!(store.status(2, ActionKind::Report), ActionStatus::Pending);
        pending.succeed();
    }

    #[test]
    fn queue_messages_append_follow_up_hint() {
        assert_eq!(
            queue_success_message(QueueKind::Scrape, ""),
            "Ingestion task queued! Scraping may take several minutes."
        );
        assert_eq!(
            queue_success_message(QueueKind::Report, "Report generation has started."),
            "Report generation has started. Check your email in a few minutes."
        );
        assert_eq!(
            queue_loading_message(QueueKind::Report),
            "Sending Report Generation request..."
        );
        assert_eq!(queue_failure_message("boom"), "Error: boom");
    }

    #[test]
    fn queue_kinds_map_to_row_actions() {
        assert_eq!(QueueKind::Scrape.action(), ActionKind::Scrape);
        assert_eq!(ActionKind::from(QueueKind::Report), ActionKind::Report);
    }

    #[test]
    fn delete_messages_name_the_product() {
        assert!(delete_success_message("X").contains("\"X\""));
        assert!(delete_confirmation_prompt("X").contains("cannot be undone"));
        assert_eq!(
            delete_failure_message("gone"),
            "Error deleting product: gone"
        );
    }
}
