//! Keyed notification center.
//!
//! A loading toast is replaced in place by its terminal toast, so one action instance never
//! shows more than one notification. Clones share the same toasts.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifier of a visible toast.
pub type ToastId = u64;

/// Toast severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    /// Operation in progress.
    Loading,
    /// Terminal success.
    Success,
    /// Terminal failure.
    Error,
}

impl ToastKind {
    /// Whether this toast ends its action.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// Toast payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    /// Monotonic toast identifier.
    pub id: ToastId,
    /// Display message.
    pub message: String,
    /// Severity classification.
    pub kind: ToastKind,
}

type Observer = Arc<dyn Fn(&Toast) + Send + Sync>;

#[derive(Default)]
struct Inner {
    next_id: ToastId,
    visible: Vec<Toast>,
    observer: Option<Observer>,
}

/// Shared notification center.
#[derive(Clone, Default)]
pub struct ToastCenter {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for ToastCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastCenter")
            .field("visible", &self.visible())
            .finish_non_exhaustive()
    }
}

impl ToastCenter {
    /// Empty center without an observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty center that reports every posted or replaced toast to `observer`.
    #[must_use]
    pub fn with_observer(observer: impl Fn(&Toast) + Send + Sync + 'static) -> Self {
        let center = Self::default();
        center.lock().observer = Some(Arc::new(observer));
        center
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn post(&self, kind: ToastKind, message: String) -> ToastId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let toast = Toast {
            id: inner.next_id,
            message,
            kind,
        };
        inner.visible.push(toast.clone());
        let observer = inner.observer.clone();
        drop(inner);
        if let Some(observer) = observer {
            observer(&toast);
        }
        toast.id
    }

    /// Show an in-progress toast; settle it later with [`Self::resolve`].
    pub fn loading(&self, message: impl Into<String>) -> ToastId {
        self.post(ToastKind::Loading, message.into())
    }

    /// Show a standalone success toast.
    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.post(ToastKind::Success, message.into())
    }

    /// Show a standalone error toast.
    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.post(ToastKind::Error, message.into())
    }

    /// Replace a toast in place. Posts a new toast when `id` is no longer visible.
    pub fn resolve(&self, id: ToastId, kind: ToastKind, message: impl Into<String>) -> ToastId {
        let message = message.into();
        let mut inner = self.lock();
        let position = inner.visible.iter().position(|toast| toast.id == id);
        let Some(position) = position else {
            drop(inner);
            return self.post(kind, message);
        };
        let slot = &mut inner.visible[position];
        slot.kind = kind;
        slot.message = message;
        let toast = slot.clone();
        let observer = inner.observer.clone();
        drop(inner);
        if let Some(observer) = observer {
            observer(&toast);
        }
        id
    }

    /// Remove a toast.
    pub fn dismiss(&self, id: ToastId) {
        self.lock().visible.retain(|toast| toast.id != id);
    }

    /// Remove and return every terminal toast, oldest first.
    pub fn drain_settled(&self) -> Vec<Toast> {
        let mut inner = self.lock();
        let (settled, pending): (Vec<_>, Vec<_>) = inner
            .visible
            .drain(..)
            .partition(|toast| toast.kind.is_terminal());
        inner.visible = pending;
        settled
    }

    /// Currently visible toasts, oldest first.
    #[must_use]
    pub fn visible(&self) -> Vec<Toast> {
        self.lock().visible.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn loading_toast_is_replaced_not_stacked() {
        let toasts = ToastCenter::new();
        let id = toasts.loading("Sending Ingestion request...");
        assert_eq!(toasts.visible().len(), 1);

        let resolved = toasts.resolve(id, ToastKind::Success, "queued");
        assert_eq!(resolved, id);
        let visible = toasts.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].kind, ToastKind::Success);
        assert_eq!(visible[0].message, "queued");
    }

    #[test]
    fn resolving_dismissed_toast_posts_new_one() {
        let toasts = ToastCenter::new();
        let id = toasts.loading("working");
        toasts.dismiss(id);
        let replacement = toasts.resolve(id, ToastKind::Error, "failed");
        assert_ne!(replacement, id);
        assert_eq!(toasts.visible().len(), 1);
    }

    #[test]
    fn drain_settled_keeps_loading_toasts() {
        let toasts = ToastCenter::new();
        toasts.success("done");
        let pending = toasts.loading("still going");
        toasts.error("broken");

        let drained = toasts.drain_settled();
        assert_eq!(
            drained.iter().map(|t| t.message.as_str()).collect::<Vec<_>>(),
            vec!["done", "broken"]
        );
        assert_eq!(toasts.visible().len(), 1);
        assert_eq!(toasts.visible()[0].id, pending);
    }

    #[test]
    fn observer_sees_posts_and_replacements() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let toasts = ToastCenter::with_observer(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let id = toasts.loading("a");
        toasts.resolve(id, ToastKind::Success, "b");
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
