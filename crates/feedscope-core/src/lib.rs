#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Dashboard state shared by every front end of the feedback-insights client.
//!
//! Layout:
//! - `actions.rs`: per-row action status store and notification texts
//! - `list.rs`: product list load phases and the render guard
//! - `form.rs`: product creation form fields and payload shaping
//! - `toast.rs`: keyed notification center
//! - `refresh.rs`: refresh trigger channel between the dashboard and its views
//!
//! Nothing here performs I/O; controllers own the HTTP calls and feed results back in.

pub mod actions;
pub mod form;
pub mod list;
pub mod refresh;
pub mod toast;

pub use actions::{
    ActionKind, ActionRejected, ActionStatus, ActionStore, PendingAction, QueueKind,
};
pub use form::{FormError, FormField, ProductForm};
pub use list::{ListPhase, ListView, LoadOutcome, LoadTicket, ProductListState};
pub use refresh::{RefreshListener, RefreshTrigger, refresh_channel};
pub use toast::{Toast, ToastCenter, ToastId, ToastKind};
