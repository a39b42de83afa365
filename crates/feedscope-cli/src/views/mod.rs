//! Controllers that bind the core state types to the REST client.

pub(crate) mod dashboard;
pub(crate) mod form;
pub(crate) mod list;

pub(crate) use dashboard::Dashboard;
pub(crate) use form::{ProductFormView, SubmitOutcome};
pub(crate) use list::{ActionOutcome, ListSnapshot, ProductListView, RowSnapshot};
