//! Dashboard composition root.
//!
//! Owns the refresh channel shared by the form and the list: the form bumps it after a
//! create, the list bumps it after a delete, and the dashboard re-fetches once per change.

use std::sync::Arc;

use feedscope_core::{LoadOutcome, RefreshListener, RefreshTrigger, ToastCenter, refresh_channel};

use super::form::ProductFormView;
use super::list::ProductListView;
use crate::client::{ApiClient, ApiError};
use crate::prompt::Confirm;

pub(crate) struct Dashboard {
    list: ProductListView,
    form: ProductFormView,
    trigger: RefreshTrigger,
    listener: RefreshListener,
}

impl Dashboard {
    pub(crate) fn new(api: ApiClient, toasts: ToastCenter, confirm: Arc<dyn Confirm>) -> Self {
        let (trigger, listener) = refresh_channel();
        Self {
            list: ProductListView::new(api.clone(), toasts.clone(), trigger.clone(), confirm),
            form: ProductFormView::new(api, toasts, trigger.clone()),
            trigger,
            listener,
        }
    }

    /// Initial fetch. Pending refresh requests are folded into it.
    pub(crate) async fn mount(&mut self) -> Result<LoadOutcome, ApiError> {
        self.listener.take_change();
        self.list.load().await
    }

    /// Re-fetch if the refresh signal changed since the last fetch.
    pub(crate) async fn sync(&mut self) -> Option<Result<LoadOutcome, ApiError>> {
        let value = self.listener.take_change()?;
        tracing::debug!(refresh = value, "refreshing product list");
        Some(self.list.load().await)
    }

    /// Ask for a re-fetch on the next [`Dashboard::sync`].
    pub(crate) fn request_refresh(&self) -> u64 {
        self.trigger.bump()
    }

    pub(crate) const fn list(&self) -> &ProductListView {
        &self.list
    }

    pub(crate) const fn form(&self) -> &ProductFormView {
        &self.form
    }
}
