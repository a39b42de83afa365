//! Product creation controller.

use std::sync::{Mutex, MutexGuard, PoisonError};

use feedscope_api_models::Product;
use feedscope_core::form::{CREATE_LOADING_MESSAGE, CREATE_SUCCESS_MESSAGE, create_failure_message};
use feedscope_core::{
    FormError, FormField, ProductForm, RefreshTrigger, ToastCenter, ToastId, ToastKind,
};

use crate::client::{ApiClient, ApiError};

/// Result of a form submission.
#[derive(Debug)]
pub(crate) enum SubmitOutcome {
    /// The backend created the product; the form was cleared.
    Created(Product),
    /// Refused locally; nothing was sent.
    Rejected(FormError),
    /// The backend refused or the call failed; fields are kept.
    Failed(ApiError),
}

pub(crate) struct ProductFormView {
    api: ApiClient,
    form: Mutex<ProductForm>,
    toasts: ToastCenter,
    on_product_added: RefreshTrigger,
}

impl ProductFormView {
    pub(crate) fn new(
        api: ApiClient,
        toasts: ToastCenter,
        on_product_added: RefreshTrigger,
    ) -> Self {
        Self {
            api,
            form: Mutex::new(ProductForm::new()),
            toasts,
            on_product_added,
        }
    }

    fn form(&self) -> MutexGuard<'_, ProductForm> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set(&self, field: FormField, value: impl Into<String>) {
        self.form().set(field, value);
    }

    /// Copy of the current form state.
    pub(crate) fn snapshot(&self) -> ProductForm {
        self.form().clone()
    }

    /// Validate, send, and settle the form. Success requests one list refresh.
    pub(crate) async fn submit(&self) -> SubmitOutcome {
        let payload = match self.form().begin_submit() {
            Ok(payload) => payload,
            Err(err) => return SubmitOutcome::Rejected(err),
        };
        let toast = self.toasts.loading(CREATE_LOADING_MESSAGE);
        let submission = Submission {
            view: self,
            toast,
            settled: false,
        };

        let result = self.api.create_product(&payload).await;
        submission.settle();
        match result {
            Ok(product) => {
                self.form().finish_success();
                self.toasts
                    .resolve(toast, ToastKind::Success, CREATE_SUCCESS_MESSAGE);
                tracing::info!(product_id = product.id, "product created");
                self.on_product_added.bump();
                SubmitOutcome::Created(product)
            }
            Err(err) => {
                let message = err.to_string();
                self.form().finish_failure(message.clone());
                self.toasts
                    .resolve(toast, ToastKind::Error, create_failure_message(&message));
                tracing::warn!(error = %err, "product creation failed");
                SubmitOutcome::Failed(err)
            }
        }
    }
}

/// In-flight submission. Dropped before it settles, it leaves the submitting state and
/// withdraws its loading notification.
struct Submission<'a> {
    view: &'a ProductFormView,
    toast: ToastId,
    settled: bool,
}

impl Submission<'_> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.view.form().abandon_submit();
            self.view.toasts.dismiss(self.toast);
            tracing::debug!("product creation abandoned");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::{client_for, product_json};
    use std::time::Duration;

    use feedscope_core::refresh_channel;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    fn fill(view: &ProductFormView) {
        view.set(FormField::Name, "Widget");
        view.set(FormField::YoutubeKeywords, " a, b ,,c");
        view.set(FormField::RedditSubreddits, "r1, r2");
    }

    #[tokio::test]
    async fn successful_submit_clears_form_and_requests_refresh() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST).path("/products").json_body(json!({
                "name": "Widget",
                "config": {
                    "search_query": null,
                    "youtube_keywords": ["a", "b", "c"],
                    "reddit_subreddits": ["r1", "r2"]
                }
            }));
            then.status(201).json_body(product_json(11, "Widget"));
        });
        let toasts = ToastCenter::new();
        let (trigger, mut listener) = refresh_channel();
        let view = ProductFormView::new(client_for(&server), toasts.clone(), trigger);
        fill(&view);

        let SubmitOutcome::Created(product) = view.submit().await else {
            panic!("submit should succeed");
        };
        create.assert();
        assert_eq!(product.id, 11);
        assert_eq!(view.snapshot(), ProductForm::new());
        assert_eq!(listener.take_change(), Some(1));
        let toast = toasts.visible().pop().expect("toast");
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.message, "Product added successfully!");
    }

    #[tokio::test]
    async fn blank_name_is_rejected_without_a_request() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST).path("/products");
            then.status(201).json_body(product_json(1, "x"));
        });
        let toasts = ToastCenter::new();
        let (trigger, mut listener) = refresh_channel();
        let view = ProductFormView::new(client_for(&server), toasts.clone(), trigger);
        fill(&view);
        view.set(FormField::Name, "   ");

        let outcome = view.submit().await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(FormError::MissingField(FormField::Name))
        ));
        create.assert_calls(0);
        assert!(toasts.visible().is_empty());
        assert_eq!(listener.take_change(), None);
    }

    #[tokio::test]
    async fn abandoned_submit_does_not_block_the_next_one() {
        let server = MockServer::start_async().await;
        let mut slow = server.mock(|when, then| {
            when.method(POST).path("/products");
            then.status(201)
                .delay(Duration::from_millis(500))
                .json_body(product_json(11, "Widget"));
        });
        let toasts = ToastCenter::new();
        let (trigger, _listener) = refresh_channel();
        let view = ProductFormView::new(client_for(&server), toasts.clone(), trigger);
        fill(&view);

        let timed_out = tokio::time::timeout(Duration::from_millis(50), view.submit()).await;
        assert!(timed_out.is_err());
        let form = view.snapshot();
        assert!(!form.is_submitting());
        assert_eq!(form.get(FormField::Name), "Widget");
        assert!(toasts.visible().is_empty());

        slow.delete();
        server.mock(|when, then| {
            when.method(POST).path("/products");
            then.status(201).json_body(product_json(11, "Widget"));
        });
        assert!(matches!(view.submit().await, SubmitOutcome::Created(_)));
    }

    #[tokio::test]
    async fn failure_keeps_fields_and_shows_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/products");
            then.status(400)
                .json_body(json!({"detail": "Product already exists"}));
        });
        let toasts = ToastCenter::new();
        let (trigger, mut listener) = refresh_channel();
        let view = ProductFormView::new(client_for(&server), toasts.clone(), trigger);
        fill(&view);

        assert!(matches!(view.submit().await, SubmitOutcome::Failed(_)));
        let form = view.snapshot();
        assert_eq!(form.get(FormField::Name), "Widget");
        assert_eq!(form.error(), Some("Product already exists"));
        assert!(!form.is_submitting());
        assert_eq!(listener.take_change(), None);
        let toast = toasts.visible().pop().expect("toast");
        assert_eq!(toast.message, "Error: Product already exists");
    }
}
