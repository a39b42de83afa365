//! Product list controller.
//!
//! Drives [`ProductListState`] and [`ActionStore`] with the REST client. Every handler catches
//! at its own boundary: failures become a toast (and, for loads, list state) rather than
//! propagating past the view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use feedscope_api_models::{Product, TaskQueueResult};
use feedscope_core::actions::{
    delete_confirmation_prompt, delete_failure_message, delete_loading_message,
    delete_success_message, queue_failure_message, queue_loading_message, queue_success_message,
};
use feedscope_core::list::load_failure_toast;
use feedscope_core::{
    ActionKind, ActionRejected, ActionStore, ListView, LoadOutcome, ProductListState, QueueKind,
    RefreshTrigger, ToastCenter, ToastKind,
};

use crate::client::{ApiClient, ApiError};
use crate::prompt::Confirm;

const LOADING_PRODUCTS: &str = "Loading products...";

/// Result of a row action.
#[derive(Debug)]
pub(crate) enum ActionOutcome {
    /// The backend accepted the action; carries the success notification text.
    Completed(String),
    /// The call failed; the row is actionable again.
    Failed(ApiError),
    /// The user declined the confirmation prompt.
    Cancelled,
    /// Another action is still running on the row.
    Rejected(ActionRejected),
}

/// Owned copy of what the list currently renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ListSnapshot {
    Loading,
    Error(String),
    Empty,
    Rows(Vec<RowSnapshot>),
}

/// One rendered row with its in-flight action, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RowSnapshot {
    pub(crate) product: Product,
    pub(crate) active: Option<ActionKind>,
}

pub(crate) struct ProductListView {
    api: ApiClient,
    state: Arc<Mutex<ProductListState>>,
    actions: ActionStore,
    toasts: ToastCenter,
    on_refresh_needed: RefreshTrigger,
    confirm: Arc<dyn Confirm>,
}

impl ProductListView {
    pub(crate) fn new(
        api: ApiClient,
        toasts: ToastCenter,
        on_refresh_needed: RefreshTrigger,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(ProductListState::new())),
            actions: ActionStore::new(),
            toasts,
            on_refresh_needed,
            confirm,
        }
    }

    fn state(&self) -> MutexGuard<'_, ProductListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the full list. Prior rows are replaced only on success.
    pub(crate) async fn load(&self) -> Result<LoadOutcome, ApiError> {
        let ticket = self.state().begin_load();
        let toast = self.toasts.loading(LOADING_PRODUCTS);
        tracing::debug!(ticket = ticket.sequence(), "loading products");

        match self.api.list_products().await {
            Ok(products) => {
                let ids = products.iter().map(|product| product.id).collect::<Vec<_>>();
                let outcome = self.state().finish_load(ticket, Ok(products));
                if let LoadOutcome::Applied(count) = outcome {
                    self.actions.retain_rows(&ids);
                    self.toasts
                        .resolve(toast, ToastKind::Success, loaded_message(count));
                    tracing::info!(count, "products loaded");
                } else {
                    self.toasts.dismiss(toast);
                }
                Ok(outcome)
            }
            Err(err) => {
                let outcome = self.state().finish_load(ticket, Err(err.to_string()));
                if outcome == LoadOutcome::Stale {
                    self.toasts.dismiss(toast);
                    return Ok(outcome);
                }
                self.toasts.resolve(
                    toast,
                    ToastKind::Error,
                    load_failure_toast(&err.to_string()),
                );
                tracing::warn!(error = %err, "failed to load products");
                Err(err)
            }
        }
    }

    /// Ask the backend to collect feedback for a product.
    pub(crate) async fn scrape(&self, product_id: i64) -> ActionOutcome {
        self.queue_job(product_id, QueueKind::Scrape).await
    }

    /// Ask the backend to generate and email a report for a product.
    pub(crate) async fn report(&self, product_id: i64) -> ActionOutcome {
        self.queue_job(product_id, QueueKind::Report).await
    }

    /// Queue a backend job for a product, tracking it as a row action.
    pub(crate) async fn queue_job(&self, product_id: i64, kind: QueueKind) -> ActionOutcome {
        let action = kind.action();
        let pending = match self.actions.begin(product_id, action) {
            Ok(pending) => pending,
            Err(rejected) => return ActionOutcome::Rejected(rejected),
        };
        let toast = self.toasts.loading(queue_loading_message(kind));

        let result = match kind {
            QueueKind::Scrape => self.api.trigger_ingestion(product_id).await,
            QueueKind::Report => self.api.trigger_email_report(product_id).await,
        }
        .and_then(accepted);

        match result {
            Ok(ack) => {
                let message = queue_success_message(kind, &ack.message);
                pending.succeed();
                self.toasts.resolve(toast, ToastKind::Success, message.clone());
                tracing::info!(product_id, %action, "job queued");
                ActionOutcome::Completed(message)
            }
            Err(err) => {
                pending.fail();
                self.toasts.resolve(
                    toast,
                    ToastKind::Error,
                    queue_failure_message(&err.to_string()),
                );
                tracing::warn!(product_id, %action, error = %err, "job not queued");
                ActionOutcome::Failed(err)
            }
        }
    }

    /// Delete a product after confirmation. Success requests one list refresh.
    pub(crate) async fn delete(&self, product_id: i64) -> ActionOutcome {
        if let Some(active) = self.actions.active(product_id) {
            return ActionOutcome::Rejected(ActionRejected::RowBusy { product_id, active });
        }
        let name = self
            .state()
            .product(product_id)
            .map_or_else(|| format!("product {product_id}"), |product| product.name.clone());

        if !self
            .confirm
            .confirm(&delete_confirmation_prompt(&name))
            .await
        {
            tracing::debug!(product_id, "delete cancelled");
            return ActionOutcome::Cancelled;
        }

        let pending = match self.actions.begin(product_id, ActionKind::Delete) {
            Ok(pending) => pending,
            Err(rejected) => return ActionOutcome::Rejected(rejected),
        };
        let toast = self.toasts.loading(delete_loading_message(&name));

        match self.api.delete_product(product_id).await {
            Ok(ack) => {
                let message = delete_success_message(&name);
                pending.succeed();
                self.toasts.resolve(toast, ToastKind::Success, message.clone());
                tracing::info!(product_id, backend_message = %ack.message, "product deleted");
                self.on_refresh_needed.bump();
                ActionOutcome::Completed(message)
            }
            Err(err) => {
                pending.fail();
                self.toasts.resolve(
                    toast,
                    ToastKind::Error,
                    delete_failure_message(&err.to_string()),
                );
                tracing::warn!(product_id, error = %err, "delete failed");
                ActionOutcome::Failed(err)
            }
        }
    }

    /// What the list renders right now.
    pub(crate) fn snapshot(&self) -> ListSnapshot {
        let state = self.state();
        match state.view() {
            ListView::Loading => ListSnapshot::Loading,
            ListView::Error(message) => ListSnapshot::Error(message),
            ListView::Empty => ListSnapshot::Empty,
            ListView::Rows(products) => ListSnapshot::Rows(
                products
                    .iter()
                    .map(|product| RowSnapshot {
                        product: product.clone(),
                        active: self.actions.active(product.id),
                    })
                    .collect(),
            ),
        }
    }

    #[cfg(test)]
    pub(crate) const fn actions(&self) -> &ActionStore {
        &self.actions
    }
}

fn accepted(ack: TaskQueueResult) -> Result<TaskQueueResult, ApiError> {
    match ack.rejection() {
        Some(message) => Err(ApiError::Rejected(message.to_string())),
        None => Ok(ack),
    }
}

fn loaded_message(count: usize) -> String {
    match count {
        1 => "Loaded 1 product".to_string(),
        n => format!("Loaded {n} products"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::test_support::{client_for, client_with_token, product_json};
    use crate::prompt::AssumeYes;
    use async_trait::async_trait;
    use feedscope_core::{ActionStatus, ListPhase, refresh_channel};
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    struct Decline;

    #[async_trait]
    impl Confirm for Decline {
        async fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    fn view_with(api: ApiClient, confirm: Arc<dyn Confirm>) -> (ProductListView, ToastCenter) {
        let toasts = ToastCenter::new();
        let (trigger, _listener) = refresh_channel();
        (
            ProductListView::new(api, toasts.clone(), trigger, confirm),
            toasts,
        )
    }

    fn last_toast(toasts: &ToastCenter) -> (ToastKind, String) {
        let toast = toasts.visible().pop().expect("a toast is visible");
        (toast.kind, toast.message)
    }

    #[tokio::test]
    async fn load_populates_rows() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200)
                .json_body(json!([product_json(1, "Widget"), product_json(2, "Gadget")]));
        });
        let (view, toasts) = view_with(client_for(&server), Arc::new(AssumeYes));

        assert_eq!(view.snapshot(), ListSnapshot::Loading);
        let outcome = view.load().await.expect("load ok");
        assert_eq!(outcome, LoadOutcome::Applied(2));

        let ListSnapshot::Rows(rows) = view.snapshot() else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.active.is_none()));
        assert_eq!(toasts.visible().len(), 1);
        assert_eq!(
            last_toast(&toasts),
            (ToastKind::Success, "Loaded 2 products".to_string())
        );
    }

    #[tokio::test]
    async fn failed_first_load_renders_error_view() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(401).json_body(json!({"detail": "Not authenticated"}));
        });
        let (view, toasts) = view_with(client_for(&server), Arc::new(AssumeYes));

        let err = view.load().await.expect_err("401 should fail");
        assert_eq!(err.to_string(), "Not authenticated");
        assert_eq!(
            view.snapshot(),
            ListSnapshot::Error("Could not load products. Not authenticated".into())
        );
        assert_eq!(
            last_toast(&toasts),
            (
                ToastKind::Error,
                "Error loading products: Not authenticated".to_string()
            )
        );
    }

    #[tokio::test]
    async fn missing_token_is_reported_as_load_failure() {
        let server = MockServer::start_async().await;
        let (view, _toasts) = view_with(client_with_token(&server, None), Arc::new(AssumeYes));
        let err = view.load().await.expect_err("no token");
        assert!(matches!(err, ApiError::AuthTokenMissing));
        assert!(matches!(
            view.snapshot(),
            ListSnapshot::Error(message) if message.contains("Authentication token not found")
        ));
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_rows() {
        let server = MockServer::start_async().await;
        let mut ok = server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200).json_body(json!([product_json(1, "Widget")]));
        });
        let (view, _toasts) = view_with(client_for(&server), Arc::new(AssumeYes));
        view.load().await.expect("first load ok");
        ok.delete();

        server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(503).body("upstream unavailable");
        });
        let err = view.load().await.expect_err("reload fails");
        assert_eq!(err.to_string(), "upstream unavailable");
        assert!(matches!(view.snapshot(), ListSnapshot::Rows(rows) if rows.len() == 1));
    }

    #[tokio::test]
    async fn scrape_and_report_leave_list_untouched() {
        let server = MockServer::start_async().await;
        let list = server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200).json_body(json!([product_json(3, "Widget")]));
        });
        server.mock(|when, then| {
            when.method(POST).path("/products/3/ingest");
            then.status(200)
                .json_body(json!({"status": "success", "message": "Ingestion started."}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/products/3/email-report");
            then.status(200).json_body(json!({"message": ""}));
        });
        let (view, toasts) = view_with(client_for(&server), Arc::new(AssumeYes));
        view.load().await.expect("load ok");
        let before = view.snapshot();

        let ActionOutcome::Completed(message) = view.scrape(3).await else {
            panic!("scrape should complete");
        };
        assert_eq!(message, "Ingestion started. Scraping may take several minutes.");
        assert_eq!(
            last_toast(&toasts),
            (ToastKind::Success, message.clone())
        );

        let ActionOutcome::Completed(message) = view.report(3).await else {
            panic!("report should complete");
        };
        assert_eq!(
            message,
            "Report Generation task queued! Check your email in a few minutes."
        );

        assert_eq!(view.snapshot(), before);
        assert_eq!(view.actions().status(3, ActionKind::Scrape), ActionStatus::Idle);
        list.assert_calls(1);
    }

    #[tokio::test]
    async fn rejected_report_is_a_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/products/4/email-report");
            then.status(200).json_body(json!({
                "status": "error",
                "message": "Server is not configured with a recipient email."
            }));
        });
        let (view, toasts) = view_with(client_for(&server), Arc::new(AssumeYes));

        let outcome = view.report(4).await;
        assert!(matches!(outcome, ActionOutcome::Failed(ApiError::Rejected(_))));
        assert_eq!(
            view.actions().status(4, ActionKind::Report),
            ActionStatus::Error
        );
        assert!(!view.actions().is_row_busy(4));
        assert_eq!(
            last_toast(&toasts),
            (
                ToastKind::Error,
                "Error: Server is not configured with a recipient email.".to_string()
            )
        );
    }

    #[tokio::test]
    async fn rows_run_concurrently_and_same_row_is_exclusive() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/products/1/ingest");
            then.status(200)
                .delay(Duration::from_millis(300))
                .json_body(json!({"message": "slow"}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/products/2/ingest");
            then.status(200).json_body(json!({"message": "fast"}));
        });
        let (view, _toasts) = view_with(client_for(&server), Arc::new(AssumeYes));

        let observer = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(view.actions().is_row_busy(1));
            assert!(matches!(
                view.report(1).await,
                ActionOutcome::Rejected(ActionRejected::RowBusy {
                    product_id: 1,
                    active: ActionKind::Scrape
                })
            ));
            let other_row = view.scrape(2).await;
            assert!(view.actions().is_row_busy(1));
            other_row
        };
        let (slow, fast) = tokio::join!(view.scrape(1), observer);

        assert!(matches!(slow, ActionOutcome::Completed(_)));
        assert!(matches!(fast, ActionOutcome::Completed(_)));
        assert!(!view.actions().is_row_busy(1));
        assert!(!view.actions().is_row_busy(2));
    }

    #[tokio::test]
    async fn abandoned_action_leaves_row_idle() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/products/6/ingest");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({"message": "late"}));
        });
        let (view, _toasts) = view_with(client_for(&server), Arc::new(AssumeYes));

        let timed_out = tokio::time::timeout(Duration::from_millis(50), view.scrape(6)).await;
        assert!(timed_out.is_err());
        assert_eq!(view.actions().status(6, ActionKind::Scrape), ActionStatus::Idle);
    }

    #[tokio::test]
    async fn declined_delete_sends_nothing() {
        let server = MockServer::start_async().await;
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/products/7");
            then.status(204);
        });
        let (view, toasts) = view_with(client_for(&server), Arc::new(Decline));

        assert!(matches!(view.delete(7).await, ActionOutcome::Cancelled));
        delete.assert_calls(0);
        assert!(toasts.visible().is_empty());
    }

    #[tokio::test]
    async fn failed_delete_reenables_row_without_refresh() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(DELETE).path("/products/9");
            then.status(404).json_body(json!({"detail": "Product not found"}));
        });
        let toasts = ToastCenter::new();
        let (trigger, mut listener) = refresh_channel();
        let view = ProductListView::new(
            client_for(&server),
            toasts.clone(),
            trigger,
            Arc::new(AssumeYes),
        );

        assert!(matches!(view.delete(9).await, ActionOutcome::Failed(_)));
        assert!(!view.actions().is_row_busy(9));
        assert_eq!(listener.take_change(), None);
        assert_eq!(
            last_toast(&toasts),
            (
                ToastKind::Error,
                "Error deleting product: Product not found".to_string()
            )
        );
    }

    #[tokio::test]
    async fn stale_phase_is_not_loading_after_settle() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200).json_body(json!([]));
        });
        let (view, _toasts) = view_with(client_for(&server), Arc::new(AssumeYes));
        let (first, second) = tokio::join!(view.load(), view.load());
        let outcomes = [first.expect("ok"), second.expect("ok")];
        assert!(outcomes.contains(&LoadOutcome::Applied(0)));
        assert_eq!(view.state().phase(), &ListPhase::Ready);
        assert_eq!(view.snapshot(), ListSnapshot::Empty);
    }
}
