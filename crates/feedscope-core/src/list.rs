//! Product list load phases and render guard.
//!
//! Every refresh issues a [`LoadTicket`]. Results are applied only when their ticket is newer
//! than the last applied one, so overlapping fetches cannot overwrite fresher data with older
//! data. Rows are replaced only on success; a failed reload keeps whatever was shown before.

use feedscope_api_models::Product;

/// Phase of the most recent load.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ListPhase {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last applied fetch succeeded.
    Ready,
    /// The last applied fetch failed with the given message.
    LoadError(String),
}

/// Ticket identifying one fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Sequence number of the fetch.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// Result of feeding a fetch result back into the list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Rows replaced with the given number of products.
    Applied(usize),
    /// The fetch failed; prior rows were kept.
    Failed(String),
    /// A newer fetch already settled; this result was dropped.
    Stale,
}

/// What the list view should show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListView<'a> {
    /// Loading placeholder.
    Loading,
    /// Full-view error, shown only when there is nothing else to display.
    Error(String),
    /// Successful load with no products.
    Empty,
    /// Products from the last successful fetch.
    Rows(&'a [Product]),
}

/// State owned by one product list instance.
#[derive(Clone, Debug, Default)]
pub struct ProductListState {
    products: Vec<Product>,
    phase: ListPhase,
    issued: u64,
    applied: u64,
}

impl ProductListState {
    /// Create an empty list in the idle phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch and enter the loading phase.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        self.phase = ListPhase::Loading;
        LoadTicket(self.issued)
    }

    /// Apply the result of a fetch.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Product>, String>,
    ) -> LoadOutcome {
        if ticket.0 <= self.applied {
            tracing::debug!(
                ticket = ticket.0,
                applied = self.applied,
                "dropping stale product list"
            );
            return LoadOutcome::Stale;
        }
        self.applied = ticket.0;
        let still_loading = self.applied < self.issued;

        match result {
            Ok(products) => {
                let count = products.len();
                self.products = products;
                if !still_loading {
                    self.phase = ListPhase::Ready;
                }
                LoadOutcome::Applied(count)
            }
            Err(message) => {
                if !still_loading {
                    self.phase = ListPhase::LoadError(message.clone());
                }
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Current load phase.
    #[must_use]
    pub const fn phase(&self) -> &ListPhase {
        &self.phase
    }

    /// Products from the last successful fetch.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a listed product.
    #[must_use]
    pub fn product(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Decide what to render.
    #[must_use]
    pub fn view(&self) -> ListView<'_> {
        match &self.phase {
            ListPhase::Idle | ListPhase::Loading => ListView::Loading,
            ListPhase::LoadError(message) if self.products.is_empty() => {
                ListView::Error(load_error_message(message))
            }
            _ if self.products.is_empty() => ListView::Empty,
            _ => ListView::Rows(&self.products),
        }
    }
}

/// Inline text for a failed load.
#[must_use]
pub fn load_error_message(error: &str) -> String {
    format!("Could not load products. {error}")
}

/// Notification for a failed load.
#[must_use]
pub fn load_failure_toast(error: &str) -> String {
    format!("Error loading products: {error}")
}
