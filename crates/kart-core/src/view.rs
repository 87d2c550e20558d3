use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

use crate::catalog::Product;
use crate::error::CatalogError;
use crate::sink::{RequestId, ResultSink};

/// What the product grid should currently show
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    /// Nothing requested yet
    #[default]
    Idle,
    Loading,
    /// Settled results; empty means "no products found"
    Loaded(Vec<Product>),
    Failed(CatalogError),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn products(&self) -> &[Product] {
        match self {
            Self::Loaded(products) => products,
            _ => &[],
        }
    }
}

/// Result sink holding the display state of a product listing.
///
/// Only the most recently issued request may change the state: a completion
/// carrying an older [`RequestId`] is dropped, so a slow earlier search cannot
/// overwrite the results of a later one.
pub struct ProductsView {
    latest: Mutex<Option<RequestId>>,
    state: watch::Sender<ViewState>,
}

impl ProductsView {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            latest: Mutex::new(None),
            state,
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every accepted state change
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    fn complete(&self, id: RequestId, next: ViewState) {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if *latest != Some(id) {
            tracing::debug!(
                "Discarding stale completion {} (latest is {:?})",
                id,
                (*latest).map(|l| l.0)
            );
            return;
        }
        self.state.send_replace(next);
    }
}

impl Default for ProductsView {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for ProductsView {
    fn on_loading(&self, id: RequestId) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if latest.is_some_and(|l| id < l) {
            tracing::debug!("Ignoring loading signal for superseded request {}", id);
            return;
        }
        *latest = Some(id);
        self.state.send_replace(ViewState::Loading);
    }

    fn on_success(&self, id: RequestId, products: Vec<Product>) {
        tracing::debug!("Request {} returned {} products", id, products.len());
        self.complete(id, ViewState::Loaded(products));
    }

    fn on_error(&self, id: RequestId, error: CatalogError) {
        tracing::debug!("Request {} failed: {}", id, error);
        self.complete(id, ViewState::Failed(error));
    }
}
