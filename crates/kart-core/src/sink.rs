use std::fmt;

use crate::catalog::Product;
use crate::error::CatalogError;

/// Sequence number attached to every issued catalog request.
/// Strictly increasing within one session, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Receives the outcome of each catalog request.
///
/// Every `on_loading(id)` is followed by exactly one `on_success(id, ..)` or
/// `on_error(id, ..)`. Completions may arrive out of issue order; a sink that
/// cares compares ids.
pub trait ResultSink: Send + Sync + 'static {
    fn on_loading(&self, id: RequestId);

    fn on_success(&self, id: RequestId, products: Vec<Product>);

    fn on_error(&self, id: RequestId, error: CatalogError);
}
