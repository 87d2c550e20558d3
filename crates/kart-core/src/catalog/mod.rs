pub mod http;

use std::future::Future;
use std::pin::Pin;

use crate::error::CatalogError;

pub use http::HttpCatalog;

/// Wire schema for a product as served by `GET /products`
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Product {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Name or title of the product
    pub name: String,
    /// Category the product belongs to (e.g. "Phones")
    pub category: String,
    /// Price
    pub cost: f64,
    /// Aggregate rating, integer out of five
    pub rating: u8,
    /// URL of the product image
    pub image: String,
}

/// Future returned by every catalog operation
pub type CatalogFuture = Pin<Box<dyn Future<Output = Result<Vec<Product>, CatalogError>> + Send>>;

/// Trait for catalog backends (the HTTP API in production, fakes in tests)
pub trait CatalogClient: Send + Sync + 'static {
    /// Fetch the unfiltered catalog
    fn list_all(&self) -> CatalogFuture;

    /// Fetch the catalog filtered server-side by `query`.
    /// An empty query is valid and returns the full catalog.
    fn search(&self, query: &str) -> CatalogFuture;
}
