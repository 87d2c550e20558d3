//! Debounced product-catalog search.
//!
//! Keystrokes go into a [`SearchSession`], which coalesces them with a
//! [`SearchScheduler`], queries a [`CatalogClient`] once input settles, and
//! reports each request to a [`ResultSink`] such as [`ProductsView`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod search;
pub mod sink;
pub mod view;

pub use catalog::{CatalogClient, CatalogFuture, HttpCatalog, Product};
pub use config::Config;
pub use error::{CatalogError, CatalogErrorKind, Error, Result};
pub use search::{SearchScheduler, SearchSession};
pub use sink::{RequestId, ResultSink};
pub use view::{ProductsView, ViewState};
