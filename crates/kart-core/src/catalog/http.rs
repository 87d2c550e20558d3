use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::catalog::{CatalogClient, CatalogFuture, Product};
use crate::config::Config;
use crate::error::{CatalogError, Error, Result};

/// Body the backend sends alongside a non-2xx status
#[derive(Debug, Deserialize)]
struct FailureBody {
    #[serde(default)]
    message: String,
}

/// Catalog backed by the storefront HTTP API.
///
/// `GET {base}/products` lists everything, `GET {base}/products/search?value=q`
/// filters server-side. The base URL may carry a path prefix such as `/api/v1`.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpCatalog {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http_client(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.endpoint_url()?, config.catalog.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/products[/extra...]`, keeping any path already on the base.
    fn products_url(&self, extra: &[&str]) -> std::result::Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CatalogError::request_setup(format!(
                    "endpoint '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push("products")
            .extend(extra);
        Ok(url)
    }

    fn search_url(&self, query: &str) -> std::result::Result<Url, CatalogError> {
        let mut url = self.products_url(&["search"])?;
        url.query_pairs_mut().append_pair("value", query);
        Ok(url)
    }
}

impl CatalogClient for HttpCatalog {
    fn list_all(&self) -> CatalogFuture {
        let client = self.http_client.clone();
        let url = self.products_url(&[]);
        Box::pin(get_products(client, url, "list"))
    }

    fn search(&self, query: &str) -> CatalogFuture {
        let client = self.http_client.clone();
        let url = self.search_url(query);
        Box::pin(get_products(client, url, "search"))
    }
}

async fn get_products(
    client: reqwest::Client,
    url: std::result::Result<Url, CatalogError>,
    op: &'static str,
) -> std::result::Result<Vec<Product>, CatalogError> {
    let result = match url {
        Ok(url) => fetch(&client, url).await,
        Err(e) => Err(e),
    };
    match &result {
        Ok(products) => tracing::debug!("Catalog {} returned {} products", op, products.len()),
        Err(e) => tracing::warn!("Catalog {} failed: {}", op, e),
    }
    result
}

async fn fetch(
    client: &reqwest::Client,
    url: Url,
) -> std::result::Result<Vec<Product>, CatalogError> {
    tracing::debug!("GET {}", url);

    let response = client.get(url).send().await.map_err(transport_error)?;
    let status = response.status();

    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<FailureBody>(&body)
            .ok()
            .map(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        return Err(CatalogError::server(status.as_u16(), message));
    }

    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|e| CatalogError::invalid_payload(e.to_string()))
}

/// Anything reqwest reports after the request was built means no usable response arrived.
fn transport_error(e: reqwest::Error) -> CatalogError {
    if e.is_builder() {
        CatalogError::request_setup(e.to_string())
    } else {
        CatalogError::no_response(e.to_string())
    }
}
