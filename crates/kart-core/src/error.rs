//! Error types for kart-core.
//!
//! [`Error`] covers setup (bad endpoint, client construction, missing runtime).
//! [`CatalogError`] is the per-request failure handed to a result sink; it is
//! `Clone` so one failure can be stored in display state and logged.

use thiserror::Error;

/// Result type for setup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while wiring up a search session.
#[derive(Error, Debug)]
pub enum Error {
    /// The configured endpoint is not a usable URL.
    #[error("invalid catalog endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    HttpClient { reason: String },

    /// A scheduler was created outside a Tokio runtime.
    #[error("no Tokio runtime is running on this thread")]
    NoRuntime,
}

impl Error {
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn http_client(reason: impl Into<String>) -> Self {
        Self::HttpClient {
            reason: reason.into(),
        }
    }
}

/// Why a catalog request failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// The request went out but no response came back (timeout, connectivity).
    #[error("no response from catalog: {reason}")]
    NoResponse { reason: String },

    /// The request could not be constructed.
    #[error("could not build catalog request: {reason}")]
    RequestSetup { reason: String },

    /// A success response whose body is not a product list.
    #[error("invalid catalog payload: {reason}")]
    InvalidPayload { reason: String },
}

/// Fieldless mirror of [`CatalogError`] for matching and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogErrorKind {
    Server,
    NoResponse,
    RequestSetup,
    InvalidPayload,
}

impl CatalogError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn no_response(reason: impl Into<String>) -> Self {
        Self::NoResponse {
            reason: reason.into(),
        }
    }

    pub fn request_setup(reason: impl Into<String>) -> Self {
        Self::RequestSetup {
            reason: reason.into(),
        }
    }

    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }

    pub const fn kind(&self) -> CatalogErrorKind {
        match self {
            Self::Server { .. } => CatalogErrorKind::Server,
            Self::NoResponse { .. } => CatalogErrorKind::NoResponse,
            Self::RequestSetup { .. } => CatalogErrorKind::RequestSetup,
            Self::InvalidPayload { .. } => CatalogErrorKind::InvalidPayload,
        }
    }

    /// Text suitable for showing to the person typing.
    ///
    /// Only server messages are passed through; transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server { message, .. } => message.clone(),
            Self::NoResponse { .. } => {
                "Could not reach the catalog. Check your connection and try again.".to_string()
            }
            Self::RequestSetup { .. } | Self::InvalidPayload { .. } => {
                "Something went wrong while loading products.".to_string()
            }
        }
    }
}
