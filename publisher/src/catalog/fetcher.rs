//! Release catalog retrieval.

use super::parser::parse_catalog;
use super::release::Catalog;
use crate::error::Result;
use crate::http::HttpTransport;
use log::{debug, info};

/// Default endpoint listing installable releases, newest first.
pub const DEFAULT_CATALOG_URL: &str = "https://update-api.shopware.com/v1/releases/install";

/// Source of the release catalog.
///
/// A failure here is fatal to the run: without a catalog there is nothing to
/// build.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogSource {
    /// Retrieve the catalog, preserving upstream order.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::Network`](crate::error::PublisherError::Network)
    /// on transport failure or a non-success status, and
    /// [`PublisherError::Parse`](crate::error::PublisherError::Parse) when the
    /// body is not a valid catalog.
    fn fetch(&self) -> Result<Catalog>;
}

/// Fetches the catalog from a configured HTTP endpoint.
pub struct ReleaseCatalogFetcher<'a> {
    transport: &'a dyn HttpTransport,
    url: String,
}

impl<'a> ReleaseCatalogFetcher<'a> {
    /// Create a fetcher for the catalog served at `url`.
    #[must_use]
    pub fn new(transport: &'a dyn HttpTransport, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    /// The endpoint this fetcher reads from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CatalogSource for ReleaseCatalogFetcher<'_> {
    fn fetch(&self) -> Result<Catalog> {
        debug!("Fetching release catalog from {}", self.url);
        let body = self.transport.get_text(&self.url)?;
        let catalog = parse_catalog(&body)?;

        match catalog.latest() {
            Some(latest) => info!(
                "Fetched {} release(s); latest version is {}",
                catalog.len(),
                latest.version()
            ),
            None => info!("Fetched an empty release catalog"),
        }
        Ok(catalog)
    }
}
