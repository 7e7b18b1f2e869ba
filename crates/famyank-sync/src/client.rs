//! # Catalog Client
//!
//! Thin reqwest wrapper for the two catalog endpoints. Every request is
//! bounded by the configured timeout and any non-2xx answer is an error.

use std::time::Duration;

use famyank_core::Product;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::parse_remote_url;
use crate::error::{SyncError, SyncResult};
use crate::wire::{CountResponse, NODE_HEADER};

const PRODUCTS_PATH: &str = "api/products";

#[derive(Serialize)]
struct PutProducts<'a> {
    products: &'a [Product],
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    products_url: Url,
    node_id: String,
    timeout: Duration,
}

impl CatalogClient {
    /// `base_url` is the server root, e.g. `http://10.0.0.2:3000`.
    pub fn new(base_url: &str, timeout: Duration, node_id: impl Into<String>) -> SyncResult<Self> {
        let mut base = parse_remote_url(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let products_url = base
            .join(PRODUCTS_PATH)
            .map_err(|e| SyncError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Http(e.to_string()))?;

        Ok(CatalogClient {
            http,
            products_url,
            node_id: node_id.into(),
            timeout,
        })
    }

    pub fn products_url(&self) -> &Url {
        &self.products_url
    }

    /// `GET /api/products`.
    pub async fn fetch_products(&self) -> SyncResult<Vec<Product>> {
        let response = self
            .http
            .get(self.products_url.clone())
            .header(NODE_HEADER, &self.node_id)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let products: Vec<Product> = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;

        debug!(count = products.len(), "Fetched remote catalog");
        Ok(products)
    }

    /// `PUT /api/products`. Returns the count the server stored.
    pub async fn put_products(&self, products: &[Product]) -> SyncResult<usize> {
        let response = self
            .http
            .put(self.products_url.clone())
            .header(NODE_HEADER, &self.node_id)
            .json(&PutProducts { products })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body: CountResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;

        debug!(count = body.count, "Pushed catalog to remote");
        Ok(body.count)
    }

    fn transport_error(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout(self.timeout.as_secs())
        } else {
            SyncError::Http(err.to_string())
        }
    }
}

async fn check_status(response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::RemoteStatus {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_url_joins_under_base_path() {
        let client = CatalogClient::new("http://10.0.0.2:3000", Duration::from_secs(1), "n").unwrap();
        assert_eq!(client.products_url().as_str(), "http://10.0.0.2:3000/api/products");

        let client =
            CatalogClient::new("https://example.com/pos", Duration::from_secs(1), "n").unwrap();
        assert_eq!(client.products_url().as_str(), "https://example.com/pos/api/products");
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(matches!(
            CatalogClient::new("ftp://example.com", Duration::from_secs(1), "n"),
            Err(SyncError::InvalidUrl(_))
        ));
    }
}
