//! Kiln HTTP Client
//!
//! A simple, type-safe HTTP client for the ML pipeline backend.
//!
//! The backend owns every long-running job (archive validation, model builds,
//! deployments, inference). This client only issues the REST calls that start
//! those jobs and read their state back.
//!
//! # Example
//!
//! ```no_run
//! use kiln_client::BackendClient;
//! use kiln_core::dto::ListQuery;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BackendClient::new("http://localhost:8000");
//!
//!     for dataset in client.list_datasets(ListQuery::default()).await? {
//!         println!("{} {}", dataset.file_name, dataset.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod datasets;
mod inference;
mod models;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// HTTP client for the backend API
///
/// Methods are organized into logical groups:
/// - Datasets (upload, list, delete, validate, status)
/// - Models (create, deploy, undeploy, list, status)
/// - Inference (upload, generate, delete, list, status, download)
#[derive(Debug, Clone)]
pub struct BackendClient {
    /// Base URL of the backend (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl BackendClient {
    /// Create a new backend client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the backend API (e.g., "http://localhost:8000")
    ///
    /// # Example
    /// ```
    /// use kiln_client::BackendClient;
    ///
    /// let client = BackendClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new backend client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use kiln_client::BackendClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = BackendClient::with_client("http://localhost:8000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Request Helpers
    // =============================================================================

    /// Build the URL of an endpoint path
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a local file as the `file` field of a multipart upload
    ///
    /// Returns the file name that was sent, so callers can compare it with
    /// the name the backend echoes back.
    async fn upload_file<T: DeserializeOwned>(&self, path: &str, file: &Path) -> Result<(String, T)> {
        let file_name = file_name_of(file)?;
        let bytes = tokio::fs::read(file).await?;
        debug!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), path);

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.clone()));
        let response = self.client.post(self.url(path)).multipart(form).send().await?;

        let echo = self.handle_response(response).await?;
        Ok((file_name, echo))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is irrelevant
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        self.check_status(response).await.map(|_| ())
    }

    /// Turn a non-2xx response into an `ApiError` carrying the body text
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}

/// Final path component as UTF-8, as sent in the multipart header
fn file_name_of(file: &Path) -> Result<String> {
    file.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| ClientError::InvalidRequest(format!("{} has no file name", file.display())))
}
