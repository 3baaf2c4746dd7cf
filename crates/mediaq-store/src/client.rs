//! Firestore REST API client for the status store.
//!
//! Production-grade client with:
//! - Token caching with refresh margin
//! - HTTP client tuning (pooling, timeouts)
//! - Emulator support for local development and tests
//! - Observability (tracing spans, metrics)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, StatusCode};
use tracing::{info_span, Instrument};

use crate::error::{StoreError, StoreResult};
use crate::metrics::record_request;
use crate::token_cache::TokenCache;
use crate::types::{CommitRequest, CommitResponse, Document, Value, Write};

// =============================================================================
// Configuration
// =============================================================================

/// Store client configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Per-read deadline; a fetch slower than this reports the record absent
    pub fetch_deadline: Duration,
    /// When set, talk plain HTTP to this host with a fixed owner token
    pub emulator_host: Option<String>,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .map_err(|_| StoreError::auth("GCP_PROJECT_ID must be set to access the store"))?;

        if project_id.is_empty() {
            return Err(StoreError::auth("GCP_PROJECT_ID cannot be empty"));
        }

        let connect_timeout_secs: u64 = std::env::var("STORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let fetch_deadline_secs: u64 = std::env::var("STORE_FETCH_DEADLINE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            project_id,
            database_id: std::env::var("STORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            fetch_deadline: Duration::from_secs(fetch_deadline_secs),
            emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST").ok(),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Authentication mode for outgoing requests.
enum Auth {
    /// Real GCP credentials behind a refreshing cache.
    Cached(Arc<TokenCache>),
    /// Fixed token, used against the emulator.
    Fixed(String),
}

/// Firestore REST API client.
pub struct StoreClient {
    http: Client,
    config: StoreConfig,
    base_url: String,
    auth: Arc<Auth>,
}

impl Clone for StoreClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            base_url: self.base_url.clone(),
            auth: Arc::clone(&self.auth),
        }
    }
}

impl StoreClient {
    /// Create a new store client.
    pub async fn new(config: StoreConfig) -> StoreResult<Self> {
        let (auth, scheme_host) = match &config.emulator_host {
            Some(host) => (Auth::Fixed("owner".to_string()), format!("http://{}", host)),
            None => {
                let provider = Self::create_auth_provider()?;
                (
                    Auth::Cached(Arc::new(TokenCache::new(provider))),
                    "https://firestore.googleapis.com".to_string(),
                )
            }
        };

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("mediaq-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Network)?;

        let base_url = format!(
            "{}/v1/projects/{}/databases/{}/documents",
            scheme_host, config.project_id, config.database_id
        );

        Ok(Self {
            http,
            config,
            base_url,
            auth: Arc::new(auth),
        })
    }

    fn create_auth_provider() -> StoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env()
            .map_err(|e| StoreError::auth(format!("Failed to load service account: {}", e)))?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(StoreError::auth(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> StoreResult<Self> {
        let config = StoreConfig::from_env()?;
        Self::new(config).await
    }

    /// Per-read deadline configured for this client.
    pub fn fetch_deadline(&self) -> Duration {
        self.config.fetch_deadline
    }

    async fn get_token(&self) -> StoreResult<String> {
        match self.auth.as_ref() {
            Auth::Cached(cache) => cache.get_token().await,
            Auth::Fixed(token) => Ok(token.clone()),
        }
    }

    async fn invalidate_token(&self) {
        if let Auth::Cached(cache) = self.auth.as_ref() {
            cache.invalidate().await;
        }
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// Build document path URL.
    fn document_path(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, doc_id)
    }

    /// Full resource name of a document, for commit writes.
    pub fn full_document_name(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "projects/{}/databases/{}/documents/{}/{}",
            self.config.project_id, self.config.database_id, collection, doc_id
        )
    }

    /// Send a request, retrying once after a token refresh when the store
    /// reports the access token expired mid-flight.
    async fn send_with_auth<F>(&self, make: F) -> StoreResult<reqwest::Response>
    where
        F: Fn(&Client, &str) -> reqwest::RequestBuilder,
    {
        let token = self.get_token().await?;
        let response = make(&self.http, &token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&body) {
            return Err(StoreError::from_http_status(
                StatusCode::UNAUTHORIZED.as_u16(),
                body,
            ));
        }

        self.invalidate_token().await;
        let token = self.get_token().await?;
        Ok(make(&self.http, &token).send().await?)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Get a document. Absent documents are `Ok(None)`.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> StoreResult<Option<Document>> {
        let url = self.document_path(collection, doc_id);

        self.execute_request("get_document", collection, Some(doc_id), async {
            let response = self
                .send_with_auth(|http, token| http.get(&url).bearer_auth(token))
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let doc: Document = response.json().await?;
                    Ok(Some(doc))
                }
                StatusCode::NOT_FOUND => Ok(None),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Create a document. An existing document with the same id is a conflict.
    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> StoreResult<Document> {
        let url = format!("{}/{}?documentId={}", self.base_url, collection, doc_id);
        let body = Document::new(fields);

        self.execute_request("create_document", collection, Some(doc_id), async {
            let response = self
                .send_with_auth(|http, token| http.post(&url).bearer_auth(token).json(&body))
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK | StatusCode::CREATED => {
                    let doc: Document = response.json().await?;
                    Ok(doc)
                }
                StatusCode::CONFLICT => Err(StoreError::AlreadyExists(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Patch a document, writing only the masked fields.
    pub async fn patch_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        update_mask: Vec<String>,
    ) -> StoreResult<Document> {
        let mut url = self.document_path(collection, doc_id);
        let params: Vec<String> = update_mask
            .iter()
            .map(|f| format!("updateMask.fieldPaths={}", urlencoding::encode(f)))
            .collect();
        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }

        let body = Document::new(fields);

        self.execute_request("patch_document", collection, Some(doc_id), async {
            let response = self
                .send_with_auth(|http, token| http.patch(&url).bearer_auth(token).json(&body))
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let doc: Document = response.json().await?;
                    Ok(doc)
                }
                StatusCode::NOT_FOUND => {
                    Err(StoreError::not_found(format!("{}/{}", collection, doc_id)))
                }
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Execute a commit with server-side writes (field transforms).
    pub async fn commit(&self, writes: Vec<Write>) -> StoreResult<CommitResponse> {
        let url = format!("{}:commit", self.base_url);
        let request = CommitRequest { writes };

        self.execute_request("commit", "commit", None, async {
            let response = self
                .send_with_auth(|http, token| http.post(&url).bearer_auth(token).json(&request))
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let resp: CommitResponse = response.json().await?;
                    Ok(resp)
                }
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        fut: F,
    ) -> StoreResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>>,
    {
        let span = if let Some(id) = doc_id {
            info_span!("store_request", operation = %operation, collection = %collection, doc_id = %id)
        } else {
            info_span!("store_request", operation = %operation, collection = %collection)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(
        status: StatusCode,
        url: &str,
        response: reqwest::Response,
    ) -> StoreError {
        let body = response.text().await.unwrap_or_default();
        StoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn config_from_env_requires_project_id() {
        std::env::remove_var("GCP_PROJECT_ID");
        assert!(StoreConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn config_default_values() {
        std::env::set_var("GCP_PROJECT_ID", "test-project");
        std::env::remove_var("STORE_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("STORE_FETCH_DEADLINE_SECS");
        let config = StoreConfig::from_env().unwrap();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.fetch_deadline, Duration::from_secs(5));
        assert_eq!(config.database_id, "(default)");
        std::env::remove_var("GCP_PROJECT_ID");
    }

    #[test]
    fn expired_token_marker_detection() {
        assert!(StoreClient::is_access_token_expired(
            "{\"status\": \"UNAUTHENTICATED\"}"
        ));
        assert!(StoreClient::is_access_token_expired("ACCESS_TOKEN_EXPIRED"));
        assert!(!StoreClient::is_access_token_expired("PERMISSION_DENIED"));
    }
}
