//! Access token caching for the Firestore REST API.
//!
//! Refreshes ahead of expiry and single-flights concurrent refreshes so
//! a burst of requests does not stampede the auth endpoint.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Refresh this long before the token actually expires.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// TTL assumed when the provider reports no usable expiry.
const FALLBACK_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for Firestore access via the datastore API surface.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe token cache with single-flight refresh.
pub struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            slot: RwLock::new(None),
        }
    }

    /// Drop the cached token, forcing a refresh on the next request.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    /// Get a valid access token, refreshing if needed.
    ///
    /// Fast path takes the read lock only. On refresh, the write lock
    /// double-checks so a refresh that raced in while waiting is reused.
    pub async fn get_token(&self) -> StoreResult<String> {
        {
            let slot = self.slot.read().await;
            if let Some(cached) = slot.as_ref() {
                if cached.is_fresh() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut slot = self.slot.write().await;
        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.access_token.clone());
            }
        }

        match self.provider.token(&[DATASTORE_SCOPE]).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();
                let expires_at = {
                    let now = Utc::now();
                    let exp = token.expires_at();
                    if exp > now {
                        match (exp - now).to_std() {
                            Ok(ttl) => Instant::now() + ttl,
                            Err(_) => Instant::now() + FALLBACK_TTL,
                        }
                    } else {
                        // Already expired, force a refresh next request
                        Instant::now()
                    }
                };

                *slot = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at,
                });
                debug!("Refreshed store auth token");
                Ok(access_token)
            }
            Err(e) => {
                // Refresh failed, keep serving the old token while it lasts
                if let Some(cached) = slot.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, reusing current token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }
                Err(StoreError::auth(format!(
                    "Failed to obtain auth token: {}",
                    e
                )))
            }
        }
    }
}
