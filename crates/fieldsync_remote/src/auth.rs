//! OAuth refresh-token exchange and access-token caching.

use crate::config::RemoteConfig;
use chrono::{DateTime, Duration, Utc};
use fieldsync_engine::{SyncError, SyncResult};
use serde::Deserialize;
use tracing::debug;

/// Margin subtracted from the token lifetime so a token is never used
/// right at its expiry edge.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A cached access token.
#[derive(Debug, Clone)]
pub(crate) struct AccessToken {
    pub(crate) value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub(crate) fn new(value: String, lifetime_secs: i64, now: DateTime<Utc>) -> Self {
        Self {
            value,
            expires_at: now + Duration::seconds(lifetime_secs - EXPIRY_MARGIN_SECS),
        }
    }

    pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_lifetime")]
    expires_in: i64,
}

fn default_lifetime() -> i64 {
    3600
}

/// Owns the refresh-token grant and the cached access token.
///
/// The rest of the client asks for a token and never learns how it was
/// obtained; the engine above never sees this type at all.
pub(crate) struct TokenManager {
    http: reqwest::Client,
    config: RemoteConfig,
    cached: tokio::sync::Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub(crate) fn new(http: reqwest::Client, config: RemoteConfig) -> Self {
        Self {
            http,
            config,
            cached: tokio::sync::Mutex::new(None),
        }
    }

    /// Returns a valid access token, refreshing if absent or expired.
    pub(crate) async fn token(&self) -> SyncResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expired(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let token = self.refresh().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next request refreshes.
    ///
    /// Called after the platform rejects a request with 401: the token may
    /// have been revoked before its bookkeeping expiry.
    pub(crate) async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn refresh(&self) -> SyncResult<AccessToken> {
        debug!("refreshing platform access token");
        let url = format!("{}/oauth/v2/token", self.config.accounts_url);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("refresh_token", self.config.refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| SyncError::transport_retryable(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Auth(format!(
                "token refresh rejected with {status}: {body}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Auth(format!("malformed token response: {e}")))?;

        Ok(AccessToken::new(body.access_token, body.expires_in, Utc::now()))
    }
}
