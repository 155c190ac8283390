//! Remote client configuration.

use fieldsync_engine::{SyncError, SyncResult};

/// Configuration for the field-service platform client.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the platform API, e.g. `https://www.zohoapis.com`.
    pub base_url: String,
    /// Base URL of the accounts/token endpoint.
    pub accounts_url: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Long-lived refresh token used to mint access tokens.
    pub refresh_token: String,
    /// Organization id sent with every API request.
    pub org_id: String,
}

impl RemoteConfig {
    /// Creates a configuration with the platform's default endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        org_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: "https://www.zohoapis.com".into(),
            accounts_url: "https://accounts.zoho.com".into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            org_id: org_id.into(),
        }
    }

    /// Overrides the API base URL (regional data centers, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = trim_trailing_slash(url.into());
        self
    }

    /// Overrides the accounts/token endpoint.
    pub fn with_accounts_url(mut self, url: impl Into<String>) -> Self {
        self.accounts_url = trim_trailing_slash(url.into());
        self
    }

    /// Loads the configuration from `FSM_*` environment variables.
    pub fn from_env() -> SyncResult<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| SyncError::Config(format!("missing environment variable {name}")))
        };

        let mut config = Self::new(
            var("FSM_CLIENT_ID")?,
            var("FSM_CLIENT_SECRET")?,
            var("FSM_REFRESH_TOKEN")?,
            var("FSM_ORG_ID")?,
        );
        if let Ok(url) = std::env::var("FSM_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Ok(url) = std::env::var("FSM_ACCOUNTS_URL") {
            config = config.with_accounts_url(url);
        }
        Ok(config)
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let config = RemoteConfig::new("id", "secret", "refresh", "org-1");
        assert_eq!(config.base_url, "https://www.zohoapis.com");

        let config = config
            .with_base_url("https://fsm.example.com/")
            .with_accounts_url("https://accounts.example.com//");
        assert_eq!(config.base_url, "https://fsm.example.com");
        assert_eq!(config.accounts_url, "https://accounts.example.com");
    }
}
