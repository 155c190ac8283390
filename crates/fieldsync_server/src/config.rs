//! Configuration for the control surface.

use std::time::Duration;

/// Configuration for the control surface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Shared secret for webhook signature verification.
    pub webhook_secret: Vec<u8>,
    /// Interval used by `start` requests that do not carry their own.
    pub default_interval: Duration,
}

impl ServerConfig {
    /// Creates a configuration with the given webhook secret.
    pub fn new(webhook_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            default_interval: Duration::from_secs(300),
        }
    }

    /// Sets the default continuous-sync interval.
    pub fn with_default_interval(mut self, interval: Duration) -> Self {
        self.default_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let config = ServerConfig::new(b"secret".to_vec())
            .with_default_interval(Duration::from_secs(60));
        assert_eq!(config.webhook_secret, b"secret");
        assert_eq!(config.default_interval, Duration::from_secs(60));
    }
}
