//! Gateway connection settings.

use store::Settings;

use crate::error::{PaymentError, Result};

pub const SANDBOX_BASE_URL: &str = "https://sandbox-api.iyzipay.com";
pub const PRODUCTION_BASE_URL: &str = "https://api.iyzipay.com";

/// Credentials and endpoint for one Iyzico merchant.
#[derive(Clone, PartialEq, Eq)]
pub struct IyzicoConfig {
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
}

impl IyzicoConfig {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>, sandbox: bool) -> Self {
        let base_url = if sandbox {
            SANDBOX_BASE_URL
        } else {
            PRODUCTION_BASE_URL
        };
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            base_url: base_url.to_string(),
        }
    }

    /// Points the config at another host, e.g. a local stub server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builds the config from stored settings. Fails when the key or the
    /// secret is missing or blank.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let key = settings.iyzico_key.as_deref().map(str::trim).unwrap_or("");
        let secret = settings
            .iyzico_secret_key
            .as_deref()
            .map(str::trim)
            .unwrap_or("");
        if key.is_empty() || secret.is_empty() {
            return Err(PaymentError::NotConfigured);
        }
        Ok(Self::new(key, secret, settings.iyzico_sandbox_mode))
    }

    pub fn is_sandbox(&self) -> bool {
        self.base_url == SANDBOX_BASE_URL
    }
}

// Keeps the secret out of logs and `#[instrument]` fields.
impl std::fmt::Debug for IyzicoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IyzicoConfig")
            .field("api_key", &self.api_key)
            .field("secret_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_flag_selects_base_url() {
        assert_eq!(IyzicoConfig::new("k", "s", true).base_url, SANDBOX_BASE_URL);
        assert_eq!(IyzicoConfig::new("k", "s", false).base_url, PRODUCTION_BASE_URL);
        assert!(IyzicoConfig::new("k", "s", true).is_sandbox());
    }

    #[test]
    fn from_settings_requires_key_and_secret() {
        let mut settings = Settings {
            iyzico_key: Some("key".into()),
            iyzico_secret_key: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(
            IyzicoConfig::from_settings(&settings),
            Err(PaymentError::NotConfigured)
        ));

        settings.iyzico_secret_key = Some("secret".into());
        settings.iyzico_sandbox_mode = true;
        let config = IyzicoConfig::from_settings(&settings).unwrap();
        assert_eq!(config.api_key, "key");
        assert!(config.is_sandbox());
    }

    #[test]
    fn debug_hides_secret() {
        let config = IyzicoConfig::new("key", "very-secret", false);
        let printed = format!("{config:?}");
        assert!(!printed.contains("very-secret"));
    }

    #[test]
    fn with_base_url_trims_trailing_slash() {
        let config = IyzicoConfig::new("k", "s", true).with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
    }
}
