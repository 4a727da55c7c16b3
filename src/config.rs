//! Configuration management for zenex.
//!
//! This module handles loading configuration from environment variables,
//! with validation to ensure all required values are present.

use std::env;
use std::time::Duration;

use crate::error::ZenexError;
use crate::export::FieldMapping;

/// Default Zendesk domain, combined with the subdomain into the base URL.
pub const DEFAULT_DOMAIN: &str = "zendesk.com";

/// Configuration for connecting to Zendesk.
///
/// The API token is stored but never logged or exposed in error messages.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the Zendesk account (e.g., `https://acme.zendesk.com`).
    pub base_url: String,

    /// Agent email used for token authentication.
    pub email: String,

    /// API token for authentication.
    /// This value must never be logged or included in error messages.
    api_token: String,

    /// Transport timeout; `None` keeps the HTTP client default.
    pub timeout: Option<Duration>,

    /// How custom fields are picked when projecting tickets into export rows.
    pub field_mapping: FieldMapping,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("field_mapping", &self.field_mapping)
            .finish()
    }
}

impl Config {
    /// Builds a configuration from an explicit base URL and credentials.
    ///
    /// # Errors
    ///
    /// Returns `ZenexError::Config` if the base URL has no http(s) scheme
    /// or the token is a placeholder.
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self, ZenexError> {
        let base_url = Self::validate_base_url(base_url.into())?;
        let api_token = api_token.into();
        Self::validate_api_token(&api_token)?;

        Ok(Config {
            base_url,
            email: email.into(),
            api_token,
            timeout: None,
            field_mapping: FieldMapping::default(),
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `ZD_EMAIL`: Agent email
    /// - `ZD_TOKEN`: API token
    /// - `ZD_SUBDOMAIN`: Account subdomain (unless `ZD_BASE_URL` is set)
    ///
    /// # Optional Environment Variables
    ///
    /// - `ZD_DOMAIN`: Defaults to `zendesk.com`
    /// - `ZD_BASE_URL`: Overrides `https://{subdomain}.{domain}`
    /// - `ZD_TIMEOUT_SECS`: Transport timeout in seconds
    /// - `ZD_EXPORT_FIELD_IDS`: Three comma-separated custom field ids;
    ///   switches the export to keyed field lookup
    ///
    /// # Errors
    ///
    /// Returns `ZenexError::Config` if any required variable is missing
    /// or if values fail validation.
    pub fn from_env() -> Result<Self, ZenexError> {
        let email = Self::get_required_env("ZD_EMAIL")?;
        let api_token = Self::get_required_env("ZD_TOKEN")?;

        let base_url = match Self::get_optional_env("ZD_BASE_URL") {
            Some(url) => url,
            None => {
                let subdomain = Self::get_required_env("ZD_SUBDOMAIN")?;
                let domain = Self::get_optional_env("ZD_DOMAIN")
                    .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
                Self::build_base_url(&subdomain, &domain)
            }
        };

        let mut config = Self::new(base_url, email, api_token)?;

        if let Some(raw) = Self::get_optional_env("ZD_TIMEOUT_SECS") {
            config.timeout = Some(Self::parse_timeout(&raw)?);
        }

        if let Some(raw) = Self::get_optional_env("ZD_EXPORT_FIELD_IDS") {
            config.field_mapping = Self::parse_field_ids(&raw)?;
        }

        Ok(config)
    }

    /// Returns the API token. Only the HTTP client should read this.
    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    /// Sets the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the custom field mapping used by exports.
    pub fn with_field_mapping(mut self, mapping: FieldMapping) -> Self {
        self.field_mapping = mapping;
        self
    }

    /// Assembles `https://{subdomain}.{domain}`.
    pub fn build_base_url(subdomain: &str, domain: &str) -> String {
        format!("https://{}.{}", subdomain.trim(), domain.trim())
    }

    /// Gets a required environment variable, returning an error if missing or empty.
    fn get_required_env(name: &str) -> Result<String, ZenexError> {
        Self::get_optional_env(name).ok_or_else(|| ZenexError::missing_env(name))
    }

    fn get_optional_env(name: &str) -> Option<String> {
        env::var(name).ok().filter(|value| !value.trim().is_empty())
    }

    /// Validates and normalizes the base URL.
    fn validate_base_url(url: String) -> Result<String, ZenexError> {
        let url = url.trim().trim_end_matches('/').to_string();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ZenexError::invalid_config(
                "base URL must start with http:// or https://",
            ));
        }

        Ok(url)
    }

    /// Validates the API token is not a placeholder value.
    fn validate_api_token(token: &str) -> Result<(), ZenexError> {
        let token_lower = token.to_lowercase();
        let placeholder_patterns = ["your_token", "your_api_token", "placeholder", "changeme"];

        for pattern in placeholder_patterns {
            if token_lower.contains(pattern) {
                return Err(ZenexError::invalid_config(
                    "ZD_TOKEN appears to be a placeholder value",
                ));
            }
        }

        Ok(())
    }

    fn parse_timeout(raw: &str) -> Result<Duration, ZenexError> {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ZenexError::invalid_config(format!(
                "ZD_TIMEOUT_SECS must be a positive integer, got {:?}",
                raw
            ))),
        }
    }

    fn parse_field_ids(raw: &str) -> Result<FieldMapping, ZenexError> {
        let ids = raw
            .split(',')
            .map(|part| part.trim().parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                ZenexError::invalid_config("ZD_EXPORT_FIELD_IDS must contain numeric field ids")
            })?;

        let ids: [u64; 3] = ids.try_into().map_err(|_| {
            ZenexError::invalid_config("ZD_EXPORT_FIELD_IDS must contain exactly three ids")
        })?;

        Ok(FieldMapping::Keyed(ids))
    }
}
