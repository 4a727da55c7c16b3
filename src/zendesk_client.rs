//! HTTP client for the Zendesk Support API.
//!
//! This module provides `ZendeskClient`, which issues authenticated GET
//! requests against a fixed set of API v2 endpoints:
//!
//! - `/api/v2/search.json` - paged search
//! - `/api/v2/search/export` - cursor-paged export search
//! - `/api/v2/tickets` - ticket list
//! - `/api/v2/{resource}/{id}.json` - single resource lookup
//!
//! Every call sends exactly one request. Only HTTP 200 counts as success;
//! any other status comes back as `ZenexError::HttpStatus` so the caller
//! can decide what to do with it. Retries are left to the caller.
//!
//! # Security
//!
//! Requests use token authentication (`{email}/token` as the basic-auth
//! user). The token is never logged, and response bodies are scrubbed of it
//! before they are logged or returned in errors.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::Config;
use crate::error::ZenexError;
use crate::export::PageSource;
use crate::models::{Payload, ResourceType};

/// HTTP client for the Zendesk API.
///
/// # Example
///
/// ```ignore
/// let config = Config::from_env()?;
/// let client = ZendeskClient::new(&config)?.with_response_logging(false);
///
/// let page = client.search("type:ticket status:closed", 1).await?;
/// println!("{} matches", page.count().unwrap_or_default());
/// ```
#[derive(Clone)]
pub struct ZendeskClient {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// Account base URL (e.g., `https://acme.zendesk.com`).
    base_url: String,

    /// Agent email; the basic-auth user is `{email}/token`.
    email: String,

    /// API token.
    /// SECURITY: Never log this value!
    api_token: String,

    /// Transport timeout, if one was configured.
    timeout: Option<Duration>,

    /// Log a summary of each response.
    response_logging: bool,
}

/// Logs how long a gateway call took when dropped.
struct CallTimer<'a> {
    operation: &'a str,
    started: Instant,
}

impl<'a> CallTimer<'a> {
    fn start(operation: &'a str) -> Self {
        Self {
            operation,
            started: Instant::now(),
        }
    }
}

impl Drop for CallTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        tracing::info!(
            operation = self.operation,
            elapsed_ms = elapsed.as_millis() as u64,
            "Task finished in {:.3} seconds",
            elapsed.as_secs_f64()
        );
    }
}

impl ZendeskClient {
    /// Creates a new client from configuration. Response logging starts enabled.
    ///
    /// # Errors
    ///
    /// Returns `ZenexError::HttpClient` if the HTTP client fails to initialize.
    pub fn new(config: &Config) -> Result<Self, ZenexError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ZenexError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email.clone(),
            api_token: config.api_token().to_string(),
            timeout: config.timeout,
            response_logging: true,
        })
    }

    /// Enables or disables response logging.
    pub fn with_response_logging(mut self, enabled: bool) -> Self {
        self.response_logging = enabled;
        self
    }

    /// Enables or disables response logging for subsequent calls.
    pub fn set_response_logging(&mut self, enabled: bool) {
        self.response_logging = enabled;
    }

    /// Returns true if responses are being logged.
    pub fn response_logging(&self) -> bool {
        self.response_logging
    }

    /// Returns the account base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the token for scrubbing text before it is logged.
    pub(crate) fn api_token_for_sanitization(&self) -> &str {
        &self.api_token
    }

    /// Searches tickets, users and organizations; returns one page, newest first.
    ///
    /// # Arguments
    ///
    /// * `query` - Zendesk search syntax, passed through unvalidated
    /// * `page` - 1-based page number
    pub async fn search(&self, query: &str, page: u32) -> Result<Payload, ZenexError> {
        let url = format!("{}/api/v2/search.json", self.base_url);
        let params = [
            ("query", query.to_string()),
            ("sort_by", "created_at".to_string()),
            ("sort_order", "desc".to_string()),
            ("page", page.to_string()),
        ];
        self.get("search", &url, &params).await
    }

    /// Fetches one page of an export search.
    ///
    /// Without a cursor this starts a ticket export for `query`. With a
    /// cursor (a previous page's `next_page`) the cursor URL is requested
    /// as-is and `query` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ZenexError::Validation` if the cursor is not a URL on the
    /// configured account host; credentials are never sent elsewhere.
    pub async fn search_export(
        &self,
        query: &str,
        cursor: Option<&str>,
    ) -> Result<Payload, ZenexError> {
        match cursor {
            None => {
                let url = format!("{}/api/v2/search/export", self.base_url);
                let params = [
                    ("query", query.to_string()),
                    ("filter[type]", "ticket".to_string()),
                ];
                self.get("search_export", &url, &params).await
            }
            Some(cursor) => {
                self.validate_cursor(cursor)?;
                tracing::info!("Querying next page...");
                self.get("search_export", cursor, &[]).await
            }
        }
    }

    /// Lists tickets, newest first.
    pub async fn list_tickets(&self) -> Result<Payload, ZenexError> {
        let url = format!("{}/api/v2/tickets", self.base_url);
        let params = [
            ("sort_by", "created_at".to_string()),
            ("sort_order", "desc".to_string()),
        ];
        self.get("list_tickets", &url, &params).await
    }

    /// Shows a single resource by id.
    ///
    /// The id is percent-encoded but otherwise not checked; ids that do not
    /// exist come back as a 404 rejection.
    pub async fn show_resource(
        &self,
        resource: ResourceType,
        id: &str,
    ) -> Result<Payload, ZenexError> {
        let url = format!(
            "{}/api/v2/{}/{}.json",
            self.base_url,
            resource.as_path(),
            urlencoding::encode(id)
        );
        self.get("show_resource", &url, &[]).await
    }

    /// Checks that a cursor URL points at the configured account origin.
    ///
    /// Scheme, host and port must all match the base URL, so a cursor can
    /// neither move the credentials to another server nor downgrade them
    /// to plain HTTP.
    fn validate_cursor(&self, cursor: &str) -> Result<(), ZenexError> {
        let cursor_url = Url::parse(cursor)
            .map_err(|e| ZenexError::validation(format!("invalid cursor URL: {}", e)))?;
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| ZenexError::validation(format!("invalid base URL: {}", e)))?;

        if cursor_url.host() != base_url.host() {
            return Err(ZenexError::validation(format!(
                "cursor host mismatch: expected {:?}, got {:?}",
                base_url.host_str(),
                cursor_url.host_str()
            )));
        }
        if cursor_url.scheme() != base_url.scheme() {
            return Err(ZenexError::validation(format!(
                "cursor scheme mismatch: expected {}, got {}",
                base_url.scheme(),
                cursor_url.scheme()
            )));
        }
        if cursor_url.port_or_known_default() != base_url.port_or_known_default() {
            return Err(ZenexError::validation(format!(
                "cursor port mismatch: expected {:?}, got {:?}",
                base_url.port_or_known_default(),
                cursor_url.port_or_known_default()
            )));
        }
        Ok(())
    }

    /// Sends one authenticated GET and decodes a 200 response.
    ///
    /// Empty `params` leaves the URL untouched.
    async fn get(
        &self,
        operation: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Payload, ZenexError> {
        let _timer = CallTimer::start(operation);

        tracing::debug!(operation, url = %url, "Making Zendesk API request");

        let mut req = self
            .http
            .get(url)
            .basic_auth(format!("{}/token", self.email), Some(&self.api_token));
        if !params.is_empty() {
            req = req.query(params);
        }

        let response = req
            .send()
            .await
            .map_err(|e| self.transport_error(operation, e))?;
        let status = response.status();

        if status != StatusCode::OK {
            return Err(self.handle_http_error(operation, status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(operation, e))?;

        tracing::trace!(body = %body, "Zendesk API response");

        let payload = Payload::from_body(&body).inspect_err(|e| {
            tracing::error!(operation, error = %e, "Response body is not a JSON object");
        })?;

        if self.response_logging {
            self.log_payload(operation, &payload);
        }

        Ok(payload)
    }

    /// Classifies a reqwest failure and logs it.
    fn transport_error(&self, operation: &str, e: reqwest::Error) -> ZenexError {
        let err = if e.is_timeout() {
            ZenexError::timeout(self.timeout.unwrap_or_default(), operation)
        } else {
            ZenexError::Http(e)
        };
        tracing::error!(
            operation,
            error = %err.sanitized_display(&self.api_token),
            "Transport failure"
        );
        err
    }

    /// Turns a non-200 response into a rejection, logging it if enabled.
    async fn handle_http_error(
        &self,
        operation: &str,
        status: StatusCode,
        response: reqwest::Response,
    ) -> ZenexError {
        let body = response.text().await.unwrap_or_else(|e| {
            tracing::debug!(
                operation,
                %status,
                error = %ZenexError::sanitize_message(&e.to_string(), &self.api_token),
                "Failed to read rejection body"
            );
            String::new()
        });
        let body = ZenexError::sanitize_message(&body, &self.api_token);
        let err = ZenexError::http_status(status, body);

        if self.response_logging {
            if let ZenexError::HttpStatus { reason, body, .. } = &err {
                tracing::error!(operation, "HTTP {} - {}", status.as_u16(), reason);
                tracing::error!(operation, "{}", body);
            }
        }

        err
    }

    /// Logs the payload without its record arrays, plus the record count.
    fn log_payload(&self, operation: &str, payload: &Payload) {
        let summary = serde_json::to_string_pretty(&payload.summary()).unwrap_or_default();
        tracing::info!(operation, "{}", summary);

        if let Some(count) = payload.record_count() {
            tracing::info!(
                operation,
                records = count,
                next_page = payload.next_page().unwrap_or(""),
                previous_page = payload.previous_page().unwrap_or(""),
                "{} records in the current page",
                count
            );
        }
    }
}

impl PageSource for ZendeskClient {
    async fn fetch_page(&self, query: &str, cursor: Option<&str>) -> Result<Payload, ZenexError> {
        self.search_export(query, cursor).await
    }
}
