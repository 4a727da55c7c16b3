//! Error types for zenex.
//!
//! This module defines `ZenexError`, the unified error type used throughout
//! the crate.
//!
//! Errors fall into two families that callers treat very differently:
//!
//! - **Remote rejections** (`HttpStatus`): the API answered with a non-200
//!   status. These are ordinary values; the caller decides what to do.
//! - **Transport faults** (`Http`, `Timeout`, `Serialization`): the response
//!   never arrived or could not be decoded. Any run depending on the payload
//!   must stop.
//!
//! # Security
//!
//! The API token must never appear in logs or error messages. Use
//! `sanitize_message()` when building messages from external text.

use std::time::Duration;
use thiserror::Error;

/// Maximum length of a response body kept in an error, in bytes.
pub const MAX_ERROR_BODY_LEN: usize = 500;

/// Unified error type for all zenex operations.
#[derive(Error, Debug)]
pub enum ZenexError {
    /// Configuration error - missing or invalid environment variables.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The API answered with a non-200 status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// Canonical reason phrase for the status.
        reason: String,
        /// The response body, truncated and sanitized.
        body: String,
    },

    /// Request timed out.
    #[error("request timed out after {duration:?} ({operation})")]
    Timeout {
        /// The configured transport timeout.
        duration: Duration,
        /// The operation that timed out.
        operation: String,
    },

    /// The response body was not the JSON object we expected.
    #[error("malformed response: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Writing the export failed.
    #[error("export write failed: {0}")]
    Export(#[from] csv::Error),

    /// Filesystem error while preparing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ZenexError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        ZenexError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ZenexError::Config(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ZenexError::Validation(message.into())
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        ZenexError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Creates a rejection error, truncating the body to `MAX_ERROR_BODY_LEN`.
    pub fn http_status(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        ZenexError::HttpStatus {
            status,
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            body: truncate_body(body.into()),
        }
    }

    /// Returns true if the remote API rejected the request with a status code.
    ///
    /// Rejections are data: the request reached the server and it answered.
    #[must_use]
    pub fn is_remote_rejection(&self) -> bool {
        matches!(self, ZenexError::HttpStatus { .. })
    }

    /// Returns true if the response never arrived or could not be decoded.
    ///
    /// A transport fault leaves the caller with no usable payload, so any
    /// run that depends on it has to stop.
    #[must_use]
    pub fn is_transport_fault(&self) -> bool {
        matches!(
            self,
            ZenexError::Http(_) | ZenexError::Timeout { .. } | ZenexError::Serialization(_)
        )
    }

    /// Returns the status code for rejections.
    #[must_use]
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ZenexError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Replaces any occurrence of `secret` in `message` with `[REDACTED]`.
    #[must_use]
    pub fn sanitize_message(message: &str, secret: &str) -> String {
        if secret.is_empty() {
            return message.to_string();
        }
        message.replace(secret, "[REDACTED]")
    }

    /// Creates a sanitized version of this error's display message.
    #[must_use]
    pub fn sanitized_display(&self, secret: &str) -> String {
        Self::sanitize_message(&self.to_string(), secret)
    }
}

fn truncate_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body;
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}
