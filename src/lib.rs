//! # zenex
//!
//! A small client for the Zendesk Support API, built around one reporting
//! job: export every ticket matching a search query into a CSV file.
//!
//! ## Features
//!
//! - **Search**: one page of `/api/v2/search.json`, newest first
//! - **Export**: follow `/api/v2/search/export` cursors to the last page and
//!   write a fixed 9-column CSV
//! - **Lookups**: list tickets, show users, ticket fields, brands,
//!   organizations and groups by id
//! - **Error handling**: HTTP rejections are values; only transport faults
//!   abort a run
//! - **Security**: the API token is never logged or exposed in error messages
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - Error types with token sanitization
//! - [`zendesk_client`] - HTTP client for the Zendesk API
//! - [`export`] - Row projection, the pagination loop and CSV output
//! - [`models`] - Response payloads, tickets and resource types
//! - [`cli`] - Command line interface
//!
//! ## Example
//!
//! ```ignore
//! use zenex::config::Config;
//! use zenex::export::{CsvSink, ExportPipeline};
//! use zenex::zendesk_client::ZendeskClient;
//!
//! async fn example() -> Result<(), zenex::error::ZenexError> {
//!     let config = Config::from_env()?;
//!     let client = ZendeskClient::new(&config)?;
//!     let mut sink = CsvSink::new("downloads/closed.csv");
//!
//!     let outcome = ExportPipeline::new(&client, &mut sink)
//!         .with_field_mapping(config.field_mapping)
//!         .run("status:closed")
//!         .await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod zendesk_client;
