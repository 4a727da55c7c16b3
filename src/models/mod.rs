//! Data models for the Zendesk API.
//!
//! This module contains the decoded response payload, the read-only ticket
//! view used by exports, and the resource types accepted by the show
//! endpoint.

mod payload;
mod resource;
mod ticket;

pub use payload::*;
pub use resource::*;
pub use ticket::*;
