//! Request construction for a search server's REST API.
//!
//! # Overview
//! Builds `BuiltRequest` values (relative URI, verb, JSON payload) without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip and parses the response itself.
//!
//! # Design
//! - Endpoints are `static` `EndpointSpec` tables, not types. One generic
//!   `RequestBuilder` interprets them.
//! - Option names are an enum; an endpoint that does not declare an option
//!   rejects it with `ConfigurationError` at the call site.
//! - `BuiltRequest` is immutable and compares by value. Payload keys are
//!   sorted, so equal configurations render byte-identical bodies.
//! - The scroll endpoint switches from GET to POST once the scroll id is
//!   too long to ride in the URI.

pub mod builder;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;

pub use builder::RequestBuilder;
pub use client::SearchClient;
pub use config::ClientConfig;
pub use endpoint::{EndpointSpec, OptionName, MAX_SCROLL_ID_LENGTH};
pub use error::ConfigurationError;
pub use http::{BuiltRequest, HttpMethod};
