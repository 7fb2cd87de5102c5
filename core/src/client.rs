//! Entry point binding endpoints to a server location.
//!
//! # Design
//! `SearchClient` holds only a `base_url` and carries no mutable state between
//! calls. Its shortcuts hand out builders pre-bound to an endpoint; the
//! resulting `BuiltRequest` stays relative, and `url_for` is the one place
//! where it is joined onto the server address for the transport.

use crate::builder::RequestBuilder;
use crate::config::ClientConfig;
use crate::endpoint::{OptionName, ANALYZE, CLEAR_SCROLL, GET_ALIASES, SEARCH_SCROLL};
use crate::error::ConfigurationError;
use crate::http::BuiltRequest;

#[derive(Debug, Clone)]
pub struct SearchClient {
    base_url: String,
}

impl SearchClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn analyze(&self) -> RequestBuilder {
        RequestBuilder::new(&ANALYZE)
    }

    /// Continue the scroll `scroll_id`, keeping the context alive for
    /// `scroll` (e.g. `"1m"`).
    pub fn search_scroll(&self, scroll_id: &str, scroll: &str) -> Result<RequestBuilder, ConfigurationError> {
        RequestBuilder::new(&SEARCH_SCROLL)
            .set(OptionName::ScrollId, scroll_id)?
            .set(OptionName::Scroll, scroll)
    }

    pub fn clear_scroll(&self) -> RequestBuilder {
        RequestBuilder::new(&CLEAR_SCROLL)
    }

    pub fn get_aliases(&self) -> RequestBuilder {
        RequestBuilder::new(&GET_ALIASES)
    }

    /// Absolute URL for `request` on this client's server.
    pub fn url_for(&self, request: &BuiltRequest) -> String {
        format!("{}/{}", self.base_url, request.uri().trim_start_matches('/'))
    }
}
