//! Error types for request configuration.
//!
//! # Design
//! Every failure this crate can report happens while a request is being
//! configured, before anything reaches the network. Transport and server
//! errors belong to whoever executes the `BuiltRequest` and are not modeled.

use thiserror::Error;

use crate::endpoint::{OptionName, ValueKind};

/// Errors raised synchronously by the builder, registry and config loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The endpoint does not declare this option.
    #[error("endpoint `{endpoint}` does not accept option `{option}`")]
    UnknownOption {
        endpoint: &'static str,
        option: OptionName,
    },

    /// A string-keyed call named no known option at all.
    #[error("unrecognized option name `{0}`")]
    UnrecognizedName(String),

    #[error("option `{option}` expects {expected}, found {found}")]
    WrongType {
        option: OptionName,
        expected: ValueKind,
        found: &'static str,
    },

    /// `add` was called on an option that holds a single value.
    #[error("option `{option}` of endpoint `{endpoint}` is not repeatable")]
    NotRepeatable {
        endpoint: &'static str,
        option: OptionName,
    },

    #[error("unknown endpoint `{0}`")]
    UnknownEndpoint(String),

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_option() {
        let err = ConfigurationError::UnknownOption {
            endpoint: "get_aliases",
            option: OptionName::Analyzer,
        };
        assert_eq!(
            err.to_string(),
            "endpoint `get_aliases` does not accept option `analyzer`"
        );

        let err = ConfigurationError::WrongType {
            option: OptionName::Text,
            expected: ValueKind::String,
            found: "number",
        };
        assert_eq!(err.to_string(), "option `text` expects a string, found number");
    }
}
