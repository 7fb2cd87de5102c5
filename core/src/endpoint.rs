//! Declarative endpoint descriptions.
//!
//! # Design
//! An endpoint is data, not a type. `EndpointSpec` names the path suffix,
//! how the verb is chosen and which options the endpoint accepts. Each
//! `OptionSpec` says what shape of value is allowed, whether calls
//! accumulate, whether the value goes to the query string or the JSON body
//! and when it is left out. `RequestBuilder` interprets these tables; adding
//! an endpoint means adding a `static`, not writing a builder.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ConfigurationError;
use crate::http::HttpMethod;

/// Longest scroll identifier still sent inline in a GET URI.
///
/// Identifiers of this length or longer switch the request to POST with the
/// identifier in the body, keeping the URI under the 2000-character limit
/// many proxies enforce.
pub const MAX_SCROLL_ID_LENGTH: usize = 1900;

/// Every option name known to the crate. Endpoints accept a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionName {
    Text,
    Analyzer,
    Field,
    Tokenizer,
    Filter,
    CharFilter,
    Explain,
    Format,
    Scroll,
    ScrollId,
    Local,
}

impl OptionName {
    pub const ALL: [OptionName; 11] = [
        OptionName::Text,
        OptionName::Analyzer,
        OptionName::Field,
        OptionName::Tokenizer,
        OptionName::Filter,
        OptionName::CharFilter,
        OptionName::Explain,
        OptionName::Format,
        OptionName::Scroll,
        OptionName::ScrollId,
        OptionName::Local,
    ];

    /// Key used on the wire, in the body and in the query string alike.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionName::Text => "text",
            OptionName::Analyzer => "analyzer",
            OptionName::Field => "field",
            OptionName::Tokenizer => "tokenizer",
            OptionName::Filter => "filter",
            OptionName::CharFilter => "char_filter",
            OptionName::Explain => "explain",
            OptionName::Format => "format",
            OptionName::Scroll => "scroll",
            OptionName::ScrollId => "scroll_id",
            OptionName::Local => "local",
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionName {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnrecognizedName(s.to_string()))
    }
}

/// Shape of value an option accepts. For repeatable options this is the
/// element shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Boolean,
    Any,
}

impl ValueKind {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Any => true,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::String => "a string",
            ValueKind::Boolean => "a boolean",
            ValueKind::Any => "any value",
        })
    }
}

/// Short name of a JSON value's type, for error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Body,
    Query,
}

/// When a value is left out of the serialized request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OmissionPolicy {
    /// Omitted only if the caller never set it.
    SkipIfAbsent,
    /// Omitted if never set, or set to `""`, `[]`, `{}` or `null`.
    SkipIfEmpty,
    /// Always emitted. Unset repeatable options emit `[]`; an unset scalar
    /// has no empty form and is still omitted.
    AlwaysInclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: OptionName,
    pub kind: ValueKind,
    pub repeatable: bool,
    pub placement: Placement,
    pub omission: OmissionPolicy,
}

impl OptionSpec {
    pub const fn body(name: OptionName, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            repeatable: false,
            placement: Placement::Body,
            omission: OmissionPolicy::SkipIfAbsent,
        }
    }

    pub const fn query(name: OptionName, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            repeatable: false,
            placement: Placement::Query,
            omission: OmissionPolicy::SkipIfAbsent,
        }
    }

    pub const fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub const fn omit(mut self, omission: OmissionPolicy) -> Self {
        self.omission = omission;
        self
    }

    /// Value emitted when the caller supplied nothing, if any.
    pub(crate) fn absent_value(&self) -> Option<Value> {
        if self.omission == OmissionPolicy::AlwaysInclude && self.repeatable {
            Some(Value::Array(Vec::new()))
        } else {
            None
        }
    }

    /// Apply the omission policy to a supplied value.
    pub(crate) fn keeps(&self, value: &Value) -> bool {
        match self.omission {
            OmissionPolicy::SkipIfAbsent | OmissionPolicy::AlwaysInclude => true,
            OmissionPolicy::SkipIfEmpty => !is_empty(value),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// How the HTTP verb is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRule {
    Fixed(HttpMethod),
    /// `short` while the identifier option is shorter than `threshold`
    /// characters, sent in the query string. Otherwise `long`, with the
    /// identifier moved into the body.
    LengthSwitch {
        option: OptionName,
        threshold: usize,
        short: HttpMethod,
        long: HttpMethod,
    },
}

/// Immutable description of one API action.
#[derive(Debug, PartialEq, Eq)]
pub struct EndpointSpec {
    pub name: &'static str,
    /// Path suffix without a leading slash, e.g. `_analyze`.
    pub suffix: &'static str,
    pub method: MethodRule,
    pub options: &'static [OptionSpec],
}

impl EndpointSpec {
    pub fn option(&self, name: OptionName) -> Option<&OptionSpec> {
        self.options.iter().find(|spec| spec.name == name)
    }

    pub fn accepts(&self, name: OptionName) -> bool {
        self.option(name).is_some()
    }
}

/// Text analysis: breaks text into tokens with a named or ad hoc analyzer.
pub static ANALYZE: EndpointSpec = EndpointSpec {
    name: "analyze",
    suffix: "_analyze",
    method: MethodRule::Fixed(HttpMethod::Post),
    options: &[
        OptionSpec::body(OptionName::Text, ValueKind::String)
            .repeatable()
            .omit(OmissionPolicy::AlwaysInclude),
        OptionSpec::body(OptionName::Analyzer, ValueKind::String).omit(OmissionPolicy::SkipIfEmpty),
        // analyzer taken from the field's mapping
        OptionSpec::body(OptionName::Field, ValueKind::String).omit(OmissionPolicy::SkipIfEmpty),
        OptionSpec::body(OptionName::Tokenizer, ValueKind::String).omit(OmissionPolicy::SkipIfEmpty),
        OptionSpec::body(OptionName::Filter, ValueKind::String)
            .repeatable()
            .omit(OmissionPolicy::SkipIfEmpty),
        // names or inline definitions
        OptionSpec::body(OptionName::CharFilter, ValueKind::Any)
            .repeatable()
            .omit(OmissionPolicy::SkipIfEmpty),
        OptionSpec::body(OptionName::Explain, ValueKind::Boolean),
        // `detailed` (default) or `text`
        OptionSpec::query(OptionName::Format, ValueKind::String).omit(OmissionPolicy::SkipIfEmpty),
    ],
};

/// Fetch the next page of a scrolled search.
pub static SEARCH_SCROLL: EndpointSpec = EndpointSpec {
    name: "search_scroll",
    suffix: "_search/scroll",
    method: MethodRule::LengthSwitch {
        option: OptionName::ScrollId,
        threshold: MAX_SCROLL_ID_LENGTH,
        short: HttpMethod::Get,
        long: HttpMethod::Post,
    },
    options: &[
        OptionSpec::query(OptionName::Scroll, ValueKind::String).omit(OmissionPolicy::SkipIfEmpty),
        OptionSpec::query(OptionName::ScrollId, ValueKind::String),
    ],
};

/// Release server-side scroll contexts.
pub static CLEAR_SCROLL: EndpointSpec = EndpointSpec {
    name: "clear_scroll",
    suffix: "_search/scroll",
    method: MethodRule::Fixed(HttpMethod::Delete),
    options: &[OptionSpec::body(OptionName::ScrollId, ValueKind::String)
        .repeatable()
        .omit(OmissionPolicy::SkipIfEmpty)],
};

/// List aliases of one or more indices.
pub static GET_ALIASES: EndpointSpec = EndpointSpec {
    name: "get_aliases",
    suffix: "_alias",
    method: MethodRule::Fixed(HttpMethod::Get),
    // answer from the receiving node's cluster state
    options: &[OptionSpec::query(OptionName::Local, ValueKind::Boolean)],
};

pub static ENDPOINTS: [&EndpointSpec; 4] = [&ANALYZE, &SEARCH_SCROLL, &CLEAR_SCROLL, &GET_ALIASES];

/// Find a registered endpoint by name.
pub fn lookup(name: &str) -> Result<&'static EndpointSpec, ConfigurationError> {
    ENDPOINTS
        .iter()
        .copied()
        .find(|spec| spec.name == name)
        .ok_or_else(|| ConfigurationError::UnknownEndpoint(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn option_names_parse_from_wire_form() {
        for name in OptionName::ALL {
            assert_eq!(name.as_str().parse::<OptionName>(), Ok(name));
        }
        assert_eq!(
            "scrollId".parse::<OptionName>(),
            Err(ConfigurationError::UnrecognizedName("scrollId".to_string()))
        );
    }

    #[test]
    fn lookup_finds_registered_endpoints() {
        assert_eq!(lookup("analyze").unwrap().suffix, "_analyze");
        assert_eq!(lookup("get_aliases").unwrap().method, MethodRule::Fixed(HttpMethod::Get));
        assert!(matches!(
            lookup("reindex"),
            Err(ConfigurationError::UnknownEndpoint(name)) if name == "reindex"
        ));
    }

    #[test]
    fn endpoint_option_tables_have_no_duplicates() {
        for spec in ENDPOINTS {
            for (i, a) in spec.options.iter().enumerate() {
                assert!(
                    spec.options[i + 1..].iter().all(|b| b.name != a.name),
                    "{} declares {} twice",
                    spec.name,
                    a.name
                );
            }
        }
    }

    #[test]
    fn skip_if_empty_drops_empty_values() {
        let filter = ANALYZE.option(OptionName::Filter).unwrap();
        assert!(!filter.keeps(&json!([])));
        assert!(filter.keeps(&json!(["lowercase"])));
        assert_eq!(filter.absent_value(), None);

        let analyzer = ANALYZE.option(OptionName::Analyzer).unwrap();
        assert!(!analyzer.keeps(&json!("")));
    }

    #[test]
    fn always_include_emits_empty_sequence_when_unset() {
        let text = ANALYZE.option(OptionName::Text).unwrap();
        assert_eq!(text.absent_value(), Some(json!([])));
        assert!(text.keeps(&json!([])));
    }

    #[test]
    fn value_kinds_check_json_shape() {
        assert!(ValueKind::String.accepts(&json!("x")));
        assert!(!ValueKind::String.accepts(&json!(1)));
        assert!(ValueKind::Boolean.accepts(&json!(false)));
        assert!(!ValueKind::Boolean.accepts(&json!("true")));
        assert!(ValueKind::Any.accepts(&json!({"type": "mapping"})));
        assert!(ValueKind::Any.accepts(&Value::Null));
        assert_eq!(kind_of(&json!([1])), "array");
    }
}
