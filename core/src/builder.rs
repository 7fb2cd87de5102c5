//! Fluent configuration of a single request.
//!
//! # Design
//! A `RequestBuilder` is bound to one `EndpointSpec` and owns the options the
//! caller has supplied so far, in the order they were first set. Every
//! configuration call is checked against the endpoint's option table and
//! fails on the spot; `build` then only has to apply the omission policies,
//! pick the verb and lay the values out into URI and body. Builders are
//! taken by value, so a builder is consumed exactly once.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::form_urlencoded;

use crate::endpoint::{kind_of, EndpointSpec, MethodRule, OptionName, OptionSpec, Placement};
use crate::error::ConfigurationError;
use crate::http::BuiltRequest;

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint: &'static EndpointSpec,
    indices: Vec<String>,
    options: Vec<(OptionName, Value)>,
}

impl RequestBuilder {
    pub fn new(endpoint: &'static EndpointSpec) -> Self {
        Self {
            endpoint,
            indices: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn endpoint(&self) -> &'static EndpointSpec {
        self.endpoint
    }

    /// Target a single index, replacing any index set before.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.indices = vec![name.into()];
        self
    }

    /// Append an index. Multiple indices are joined with `,` in the URI.
    pub fn add_index(mut self, name: impl Into<String>) -> Self {
        self.indices.push(name.into());
        self
    }

    pub fn add_indices<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indices.extend(names.into_iter().map(Into::into));
        self
    }

    /// Replace the value of `option`.
    ///
    /// Repeatable options accept either one element or a sequence of
    /// elements; the stored value is always a sequence.
    pub fn set(mut self, option: OptionName, value: impl Into<Value>) -> Result<Self, ConfigurationError> {
        let spec = self.spec_for(option)?;
        let value = value.into();
        let value = if spec.repeatable {
            Value::Array(elements(spec, value)?)
        } else {
            check_kind(spec, &value)?;
            value
        };
        trace!(endpoint = self.endpoint.name, option = %option, "option set");
        self.store(option, value);
        Ok(self)
    }

    /// Append to a repeatable option. A sequence appends every element in
    /// order; anything else appends one element.
    pub fn add(mut self, option: OptionName, value: impl Into<Value>) -> Result<Self, ConfigurationError> {
        let spec = self.spec_for(option)?;
        if !spec.repeatable {
            return Err(ConfigurationError::NotRepeatable {
                endpoint: self.endpoint.name,
                option,
            });
        }
        let items = elements(spec, value.into())?;
        trace!(endpoint = self.endpoint.name, option = %option, count = items.len(), "option appended");
        match self.options.iter_mut().find(|(name, _)| *name == option) {
            Some((_, Value::Array(existing))) => existing.extend(items),
            Some((_, other)) => *other = Value::Array(items),
            None => self.options.push((option, Value::Array(items))),
        }
        Ok(self)
    }

    pub fn add_all<I, V>(self, option: OptionName, values: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let batch: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.add(option, Value::Array(batch))
    }

    /// `set` keyed by the option's wire name.
    pub fn set_named(self, option: &str, value: impl Into<Value>) -> Result<Self, ConfigurationError> {
        let option = option.parse()?;
        self.set(option, value)
    }

    /// `add` keyed by the option's wire name.
    pub fn add_named(self, option: &str, value: impl Into<Value>) -> Result<Self, ConfigurationError> {
        let option = option.parse()?;
        self.add(option, value)
    }

    /// Finalize into an immutable request.
    pub fn build(self) -> BuiltRequest {
        let endpoint = self.endpoint;
        let (method, inline_identifier) = match endpoint.method {
            MethodRule::Fixed(method) => (method, true),
            MethodRule::LengthSwitch {
                option,
                threshold,
                short,
                long,
            } => {
                let length = self
                    .value_of(option)
                    .and_then(Value::as_str)
                    .map_or(0, |id| id.chars().count());
                if length < threshold {
                    (short, true)
                } else {
                    debug!(
                        endpoint = endpoint.name,
                        option = %option,
                        length,
                        threshold,
                        "identifier too long for the URI, moving it to the body"
                    );
                    (long, false)
                }
            }
        };

        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;
        let mut body = BTreeMap::new();
        for spec in endpoint.options {
            let Some(value) = self.emitted_value(spec) else {
                continue;
            };
            let placement = match endpoint.method {
                MethodRule::LengthSwitch { option, .. } if option == spec.name && !inline_identifier => {
                    Placement::Body
                }
                _ => spec.placement,
            };
            match placement {
                Placement::Query => {
                    query.append_pair(spec.name.as_str(), &query_text(&value));
                    has_query = true;
                }
                Placement::Body => {
                    body.insert(spec.name.as_str(), sort_keys(value));
                }
            }
        }

        let mut uri = format!("{}/{}", index_segment(&self.indices), endpoint.suffix);
        if has_query {
            uri.push('?');
            uri.push_str(&query.finish());
        }
        // Inserted in sorted order whichever map serde_json was built with.
        let payload = if body.is_empty() {
            None
        } else {
            Some(Value::Object(
                body.into_iter().map(|(key, value)| (key.to_string(), value)).collect(),
            ))
        };

        debug!(endpoint = endpoint.name, method = %method, uri = %uri, "request built");
        BuiltRequest::new(method, uri, payload)
    }

    fn spec_for(&self, option: OptionName) -> Result<&'static OptionSpec, ConfigurationError> {
        self.endpoint
            .option(option)
            .ok_or(ConfigurationError::UnknownOption {
                endpoint: self.endpoint.name,
                option,
            })
    }

    fn store(&mut self, option: OptionName, value: Value) {
        match self.options.iter_mut().find(|(name, _)| *name == option) {
            Some((_, slot)) => *slot = value,
            None => self.options.push((option, value)),
        }
    }

    fn value_of(&self, option: OptionName) -> Option<&Value> {
        self.options
            .iter()
            .find(|(name, _)| *name == option)
            .map(|(_, value)| value)
    }

    fn emitted_value(&self, spec: &OptionSpec) -> Option<Value> {
        match self.value_of(spec.name) {
            Some(value) if spec.keeps(value) => Some(value.clone()),
            Some(_) => None,
            None => spec.absent_value(),
        }
    }
}

fn check_kind(spec: &OptionSpec, value: &Value) -> Result<(), ConfigurationError> {
    if spec.kind.accepts(value) {
        Ok(())
    } else {
        Err(ConfigurationError::WrongType {
            option: spec.name,
            expected: spec.kind,
            found: kind_of(value),
        })
    }
}

/// Elements contributed by one value of a repeatable option.
fn elements(spec: &OptionSpec, value: Value) -> Result<Vec<Value>, ConfigurationError> {
    let items = match value {
        Value::Array(items) => items,
        single => vec![single],
    };
    for item in &items {
        check_kind(spec, item)?;
    }
    Ok(items)
}

/// Non-empty index names, each percent-encoded, joined with `,`.
fn index_segment(indices: &[String]) -> String {
    indices
        .iter()
        .filter(|name| !name.is_empty())
        // a literal `+` is already `%2B`, so any `+` left stands for a space
        .map(|name| form_urlencoded::byte_serialize(name.as_bytes()).collect::<String>().replace('+', "%20"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Rebuild nested objects with their keys in sorted order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(key, value)| (key, sort_keys(value))).collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn query_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(query_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{ANALYZE, CLEAR_SCROLL, GET_ALIASES, MAX_SCROLL_ID_LENGTH, SEARCH_SCROLL};
    use crate::http::HttpMethod;
    use serde_json::json;

    fn analyze() -> RequestBuilder {
        RequestBuilder::new(&ANALYZE)
    }

    fn scroll(id: &str) -> BuiltRequest {
        RequestBuilder::new(&SEARCH_SCROLL)
            .set(OptionName::ScrollId, id)
            .unwrap()
            .set(OptionName::Scroll, "1m")
            .unwrap()
            .build()
    }

    fn padded_id(len: usize) -> String {
        format!("{}scrollId", "x".repeat(len - "scrollId".len()))
    }

    #[test]
    fn basic_analyze_without_index() {
        let req = analyze().set(OptionName::Analyzer, "standard").unwrap().build();
        assert_eq!(req.uri(), "/_analyze");
        assert_eq!(req.http_method(), HttpMethod::Post);
        assert_eq!(req.body().as_deref(), Some(r#"{"analyzer":"standard","text":[]}"#));
    }

    #[test]
    fn transient_analyzer_from_tokenizer_and_filter() {
        let req = analyze()
            .set(OptionName::Tokenizer, "keyword")
            .unwrap()
            .add(OptionName::Filter, "lowercase")
            .unwrap()
            .build();
        assert_eq!(req.uri(), "/_analyze");
        assert_eq!(
            req.body().as_deref(),
            Some(r#"{"filter":["lowercase"],"text":[],"tokenizer":"keyword"}"#)
        );
    }

    #[test]
    fn index_prefixes_the_suffix() {
        let req = analyze().index("test").build();
        assert_eq!(req.uri(), "test/_analyze");
        assert_eq!(req.body().as_deref(), Some(r#"{"text":[]}"#));
    }

    #[test]
    fn index_and_field_mapping() {
        let req = analyze().index("test").set(OptionName::Field, "obj1.field1").unwrap().build();
        assert_eq!(req.uri(), "test/_analyze");
        assert_eq!(req.body().as_deref(), Some(r#"{"field":"obj1.field1","text":[]}"#));
    }

    #[test]
    fn text_accumulates_in_call_order() {
        let req = analyze()
            .add(OptionName::Text, "foo")
            .unwrap()
            .add(OptionName::Text, "bar")
            .unwrap()
            .build();
        assert_eq!(req.body().as_deref(), Some(r#"{"text":["foo","bar"]}"#));
    }

    #[test]
    fn batch_then_single_text_preserves_order() {
        let req = analyze()
            .add(OptionName::Text, vec!["foo", "bar"])
            .unwrap()
            .add(OptionName::Text, "baz")
            .unwrap()
            .build();
        assert_eq!(req.payload(), Some(&json!({"text": ["foo", "bar", "baz"]})));

        let req = analyze()
            .add(OptionName::Text, "foo")
            .unwrap()
            .add_all(OptionName::Text, ["bar", "baz"])
            .unwrap()
            .build();
        assert_eq!(req.payload(), Some(&json!({"text": ["foo", "bar", "baz"]})));
    }

    #[test]
    fn set_replaces_accumulated_values() {
        let req = analyze()
            .add(OptionName::Text, "foo")
            .unwrap()
            .set(OptionName::Text, "bar")
            .unwrap()
            .build();
        assert_eq!(req.payload(), Some(&json!({"text": ["bar"]})));
    }

    #[test]
    fn empty_values_are_omitted() {
        let req = analyze()
            .set(OptionName::Analyzer, "")
            .unwrap()
            .set(OptionName::Filter, Vec::<String>::new())
            .unwrap()
            .build();
        assert_eq!(req.body().as_deref(), Some(r#"{"text":[]}"#));
    }

    #[test]
    fn format_goes_to_the_query_string() {
        let req = analyze().index("test").set(OptionName::Format, "text").unwrap().build();
        assert_eq!(req.uri(), "test/_analyze?format=text");
        assert_eq!(req.payload(), Some(&json!({"text": []})));
    }

    #[test]
    fn query_values_are_form_encoded() {
        let req = scroll("a b&c=");
        assert_eq!(req.uri(), "/_search/scroll?scroll=1m&scroll_id=a+b%26c%3D");
    }

    #[test]
    fn equal_configurations_build_equal_requests() {
        let build = |text: &str| {
            analyze()
                .index("test")
                .set(OptionName::Analyzer, "whitespace")
                .unwrap()
                .add(OptionName::Text, text)
                .unwrap()
                .build()
        };
        assert_eq!(build("source"), build("source"));
        assert_ne!(build("source"), build("source2"));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err = RequestBuilder::new(&GET_ALIASES)
            .set(OptionName::Analyzer, "standard")
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownOption {
                endpoint: "get_aliases",
                option: OptionName::Analyzer,
            }
        );
    }

    #[test]
    fn unrecognized_name_is_rejected() {
        let err = analyze().set_named("analyser", "standard").unwrap_err();
        assert_eq!(err, ConfigurationError::UnrecognizedName("analyser".to_string()));
    }

    #[test]
    fn named_calls_match_typed_calls() {
        let named = analyze()
            .set_named("analyzer", "whitespace")
            .unwrap()
            .add_named("text", "source")
            .unwrap()
            .build();
        let typed = analyze()
            .set(OptionName::Analyzer, "whitespace")
            .unwrap()
            .add(OptionName::Text, "source")
            .unwrap()
            .build();
        assert_eq!(named, typed);
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let err = analyze().set(OptionName::Analyzer, 42).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::WrongType {
                option: OptionName::Analyzer,
                expected: crate::endpoint::ValueKind::String,
                found: "number",
            }
        );

        let err = analyze().add(OptionName::Text, json!(["ok", true])).unwrap_err();
        assert!(matches!(err, ConfigurationError::WrongType { found: "boolean", .. }));
    }

    #[test]
    fn add_on_scalar_option_is_rejected() {
        let err = analyze().add(OptionName::Tokenizer, "keyword").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NotRepeatable {
                endpoint: "analyze",
                option: OptionName::Tokenizer,
            }
        );
    }

    #[test]
    fn short_scroll_id_uses_get() {
        let id = padded_id(MAX_SCROLL_ID_LENGTH - 1);
        let req = scroll(&id);
        assert_eq!(req.http_method(), HttpMethod::Get);
        assert!(req.payload().is_none());
        assert!(req.uri().contains(&id));
        assert!(req.uri().len() < 2000);
    }

    #[test]
    fn scroll_id_at_threshold_uses_post() {
        let id = padded_id(MAX_SCROLL_ID_LENGTH);
        let req = scroll(&id);
        assert_eq!(req.http_method(), HttpMethod::Post);
        assert!(!req.uri().contains(&id));
    }

    #[test]
    fn long_scroll_id_moves_to_body() {
        let id = padded_id(2000);
        let req = scroll(&id);
        assert_eq!(req.http_method(), HttpMethod::Post);
        assert_eq!(req.body(), Some(format!(r#"{{"scroll_id":"{id}"}}"#)));
        assert_eq!(req.uri(), "/_search/scroll?scroll=1m");
        assert!(req.uri().len() < 2000);
    }

    #[test]
    fn scroll_equality_follows_id_and_keepalive() {
        let build = |id: &str, keep_alive: &str| {
            RequestBuilder::new(&SEARCH_SCROLL)
                .set(OptionName::ScrollId, id)
                .unwrap()
                .set(OptionName::Scroll, keep_alive)
                .unwrap()
                .build()
        };
        assert_eq!(build("scroller1", "scroll"), build("scroller1", "scroll"));
        assert_ne!(build("scroller1", "scroll"), build("scroller2", "scroll"));
        assert_ne!(build("scroller", "scroll"), build("scroller", "scroll2"));
    }

    #[test]
    fn aliases_of_several_indices() {
        let req = RequestBuilder::new(&GET_ALIASES)
            .add_index("twitter")
            .add_indices(["myspace"])
            .build();
        assert_eq!(req.http_method(), HttpMethod::Get);
        assert_eq!(req.uri(), "twitter,myspace/_alias");
        assert!(req.payload().is_none());
    }

    #[test]
    fn index_replaces_previous_indices() {
        let req = RequestBuilder::new(&GET_ALIASES)
            .add_index("twitter")
            .index("myspace")
            .build();
        assert_eq!(req.uri(), "myspace/_alias");
    }

    #[test]
    fn clear_scroll_lists_ids_in_body() {
        let req = RequestBuilder::new(&CLEAR_SCROLL)
            .add(OptionName::ScrollId, "a")
            .unwrap()
            .add(OptionName::ScrollId, "b")
            .unwrap()
            .build();
        assert_eq!(req.http_method(), HttpMethod::Delete);
        assert_eq!(req.uri(), "/_search/scroll");
        assert_eq!(req.body().as_deref(), Some(r#"{"scroll_id":["a","b"]}"#));
    }

    #[test]
    fn payload_keys_are_sorted_independently_of_declaration_order() {
        let req = analyze()
            .set(OptionName::Explain, true)
            .unwrap()
            .set(OptionName::Tokenizer, "standard")
            .unwrap()
            .add(OptionName::Text, "foo")
            .unwrap()
            .add(OptionName::CharFilter, json!({"type": "mapping", "mappings": ["ph => f"]}))
            .unwrap()
            .set(OptionName::Analyzer, "whitespace")
            .unwrap()
            .build();
        assert_eq!(
            req.body().as_deref(),
            Some(concat!(
                r#"{"analyzer":"whitespace","#,
                r#""char_filter":[{"mappings":["ph => f"],"type":"mapping"}],"#,
                r#""explain":true,"text":["foo"],"tokenizer":"standard"}"#
            ))
        );
    }

    #[test]
    fn nested_object_keys_are_sorted() {
        assert_eq!(
            sort_keys(json!({"b": {"z": 1, "a": [{"y": 2, "x": 3}]}, "a": null})).to_string(),
            r#"{"a":null,"b":{"a":[{"x":3,"y":2}],"z":1}}"#
        );
    }

    #[test]
    fn explain_must_be_boolean() {
        let err = analyze().set(OptionName::Explain, "yes").unwrap_err();
        assert!(matches!(err, ConfigurationError::WrongType { found: "string", .. }));
    }

    #[test]
    fn index_names_are_percent_encoded() {
        let req = analyze().index("logs?x=1#frag").build();
        assert_eq!(req.uri(), "logs%3Fx%3D1%23frag/_analyze");
        assert!(!req.uri().contains('?'));
        assert!(!req.uri().contains('#'));

        let req = analyze().index("a/b").build();
        assert_eq!(req.uri(), "a%2Fb/_analyze");
    }

    #[test]
    fn index_encoding_keeps_the_endpoint_query() {
        let req = analyze().index("my index").set(OptionName::Format, "text").unwrap().build();
        assert_eq!(req.uri(), "my%20index/_analyze?format=text");

        let req = analyze().index("c++").build();
        assert_eq!(req.uri(), "c%2B%2B/_analyze");
    }

    #[test]
    fn empty_index_names_are_skipped() {
        let req = RequestBuilder::new(&GET_ALIASES).add_indices(["", "twitter"]).build();
        assert_eq!(req.uri(), "twitter/_alias");

        let req = analyze().index("").build();
        assert_eq!(req.uri(), "/_analyze");
    }

    #[test]
    fn local_alias_lookup_is_a_query_flag() {
        let req = RequestBuilder::new(&GET_ALIASES)
            .index("twitter")
            .set(OptionName::Local, true)
            .unwrap()
            .build();
        assert_eq!(req.uri(), "twitter/_alias?local=true");
        assert!(req.payload().is_none());
    }
}
