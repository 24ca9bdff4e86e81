//! URL and query-string assembly.
//!
//! - `url_concat` - join path segments with exactly one `/` at each boundary
//! - `encode_component` - percent-encode like JavaScript `encodeURIComponent`
//! - `array_to_query_string` - serialize an ordered parameter list
//! - `QueryString` - ordered builder with conditional inclusion

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// Characters left unescaped by `encodeURIComponent`.
const URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT_SET).to_string()
}

/// Join URL segments, normalizing only the slashes at segment boundaries.
///
/// Returns `None` when there are no segments or any segment is absent.
pub fn url_concat<S: AsRef<str>>(segments: &[Option<S>]) -> Option<String> {
    let (first, rest) = segments.split_first()?;
    let mut url = first.as_ref()?.as_ref().to_string();

    for segment in rest {
        append_segment(&mut url, segment.as_ref()?.as_ref());
    }

    Some(url)
}

/// Two-segment join for call sites where both parts are known.
pub fn join_url(base: &str, segment: &str) -> String {
    let mut url = base.to_string();
    append_segment(&mut url, segment);
    url
}

fn append_segment(url: &mut String, segment: &str) {
    match (url.ends_with('/'), segment.starts_with('/')) {
        (true, true) => url.push_str(&segment[1..]),
        (false, false) => {
            url.push('/');
            url.push_str(segment);
        }
        _ => url.push_str(segment),
    }
}

/// One entry of an ordered parameter list.
///
/// Servers identify parameters by `id` or, failing that, `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            value: value.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        self.id.as_deref().or(self.name.as_deref()).unwrap_or("")
    }

    /// Parse a `name=value` pair as typed on a command line.
    pub fn parse_pair(pair: &str) -> Option<Self> {
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, value))
    }
}

/// Text form of a parameter value: strings verbatim, `null` empty,
/// everything else as compact JSON.
pub fn value_to_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Serialize `items` as `&{prefix}{key}={value}` pairs.
///
/// The first pair carries a leading `&` only when `prepend_ampersand` is set.
pub fn array_to_query_string(
    items: &[QueryParam],
    item_prefix: &str,
    prepend_ampersand: bool,
) -> String {
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        if index > 0 || prepend_ampersand {
            out.push('&');
        }
        out.push_str(item_prefix);
        out.push_str(&encode_component(item.key()));
        out.push('=');
        out.push_str(&encode_component(&value_to_param(&item.value)));
    }
    out
}

/// Ordered `name=value` builder. Keys are never emitted when their
/// controlling condition is false or their value is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryString {
    buf: String,
}

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: impl Display) -> &mut Self {
        if !self.buf.is_empty() {
            self.buf.push('&');
        }
        self.buf.push_str(&encode_component(name));
        self.buf.push('=');
        self.buf.push_str(&encode_component(&value.to_string()));
        self
    }

    pub fn push_opt<V: Display>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(name, value);
        }
        self
    }

    pub fn push_if(&mut self, condition: bool, name: &str, value: impl Display) -> &mut Self {
        if condition {
            self.push(name, value);
        }
        self
    }

    pub fn push_params(&mut self, items: &[QueryParam], item_prefix: &str) -> &mut Self {
        let fragment = array_to_query_string(items, item_prefix, !self.buf.is_empty());
        self.buf.push_str(&fragment);
        self
    }

    /// Append an already-encoded query fragment, with or without a leading `&`.
    pub fn append_raw(&mut self, fragment: &str) -> &mut Self {
        let fragment = fragment.trim_start_matches('&');
        if fragment.is_empty() {
            return self;
        }
        if !self.buf.is_empty() {
            self.buf.push('&');
        }
        self.buf.push_str(fragment);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Attach to `url` with `?`, or `&` when it already has a query.
    pub fn apply_to(&self, url: &str) -> String {
        if self.buf.is_empty() {
            return url.to_string();
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", url, separator, self.buf)
    }
}

impl Display for QueryString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_concat_inserts_single_slash() {
        assert_eq!(url_concat(&[Some("a"), Some("b")]).as_deref(), Some("a/b"));
        assert_eq!(url_concat(&[Some("a/"), Some("/b")]).as_deref(), Some("a/b"));
        assert_eq!(url_concat(&[Some("a/"), Some("b")]).as_deref(), Some("a/b"));
        assert_eq!(url_concat(&[Some("a"), Some("/b")]).as_deref(), Some("a/b"));
        assert_eq!(
            url_concat(&[Some("/app"), Some("webui"), Some("x.ashx")]).as_deref(),
            Some("/app/webui/x.ashx")
        );
    }

    #[test]
    fn url_concat_rejects_missing_segments() {
        assert_eq!(url_concat(&[Some("a"), None]), None);
        assert_eq!(url_concat::<&str>(&[]), None);
        assert_eq!(url_concat::<&str>(&[None]), None);
    }

    #[test]
    fn url_concat_keeps_inner_double_slashes() {
        assert_eq!(
            url_concat(&[Some("http://host/"), Some("a//b")]).as_deref(),
            Some("http://host/a//b")
        );
        assert_eq!(url_concat(&[Some("a/"), Some("//b")]).as_deref(), Some("a//b"));
    }

    #[test]
    fn url_concat_single_segment_is_unchanged() {
        assert_eq!(url_concat(&[Some("/app/")]).as_deref(), Some("/app/"));
    }

    #[test]
    fn encode_component_matches_javascript() {
        assert_eq!(encode_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_component("it's(1)*!~"), "it's(1)*!~");
        assert_eq!(encode_component("é/"), "%C3%A9%2F");
    }

    #[test]
    fn array_to_query_string_uses_id_then_name() {
        let items = vec![QueryParam::with_id("x", "1"), QueryParam::new("y", "2")];
        assert_eq!(array_to_query_string(&items, "p_", true), "&p_x=1&p_y=2");
        assert_eq!(array_to_query_string(&items, "p_", false), "p_x=1&p_y=2");
        assert_eq!(array_to_query_string(&[], "p_", true), "");
    }

    #[test]
    fn array_to_query_string_prefers_id_over_name() {
        let item = QueryParam {
            id: Some("ID".to_string()),
            name: Some("NAME".to_string()),
            value: json!("v"),
        };
        assert_eq!(array_to_query_string(&[item], "", false), "ID=v");
    }

    #[test]
    fn array_to_query_string_encodes_values() {
        let items = vec![
            QueryParam::new("city", "New York"),
            QueryParam::new("n", json!(3)),
            QueryParam::new("empty", Value::Null),
        ];
        assert_eq!(
            array_to_query_string(&items, "", false),
            "city=New%20York&n=3&empty="
        );
    }

    #[test]
    fn query_param_deserializes_from_json() {
        let items: Vec<QueryParam> =
            serde_json::from_str(r#"[{"id":"x","value":"1"},{"name":"y","value":2}]"#).unwrap();
        assert_eq!(items[0].key(), "x");
        assert_eq!(items[1].key(), "y");
        assert_eq!(items[1].value, json!(2));
    }

    #[test]
    fn parse_pair_splits_on_first_equals() {
        let param = QueryParam::parse_pair("filter=a=b").unwrap();
        assert_eq!(param.key(), "filter");
        assert_eq!(param.value, json!("a=b"));
        assert!(QueryParam::parse_pair("novalue").is_none());
        assert!(QueryParam::parse_pair("=x").is_none());
    }

    #[test]
    fn query_string_skips_absent_values() {
        let mut qs = QueryString::new();
        qs.push("databaseName", "DB1")
            .push_opt::<&str>("runAs", None)
            .push_opt("cancelId", Some("c1"))
            .push_if(false, "refresh", true)
            .push_if(true, "keep", 1);
        assert_eq!(qs.as_str(), "databaseName=DB1&cancelId=c1&keep=1");
    }

    #[test]
    fn query_string_params_join_with_ampersand() {
        let params = vec![QueryParam::new("a", "1")];

        let mut empty = QueryString::new();
        empty.push_params(&params, "p_");
        assert_eq!(empty.as_str(), "p_a=1");

        let mut filled = QueryString::new();
        filled.push("x", 1).push_params(&params, "p_");
        assert_eq!(filled.as_str(), "x=1&p_a=1");
    }

    #[test]
    fn query_string_apply_to_picks_separator() {
        let mut qs = QueryString::new();
        qs.push("a", 1);
        assert_eq!(qs.apply_to("/svc"), "/svc?a=1");
        assert_eq!(qs.apply_to("/svc?z=0"), "/svc?z=0&a=1");
        assert_eq!(QueryString::new().apply_to("/svc"), "/svc");
    }

    #[test]
    fn append_raw_strips_leading_ampersand() {
        let mut qs = QueryString::new();
        qs.push("a", 1).append_raw("&b=2").append_raw("");
        assert_eq!(qs.as_str(), "a=1&b=2");
    }
}
