//! Request dispatch for web shell endpoints.
//!
//! Every call goes out exactly once with the merged header set and caching
//! disabled. The transport's result is handed back untouched: no retries, no
//! timeouts, no interpretation of the response body.

use crate::config::{Defaults, ServiceConfig};
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Headers applied after every merge so responses are never served from cache.
pub const NO_CACHE_HEADERS: [(&str, &str); 2] = [("Cache-Control", "no-cache"), ("Pragma", "no-cache")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved request, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl PreparedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::internal_json(e.to_string(), Some("parse response body".to_string())))
    }

    /// Body as JSON, with an empty body read as `null`.
    pub fn value(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        self.json()
    }
}

/// Per-call settings layered over the client and service headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub http_headers: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.http_headers.insert(name.into(), value.into());
        self
    }
}

/// Sends one prepared request.
pub trait Transport {
    fn send(&self, request: &PreparedRequest) -> Result<Response>;
}

/// Blocking reqwest transport. Non-2xx statuses come back as `http.status`
/// errors carrying the status and body.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &PreparedRequest) -> Result<Response> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let transport_error =
            |e: reqwest::Error| Error::http_transport(request.method.as_str(), &request.url, e.to_string());

        let response = builder.send().map_err(transport_error)?;
        let status = response.status();
        let body = response.text().map_err(transport_error)?;

        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), &request.url, body));
        }

        Ok(Response {
            status: status.as_u16(),
            body,
        })
    }
}

fn insert_header(headers: &mut BTreeMap<String, String>, name: &str, value: &str) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
}

/// Merge header layers; later layers win, header names compare case-insensitively.
pub fn merge_headers(layers: &[&BTreeMap<String, String>]) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for layer in layers {
        for (name, value) in layer.iter() {
            insert_header(&mut merged, name, value);
        }
    }
    for (name, value) in NO_CACHE_HEADERS {
        insert_header(&mut merged, name, value);
    }
    merged
}

pub fn prepare_request(
    defaults: &Defaults,
    service: &ServiceConfig,
    method: Method,
    url: &str,
    data: Option<&Value>,
    options: &RequestOptions,
) -> PreparedRequest {
    PreparedRequest {
        method,
        url: url.to_string(),
        headers: merge_headers(&[
            &defaults.http_headers,
            &service.http_headers,
            &options.http_headers,
        ]),
        body: data.cloned(),
    }
}

/// Issue exactly one request and return the transport's result as-is.
pub fn do_request(
    transport: &dyn Transport,
    defaults: &Defaults,
    service: &ServiceConfig,
    method: Method,
    url: &str,
    data: Option<&Value>,
    options: &RequestOptions,
) -> Result<Response> {
    let request = prepare_request(defaults, service, method, url, data, options);
    log_status!("http", "{} {}", method, url);
    transport.send(&request)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorded {
        requests: Vec<PreparedRequest>,
        replies: VecDeque<Result<Response>>,
    }

    /// Records every request; replies come from a queue, then default to `200 {}`.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingTransport {
        inner: Rc<RefCell<Recorded>>,
    }

    impl RecordingTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn reply(&self, reply: Result<Response>) {
            self.inner.borrow_mut().replies.push_back(reply);
        }

        pub(crate) fn requests(&self) -> Vec<PreparedRequest> {
            self.inner.borrow().requests.clone()
        }

        pub(crate) fn last(&self) -> PreparedRequest {
            self.requests().pop().expect("no request recorded")
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, request: &PreparedRequest) -> Result<Response> {
            let mut inner = self.inner.borrow_mut();
            inner.requests.push(request.clone());
            inner.replies.pop_front().unwrap_or_else(|| {
                Ok(Response {
                    status: 200,
                    body: "{}".to_string(),
                })
            })
        }
    }
}
