//! Service handle for one web shell server.
//!
//! Holds configuration only; the single piece of mutable client state (the
//! form-session event queue) lives in `uimodel`.

use crate::config::{Defaults, ServiceConfig};
use crate::error::{Error, Result};
use crate::http::{self, HttpTransport, Method, RequestOptions, Response, Transport};
use crate::utils::url::{join_url, QueryString};
use serde_json::Value;
use std::str::FromStr;

/// Server endpoint files, relative to the service root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Shell,
    DataList,
    SearchList,
    UiModeling,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Shell => "webui/WebShellService.ashx",
            Endpoint::DataList => "webui/WebShellDataListService.ashx",
            Endpoint::SearchList => "webui/WebShellSearchListService.ashx",
            Endpoint::UiModeling => "uimodel/UIModelingService.ashx",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Shell => "shell",
            Endpoint::DataList => "data-list",
            Endpoint::SearchList => "search-list",
            Endpoint::UiModeling => "ui-modeling",
        }
    }

    pub fn all() -> [Endpoint; 4] {
        [
            Endpoint::Shell,
            Endpoint::DataList,
            Endpoint::SearchList,
            Endpoint::UiModeling,
        ]
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Endpoint::all()
            .into_iter()
            .find(|endpoint| endpoint.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::validation_invalid_argument(
                    "endpoint",
                    format!("Unknown endpoint '{}'", s),
                    None,
                )
                .with_hint("Use one of: shell, data-list, search-list, ui-modeling")
            })
    }
}

pub struct ShellService {
    config: ServiceConfig,
    defaults: Defaults,
    transport: Box<dyn Transport>,
}

impl ShellService {
    /// Creates a service handle backed by the blocking HTTP transport.
    pub fn new(config: ServiceConfig, defaults: Defaults) -> Result<Self> {
        Self::with_transport(config, defaults, Box::new(HttpTransport::new()))
    }

    pub fn with_transport(
        config: ServiceConfig,
        defaults: Defaults,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            defaults,
            transport,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        join_url(self.config.root_url(), endpoint.path())
    }

    /// `databaseName`, then `action` when given, then `runAs` when configured.
    pub fn base_query(&self, action: Option<&str>) -> QueryString {
        let mut query = QueryString::new();
        query
            .push("databaseName", &self.config.database_name)
            .push_opt("action", action)
            .push_opt("runAs", self.config.run_as.as_deref());
        query
    }

    /// Full URL for `action` on `endpoint`, with operation parameters appended
    /// after the base parameters.
    pub fn action_url(&self, endpoint: Endpoint, action: &str, extra: Option<&QueryString>) -> String {
        let mut query = self.base_query(Some(action));
        if let Some(extra) = extra {
            query.append_raw(extra.as_str());
        }
        query.apply_to(&self.endpoint_url(endpoint))
    }

    pub fn get(&self, url: &str) -> Result<Response> {
        self.request(Method::Get, url, None, &RequestOptions::default())
    }

    pub fn post(&self, url: &str, body: &Value) -> Result<Response> {
        self.request(Method::Post, url, Some(body), &RequestOptions::default())
    }

    pub fn request(
        &self,
        method: Method,
        url: &str,
        data: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Response> {
        http::do_request(
            self.transport.as_ref(),
            &self.defaults,
            &self.config,
            method,
            url,
            data,
            options,
        )
    }

    pub fn get_action(
        &self,
        endpoint: Endpoint,
        action: &str,
        extra: Option<&QueryString>,
    ) -> Result<Response> {
        self.get(&self.action_url(endpoint, action, extra))
    }

    pub fn post_action(
        &self,
        endpoint: Endpoint,
        action: &str,
        extra: Option<&QueryString>,
        body: &Value,
    ) -> Result<Response> {
        self.post(&self.action_url(endpoint, action, extra), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::http::testing::RecordingTransport;
    use serde_json::json;

    fn service_with(config: ServiceConfig) -> (ShellService, RecordingTransport) {
        let transport = RecordingTransport::new();
        let service =
            ShellService::with_transport(config, Defaults::default(), Box::new(transport.clone()))
                .unwrap();
        (service, transport)
    }

    #[test]
    fn action_url_orders_base_database_then_action() {
        let (service, _) = service_with(ServiceConfig::new("/app", "DB1"));
        let url = service.action_url(Endpoint::Shell, "getNavigation", None);

        let base = url.find("/app").unwrap();
        let database = url.find("databaseName=DB1").unwrap();
        let action = url.find("action=getNavigation").unwrap();
        assert!(base < database && database < action);
        assert_eq!(
            url,
            "/app/webui/WebShellService.ashx?databaseName=DB1&action=getNavigation"
        );
    }

    #[test]
    fn action_url_adds_run_as_and_extra_params() {
        let (service, _) = service_with(ServiceConfig::new("/app/", "My DB").with_run_as("dom\\user"));
        let mut extra = QueryString::new();
        extra.push("pageId", "p-1");

        let url = service.action_url(Endpoint::Shell, "getPageMetadata", Some(&extra));

        assert_eq!(
            url,
            "/app/webui/WebShellService.ashx?databaseName=My%20DB&action=getPageMetadata&runAs=dom%5Cuser&pageId=p-1"
        );
    }

    #[test]
    fn proxy_url_replaces_base_url() {
        let (service, _) =
            service_with(ServiceConfig::new("/app", "DB1").with_proxy_url("https://proxy/shell/"));
        assert_eq!(
            service.endpoint_url(Endpoint::DataList),
            "https://proxy/shell/webui/WebShellDataListService.ashx"
        );
    }

    #[test]
    fn get_and_post_go_through_transport() {
        let (service, transport) = service_with(ServiceConfig::new("/app", "DB1"));

        service.get_action(Endpoint::Shell, "getNavigation", None).unwrap();
        service
            .post_action(Endpoint::Shell, "saveThing", None, &json!({ "x": 1 }))
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].body, None);
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(requests[1].body, Some(json!({ "x": 1 })));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = ShellService::with_transport(
            ServiceConfig::new("", "DB1"),
            Defaults::default(),
            Box::new(RecordingTransport::new()),
        );
        assert_eq!(result.err().map(|e| e.code), Some(ErrorCode::ConfigInvalidValue));
    }

    #[test]
    fn endpoint_parses_by_name() {
        assert_eq!("data-list".parse::<Endpoint>().unwrap(), Endpoint::DataList);
        assert_eq!("UI-Modeling".parse::<Endpoint>().unwrap(), Endpoint::UiModeling);
        assert!("nope".parse::<Endpoint>().is_err());
    }
}
