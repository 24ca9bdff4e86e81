//! Named server operations built on [`ShellService`].
//!
//! Each operation composes its URL and body synchronously and issues exactly
//! one request. Optional settings are `Option` fields: `Some` is sent even
//! when empty, `None` is left off the request.

use crate::error::Result;
use crate::http::Response;
use crate::service::{Endpoint, ShellService};
use crate::utils::url::{array_to_query_string, QueryParam, QueryString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use uuid::Uuid;

/// Prefix the data-list endpoint expects on filter parameter names.
pub const DATA_LIST_PARAM_PREFIX: &str = "p_";

/// Opaque token tying a long-running server operation to a later cancel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CancelId(String);

impl CancelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CancelId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for CancelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CancelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CancelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOptions {
    pub record_id: Option<String>,
    pub context_record_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataListLoadOptions {
    pub context_record_id: Option<String>,
    pub page_record_id: Option<String>,
    pub cancel_id: Option<CancelId>,
    pub user_settings_path: Option<String>,
    pub return_format: Option<String>,
    /// Filter values, sent positionally with the `p_` prefix.
    pub parameters: Vec<QueryParam>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchListOptions {
    pub max_records: Option<u32>,
    pub cancel_id: Option<CancelId>,
    pub criteria: Vec<QueryParam>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdHocQueryOptions {
    pub max_records: Option<u32>,
    pub cancel_id: Option<CancelId>,
    pub filter_fields: Vec<QueryParam>,
    pub output_fields: Vec<String>,
}

impl ShellService {
    pub fn navigation(&self) -> Result<Response> {
        self.get_action(Endpoint::Shell, "getNavigation", None)
    }

    pub fn page_metadata(&self, page_id: &str, options: &PageOptions) -> Result<Response> {
        let mut query = QueryString::new();
        query
            .push("pageId", page_id)
            .push_opt("recordId", options.record_id.as_deref())
            .push_opt("contextRecordId", options.context_record_id.as_deref());
        self.get_action(Endpoint::Shell, "getPageMetadata", Some(&query))
    }

    pub fn data_list_load_url(&self, data_list_id: &str, options: &DataListLoadOptions) -> String {
        let mut query = QueryString::new();
        query
            .push("dataListId", data_list_id)
            .push_opt("contextRecordId", options.context_record_id.as_deref())
            .push_opt("pageRecordId", options.page_record_id.as_deref())
            .push_opt("cancelId", options.cancel_id.as_ref())
            .push_opt("userSettingsPath", options.user_settings_path.as_deref())
            .push_opt("returnFormat", options.return_format.as_deref())
            .append_raw(&array_to_query_string(
                &options.parameters,
                DATA_LIST_PARAM_PREFIX,
                false,
            ));
        self.action_url(Endpoint::DataList, "loadDataList", Some(&query))
    }

    pub fn data_list_load(&self, data_list_id: &str, options: &DataListLoadOptions) -> Result<Response> {
        self.get(&self.data_list_load_url(data_list_id, options))
    }

    /// Runs a search list; criteria travel in the POST body.
    pub fn search_list_query(&self, search_list_id: &str, options: &SearchListOptions) -> Result<Response> {
        let mut query = QueryString::new();
        query
            .push("searchListId", search_list_id)
            .push_opt("maxRecords", options.max_records)
            .push_opt("cancelId", options.cancel_id.as_ref());
        let body = json!({ "criteria": options.criteria });
        self.post_action(Endpoint::SearchList, "query", Some(&query), &body)
    }

    pub fn ad_hoc_query_process(&self, query_view_id: &str, options: &AdHocQueryOptions) -> Result<Response> {
        let mut query = QueryString::new();
        query
            .push("queryViewId", query_view_id)
            .push_opt("maxRecords", options.max_records)
            .push_opt("cancelId", options.cancel_id.as_ref());
        let body = json!({
            "filterFields": options.filter_fields,
            "outputFields": options.output_fields,
        });
        self.post_action(Endpoint::Shell, "processAdHocQuery", Some(&query), &body)
    }

    /// Download URL for a report export; the browser or caller fetches it.
    pub fn report_export_url(&self, report_id: &str, format: &str, parameters: &[QueryParam]) -> String {
        let mut query = QueryString::new();
        query
            .push("reportId", report_id)
            .push("exportFormat", format)
            .push_params(parameters, "");
        self.action_url(Endpoint::Shell, "exportReport", Some(&query))
    }

    pub fn user_settings_get(&self, path: &str) -> Result<Response> {
        let mut query = QueryString::new();
        query.push("path", path);
        self.get_action(Endpoint::Shell, "getUserSettings", Some(&query))
    }

    pub fn user_settings_save(&self, path: &str, settings: &Value) -> Result<Response> {
        let mut query = QueryString::new();
        query.push("path", path);
        self.post_action(Endpoint::Shell, "saveUserSettings", Some(&query), settings)
    }

    /// Asks the server to stop the operation tagged with `cancel_id`.
    ///
    /// This is a separate request; the outstanding call is not aborted locally.
    pub fn cancel_async_operation(&self, cancel_id: &CancelId) -> Result<Response> {
        let mut query = QueryString::new();
        query.push("cancelId", cancel_id);
        self.get_action(Endpoint::Shell, "cancelAsyncOperation", Some(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Defaults, ServiceConfig};
    use crate::http::testing::RecordingTransport;
    use crate::http::Method;

    fn service() -> (ShellService, RecordingTransport) {
        let transport = RecordingTransport::new();
        let service = ShellService::with_transport(
            ServiceConfig::new("/app", "DB1"),
            Defaults::default(),
            Box::new(transport.clone()),
        )
        .unwrap();
        (service, transport)
    }

    #[test]
    fn navigation_hits_shell_endpoint() {
        let (service, transport) = service();
        service.navigation().unwrap();
        assert_eq!(
            transport.last().url,
            "/app/webui/WebShellService.ashx?databaseName=DB1&action=getNavigation"
        );
    }

    #[test]
    fn page_metadata_sends_only_present_options() {
        let (service, transport) = service();
        let options = PageOptions {
            record_id: Some(String::new()),
            context_record_id: None,
        };

        service.page_metadata("page-1", &options).unwrap();

        let url = transport.last().url;
        assert!(url.ends_with("&pageId=page-1&recordId="));
        assert!(!url.contains("contextRecordId"));
    }

    #[test]
    fn data_list_load_appends_prefixed_parameters_in_order() {
        let (service, _) = service();
        let options = DataListLoadOptions {
            context_record_id: Some("ctx".to_string()),
            cancel_id: Some(CancelId::from("c-1")),
            parameters: vec![
                QueryParam::with_id("STATUS", "Active"),
                QueryParam::new("CITY", "New York"),
            ],
            ..Default::default()
        };

        let url = service.data_list_load_url("dl-9", &options);

        assert_eq!(
            url,
            "/app/webui/WebShellDataListService.ashx?databaseName=DB1&action=loadDataList\
             &dataListId=dl-9&contextRecordId=ctx&cancelId=c-1&p_STATUS=Active&p_CITY=New%20York"
        );
    }

    #[test]
    fn data_list_load_without_parameters_has_no_trailing_separator() {
        let (service, _) = service();
        let url = service.data_list_load_url("dl-9", &DataListLoadOptions::default());
        assert!(url.ends_with("&dataListId=dl-9"));
    }

    #[test]
    fn search_list_query_posts_criteria() {
        let (service, transport) = service();
        let options = SearchListOptions {
            max_records: Some(50),
            cancel_id: None,
            criteria: vec![QueryParam::new("LASTNAME", "Smith")],
        };

        service.search_list_query("sl-1", &options).unwrap();

        let request = transport.last();
        assert_eq!(request.method, Method::Post);
        assert!(request
            .url
            .starts_with("/app/webui/WebShellSearchListService.ashx?databaseName=DB1&action=query"));
        assert!(request.url.ends_with("&searchListId=sl-1&maxRecords=50"));
        assert_eq!(
            request.body,
            Some(json!({ "criteria": [{ "name": "LASTNAME", "value": "Smith" }] }))
        );
    }

    #[test]
    fn ad_hoc_query_posts_fields() {
        let (service, transport) = service();
        let options = AdHocQueryOptions {
            output_fields: vec!["NAME".to_string()],
            ..Default::default()
        };

        service.ad_hoc_query_process("qv-1", &options).unwrap();

        let request = transport.last();
        assert!(request.url.contains("action=processAdHocQuery"));
        assert_eq!(
            request.body,
            Some(json!({ "filterFields": [], "outputFields": ["NAME"] }))
        );
    }

    #[test]
    fn report_export_url_carries_parameters() {
        let (service, transport) = service();
        let url = service.report_export_url("r-1", "pdf", &[QueryParam::new("YEAR", 2024)]);
        assert!(url.ends_with("&reportId=r-1&exportFormat=pdf&YEAR=2024"));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn user_settings_round_trip_requests() {
        let (service, transport) = service();
        service.user_settings_get("grid/columns").unwrap();
        service
            .user_settings_save("grid/columns", &json!({ "widths": [10, 20] }))
            .unwrap();

        let requests = transport.requests();
        assert!(requests[0].url.ends_with("action=getUserSettings&path=grid%2Fcolumns"));
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(requests[1].body, Some(json!({ "widths": [10, 20] })));
    }

    #[test]
    fn cancel_is_a_separate_request() {
        let (service, transport) = service();
        let cancel_id = CancelId::new();
        let options = DataListLoadOptions {
            cancel_id: Some(cancel_id.clone()),
            ..Default::default()
        };

        service.data_list_load("dl-1", &options).unwrap();
        service.cancel_async_operation(&cancel_id).unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].url.contains(&format!("cancelId={}", cancel_id)));
        assert!(requests[1].url.contains("action=cancelAsyncOperation"));
        assert!(requests[1].url.ends_with(&format!("cancelId={}", cancel_id)));
    }

    #[test]
    fn cancel_ids_are_unique() {
        assert_ne!(CancelId::new(), CancelId::new());
    }
}
