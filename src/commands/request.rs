use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::fs;

use webshell::http::{Method, Response};
use webshell::url::{QueryParam, QueryString};
use webshell::{CancelId, Endpoint, Error, ShellService};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ActionArgs {
    /// Server action name (e.g., getNavigation)
    pub action: String,

    /// Endpoint: shell, data-list, search-list, ui-modeling
    #[arg(long, default_value = "shell")]
    pub endpoint: Endpoint,

    /// Query parameter as NAME=VALUE (repeatable, order preserved)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,
}

#[derive(Args)]
pub struct PostArgs {
    #[command(flatten)]
    pub action: ActionArgs,

    /// JSON body (inline, or @path to read a file)
    #[arg(long)]
    pub body: Option<String>,
}

#[derive(Args)]
pub struct CancelArgs {
    /// Cancel id passed with the original request
    pub cancel_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOutput {
    pub cancel_id: String,
    pub status: u16,
    pub response: Value,
}

fn parse_params(raw: &[String]) -> webshell::Result<QueryString> {
    let params = raw
        .iter()
        .map(|pair| {
            QueryParam::parse_pair(pair).ok_or_else(|| {
                Error::validation_invalid_argument(
                    "param",
                    format!("Expected NAME=VALUE, got '{}'", pair),
                    None,
                )
            })
        })
        .collect::<webshell::Result<Vec<_>>>()?;

    let mut query = QueryString::new();
    query.push_params(&params, "");
    Ok(query)
}

fn action_url(service: &ShellService, args: &ActionArgs) -> webshell::Result<String> {
    let extra = parse_params(&args.params)?;
    Ok(service.action_url(args.endpoint, &args.action, Some(&extra)))
}

/// Response body as JSON, or as a plain string when it is not JSON.
fn response_value(response: &Response) -> Value {
    response
        .value()
        .unwrap_or_else(|_| Value::String(response.body.clone()))
}

fn parse_body(spec: Option<&str>) -> webshell::Result<Value> {
    let Some(spec) = spec else {
        return Ok(Value::Object(serde_json::Map::new()));
    };

    let content = match spec.strip_prefix('@') {
        Some(path) if path.trim().is_empty() => {
            return Err(Error::validation_invalid_argument(
                "body",
                "Invalid body '@' (missing file path)",
                None,
            ));
        }
        Some(path) => fs::read_to_string(path)
            .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read {}", path))))?,
        None => spec.to_string(),
    };

    serde_json::from_str(&content)
        .map_err(|e| Error::validation_invalid_json(e, Some("parse request body".to_string())))
}

pub fn run_url(args: ActionArgs, global: &GlobalArgs) -> CmdResult<RequestOutput> {
    let service = global.service()?;
    let url = action_url(&service, &args)?;

    Ok((
        RequestOutput {
            method: None,
            url,
            status: None,
            response: None,
        },
        0,
    ))
}

pub fn run_get(args: ActionArgs, global: &GlobalArgs) -> CmdResult<RequestOutput> {
    let service = global.service()?;
    let url = action_url(&service, &args)?;
    let response = service.get(&url)?;

    Ok((
        RequestOutput {
            method: Some(Method::Get.to_string()),
            url,
            status: Some(response.status),
            response: Some(response_value(&response)),
        },
        0,
    ))
}

pub fn run_post(args: PostArgs, global: &GlobalArgs) -> CmdResult<RequestOutput> {
    let service = global.service()?;
    let body = parse_body(args.body.as_deref())?;
    let url = action_url(&service, &args.action)?;
    let response = service.post(&url, &body)?;

    Ok((
        RequestOutput {
            method: Some(Method::Post.to_string()),
            url,
            status: Some(response.status),
            response: Some(response_value(&response)),
        },
        0,
    ))
}

pub fn run_cancel(args: CancelArgs, global: &GlobalArgs) -> CmdResult<CancelOutput> {
    let service = global.service()?;
    let cancel_id = CancelId::from(args.cancel_id);
    let response = service.cancel_async_operation(&cancel_id)?;

    Ok((
        CancelOutput {
            cancel_id: cancel_id.to_string(),
            status: response.status,
            response: response_value(&response),
        },
        0,
    ))
}
