//! JSON envelope for command output, plus exit codes per error family.

use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use webshell::error::Hint;
use webshell::{Error, ErrorCode, Result};

#[derive(Debug, Serialize)]
pub struct CliResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
}

impl From<&Error> for CliError {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code.as_str(),
            message: err.message.clone(),
            details: err.details.clone(),
            hints: err.hints.clone(),
        }
    }
}

impl CliResponse {
    pub fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(CliError::from(&err)),
            },
        }
    }
}

/// Print the envelope to stdout. A closed pipe is not an error.
pub fn print_json_result(result: Result<Value>) -> Result<()> {
    let payload = serde_json::to_string_pretty(&CliResponse::from_result(result))
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize response".to_string())))?;

    match writeln!(io::stdout().lock(), "{}", payload) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        )),
        _ => Ok(()),
    }
}

pub fn map_cmd_result_to_json<T: Serialize>(result: Result<(T, i32)>) -> (Result<Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (
                Err(Error::internal_json(
                    err.to_string(),
                    Some("serialize response".to_string()),
                )),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(err.code);
            (Err(err), exit_code)
        }
    }
}

fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigMissingKey
        | ErrorCode::ConfigInvalidJson
        | ErrorCode::ConfigInvalidValue
        | ErrorCode::ValidationInvalidArgument
        | ErrorCode::ValidationInvalidJson => 2,

        ErrorCode::HttpTransportFailed => 10,
        ErrorCode::HttpStatus => 20,

        ErrorCode::InternalIoError | ErrorCode::InternalJsonError => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_carries_code_and_hints() {
        let err = Error::http_status(401, "/app/x", "");
        let json = serde_json::to_value(CliResponse::from_result(Err(err))).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "http.status");
        assert_eq!(json["error"]["details"]["status"], 401);
        assert!(json["error"]["hints"].is_array());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn error_envelope_has_only_populated_fields() {
        let err = Error::http_status(500, "/app/x", "");
        let json = serde_json::to_value(CliResponse::from_result(Err(err))).unwrap();

        let mut keys: Vec<&str> = json["error"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["code", "details", "message"]);
    }

    #[test]
    fn success_envelope_wraps_data() {
        let json = serde_json::to_value(CliResponse::from_result(Ok(serde_json::json!({ "a": 1 })))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["a"], 1);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn exit_codes_follow_error_family() {
        let (_, code) = map_cmd_result_to_json::<()>(Err(Error::config_missing_key("service", None)));
        assert_eq!(code, 2);
        let (_, code) = map_cmd_result_to_json::<()>(Err(Error::http_transport("GET", "/x", "refused")));
        assert_eq!(code, 10);
        let (_, code) = map_cmd_result_to_json::<()>(Err(Error::http_status(500, "/x", "")));
        assert_eq!(code, 20);
        let (value, code) = map_cmd_result_to_json(Ok((serde_json::json!({ "a": 1 }), 0)));
        assert_eq!(code, 0);
        assert_eq!(value.unwrap()["a"], 1);
    }
}
