use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "webshell.json";

/// Root configuration structure for webshell.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebShellConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceConfig>,

    #[serde(default)]
    pub defaults: Defaults,
}

impl WebShellConfig {
    pub fn require_service(&self) -> Result<&ServiceConfig> {
        let service = self
            .service
            .as_ref()
            .ok_or_else(|| Error::config_missing_key("service", Some(CONFIG_FILE_NAME.to_string())))?;
        service.validate()?;
        Ok(service)
    }
}

/// Connection settings for one web shell server.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub base_url: String,
    pub database_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub http_headers: BTreeMap<String, String>,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database_name: database_name.into(),
            ..Self::default()
        }
    }

    pub fn with_proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn with_run_as(mut self, run_as: impl Into<String>) -> Self {
        self.run_as = Some(run_as.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.http_headers.insert(name.into(), value.into());
        self
    }

    /// Root every request URL hangs off: the proxy when one is set.
    pub fn root_url(&self) -> &str {
        self.proxy_url.as_deref().unwrap_or(&self.base_url)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "baseUrl",
                None,
                "Base URL cannot be empty",
            ));
        }
        if self.database_name.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "databaseName",
                None,
                "Database name cannot be empty",
            ));
        }
        if let Some(proxy) = &self.proxy_url {
            if proxy.trim().is_empty() {
                return Err(Error::config_invalid_value(
                    "proxyUrl",
                    Some(proxy.clone()),
                    "Proxy URL cannot be blank when set",
                ));
            }
        }
        Ok(())
    }
}

/// Client-wide defaults shared by every service handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    /// Headers sent with every request; a service's own headers win.
    #[serde(default = "default_http_headers")]
    pub http_headers: BTreeMap<String, String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            http_headers: default_http_headers(),
        }
    }
}

fn default_http_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(
        "Accept".to_string(),
        "application/json, text/plain, */*".to_string(),
    );
    headers
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load webshell.json from `path`.
pub fn load_config(path: &Path) -> Result<WebShellConfig> {
    if !path.exists() {
        return Err(Error::config_missing_key(
            "service",
            Some(path.display().to_string()),
        )
        .with_hint(format!("Create {} with baseUrl and databaseName", CONFIG_FILE_NAME)));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
}

/// Load `path` if it exists, otherwise built-in defaults with no service.
pub fn load_config_or_default(path: &Path) -> Result<WebShellConfig> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(WebShellConfig::default())
    }
}

/// Save config to `path` (creates parent directories if missing).
pub fn save_config(path: &Path, config: &WebShellConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
        })?;
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| {
        Error::internal_json(e.to_string(), Some(format!("serialize {}", CONFIG_FILE_NAME)))
    })?;

    fs::write(path, content).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
    })?;

    Ok(())
}
