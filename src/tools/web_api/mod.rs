//! Mocked HTTP caller.
//!
//! Requests are validated and checked against the domain allow-list, then
//! answered with a canned payload after a simulated delay. Nothing is sent
//! over the network.


use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::tools::{
    McpTool, ParamType, ToolDescriptor, ToolError, ToolParameter, ToolResult, ValidatedArgs,
};

pub const HTTP_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];
pub const DEFAULT_TIMEOUT_SECS: i64 = 30;
pub const MAX_TIMEOUT_SECS: i64 = 300;
pub const DEFAULT_LATENCY_MS: u64 = 100;

/// Web API settings, also the `[web_api]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebApiConfig {
    /// Hosts that may be called. Empty means any host.
    pub allowed_domains: Vec<String>,
    pub simulated_latency_ms: u64,
    pub default_headers: BTreeMap<String, String>,
}

impl Default for WebApiConfig {
    #[inline]
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            simulated_latency_ms: DEFAULT_LATENCY_MS,
            default_headers: BTreeMap::from([(
                "User-Agent".to_string(),
                "MCP-WebAPI-Tool/1.0".to_string(),
            )]),
        }
    }
}

/// Validated outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub url: Url,
    pub method: String,
    pub headers: Map<String, Value>,
    pub data: Option<Map<String, Value>>,
    pub timeout: i64,
}

#[derive(Debug)]
pub struct WebApiTool {
    descriptor: ToolDescriptor,
    config: WebApiConfig,
}

impl WebApiTool {
    #[inline]
    pub fn new(config: WebApiConfig) -> Result<Self, ToolError> {
        let descriptor = ToolDescriptor::new(
            "web_api",
            "Call a web API (mocked) with request validation",
            vec![
                ToolParameter::required("url", ParamType::String, "API URL"),
                ToolParameter::optional("method", ParamType::String, "HTTP method")
                    .with_default(json!("GET"))
                    .with_allowed(HTTP_METHODS)
                    .case_insensitive(),
                ToolParameter::optional("headers", ParamType::Object, "Additional HTTP headers"),
                ToolParameter::optional("data", ParamType::Object, "Request body"),
                ToolParameter::optional("timeout", ParamType::Integer, "Timeout in seconds")
                    .with_default(json!(DEFAULT_TIMEOUT_SECS)),
            ],
        )?;
        Ok(Self { descriptor, config })
    }

    /// Build an [`ApiRequest`] from validated arguments, enforcing the URL,
    /// timeout and domain rules.
    #[inline]
    pub fn prepare(&self, args: &ValidatedArgs) -> Result<ApiRequest, ToolError> {
        let raw_url = args.str("url")?;
        let url = Url::parse(raw_url)
            .map_err(|e| ToolError::InvalidInput(format!("invalid URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ToolError::InvalidInput(format!(
                "invalid URL: unsupported scheme '{}'",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| ToolError::InvalidInput("invalid URL: missing host".to_string()))?
            .to_string();

        let timeout = args.opt_i64("timeout").unwrap_or(DEFAULT_TIMEOUT_SECS);
        if !(1..=MAX_TIMEOUT_SECS).contains(&timeout) {
            return Err(ToolError::InvalidInput(format!(
                "timeout must be between 1 and {} seconds, got {}",
                MAX_TIMEOUT_SECS, timeout
            )));
        }

        let headers = args.opt_object("headers").cloned().unwrap_or_default();
        if let Some((name, _)) = headers.iter().find(|(_, v)| !v.is_string()) {
            return Err(ToolError::InvalidInput(format!(
                "header '{}' must be a string",
                name
            )));
        }

        if !self.config.allowed_domains.is_empty()
            && !self.config.allowed_domains.iter().any(|d| *d == host)
        {
            return Err(ToolError::Policy(format!("domain not allowed: {}", host)));
        }

        Ok(ApiRequest {
            url,
            method: args.opt_str("method").unwrap_or("GET").to_ascii_uppercase(),
            headers,
            data: args.opt_object("data").cloned(),
            timeout,
        })
    }

    /// Configured default headers overlaid with the request's own.
    fn merged_headers(&self, request: &ApiRequest) -> Map<String, Value> {
        let mut merged: Map<String, Value> = self
            .config
            .default_headers
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();
        for (k, v) in &request.headers {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}

#[async_trait]
impl McpTool for WebApiTool {
    #[inline]
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<ToolResult, ToolError> {
        let request = self.prepare(&args)?;
        debug!(
            method = %request.method,
            url = %request.url,
            has_body = request.data.is_some(),
            "Simulating web API call"
        );

        tokio::time::sleep(Duration::from_millis(self.config.simulated_latency_ms)).await;

        let response = json!({
            "status": "success",
            "method": request.method,
            "url": request.url.as_str(),
            "timestamp": Utc::now().to_rfc3339(),
            "data": "Mock response data",
        });

        let headers = self.merged_headers(&request);
        Ok(ToolResult::success(serde_json::to_string_pretty(&response)?)
            .with_metadata("method", request.method.as_str())
            .with_metadata("url", request.url.as_str())
            .with_metadata("timeout", request.timeout)
            .with_metadata("headers", headers))
    }
}
