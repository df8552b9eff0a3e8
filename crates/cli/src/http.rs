//! Translation service backed by an OpenAI-compatible chat completions endpoint.

use pptrans_core::{Error, Result, ServiceRequest, TranslationService};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Blocking chat-completions client.
pub struct ChatCompletionsService {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ChatCompletionsService {
    pub fn new(api_base: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint_url(api_base),
            api_key,
        })
    }
}

fn endpoint_url(api_base: &str) -> String {
    format!("{}/chat/completions", api_base.trim_end_matches('/'))
}

fn request_body(request: &ServiceRequest) -> Value {
    serde_json::json!({
        "model": request.model_id,
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": request.user_message }
        ],
        "max_tokens": request.max_tokens,
        "temperature": request.temperature
    })
}

fn response_text(response: &Value) -> Result<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::ServiceError("No content in response".to_string()))
}

impl TranslationService for ChatCompletionsService {
    fn invoke(&self, request: &ServiceRequest) -> Result<String> {
        let mut builder = self.client.post(&self.endpoint).json(&request_body(request));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .map_err(|e| Error::ServiceError(format!("Request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::ServiceError(format!("HTTP {}: {}", status, body.trim())));
        }

        let json: Value = response
            .json()
            .map_err(|e| Error::ServiceError(format!("Invalid response: {}", e)))?;
        response_text(&json)
    }
}
