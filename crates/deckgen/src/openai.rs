//! Client for the hosted model's Responses endpoint.
//!
//! Without an API key the client runs in dummy mode: no request leaves the
//! process and callers fall back to deterministic placeholder cards.

use crate::config::{Runtime, TextModel};
use crate::error::GenError;
use crate::io::write_json;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const BACKOFF_BASE_MS: u64 = 500;

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    max_retries: u32,
    cache_dir: Option<PathBuf>,
}

impl OpenAiClient {
    /// Read `OPENAI_API_KEY` and `OPENAI_BASE_URL` from the environment
    pub fn from_env(runtime: &Runtime) -> Result<Self, GenError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, base_url, runtime)
    }

    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        runtime: &Runtime,
    ) -> Result<Self, GenError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(runtime.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: runtime.max_retries,
            cache_dir: None,
        })
    }

    /// A client that never calls out
    pub fn dummy(runtime: &Runtime) -> Result<Self, GenError> {
        Self::new(None, DEFAULT_BASE_URL, runtime)
    }

    /// Keep every request/response pair under `dir`
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn is_dummy(&self) -> bool {
        self.api_key.is_none()
    }

    /// POST a payload to `/responses`, retrying transient failures
    pub async fn responses(&self, name: &str, payload: &Value) -> Result<Value, GenError> {
        let Some(api_key) = &self.api_key else {
            warn!("OPENAI_API_KEY not set, returning dummy response for {}", name);
            return Ok(dummy_response());
        };

        let url = format!("{}/responses", self.base_url);
        let mut attempt = 0;
        let response = loop {
            let result = self
                .http
                .post(&url)
                .bearer_auth(api_key)
                .json(payload)
                .send()
                .await;

            let retry_reason = match result {
                Ok(resp) if resp.status().is_success() => break resp.json::<Value>().await?,
                Ok(resp) if is_retryable(resp.status()) => format!("status {}", resp.status()),
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(GenError::Api { status, body });
                }
                Err(e) if e.is_builder() => return Err(e.into()),
                Err(e) => e.to_string(),
            };

            if attempt >= self.max_retries {
                return Err(GenError::Task(format!(
                    "{} gave up after {} attempts: {}",
                    name,
                    attempt + 1,
                    retry_reason
                )));
            }
            let delay = backoff(attempt);
            warn!(
                "{} attempt {} failed ({}), retrying in {:?}",
                name,
                attempt + 1,
                retry_reason,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        };

        info!("{} completed", name);
        if let Some(dir) = &self.cache_dir {
            save_payload(dir, name, payload, &response)?;
        }
        Ok(response)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// 500ms, 1s, 2s, ...
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(1 << attempt.min(10)))
}

fn dummy_response() -> Value {
    json!({"output": [{"content": [{"type": "output_text", "text": "{}"}]}]})
}

/// Write `<name>.request.json` and `<name>.response.json`
pub fn save_payload(
    dir: &Path,
    name: &str,
    payload: &Value,
    response: &Value,
) -> Result<(), GenError> {
    write_json(&dir.join(format!("{}.request.json", name)), payload)?;
    write_json(&dir.join(format!("{}.response.json", name)), response)?;
    debug!("cached {} under {}", name, dir.display());
    Ok(())
}

/// Structured-output request body for a single prompt
pub fn build_text_payload(prompt: &str, model: &TextModel, schema: Value, name: &str) -> Value {
    let mut payload = json!({
        "model": model.model,
        "input": [{"role": "user", "content": [{"type": "input_text", "text": prompt}]}],
        "text": {
            "format": {"type": "json_schema", "name": name, "schema": schema, "strict": true}
        },
        "max_output_tokens": model.max_output_tokens,
        "store": model.store,
    });
    if let Some(effort) = &model.reasoning_effort {
        payload["reasoning"] = json!({ "effort": effort });
    }
    payload
}

/// First JSON object found in the response output, if any
pub fn parse_response_json(response: &Value) -> Option<Value> {
    let outputs = response.get("output")?.as_array()?;
    for item in outputs
        .iter()
        .filter_map(|o| o.get("content").and_then(Value::as_array))
        .flatten()
    {
        if let Some(obj) = item.get("json").filter(|v| v.is_object()) {
            return Some(obj.clone());
        }
        if let Some(text) = item.get("text").and_then(Value::as_str) {
            if text.is_empty() {
                continue;
            }
            return match serde_json::from_str(text) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Failed to parse model output as JSON: {}", e);
                    None
                }
            };
        }
    }
    None
}

/// Cards from a `{"cards": [...]}` body. Entries that do not deserialize are
/// logged and skipped so the rest of the batch survives.
pub fn parse_cards<T: DeserializeOwned>(body: Option<Value>, what: &str) -> Vec<T> {
    let Some(Value::Array(entries)) = body.and_then(|b| b.get("cards").cloned()) else {
        return Vec::new();
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value(entry) {
            Ok(card) => Some(card),
            Err(e) => {
                warn!("Discarding malformed {} card {}: {}", what, i, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_text_output() {
        let response = json!({
            "output": [
                {"type": "reasoning", "summary": []},
                {"content": [{"type": "output_text", "text": "{\"cards\": []}"}]}
            ]
        });
        assert_eq!(parse_response_json(&response), Some(json!({"cards": []})));
    }

    #[test]
    fn test_parse_json_output() {
        let response = json!({"output": [{"content": [{"json": {"a": 1}}]}]});
        assert_eq!(parse_response_json(&response), Some(json!({"a": 1})));
    }

    #[test]
    fn test_parse_garbage() {
        let response = json!({"output": [{"content": [{"text": "not json"}]}]});
        assert_eq!(parse_response_json(&response), None);
        assert_eq!(parse_response_json(&json!({})), None);
    }

    #[test]
    fn test_payload_shape() {
        let config = GenConfig::default();
        let payload = build_text_payload("hi", &config.models.text, json!({}), "policies");
        assert_eq!(payload["text"]["format"]["name"], "policies");
        assert_eq!(payload["text"]["format"]["strict"], true);
        assert_eq!(payload["reasoning"]["effort"], "high");
        assert_eq!(payload["store"], false);

        let mut model = config.models.text.clone();
        model.reasoning_effort = None;
        let payload = build_text_payload("hi", &model, json!({}), "policies");
        assert!(payload.get("reasoning").is_none());
    }

    #[test]
    fn test_retry_policy() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert_eq!(backoff(0), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_dummy_client_skips_network() {
        let client = OpenAiClient::dummy(&GenConfig::default().runtime).unwrap();
        assert!(client.is_dummy());
        let response = client.responses("policies", &json!({})).await.unwrap();
        assert_eq!(parse_response_json(&response), Some(json!({})));
    }
}
