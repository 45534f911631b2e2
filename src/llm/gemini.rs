//! Google Gemini `generateContent` provider.

use super::provider::{LlmError, LlmProvider};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, model: impl AsRef<str>) -> Self {
        let model = model.as_ref();
        Self {
            api_key: api_key.into(),
            model: model.strip_prefix("models/").unwrap_or(model).to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: 0.0,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {"temperature": self.temperature}
        })
    }

    pub fn parse_response(&self, json: &Value) -> Result<String, LlmError> {
        if let Some(reason) = json
            .pointer("/promptFeedback/blockReason")
            .and_then(|v| v.as_str())
        {
            return Err(LlmError::Blocked {
                provider: self.name().to_string(),
                reason: reason.to_string(),
            });
        }

        let parts = json
            .pointer("/candidates/0/content/parts")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                LlmError::Parse("missing candidates[0].content.parts".to_string())
            })?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();

        if text.is_empty() {
            return Err(LlmError::Parse(
                "candidates[0].content.parts carried no text".to_string(),
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "calling gemini");
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                provider: self.name().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = resp.json().await?;
        let text = self.parse_response(&json)?;
        debug!(reply_len = text.len(), "gemini reply received");
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
