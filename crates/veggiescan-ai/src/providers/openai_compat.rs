use crate::analyzer::ScanAnalyzer;
use crate::models::{ChatRequest, ChatResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Health checks must answer well inside a scan timeout.
const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Any server speaking the OpenAI `/chat/completions` dialect with image
/// parts, LM Studio being the usual one.
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: Client,
    health_timeout: Duration,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl OpenAiCompatProvider {
    pub fn new(
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
        max_tokens: Option<usize>,
        temperature: Option<f32>,
    ) -> Result<Self> {
        let timeout = timeout_secs.unwrap_or(30);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.unwrap_or_else(|| "google/gemma-3-4b".to_string()),
            base_url: base_url
                .unwrap_or_else(|| "http://localhost:1234/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            client,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            max_tokens,
            temperature,
        })
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Request body for one image
    pub fn build_request(&self, image: &[u8]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: crate::prompt::build_scan_messages(image),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }
}

#[async_trait]
impl ScanAnalyzer for OpenAiCompatProvider {
    fn provider(&self) -> &str {
        "openai-compatible"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn analyze(&self, image: &[u8]) -> Result<String> {
        let req = self.build_request(image);

        tracing::debug!(
            model = %self.model,
            image_bytes = image.len(),
            "Calling vision model"
        );

        let resp = self
            .authorized(
                self.client
                    .post(format!("{}/chat/completions", self.base_url))
                    .header("Content-Type", "application/json"),
            )
            .json(&req)
            .send()
            .await
            .context("Failed to send request to vision model")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                body = %body,
                "Vision model request failed"
            );
            anyhow::bail!("Vision model error {}: {}", status, body);
        }

        let chat_resp: ChatResponse = resp
            .json()
            .await
            .context("Failed to parse vision model response")?;

        tracing::debug!(
            usage = ?chat_resp.usage,
            "Vision model response received"
        );

        chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("Empty response from vision model"))
    }

    async fn health_check(&self) -> Result<()> {
        let resp = self
            .authorized(self.client.get(format!("{}/models", self.base_url)))
            .timeout(self.health_timeout)
            .send()
            .await
            .context("Vision model endpoint unreachable")?;
        if !resp.status().is_success() {
            anyhow::bail!("Vision model endpoint returned {}", resp.status());
        }
        Ok(())
    }
}
