use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::types::ModelConfig;
use crate::error::{CraigslistError, Result};
use crate::ports::classifier::{ClassificationRequest, TextClassifier};

/// Chat-completions client for any OpenAI-compatible endpoint, using the
/// `json_schema` response format.
pub struct ChatCompletionClassifier {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: Option<f32>,
}

impl ChatCompletionClassifier {
    pub fn new(
        model: impl Into<String>,
        config: &ModelConfig,
        api_key: Option<String>,
    ) -> std::result::Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[async_trait]
impl TextClassifier for ChatCompletionClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<serde_json::Value> {
        let start = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &request.schema_name,
                    strict: true,
                    schema: &request.schema,
                },
            },
        };

        let mut http_request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(ref key) = self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().await.map_err(|e| {
            warn!(error = %e, schema = %request.schema_name, "Model request failed");
            CraigslistError::ModelService {
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Model service error");
            return Err(CraigslistError::ModelService {
                reason: format!("HTTP {status}: {error_text}"),
            });
        }

        let chat: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| CraigslistError::ModelService {
                    reason: format!("unreadable completion response: {e}"),
                })?;

        let message = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| CraigslistError::ModelService {
                reason: "completion contained no choices".into(),
            })?;

        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            return Err(CraigslistError::ModelService {
                reason: format!("model refused: {refusal}"),
            });
        }

        let content = message.content.unwrap_or_default();
        debug!(
            model = %self.model,
            schema = %request.schema_name,
            duration_ms = start.elapsed().as_millis(),
            "Model completion"
        );
        trace!(schema = %request.schema_name, content = %content, "Model raw content");

        serde_json::from_str(&content).map_err(|e| CraigslistError::Validation {
            schema: request.schema_name.clone(),
            reason: format!("content is not JSON: {e}"),
        })
    }
}
