//! `OpenAI` chat-completions client for drawing descriptions and stories

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::InferenceClient;
use crate::codec::{self, PNG_MIME};
use crate::config::LlmConfig;
use crate::{Error, Result};

/// Chat-completions client bound to one API key
pub struct OpenAiClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
    story_max_tokens: u32,
}

impl OpenAiClient {
    /// Create a client for the given key
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API key is empty
    pub fn new(client: Client, api_key: &SecretString, config: &LlmConfig) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for analysis".to_string(),
            ));
        }

        Ok(Self {
            client,
            api_key: SecretString::from(api_key.expose_secret().trim().to_owned()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            story_max_tokens: config.story_max_tokens,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "API error {status}: {}",
                api_error_message(&body)
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("failed to parse response: {e}")))?;

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::Inference("empty response from model".to_string()));
        }

        Ok(text)
    }
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    async fn describe(&self, image_png: &[u8], prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: codec::data_uri(PNG_MIME, image_png),
                        },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
        };

        let description = self.complete(&request).await?;
        tracing::debug!(model = %self.model, description = %description, "drawing described");
        Ok(description)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user",
                content: vec![ContentPart::Text {
                    text: prompt.to_string(),
                }],
            }],
            max_tokens: self.story_max_tokens,
        };

        let text = self.complete(&request).await?;
        tracing::debug!(model = %self.model, chars = text.len(), "text generated");
        Ok(text)
    }
}

/// Pull `error.message` out of an API error body, falling back to the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}
