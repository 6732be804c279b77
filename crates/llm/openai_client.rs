use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::domain::{
    repositories::text_generation::TextGenerator, value_objects::generation::ChatPrompt,
};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// e.g. `https://api.openai.com/v1`, any OpenAI-compatible endpoint works.
    pub base_url: String,
    pub model: String,
}

pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    error: OpenAiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetails {
    message: Option<String>,
    #[serde(rename = "type")]
    type_: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build openai http client")?;

        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, prompt: ChatPrompt) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: 0.8,
        };

        let resp = self
            .http
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let details = serde_json::from_str::<OpenAiErrorEnvelope>(&body)
                .ok()
                .map(|envelope| envelope.error);
            error!(
                status = %status,
                model = %self.config.model,
                openai_error_type = ?details.as_ref().and_then(|d| d.type_.as_deref()),
                openai_error_message = ?details.as_ref().and_then(|d| d.message.as_deref()),
                "llm: chat completion failed"
            );
            anyhow::bail!("chat completion failed with status {}", status);
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .context("invalid chat completion response")?;

        let content = first_content(parsed)?;
        debug!(chars = content.len(), "llm: chat completion received");
        Ok(content)
    }
}

fn first_content(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| anyhow::anyhow!("chat completion returned no content"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_content_takes_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  1. Hook\n2. Payoff \n" } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        }))
        .unwrap();

        assert_eq!(first_content(response).unwrap(), "1. Hook\n2. Payoff");
    }

    #[test]
    fn empty_choices_are_an_error() {
        let response: ChatCompletionResponse =
            serde_json::from_value(serde_json::json!({ "choices": [] })).unwrap();
        assert!(first_content(response).is_err());

        let response: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [ { "message": { "content": null } } ]
        }))
        .unwrap();
        assert!(first_content(response).is_err());
    }

    #[test]
    fn request_serializes_as_chat_messages() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.8,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let client = OpenAiClient::new(OpenAiConfig {
            api_key: "sk-test".to_string(),
            base_url: "https://api.openai.com/v1/".to_string(),
            model: "gpt-4o-mini".to_string(),
        })
        .unwrap();

        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }
}
