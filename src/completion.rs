use std::time::Duration;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};

use crate::config::CompletionSettings;
use crate::session::ChatTurn;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Deserialize)]
struct CompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Chat-completions client for any OpenAI compatible endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
    defaults: CompletionOptions,
}

impl CompletionClient {
    pub fn new(settings: &CompletionSettings) -> Self {
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            timeout,
            defaults: CompletionOptions {
                max_tokens: settings.max_tokens,
                temperature: settings.temperature,
            },
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, messages: &[ChatTurn]) -> Result<String> {
        self.complete_with(messages, self.defaults).await
    }

    /// Sends one request and returns the first choice's text. The whole
    /// exchange is bounded by the configured timeout.
    pub async fn complete_with(&self, messages: &[ChatTurn], options: CompletionOptions) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("No completion API key configured"))?;

        tokio::time::timeout(self.timeout, self.exchange(api_key, messages, options))
            .await
            .map_err(|_| anyhow!("Completion request timed out after {:?}", self.timeout))?
    }

    async fn exchange(&self, api_key: &str, messages: &[ChatTurn], options: CompletionOptions) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stream: false,
        };

        info!("Sending {} messages to completion model: {}", messages.len(), self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Completion API error {}: {}", status, error_text);
            return Err(anyhow!("Completion API error {}: {}", status, error_text));
        }

        let body = response.text().await?;
        parse_completion(&body)
    }
}

/// Extracts the first choice's text from a chat-completions payload.
pub fn parse_completion(body: &str) -> Result<String> {
    let response: CompletionResponse =
        serde_json::from_str(body).context("Malformed completion payload")?;

    if let Some(usage) = &response.usage {
        debug!(
            "Token usage - Prompt: {}, Completion: {}, Total: {}",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
    }

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| anyhow!("No response choices from completion service"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_choice() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "  Tell me about a recent project.  "}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 8, "total_tokens": 18}
        }"#;
        assert_eq!(parse_completion(body).unwrap(), "Tell me about a recent project.");
    }

    #[test]
    fn test_parse_rejects_unusable_payloads() {
        assert!(parse_completion("<html>bad gateway</html>").is_err());
        assert!(parse_completion(r#"{"choices": []}"#).is_err());
        assert!(parse_completion(r#"{"error": {"message": "invalid key"}}"#).is_err());
        assert!(parse_completion(r#"{"choices": [{"message": {"content": "   "}}]}"#).is_err());
        assert!(parse_completion(r#"{"choices": [{"message": {"content": null}}]}"#).is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let client = CompletionClient::new(&CompletionSettings::default());
        assert!(!client.is_configured());
        let err = client.complete(&[ChatTurn::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("No completion API key"));
    }
}
