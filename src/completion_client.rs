use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

/// Chat-completion client for the text generation provider.
///
/// The route layer owns the prompts; this adapter only carries them over
/// the wire and hands back the first choice's content.
#[derive(Debug)]
pub struct CompletionClient {
    http_client: Client,
    base_url: Url,
    api_key: Secret<String>,
    model: String,
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(serde::Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(thiserror::Error, Debug)]
pub enum CompletionError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error("completion response contained no choices")]
    EmptyResponse,
}

impl CompletionClient {
    pub fn new(base_url: Url, api_key: Secret<String>, model: String, timeout: Duration) -> Self {
        let http_client = Client::builder().timeout(timeout).build().unwrap();

        Self {
            http_client,
            base_url,
            api_key,
            model,
        }
    }

    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, CompletionError> {
        let url = self.base_url.join("/v1/chat/completions")?;

        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature,
            max_tokens,
        };

        let response: ChatCompletionResponse = self
            .http_client
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?
            .message
            .content;

        Ok(content.trim().to_string())
    }
}
