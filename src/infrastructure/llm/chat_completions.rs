use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::ports::reasoning_port::LlmClient;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

pub struct ChatCompletionsClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: usize,
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
    max_tokens: usize,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f64,
        max_tokens: usize,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    fn request<'a>(&'a self, system: &'a str, prompt: &'a str) -> Request<'a> {
        Request {
            model: &self.model,
            messages: vec![
                Message { role: "system", content: system },
                Message { role: "user", content: prompt },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request(system, prompt))
            .send()
            .await
            .map_err(|e| DomainError::ReasoningUnavailable(format!("LLM request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::ReasoningUnavailable(format!("LLM API {status}: {body}")));
        }

        let parsed: Response = resp
            .json()
            .await
            .map_err(|e| DomainError::ReasoningParse(format!("Malformed LLM envelope: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::ReasoningParse("LLM returned no choices".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_has_system_then_user() {
        let client = ChatCompletionsClient::new(DEFAULT_BASE_URL, "k", DEFAULT_MODEL, 0.1, 1000);
        let json = serde_json::to_value(client.request("sys", "price this")).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "price this");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = ChatCompletionsClient::new("https://example.test/v1/", "k", "m", 0.0, 10);
        assert_eq!(client.base_url, "https://example.test/v1");
    }

    #[test]
    fn test_response_envelope() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"price\": 1}"}}]}"#;
        let parsed: Response = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{\"price\": 1}"));
    }
}
