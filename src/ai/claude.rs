use super::Completion;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
const MAX_TOKENS: u32 = 256;

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    text: String,
}

pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl ClaudeProvider {
    pub fn new(client: Client, api_key: String, model: Option<String>) -> Self {
        Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

#[async_trait]
impl Completion for ClaudeProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .context("claude API error")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.chars().take(1024).collect();
            anyhow::bail!("claude API {}: {}", status.as_u16(), body);
        }

        let parsed: ClaudeResponse = resp.json().await.context("decoding claude response")?;
        match parsed.content.into_iter().next() {
            Some(c) => Ok(c.text),
            None => anyhow::bail!("empty claude response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model() {
        let p = ClaudeProvider::new(Client::new(), "k".into(), None);
        assert_eq!(p.model, DEFAULT_MODEL);
        let p = ClaudeProvider::new(Client::new(), "k".into(), Some("claude-x".into()));
        assert_eq!(p.model, "claude-x");
    }

    #[test]
    fn test_request_shape() {
        let req = ClaudeRequest {
            model: "m",
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: "hi",
            }],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["max_tokens"], 256);
        assert_eq!(v["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_decoding() {
        let r: ClaudeResponse =
            serde_json::from_str(r#"{"id":"x","content":[{"type":"text","text":"SUMMARY: ok"}]}"#)
                .unwrap();
        assert_eq!(r.content[0].text, "SUMMARY: ok");
    }
}
