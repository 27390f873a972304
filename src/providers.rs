//! LLM provider clients
//!
//! Each client makes exactly one blocking request per call. There is no retry:
//! the first transport or API error is returned to the caller.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::types::{ModelParams, Provider, ReportPrompt};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; WeatherAlertBot/1.0)";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status; `body` is the provider's error payload
    #[error("{provider} API returned {status}: {body}")]
    Api {
        provider: Provider,
        status: StatusCode,
        body: String,
    },

    #[error("malformed {provider} response: {reason}")]
    Malformed { provider: Provider, reason: String },
}

/// Seam between the pipeline and an LLM provider
pub trait CompletionClient {
    fn provider(&self) -> Provider;

    fn complete(&self, prompt: &ReportPrompt, params: &ModelParams) -> Result<String, FetchError>;
}

fn build_http_client(provider: Provider) -> Result<reqwest::blocking::Client, FetchError> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|source| FetchError::Transport { provider, source })
}

/// POST a JSON body and return the raw response text of a 2xx reply
fn post_json<T: Serialize>(
    provider: Provider,
    request: reqwest::blocking::RequestBuilder,
    body: &T,
) -> Result<String, FetchError> {
    let response = request
        .json(body)
        .send()
        .map_err(|source| FetchError::Transport { provider, source })?;

    let status = response.status();
    let text = response
        .text()
        .map_err(|source| FetchError::Transport { provider, source })?;

    if !status.is_success() {
        return Err(FetchError::Api {
            provider,
            status,
            body: text,
        });
    }
    Ok(text)
}

// OpenAI chat completion types
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

fn chat_request<'a>(prompt: &'a ReportPrompt, params: &'a ModelParams) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &prompt.system {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &prompt.user,
    });

    ChatRequest {
        model: &params.model,
        messages,
        max_tokens: params.max_tokens,
        temperature: params.temperature,
    }
}

/// Pull the completion text out of `choices[0].message.content`
fn parse_chat_response(text: &str) -> Result<String, FetchError> {
    let malformed = |reason: String| FetchError::Malformed {
        provider: Provider::OpenAi,
        reason,
    };
    let response: ChatResponse =
        serde_json::from_str(text).map_err(|e| malformed(format!("{}: {}", e, text)))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| malformed("no message content in choices".to_string()))
}

pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl OpenAiClient {
    /// A missing key is sent as-is; the API answers with an auth error.
    pub fn new(api_key: Option<String>) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client(Provider::OpenAi)?,
            api_key: api_key.unwrap_or_default(),
        })
    }
}

impl CompletionClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn complete(&self, prompt: &ReportPrompt, params: &ModelParams) -> Result<String, FetchError> {
        let request = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key);
        let text = post_json(Provider::OpenAi, request, &chat_request(prompt, params))?;
        parse_chat_response(&text)
    }
}

// Anthropic messages types
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

fn messages_request<'a>(prompt: &'a ReportPrompt, params: &'a ModelParams) -> MessagesRequest<'a> {
    MessagesRequest {
        model: &params.model,
        max_tokens: params.max_tokens,
        system: prompt.system.as_deref(),
        messages: vec![ChatMessage {
            role: "user",
            content: &prompt.user,
        }],
        temperature: params.temperature,
    }
}

/// Concatenate every text block of the reply
fn parse_messages_response(text: &str) -> Result<String, FetchError> {
    let malformed = |reason: String| FetchError::Malformed {
        provider: Provider::Anthropic,
        reason,
    };
    let response: MessagesResponse =
        serde_json::from_str(text).map_err(|e| malformed(format!("{}: {}", e, text)))?;

    let blocks: Vec<String> = response
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect();

    if blocks.is_empty() {
        return Err(malformed("no text blocks in content".to_string()));
    }
    Ok(blocks.concat())
}

pub struct AnthropicClient {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl AnthropicClient {
    /// A missing key is sent as-is; the API answers with an auth error.
    pub fn new(api_key: Option<String>) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client(Provider::Anthropic)?,
            api_key: api_key.unwrap_or_default(),
        })
    }
}

impl CompletionClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn complete(&self, prompt: &ReportPrompt, params: &ModelParams) -> Result<String, FetchError> {
        let request = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let text = post_json(Provider::Anthropic, request, &messages_request(prompt, params))?;
        parse_messages_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompt() -> ReportPrompt {
        ReportPrompt {
            system: Some("You are a weather expert.".to_string()),
            user: "Generate threats.".to_string(),
        }
    }

    fn params(temperature: Option<f32>) -> ModelParams {
        ModelParams {
            model: "test-model".to_string(),
            max_tokens: 4000,
            temperature,
        }
    }

    #[test]
    fn test_chat_request_body() {
        let prompt = prompt();
        let params = params(Some(0.5));
        let body = serde_json::to_value(chat_request(&prompt, &params)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "test-model",
                "messages": [
                    {"role": "system", "content": "You are a weather expert."},
                    {"role": "user", "content": "Generate threats."}
                ],
                "max_tokens": 4000,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn test_chat_request_omits_temperature_and_system() {
        let prompt = ReportPrompt {
            system: None,
            user: "hi".to_string(),
        };
        let params = params(None);
        let body = serde_json::to_value(chat_request(&prompt, &params)).unwrap();
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_messages_request_body() {
        let prompt = prompt();
        let params = params(None);
        let body = serde_json::to_value(messages_request(&prompt, &params)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "test-model",
                "max_tokens": 4000,
                "system": "You are a weather expert.",
                "messages": [{"role": "user", "content": "Generate threats."}]
            })
        );
    }

    #[test]
    fn test_parse_chat_response() {
        let text = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Day 1: Severe Thunderstorm Risk"}}]}"#;
        assert_eq!(
            parse_chat_response(text).unwrap(),
            "Day 1: Severe Thunderstorm Risk"
        );
    }

    #[test]
    fn test_parse_chat_response_malformed() {
        assert!(matches!(
            parse_chat_response(r#"{"choices":[]}"#),
            Err(FetchError::Malformed { .. })
        ));
        assert!(matches!(
            parse_chat_response("<html>bad gateway</html>"),
            Err(FetchError::Malformed { .. })
        ));
    }

    #[test]
    fn test_parse_messages_response_joins_text_blocks() {
        let text = r#"{"content":[{"type":"text","text":"<div>"},{"type":"text","text":"</div>"}],"stop_reason":"end_turn"}"#;
        assert_eq!(parse_messages_response(text).unwrap(), "<div></div>");
    }

    #[test]
    fn test_parse_messages_response_without_text() {
        let text = r#"{"content":[]}"#;
        assert!(matches!(
            parse_messages_response(text),
            Err(FetchError::Malformed {
                provider: Provider::Anthropic,
                ..
            })
        ));
    }

    #[test]
    fn test_api_error_message_includes_body() {
        let err = FetchError::Api {
            provider: Provider::OpenAi,
            status: StatusCode::UNAUTHORIZED,
            body: r#"{"error":{"message":"Incorrect API key provided"}}"#.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("OpenAI API returned 401 Unauthorized"));
        assert!(msg.contains("Incorrect API key provided"));
    }
}
