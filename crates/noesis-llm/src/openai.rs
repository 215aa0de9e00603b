//! OpenAI-compatible chat completion provider with SSE streaming.

use crate::provider::{Generated, GenerationProvider, TextStream, FALLBACK_TEXT};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_SYSTEM_PROMPT: &str =
    "You are Noesis, an ethical synthetic cognition assistant.";
const DEFAULT_TEMPERATURE: f32 = 0.4;

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn request_body(&self, prompt: &str, system_prompt: Option<&str>, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT).to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: DEFAULT_TEMPERATURE,
            stream,
        }
    }
}

#[async_trait::async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Generated {
        let body = self.request_body(prompt, system_prompt, false);
        debug!("Generation request: model={}", body.model);

        let response = match self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Generation request failed: {} — degrading", e);
                return Generated::degraded();
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!("Generation error {}: {} — degrading", status, text);
            return Generated::degraded();
        }

        match response.json::<ChatResponse>().await {
            Ok(parsed) => match parsed.choices.into_iter().next() {
                Some(choice) => Generated::Text(choice.message.content),
                None => {
                    warn!("Generation response had no choices — degrading");
                    Generated::degraded()
                }
            },
            Err(e) => {
                warn!("Generation response not parsable: {} — degrading", e);
                Generated::degraded()
            }
        }
    }

    async fn stream(&self, prompt: &str, system_prompt: Option<&str>) -> TextStream {
        let body = self.request_body(prompt, system_prompt, true);

        let response = match self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!("Generation stream error {} — degrading", r.status());
                return Box::pin(futures::stream::once(async {
                    FALLBACK_TEXT.to_string()
                }));
            }
            Err(e) => {
                warn!("Generation stream request failed: {} — degrading", e);
                return Box::pin(futures::stream::once(async {
                    FALLBACK_TEXT.to_string()
                }));
            }
        };

        Box::pin(parse_sse_stream(response.bytes_stream()))
    }
}

fn parse_sse_stream(
    bytes_stream: impl futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> impl futures::Stream<Item = String> + Send {
    async_stream::stream! {
        let mut buffer = String::new();

        tokio::pin!(bytes_stream);

        while let Some(chunk_result) = bytes_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    warn!("Generation stream interrupted: {}", e);
                    break;
                }
            };

            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(event_end) = buffer.find("\n\n") {
                let event_str = buffer[..event_end].to_string();
                buffer = buffer[event_end + 2..].to_string();

                for line in event_str.lines() {
                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return;
                    }
                    let Ok(delta) = serde_json::from_str::<StreamChunk>(data) else {
                        continue;
                    };
                    if let Some(content) = delta
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                    {
                        if !content.is_empty() {
                            yield content;
                        }
                    }
                }
            }
        }
    }
}

// ============================================================
// Wire types
// ============================================================

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn byte_stream(
        chunks: Vec<&'static str>,
    ) -> impl futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send {
        futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(bytes::Bytes::from_static(c.as_bytes()))),
        )
    }

    #[tokio::test]
    async fn sse_parser_collects_deltas() {
        let raw = vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
        ];
        let chunks: Vec<String> = parse_sse_stream(byte_stream(raw)).collect().await;
        assert_eq!(chunks.join(""), "Hello");
    }

    #[tokio::test]
    async fn sse_parser_handles_split_events() {
        // An event split across two network chunks must still parse.
        let raw = vec![
            "data: {\"choices\":[{\"delta\":{\"con",
            "tent\":\"xy\"}}]}\n\ndata: [DONE]\n\n",
        ];
        let chunks: Vec<String> = parse_sse_stream(byte_stream(raw)).collect().await;
        assert_eq!(chunks.join(""), "xy");
    }

    #[tokio::test]
    async fn sse_parser_skips_malformed_events() {
        let raw = vec![
            "data: not json\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
            "data: [DONE]\n\n",
        ];
        let chunks: Vec<String> = parse_sse_stream(byte_stream(raw)).collect().await;
        assert_eq!(chunks, vec!["ok"]);
    }
}
