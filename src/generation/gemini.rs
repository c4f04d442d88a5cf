//! Streaming client for the Gemini `streamGenerateContent` endpoint.
//!
//! Responses are read as server-sent events. Each `data:` line carries one
//! JSON response chunk whose first candidate part may hold inline audio.

use crate::config::Config;
use crate::error::{Result, SpeechcastError};
use crate::generation::service::{FragmentStream, GenerationService};
use crate::generation::types::{Fragment, GenerationRequest, InlineAudio, SpeechConfig};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error bodies longer than this are cut in messages.
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Default, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    data: String,
    #[serde(default)]
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

impl ApiError {
    fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("{} (code {code})", self.message),
            None => self.message.clone(),
        }
    }
}

/// Build the JSON request body for one generation request.
pub fn request_body(request: &GenerationRequest) -> Value {
    let speech_config = match &request.speech_config {
        SpeechConfig::Prebuilt { voice } => json!({
            "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
        }),
        SpeechConfig::MultiSpeaker { speakers } => {
            let configs: Vec<Value> = speakers
                .iter()
                .map(|s| {
                    json!({
                        "speaker": s.speaker,
                        "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": s.voice } }
                    })
                })
                .collect();
            json!({ "multiSpeakerVoiceConfig": { "speakerVoiceConfigs": configs } })
        }
    };

    json!({
        "contents": [{ "role": "user", "parts": [{ "text": request.script_text }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": speech_config,
        }
    })
}

/// Parse one SSE line.
///
/// Returns `None` for lines that carry no event payload (comments, other
/// fields, blank keep-alives). An `error` object in the payload becomes a
/// transport error.
pub fn parse_sse_data(line: &str) -> Option<Result<Fragment>> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let chunk: StreamChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Err(SpeechcastError::transport(format!(
                "unreadable response event: {e}"
            ))));
        }
    };

    if let Some(error) = chunk.error {
        return Some(Err(SpeechcastError::transport(error.describe())));
    }

    let inline = chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.inline_data);

    Some(Ok(Fragment {
        inline_audio: inline.map(|d| InlineAudio {
            data: d.data,
            mime_type: d.mime_type,
        }),
    }))
}

/// Splits a byte stream into text lines across chunk boundaries.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every line completed by them, without terminators.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw);
            lines.push(text.trim_end_matches(['\r', '\n']).to_string());
        }
        lines
    }

    /// The unterminated tail, if any.
    pub fn finish(self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.pending).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

/// Pull a readable message out of an error response body.
fn error_body_message(body: &str) -> String {
    if let Ok(chunk) = serde_json::from_str::<StreamChunk>(body)
        && let Some(error) = chunk.error
    {
        return error.describe();
    }
    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_ERROR_BODY_CHARS {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

/// HTTP client for the hosted speech model.
pub struct GeminiService {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiService {
    /// # Errors
    /// Returns `Transport` if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpeechcastError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a client from the `[service]` section and the API key environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.service.api_key()?;
        Self::new(
            config.service.endpoint.clone(),
            api_key,
            Duration::from_secs(config.service.request_timeout_secs),
        )
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:streamGenerateContent?alt=sse",
            self.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl GenerationService for GeminiService {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        let url = self.url(&request.model);
        let body = request_body(&request);
        tracing::debug!(url = %url, "sending generation request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| SpeechcastError::transport(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SpeechcastError::transport(format!(
                "service returned status {status}: {}",
                error_body_message(&text)
            )));
        }

        let mut bytes = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut lines = SseLineBuffer::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(SpeechcastError::transport(format!(
                            "response stream interrupted: {e}"
                        )));
                        return;
                    }
                };
                for line in lines.push(&chunk) {
                    if let Some(item) = parse_sse_data(&line) {
                        let failed = item.is_err();
                        yield item;
                        if failed {
                            return;
                        }
                    }
                }
            }
            if let Some(line) = lines.finish()
                && let Some(item) = parse_sse_data(&line)
            {
                yield item;
            }
        };

        let stream: FragmentStream = Box::pin(stream);
        Ok(stream)
    }
}
