//! Seam to the external generation service.

use crate::error::{Result, SpeechcastError};
use crate::generation::types::{Fragment, GenerationRequest};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Forward-only, non-restartable sequence of response fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>;

/// A remote service that turns a script plus voice configuration into audio.
///
/// This trait allows swapping implementations (real HTTP client vs mock).
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &'static str;

    /// Issue a request and return its response stream.
    ///
    /// Failing to start the request and failing mid-stream are both
    /// reported as errors. Any error ends the attempt and, for a
    /// single-voice request, moves on to the fallback voice.
    async fn stream(&self, request: GenerationRequest) -> Result<FragmentStream>;
}


/// One scripted element of a mock response.
#[derive(Debug, Clone)]
pub enum MockStep {
    Fragment(Fragment),
    /// The stream breaks with a transport error.
    Fail(String),
}

impl MockStep {
    /// A raw 16-bit, 24 kHz PCM fragment carrying `pcm`.
    pub fn pcm(pcm: &[u8]) -> Self {
        Self::Fragment(Fragment::audio(BASE64.encode(pcm), "audio/L16;rate=24000"))
    }

    /// An already-encoded fragment tagged `mime_type`.
    pub fn encoded(bytes: &[u8], mime_type: &str) -> Self {
        Self::Fragment(Fragment::audio(BASE64.encode(bytes), mime_type))
    }

    pub fn empty() -> Self {
        Self::Fragment(Fragment::empty())
    }

    pub fn fail(message: &str) -> Self {
        Self::Fail(message.to_string())
    }
}

/// Scripted outcome of one request.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Stream(Vec<MockStep>),
    /// The request is rejected before any fragment is produced.
    Rejected(String),
}

/// Mock generation service for testing.
///
/// Responses are keyed by the prebuilt voice of the request; multi-speaker
/// requests and unknown voices get the default response.
#[derive(Clone)]
pub struct MockGenerationService {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    default_response: MockResponse,
    captured_requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl Default for MockGenerationService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationService {
    /// Create a mock whose default response is an empty, successful stream.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_response: MockResponse::Stream(Vec::new()),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script the response for requests using `voice`.
    pub fn with_voice(self, voice: &str, steps: Vec<MockStep>) -> Self {
        self.insert(voice, MockResponse::Stream(steps));
        self
    }

    /// Reject requests using `voice` before streaming starts.
    pub fn with_rejected_voice(self, voice: &str, message: &str) -> Self {
        self.insert(voice, MockResponse::Rejected(message.to_string()));
        self
    }

    /// Response for multi-speaker requests and unscripted voices.
    pub fn with_default(mut self, steps: Vec<MockStep>) -> Self {
        self.default_response = MockResponse::Stream(steps);
        self
    }

    pub fn with_default_rejection(mut self, message: &str) -> Self {
        self.default_response = MockResponse::Rejected(message.to_string());
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.captured_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    fn insert(&self, voice: &str, response: MockResponse) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(voice.to_string(), response);
        }
    }

    fn response_for(&self, request: &GenerationRequest) -> MockResponse {
        request
            .prebuilt_voice()
            .and_then(|voice| {
                self.responses
                    .lock()
                    .ok()
                    .and_then(|responses| responses.get(voice).cloned())
            })
            .unwrap_or_else(|| self.default_response.clone())
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        let response = self.response_for(&request);
        if let Ok(mut requests) = self.captured_requests.lock() {
            requests.push(request);
        }

        match response {
            MockResponse::Rejected(message) => Err(SpeechcastError::transport(message)),
            MockResponse::Stream(steps) => {
                let items: Vec<Result<Fragment>> = steps
                    .into_iter()
                    .map(|step| match step {
                        MockStep::Fragment(fragment) => Ok(fragment),
                        MockStep::Fail(message) => Err(SpeechcastError::transport(message)),
                    })
                    .collect();
                Ok(Box::pin(futures_util::stream::iter(items)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::types::SpeechConfig;
    use futures_util::StreamExt;

    fn request(voice: &str) -> GenerationRequest {
        GenerationRequest {
            model: "test-model".to_string(),
            script_text: "Hello".to_string(),
            speech_config: SpeechConfig::Prebuilt {
                voice: voice.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn scripted_voice_yields_fragments_then_error() {
        let service = MockGenerationService::new()
            .with_voice("Puck", vec![MockStep::pcm(&[0, 0]), MockStep::fail("reset")]);

        let mut stream = service.stream(request("Puck")).await.unwrap();
        assert!(stream.next().await.unwrap().is_ok());
        assert!(matches!(
            stream.next().await.unwrap(),
            Err(SpeechcastError::Transport { .. })
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn rejected_voice_fails_before_streaming() {
        let service = MockGenerationService::new().with_rejected_voice("Puck", "unknown voice");
        let result = service.stream(request("Puck")).await;
        assert!(matches!(result, Err(SpeechcastError::Transport { .. })));
        assert_eq!(service.request_count(), 1);
    }

    #[tokio::test]
    async fn unscripted_voice_uses_default() {
        let service = MockGenerationService::new().with_default(vec![MockStep::empty()]);
        let stream = service.stream(request("Kore")).await.unwrap();
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn requests_are_captured_in_order() {
        let service = MockGenerationService::new();
        let _ = service.stream(request("Puck")).await;
        let _ = service.stream(request("Zephyr")).await;

        let voices: Vec<String> = service
            .requests()
            .iter()
            .filter_map(|r| r.prebuilt_voice().map(str::to_string))
            .collect();
        assert_eq!(voices, vec!["Puck", "Zephyr"]);
    }

    #[test]
    fn service_trait_is_object_safe() {
        let service: Arc<dyn GenerationService> = Arc::new(MockGenerationService::new());
        assert_eq!(service.name(), "mock");
    }
}
