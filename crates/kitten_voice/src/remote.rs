//! Adapter for a synthesis engine served over HTTP.
//!
//! Request: `POST <url>` with `{"text", "voice", "speed"}`.
//! Response: a WAV body at whatever sample rate the engine runs.

use crate::codec::decode_wav;
use crate::retry::{with_retry, RetryConfig};
use crate::{EngineCapabilities, SpeechSynthesizer};
use anyhow::{Context, Result};
use async_trait::async_trait;
use kitten_core::AudioBuffer;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct RemoteRequest<'a> {
    text: &'a str,
    voice: &'a str,
    speed: f32,
}

pub struct RemoteSynthesizer {
    client: reqwest::Client,
    url: reqwest::Url,
    voices: Vec<String>,
    retry: RetryConfig,
    max_parallel_calls: usize,
}

impl RemoteSynthesizer {
    pub fn new(
        url: &str,
        voices: Vec<String>,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self> {
        let url = reqwest::Url::parse(url).context("Invalid remote engine URL")?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url,
            voices,
            retry,
            max_parallel_calls: 1,
        })
    }

    pub fn with_max_parallel_calls(mut self, n: usize) -> Self {
        self.max_parallel_calls = n.max(1);
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for RemoteSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str, speed: f32) -> Result<AudioBuffer> {
        let body = RemoteRequest { text, voice, speed };
        let response = with_retry(&self.retry, "Remote engine", || async {
            self.client
                .post(self.url.clone())
                .json(&body)
                .send()
                .await
                .map_err(anyhow::Error::from)
        })
        .await?;

        let bytes = response
            .bytes()
            .await
            .context("Failed to read remote engine response")?;
        let audio = decode_wav(&bytes).context("Remote engine returned invalid audio")?;
        tracing::debug!(
            "Remote engine produced {} samples at {} Hz",
            audio.len(),
            audio.sample_rate
        );
        Ok(audio)
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            engine: format!("remote ({})", self.url),
            native_voices: self.voices.clone(),
            accelerated: false,
            execution_providers: vec!["remote".to_string()],
            max_parallel_calls: self.max_parallel_calls,
        }
    }

    fn provider_name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_wav;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_factor: 1.0,
        }
    }

    fn wav_body() -> Vec<u8> {
        encode_wav(&AudioBuffer::new(vec![0.1; 240], 24_000)).unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_decodes_wav() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/synthesize")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "text": "Hello world.",
                "voice": "expr-voice-2-f"
            })))
            .with_status(200)
            .with_header("content-type", "audio/wav")
            .with_body(wav_body())
            .create_async()
            .await;

        let engine = RemoteSynthesizer::new(
            &format!("{}/synthesize", server.url()),
            vec!["expr-voice-2-f".into()],
            Duration::from_secs(5),
            fast_retry(),
        )
        .unwrap();
        let audio = engine
            .synthesize("Hello world.", "expr-voice-2-f", 1.0)
            .await
            .unwrap();
        assert_eq!(audio.sample_rate, 24_000);
        assert_eq!(audio.len(), 240);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/synthesize")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let engine = RemoteSynthesizer::new(
            &format!("{}/synthesize", server.url()),
            vec![],
            Duration::from_secs(5),
            fast_retry(),
        )
        .unwrap();
        let err = engine.synthesize("Hello", "v", 1.0).await.unwrap_err();
        assert!(err.to_string().contains("3 attempts"));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let rejected = server
            .mock("POST", "/synthesize")
            .with_status(422)
            .with_body("unknown voice")
            .expect(1)
            .create_async()
            .await;

        let engine = RemoteSynthesizer::new(
            &format!("{}/synthesize", server.url()),
            vec![],
            Duration::from_secs(5),
            fast_retry(),
        )
        .unwrap();
        let err = engine.synthesize("Hello", "v", 1.0).await.unwrap_err();
        assert!(err.to_string().contains("unknown voice"));
        rejected.assert_async().await;
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(RemoteSynthesizer::new("not a url", vec![], Duration::from_secs(1), fast_retry()).is_err());
    }
}
