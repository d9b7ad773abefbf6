//! Lifecycle of the shared synthesis engine.

use crate::{RemoteSynthesizer, RetryConfig, SpeechSynthesizer, ToneSynthesizer};
use anyhow::{Context, Result};
use kitten_core::config::EngineKind;
use kitten_core::{EngineNotReady, GatewayConfig, VoiceMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Holds the process-wide engine. Constructed empty, initialized exactly once.
///
/// Until `initialize` completes every `get` returns `EngineNotReady`, which the
/// gateway reports as 503 and `/health` as `model_not_loaded`.
#[derive(Default)]
pub struct EngineCell {
    inner: OnceCell<Arc<dyn SpeechSynthesizer>>,
}

impl EngineCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cell that is ready from the start.
    pub fn ready(engine: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            inner: OnceCell::new_with(Some(engine)),
        }
    }

    pub fn get(&self) -> Result<Arc<dyn SpeechSynthesizer>, EngineNotReady> {
        self.inner.get().cloned().ok_or(EngineNotReady)
    }

    pub fn is_ready(&self) -> bool {
        self.inner.initialized()
    }

    /// Run `init` unless the engine already exists. Concurrent callers wait for
    /// the first one; a failed init leaves the cell empty so it can be retried.
    pub async fn initialize<F, Fut>(&self, init: F) -> Result<Arc<dyn SpeechSynthesizer>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn SpeechSynthesizer>>>,
    {
        let engine = self.inner.get_or_try_init(init).await?;
        tracing::info!("Speech engine '{}' ready", engine.provider_name());
        Ok(engine.clone())
    }

    /// `initialize`, retried with backoff until it succeeds or
    /// `retry.max_attempts` is used up. The cell stays empty on final failure.
    pub async fn initialize_with_retry<F, Fut>(
        &self,
        retry: &RetryConfig,
        init: F,
    ) -> Result<Arc<dyn SpeechSynthesizer>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Arc<dyn SpeechSynthesizer>>>,
    {
        let max_attempts = retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.initialize(&init).await {
                Ok(engine) => return Ok(engine),
                Err(e) if attempt < max_attempts => {
                    let delay = retry.delay_after(attempt);
                    tracing::warn!(
                        "Engine initialization attempt {}/{} failed: {:#}. Retrying in {:?}",
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "Engine initialization failed after {} attempts",
                        max_attempts
                    )))
                }
            }
        }
    }
}

/// Backoff for engine calls and engine startup, bounded by `engine.max_attempts`.
pub fn engine_retry(config: &GatewayConfig) -> RetryConfig {
    RetryConfig {
        max_attempts: config.engine.max_attempts.max(1),
        ..RetryConfig::default()
    }
}

/// Construct the engine selected by `config.engine`.
pub async fn build_engine(config: &GatewayConfig) -> Result<Arc<dyn SpeechSynthesizer>> {
    let voices = VoiceMap::from_config(&config.voices).engine_voices();
    match config.engine.kind {
        EngineKind::Tone => Ok(Arc::new(
            ToneSynthesizer::new(config.audio.default_sample_rate, voices)
                .with_max_parallel_calls(config.engine.max_parallel_calls),
        )),
        EngineKind::Remote => {
            let url = config
                .engine
                .url
                .clone()
                .context("engine.url is required for the remote engine")?;
            let engine = RemoteSynthesizer::new(
                &url,
                voices,
                Duration::from_secs(config.engine.timeout_secs),
                engine_retry(config),
            )?
            .with_max_parallel_calls(config.engine.max_parallel_calls);
            Ok(Arc::new(engine))
        }
    }
}
