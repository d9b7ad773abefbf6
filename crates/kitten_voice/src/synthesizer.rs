//! Text-to-Speech adapter trait definition

use anyhow::Result;
use async_trait::async_trait;
use kitten_core::AudioBuffer;
use serde::Serialize;

/// What an engine can do, reported once instead of probed per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineCapabilities {
    pub engine: String,
    pub native_voices: Vec<String>,
    pub accelerated: bool,
    pub execution_providers: Vec<String>,
    /// Calls this engine can serve at once for a single request.
    pub max_parallel_calls: usize,
}

/// Synthesis engine boundary: one call turns one chunk of text into samples.
///
/// Implementations may block for a text-length-dependent time; blocking work
/// belongs on `spawn_blocking`, not the async executor. Engines are shared
/// across concurrent requests, so any serialization of access is theirs.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with an engine-native `voice` at an already clamped `speed`.
    async fn synthesize(&self, text: &str, voice: &str, speed: f32) -> Result<AudioBuffer>;

    fn capabilities(&self) -> EngineCapabilities;

    /// Get the name of this TTS provider
    fn provider_name(&self) -> &'static str;
}
