//! Deterministic tone engine standing in for a neural model in development and tests.

use crate::{EngineCapabilities, SpeechSynthesizer};
use anyhow::Result;
use async_trait::async_trait;
use kitten_core::AudioBuffer;

/// Seconds of audio produced per input character at speed 1.0.
const SECS_PER_CHAR: f64 = 0.06;
const MIN_DURATION_SECS: f64 = 0.2;
const AMPLITUDE: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    sample_rate: u32,
    voices: Vec<String>,
    max_parallel_calls: usize,
}

impl ToneSynthesizer {
    pub fn new(sample_rate: u32, voices: Vec<String>) -> Self {
        Self {
            sample_rate,
            voices,
            max_parallel_calls: 1,
        }
    }

    pub fn with_max_parallel_calls(mut self, n: usize) -> Self {
        self.max_parallel_calls = n.max(1);
        self
    }

    /// Each voice gets its own pitch so outputs are distinguishable.
    fn frequency_for(&self, voice: &str) -> f32 {
        let idx = self.voices.iter().position(|v| v == voice).unwrap_or(0);
        180.0 + 20.0 * idx as f32
    }

    fn render(sample_rate: u32, frequency: f32, chars: usize, speed: f32) -> Vec<f32> {
        let secs = (chars as f64 * SECS_PER_CHAR / speed.max(0.01) as f64).max(MIN_DURATION_SECS);
        let n = (secs * sample_rate as f64).round() as usize;
        let step = std::f32::consts::TAU * frequency / sample_rate as f32;
        (0..n).map(|i| AMPLITUDE * (step * i as f32).sin()).collect()
    }
}

#[async_trait]
impl SpeechSynthesizer for ToneSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str, speed: f32) -> Result<AudioBuffer> {
        if text.trim().is_empty() {
            anyhow::bail!("Cannot synthesize empty text");
        }
        if !self.voices.iter().any(|v| v == voice) {
            anyhow::bail!(
                "Voice '{}' not available. Choose from: {:?}",
                voice,
                self.voices
            );
        }
        let sample_rate = self.sample_rate;
        let frequency = self.frequency_for(voice);
        let chars = text.chars().count();
        let samples =
            tokio::task::spawn_blocking(move || Self::render(sample_rate, frequency, chars, speed))
                .await?;
        Ok(AudioBuffer::new(samples, sample_rate))
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            engine: "tone".to_string(),
            native_voices: self.voices.clone(),
            accelerated: false,
            execution_providers: vec!["cpu".to_string()],
            max_parallel_calls: self.max_parallel_calls,
        }
    }

    fn provider_name(&self) -> &'static str {
        "tone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ToneSynthesizer {
        ToneSynthesizer::new(22_050, vec!["expr-voice-2-f".into(), "expr-voice-5-m".into()])
    }

    #[tokio::test]
    async fn test_duration_scales_with_text_and_speed() {
        let tts = engine();
        let text = "x".repeat(100);
        let normal = tts.synthesize(&text, "expr-voice-5-m", 1.0).await.unwrap();
        let fast = tts.synthesize(&text, "expr-voice-5-m", 2.0).await.unwrap();
        assert_eq!(normal.sample_rate, 22_050);
        assert_eq!(normal.len(), 132_300); // 6.0s
        assert_eq!(fast.len(), 66_150);
        assert!(normal.samples.iter().all(|s| s.abs() <= AMPLITUDE));
    }

    #[tokio::test]
    async fn test_short_text_gets_minimum_duration() {
        let out = engine().synthesize("Hi", "expr-voice-2-f", 1.0).await.unwrap();
        assert_eq!(out.len(), 4410);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let tts = engine();
        let a = tts.synthesize("Hello world.", "expr-voice-2-f", 1.0).await.unwrap();
        let b = tts.synthesize("Hello world.", "expr-voice-2-f", 1.0).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_rejects_unknown_voice_and_empty_text() {
        let tts = engine();
        let err = tts.synthesize("Hello", "alloy", 1.0).await.unwrap_err();
        assert!(err.to_string().contains("not available"));
        assert!(tts.synthesize("   ", "expr-voice-2-f", 1.0).await.is_err());
    }

    #[test]
    fn test_capabilities() {
        let caps = engine().with_max_parallel_calls(0).capabilities();
        assert_eq!(caps.engine, "tone");
        assert_eq!(caps.native_voices.len(), 2);
        assert_eq!(caps.max_parallel_calls, 1);
        assert!(!caps.accelerated);
    }
}
