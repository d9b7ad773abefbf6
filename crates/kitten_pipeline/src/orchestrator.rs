//! Per-request state machine:
//! `Validating → Deciding → (SingleShot | Chunking → Synthesizing → Assembling) → Done`.

use crate::error::{ChunkFailure, PipelineError};
use crate::{assemble, validate, TextChunker};
use futures_util::stream::{self, StreamExt};
use kitten_core::config::{AudioConfig, TextLimits};
use kitten_core::{AudioBuffer, GatewayConfig, VoiceMap};
use kitten_voice::{EngineCell, SpeechSynthesizer};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Deciding,
    SingleShot,
    Chunking,
    Synthesizing,
    Assembling,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::Deciding => "deciding",
            Self::SingleShot => "single_shot",
            Self::Chunking => "chunking",
            Self::Synthesizing => "synthesizing",
            Self::Assembling => "assembling",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    /// Public (OpenAI) or engine-native voice name.
    pub voice: String,
    /// Unclamped; `None` means the configured default.
    pub speed: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub audio: AudioBuffer,
    pub chunks_processed: usize,
    /// Character count of the raw input.
    pub text_length: usize,
    /// Engine voice actually used.
    pub voice: String,
    pub speed: f32,
}

/// Validates, chunks, synthesizes and reassembles one request at a time.
///
/// Shared across requests; holds no per-request state.
pub struct SpeechPipeline {
    limits: TextLimits,
    audio: AudioConfig,
    voices: VoiceMap,
    chunker: TextChunker,
    engine: Arc<EngineCell>,
}

impl SpeechPipeline {
    pub fn new(config: &GatewayConfig, engine: Arc<EngineCell>) -> Self {
        Self {
            limits: config.text.clone(),
            audio: config.audio.clone(),
            voices: VoiceMap::from_config(&config.voices),
            chunker: TextChunker::new(config.text.max_chars_per_chunk),
            engine,
        }
    }

    pub fn limits(&self) -> &TextLimits {
        &self.limits
    }

    pub fn voices(&self) -> &VoiceMap {
        &self.voices
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    pub fn engine(&self) -> &EngineCell {
        &self.engine
    }

    /// Run one request to completion, or stop at the first error.
    ///
    /// Never returns partial audio: a failed chunk, a cancelled token or an
    /// assembly error drops everything synthesized so far.
    pub async fn run(
        &self,
        request: &SpeechRequest,
        cancel: &CancellationToken,
    ) -> Result<SynthesisOutcome, PipelineError> {
        let mut stage = PipelineStage::Validating;
        let result = self.run_stages(request, cancel, &mut stage).await;
        if let Err(e) = &result {
            if e.is_client_error() {
                tracing::debug!("Speech request rejected while {}: {}", stage, e);
            } else {
                tracing::warn!("Speech request failed while {}: {}", stage, e);
            }
        }
        result
    }

    async fn run_stages(
        &self,
        request: &SpeechRequest,
        cancel: &CancellationToken,
        stage: &mut PipelineStage,
    ) -> Result<SynthesisOutcome, PipelineError> {
        enter(stage, PipelineStage::Validating);
        validate(&request.text, self.limits.effective_max_chars())?;
        let resolution = self.voices.resolve(&request.voice)?;
        let voice = resolution.engine_voice().to_string();
        let speed = self
            .audio
            .clamp_speed(request.speed.unwrap_or(self.audio.default_speed));
        let engine = self.engine.get()?;
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        enter(stage, PipelineStage::Deciding);
        let text_length = request.text.chars().count();
        let chunked =
            self.limits.enable_chunking && text_length > self.chunker.max_chunk_size();
        tracing::info!(
            "Generating speech: {} chars, voice={} ({}), speed={:.2}, chunked={}",
            text_length,
            request.voice,
            voice,
            speed,
            chunked
        );

        if !chunked {
            enter(stage, PipelineStage::SingleShot);
            let audio = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                result = engine.synthesize(request.text.trim(), &voice, speed) => {
                    result.map_err(|cause| {
                        PipelineError::from_chunk(ChunkFailure { chunk_index: 1, cause }, 1)
                    })?
                }
            };
            enter(stage, PipelineStage::Done);
            return Ok(SynthesisOutcome {
                audio,
                chunks_processed: 1,
                text_length,
                voice,
                speed,
            });
        }

        enter(stage, PipelineStage::Chunking);
        let chunks = self.chunker.chunk(&request.text);
        if chunks.is_empty() {
            return Err(PipelineError::NoSegmentsProduced);
        }
        tracing::info!(
            "Estimated processing time for {} chunks: {:.1}s",
            chunks.len(),
            TextChunker::estimate(text_length, chunks.len()).as_secs_f64()
        );

        enter(stage, PipelineStage::Synthesizing);
        let segments = self
            .synthesize_chunks(&engine, &chunks, &voice, speed, cancel)
            .await?;

        enter(stage, PipelineStage::Assembling);
        let audio = assemble(segments, self.audio.gap_seconds)?;

        enter(stage, PipelineStage::Done);
        tracing::info!(
            "Generated {:.2}s of audio from {} chunks",
            audio.duration_secs(),
            chunks.len()
        );
        Ok(SynthesisOutcome {
            audio,
            chunks_processed: chunks.len(),
            text_length,
            voice,
            speed,
        })
    }

    /// Synthesize every chunk, yielding segments in chunk order whatever the
    /// completion order of in-flight calls.
    async fn synthesize_chunks(
        &self,
        engine: &Arc<dyn SpeechSynthesizer>,
        chunks: &[String],
        voice: &str,
        speed: f32,
        cancel: &CancellationToken,
    ) -> Result<Vec<AudioBuffer>, PipelineError> {
        let chunk_count = chunks.len();
        let concurrency = self
            .audio
            .chunk_concurrency
            .min(engine.capabilities().max_parallel_calls)
            .max(1);
        tracing::debug!(
            "Synthesizing {} chunks with concurrency {}",
            chunk_count,
            concurrency
        );

        // Index-driven: the run future must stay Send for axum handlers.
        let results = stream::iter(0..chunk_count)
            .map(move |i| {
                let chunk = chunks[i].as_str();
                async move {
                    tracing::debug!(
                        "Synthesizing chunk {}/{} ({} chars)",
                        i + 1,
                        chunk_count,
                        chunk.chars().count()
                    );
                    engine
                        .synthesize(chunk, voice, speed)
                        .await
                        .map_err(|cause| ChunkFailure {
                            chunk_index: i + 1,
                            cause,
                        })
                }
            })
            .buffered(concurrency);
        let mut results = std::pin::pin!(results);

        let mut segments = Vec::with_capacity(chunk_count);
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(
                        "Cancelled after {}/{} chunks",
                        segments.len(),
                        chunk_count
                    );
                    return Err(PipelineError::Cancelled);
                }
                next = results.next() => next,
            };
            match next {
                Some(Ok(segment)) => segments.push(segment),
                Some(Err(failure)) => return Err(PipelineError::from_chunk(failure, chunk_count)),
                None => break,
            }
        }
        Ok(segments)
    }
}

fn enter(stage: &mut PipelineStage, next: PipelineStage) {
    tracing::debug!("Pipeline stage: {} -> {}", stage, next);
    *stage = next;
}
