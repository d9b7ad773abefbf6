use kitten_core::{AssemblyError, EngineNotReady, UnknownVoice, ValidationError};
use thiserror::Error;

/// A single chunk that the engine could not synthesize.
#[derive(Debug)]
pub struct ChunkFailure {
    /// 1-based position of the chunk within the request.
    pub chunk_index: usize,
    pub cause: anyhow::Error,
}

/// Everything that can end a synthesis request early.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    UnknownVoice(#[from] UnknownVoice),

    #[error(transparent)]
    EngineNotReady(#[from] EngineNotReady),

    #[error("Text chunking produced no segments")]
    NoSegmentsProduced,

    #[error("Speech generation failed on chunk {chunk_index} of {chunk_count}: {cause:#}")]
    Synthesis {
        chunk_index: usize,
        chunk_count: usize,
        cause: anyhow::Error,
    },

    #[error("Audio assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Speech generation was cancelled")]
    Cancelled,
}

impl PipelineError {
    pub(crate) fn from_chunk(failure: ChunkFailure, chunk_count: usize) -> Self {
        Self::Synthesis {
            chunk_index: failure.chunk_index,
            chunk_count,
            cause: failure.cause,
        }
    }

    /// Whether the caller's input is at fault rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnknownVoice(_))
    }
}
