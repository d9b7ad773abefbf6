//! Text chunking and audio reassembly pipeline.
//!
//! raw text → validated text → ordered chunks → ordered segments → one buffer.

pub mod assembler;
pub mod chunker;
pub mod error;
pub mod orchestrator;
pub mod validator;

pub use assembler::assemble;
pub use chunker::TextChunker;
pub use error::{ChunkFailure, PipelineError};
pub use orchestrator::{PipelineStage, SpeechPipeline, SpeechRequest, SynthesisOutcome};
pub use validator::{validate, MIN_TEXT_CHARS};
