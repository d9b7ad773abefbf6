use thiserror::Error;

// ============================================================================
// Validation
// ============================================================================

/// Why an input text was rejected before any synthesis work began.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Input text cannot be empty")]
    EmptyInput,
    #[error("Input text too short. Minimum length is {min} characters")]
    TooShort { min: usize, actual: usize },
    #[error("Input text too long. Maximum length is {limit} characters, got {actual}")]
    TooLong { limit: usize, actual: usize },
}

// ============================================================================
// Assembly
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("No audio segments to assemble")]
    NoSegments,
    /// The synthesizer broke its contract: every segment of one request must
    /// share the first segment's rate.
    #[error("Sample rate mismatch in segment {segment_index}: expected {expected} Hz, got {found} Hz")]
    SampleRateMismatch {
        segment_index: usize,
        expected: u32,
        found: u32,
    },
}

// ============================================================================
// Engine / voices
// ============================================================================

/// The synthesis engine has not finished initializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Speech engine is not ready yet")]
pub struct EngineNotReady;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown voice '{name}'. Choose from: {}", available.join(", "))]
pub struct UnknownVoice {
    pub name: String,
    pub available: Vec<String>,
}
