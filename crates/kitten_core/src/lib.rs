pub mod audio;
pub mod config;
pub mod error;
pub mod voices;

pub use audio::{AudioBuffer, EncodedAudio, ResponseFormat};
pub use config::GatewayConfig;
pub use error::{AssemblyError, EngineNotReady, UnknownVoice, ValidationError};
pub use voices::{VoiceMap, VoiceResolution};

/// Server version reported by the informational endpoints.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
