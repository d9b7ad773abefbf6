//! Voice module for the KittenTTS gateway
//!
//! Defines the synthesis adapter boundary, the engine lifecycle cell, the
//! bundled engines, and the response encoder.

mod codec;
mod engine;
mod remote;
mod retry;
mod synthesizer;
mod tone;

pub use codec::{decode_wav, encode, encode_pcm16, encode_wav, NATIVE_FORMATS};
pub use engine::{build_engine, engine_retry, EngineCell};
pub use remote::RemoteSynthesizer;
pub use retry::RetryConfig;
pub use synthesizer::{EngineCapabilities, SpeechSynthesizer};
pub use tone::ToneSynthesizer;
