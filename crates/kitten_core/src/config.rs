use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::audio::DEFAULT_GAP_SECONDS;
use crate::voices::{default_voice_mapping, DEFAULT_ENGINE_VOICE};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub text: TextLimits,
    pub audio: AudioConfig,
    pub engine: EngineConfig,
    pub voices: VoiceConfig,
}

impl GatewayConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: GatewayConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                Self::from_env()
            }
        }
    }

    /// Defaults with env var overrides applied, no file involved.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    /// Apply `KITTENTTS_*` environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KITTENTTS_HOST") {
            self.server.host = v;
        }
        env_parse("KITTENTTS_PORT", &mut self.server.port);
        if let Ok(v) = std::env::var("KITTENTTS_LOG_LEVEL") {
            self.server.log_level = v.to_ascii_lowercase();
        }
        env_parse(
            "KITTENTTS_REQUEST_TIMEOUT_SECS",
            &mut self.server.request_timeout_secs,
        );
        env_parse("KITTENTTS_MAX_TEXT_LENGTH", &mut self.text.max_text_length);
        env_parse("KITTENTTS_MAX_TOTAL_CHARS", &mut self.text.max_total_chars);
        env_parse(
            "KITTENTTS_MAX_CHARS_PER_CHUNK",
            &mut self.text.max_chars_per_chunk,
        );
        if let Ok(v) = std::env::var("KITTENTTS_ENABLE_CHUNKING") {
            if let Some(b) = parse_bool(&v) {
                self.text.enable_chunking = b;
            }
        }
        env_parse("KITTENTTS_SAMPLE_RATE", &mut self.audio.default_sample_rate);
        if let Ok(v) = std::env::var("KITTENTTS_ENGINE") {
            match v.to_ascii_lowercase().as_str() {
                "tone" => self.engine.kind = EngineKind::Tone,
                "remote" => self.engine.kind = EngineKind::Remote,
                other => tracing::warn!("Ignoring unknown KITTENTTS_ENGINE '{}'", other),
            }
        }
        if let Ok(v) = std::env::var("KITTENTTS_ENGINE_URL") {
            self.engine.url = Some(v);
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, slot: &mut T) {
    if let Ok(v) = std::env::var(key) {
        match v.trim().parse() {
            Ok(n) => *slot = n,
            Err(_) => tracing::warn!("Ignoring unparseable {}={:?}", key, v),
        }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,
    /// Upper bound on one speech request, synthesis included.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            log_level: "info".to_string(),
            json_logs: false,
            request_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TextLimits {
    /// Single-shot cap, applied only when chunking is disabled.
    pub max_text_length: usize,
    /// Absolute ceiling on input size (HTTP 413 above it).
    pub max_total_chars: usize,
    pub max_chars_per_chunk: usize,
    pub enable_chunking: bool,
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            max_text_length: 4000,
            max_total_chars: 50_000,
            max_chars_per_chunk: 1200,
            enable_chunking: true,
        }
    }
}

impl TextLimits {
    /// The ceiling the validator enforces for the current chunking mode.
    pub fn effective_max_chars(&self) -> usize {
        if self.enable_chunking {
            self.max_total_chars
        } else {
            self.max_text_length.min(self.max_total_chars)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub default_sample_rate: u32,
    pub default_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Silence inserted between consecutive chunks.
    pub gap_seconds: f64,
    /// Chunks synthesized at once within one request. Capped by the engine.
    pub chunk_concurrency: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            default_sample_rate: 44_100,
            default_speed: 1.0,
            min_speed: 0.25,
            max_speed: 4.0,
            gap_seconds: DEFAULT_GAP_SECONDS,
            chunk_concurrency: 1,
        }
    }
}

impl AudioConfig {
    pub fn clamp_speed(&self, speed: f32) -> f32 {
        if !speed.is_finite() {
            return self.default_speed;
        }
        speed.clamp(self.min_speed, self.max_speed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Built-in deterministic tone generator (development / tests).
    #[default]
    Tone,
    /// External engine reached over HTTP.
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kind: EngineKind,
    pub url: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    /// Calls the engine accepts in parallel.
    pub max_parallel_calls: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Tone,
            url: None,
            timeout_secs: 120,
            max_attempts: 3,
            max_parallel_calls: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub mapping: BTreeMap<String, String>,
    pub default_voice: String,
    /// Reject unmapped voice names instead of falling back.
    pub strict: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            mapping: default_voice_mapping(),
            default_voice: DEFAULT_ENGINE_VOICE.to_string(),
            strict: false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
