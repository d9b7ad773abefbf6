//! OpenAI voice names → engine-native voice identifiers.

use crate::config::VoiceConfig;
use crate::error::UnknownVoice;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_ENGINE_VOICE: &str = "expr-voice-5-m";

pub fn default_voice_mapping() -> BTreeMap<String, String> {
    [
        ("alloy", "expr-voice-5-m"),
        ("echo", "expr-voice-2-m"),
        ("fable", "expr-voice-3-f"),
        ("onyx", "expr-voice-4-m"),
        ("nova", "expr-voice-5-f"),
        ("shimmer", "expr-voice-2-f"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// How a requested voice name was turned into an engine voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceResolution {
    /// Public name found in the mapping table.
    Mapped(String),
    /// Caller already used an engine-native identifier.
    Native(String),
    /// Unmapped name replaced by the default engine voice.
    Fallback(String),
}

impl VoiceResolution {
    pub fn engine_voice(&self) -> &str {
        match self {
            Self::Mapped(v) | Self::Native(v) | Self::Fallback(v) => v,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceMap {
    mapping: BTreeMap<String, String>,
    default_voice: String,
    #[serde(skip)]
    strict: bool,
}

impl Default for VoiceMap {
    fn default() -> Self {
        Self::from_config(&VoiceConfig::default())
    }
}

impl VoiceMap {
    pub fn from_config(config: &VoiceConfig) -> Self {
        let mapping = config
            .mapping
            .iter()
            .map(|(name, voice)| (name.trim().to_ascii_lowercase(), voice.clone()))
            .collect();
        Self {
            mapping,
            default_voice: config.default_voice.clone(),
            strict: config.strict,
        }
    }

    pub fn resolve(&self, name: &str) -> Result<VoiceResolution, UnknownVoice> {
        let key = name.trim().to_ascii_lowercase();
        if let Some(voice) = self.mapping.get(&key) {
            return Ok(VoiceResolution::Mapped(voice.clone()));
        }
        if self.is_engine_voice(name.trim()) {
            return Ok(VoiceResolution::Native(name.trim().to_string()));
        }
        if self.strict {
            return Err(UnknownVoice {
                name: name.to_string(),
                available: self.public_names(),
            });
        }
        tracing::debug!(
            "Voice '{}' is not mapped, falling back to {}",
            name,
            self.default_voice
        );
        Ok(VoiceResolution::Fallback(self.default_voice.clone()))
    }

    pub fn public_names(&self) -> Vec<String> {
        self.mapping.keys().cloned().collect()
    }

    fn is_engine_voice(&self, voice: &str) -> bool {
        voice == self.default_voice || self.mapping.values().any(|v| v == voice)
    }

    /// Distinct engine voices referenced by the table plus the default voice,
    /// in sorted order.
    pub fn engine_voices(&self) -> Vec<String> {
        let mut voices: Vec<String> = self.mapping.values().cloned().collect();
        voices.push(self.default_voice.clone());
        voices.sort();
        voices.dedup();
        voices
    }

    pub fn mapping(&self) -> &BTreeMap<String, String> {
        &self.mapping
    }

    pub fn default_voice(&self) -> &str {
        &self.default_voice
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_names() {
        let map = VoiceMap::default();
        assert_eq!(
            map.resolve("alloy").unwrap(),
            VoiceResolution::Mapped("expr-voice-5-m".into())
        );
        assert_eq!(map.resolve("Shimmer").unwrap().engine_voice(), "expr-voice-2-f");
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn test_native_passthrough() {
        let map = VoiceMap::default();
        assert_eq!(
            map.resolve("expr-voice-3-f").unwrap(),
            VoiceResolution::Native("expr-voice-3-f".into())
        );
    }

    #[test]
    fn test_unmapped_falls_back_unless_strict() {
        let map = VoiceMap::default();
        assert_eq!(
            map.resolve("darth").unwrap(),
            VoiceResolution::Fallback(DEFAULT_ENGINE_VOICE.into())
        );

        let strict = VoiceMap::from_config(&VoiceConfig {
            strict: true,
            ..VoiceConfig::default()
        });
        let err = strict.resolve("darth").unwrap_err();
        assert_eq!(err.name, "darth");
        assert_eq!(err.available.len(), 6);
    }

    #[test]
    fn test_default_voice_outside_mapping_is_an_engine_voice() {
        let map = VoiceMap::from_config(&VoiceConfig {
            mapping: BTreeMap::from([("alloy".to_string(), "expr-voice-3-m".to_string())]),
            default_voice: "expr-voice-2-f".into(),
            strict: false,
        });
        assert_eq!(map.engine_voices(), vec!["expr-voice-2-f", "expr-voice-3-m"]);
        let fallback = map.resolve("nova").unwrap();
        assert_eq!(fallback, VoiceResolution::Fallback("expr-voice-2-f".into()));
        assert!(map.engine_voices().iter().any(|v| v == fallback.engine_voice()));
        assert_eq!(
            map.resolve("expr-voice-2-f").unwrap(),
            VoiceResolution::Native("expr-voice-2-f".into())
        );
    }

    #[test]
    fn test_config_keys_are_case_insensitive() {
        let map = VoiceMap::from_config(&VoiceConfig {
            mapping: BTreeMap::from([(" Alloy".to_string(), "expr-voice-3-m".to_string())]),
            ..VoiceConfig::default()
        });
        assert_eq!(map.public_names(), vec!["alloy"]);
        assert_eq!(
            map.resolve("ALLOY").unwrap(),
            VoiceResolution::Mapped("expr-voice-3-m".into())
        );
    }

    #[test]
    fn test_engine_voices_dedup() {
        let map = VoiceMap::default();
        let voices = map.engine_voices();
        assert_eq!(voices.len(), 6);
        assert!(voices.windows(2).all(|w| w[0] < w[1]));
    }
}
