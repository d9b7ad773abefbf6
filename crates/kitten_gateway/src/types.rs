use kitten_core::ResponseFormat;
use kitten_pipeline::SpeechRequest;
use kitten_voice::EngineCapabilities;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unix timestamp reported for every model in `/v1/models`.
const MODEL_CREATED: i64 = 1_677_610_602;
const MODEL_OWNER: &str = "kittentts";
pub const MODEL_IDS: [&str; 2] = ["tts-1", "tts-1-hd"];

fn default_model() -> String {
    "tts-1-hd".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

/// `POST /v1/audio/speech` body, OpenAI-compatible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequestBody {
    /// Accepted for compatibility; every model id uses the same engine.
    #[serde(default = "default_model")]
    pub model: String,
    pub input: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
    #[serde(default)]
    pub speed: Option<f32>,
}

impl SpeechRequestBody {
    pub fn format(&self) -> ResponseFormat {
        self.response_format.unwrap_or_default()
    }

    pub fn into_request(self) -> SpeechRequest {
        SpeechRequest {
            text: self.input,
            voice: self.voice,
            speed: self.speed,
        }
    }
}

// ============================================================================
// Informational responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RootInfo {
    pub message: &'static str,
    pub status: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct ModelEntry {
    pub id: &'static str,
    pub object: &'static str,
    pub created: i64,
    pub owned_by: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelEntry>,
}

impl ModelList {
    pub fn available() -> Self {
        Self {
            object: "list",
            data: MODEL_IDS
                .into_iter()
                .map(|id| ModelEntry {
                    id,
                    object: "model",
                    created: MODEL_CREATED,
                    owned_by: MODEL_OWNER,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VoiceData {
    pub openai_compatible: Vec<String>,
    pub native: Vec<String>,
    pub voice_mapping: BTreeMap<String, String>,
    pub total_voices: usize,
}

#[derive(Debug, Serialize)]
pub struct VoiceList {
    pub object: &'static str,
    pub data: VoiceData,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub model_type: &'static str,
    pub voices_available: usize,
    #[serde(flatten)]
    pub capabilities: EngineCapabilities,
}

#[derive(Debug, Serialize)]
pub struct HealthConfig {
    pub max_text_length: usize,
    pub max_total_chars: usize,
    pub max_chars_per_chunk: usize,
    pub chunking_enabled: bool,
    pub available_voices: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `model_not_loaded`.
    pub status: &'static str,
    pub model_loaded: bool,
    pub server_version: &'static str,
    pub model_info: Option<ModelInfo>,
    pub supported_formats: Vec<ResponseFormat>,
    pub config: HealthConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_body_defaults() {
        let body: SpeechRequestBody = serde_json::from_str(r#"{"input":"Hello"}"#).unwrap();
        assert_eq!(body.model, "tts-1-hd");
        assert_eq!(body.voice, "alloy");
        assert_eq!(body.format(), ResponseFormat::Mp3);
        assert!(body.speed.is_none());
    }

    #[test]
    fn test_speech_body_rejects_unknown_format() {
        let json = r#"{"input":"Hello","response_format":"ogg"}"#;
        assert!(serde_json::from_str::<SpeechRequestBody>(json).is_err());
    }

    #[test]
    fn test_into_request_keeps_raw_speed() {
        let body: SpeechRequestBody =
            serde_json::from_str(r#"{"input":"Hi there","voice":"nova","speed":9.5}"#).unwrap();
        let req = body.into_request();
        assert_eq!(req.text, "Hi there");
        assert_eq!(req.voice, "nova");
        assert_eq!(req.speed, Some(9.5));
    }

    #[test]
    fn test_model_list_shape() {
        let json = serde_json::to_value(ModelList::available()).unwrap();
        assert_eq!(json["object"], "list");
        assert_eq!(json["data"][0]["id"], "tts-1");
        assert_eq!(json["data"][1]["id"], "tts-1-hd");
        assert_eq!(json["data"][1]["owned_by"], "kittentts");
    }
}
