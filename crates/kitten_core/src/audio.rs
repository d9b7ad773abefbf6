//! Audio value types shared by engines, the assembler and the response encoder.

use serde::{Deserialize, Serialize};

/// Silence inserted between consecutive chunks unless configured otherwise.
pub const DEFAULT_GAP_SECONDS: f64 = 0.1;

/// A mono buffer of samples in `[-1.0, 1.0]` paired with its sample rate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Zero-valued samples lasting `round(sample_rate * seconds)` samples.
    pub fn silence(sample_rate: u32, seconds: f64) -> Self {
        Self {
            samples: vec![0.0; silence_len(sample_rate, seconds)],
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Number of samples in a silence gap of `seconds` at `sample_rate`.
pub fn silence_len(sample_rate: u32, seconds: f64) -> usize {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (sample_rate as f64 * seconds).round() as usize
}

/// Response container requested by the client (OpenAI `response_format`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Wav,
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Pcm,
}

impl ResponseFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Opus => "audio/opus",
            Self::Aac => "audio/aac",
            Self::Flac => "audio/flac",
            Self::Pcm => "audio/pcm",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Pcm => "pcm",
        }
    }
}

/// Bytes ready to be sent, tagged with the format that was actually produced.
#[derive(Debug, Clone)]
pub struct EncodedAudio {
    pub bytes: Vec<u8>,
    pub format: ResponseFormat,
}

impl EncodedAudio {
    pub fn filename(&self) -> String {
        format!("speech.{}", self.format.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_length_rounds() {
        assert_eq!(AudioBuffer::silence(22050, 0.1).len(), 2205);
        assert_eq!(AudioBuffer::silence(44100, 0.1).len(), 4410);
        assert_eq!(AudioBuffer::silence(16000, 0.0).len(), 0);
        assert!(AudioBuffer::silence(16000, 0.1).samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_duration() {
        let buf = AudioBuffer::new(vec![0.0; 11025], 22050);
        assert!((buf.duration_secs() - 0.5).abs() < 1e-9);
        assert_eq!(AudioBuffer::default().duration_secs(), 0.0);
    }

    #[test]
    fn test_response_format_parse() {
        let f: ResponseFormat = serde_json::from_str("\"flac\"").unwrap();
        assert_eq!(f, ResponseFormat::Flac);
        assert_eq!(f.content_type(), "audio/flac");
        assert_eq!(ResponseFormat::default(), ResponseFormat::Mp3);
        assert!(serde_json::from_str::<ResponseFormat>("\"ogg\"").is_err());
    }

    #[test]
    fn test_encoded_filename() {
        let enc = EncodedAudio {
            bytes: vec![],
            format: ResponseFormat::Wav,
        };
        assert_eq!(enc.filename(), "speech.wav");
    }
}
