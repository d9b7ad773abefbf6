//! WAV / PCM encoding of assembled audio and decoding of engine WAV output.

use anyhow::{Context, Result};
use kitten_core::{AudioBuffer, EncodedAudio, ResponseFormat};
use std::io::Cursor;

/// Formats produced without falling back to WAV.
pub const NATIVE_FORMATS: [ResponseFormat; 2] = [ResponseFormat::Wav, ResponseFormat::Pcm];

/// Encode `audio` for the requested format.
///
/// Only `wav` and `pcm` are produced natively. Compressed formats fall back
/// to WAV, and the returned `EncodedAudio::format` says so.
pub fn encode(audio: &AudioBuffer, format: ResponseFormat) -> Result<EncodedAudio> {
    match format {
        ResponseFormat::Wav => Ok(EncodedAudio {
            bytes: encode_wav(audio)?,
            format,
        }),
        ResponseFormat::Pcm => Ok(EncodedAudio {
            bytes: encode_pcm16(audio),
            format,
        }),
        other => {
            tracing::warn!(
                "Format '{}' not supported by the encoder, returning WAV",
                other.extension()
            );
            Ok(EncodedAudio {
                bytes: encode_wav(audio)?,
                format: ResponseFormat::Wav,
            })
        }
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// 16-bit mono PCM in a RIFF/WAV container.
pub fn encode_wav(audio: &AudioBuffer) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(44 + audio.len() * 2));
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("failed creating wav writer")?;
        for sample in &audio.samples {
            writer.write_sample(to_i16(*sample))?;
        }
        writer.finalize().context("failed finalizing wav")?;
    }
    Ok(cursor.into_inner())
}

/// Headerless 16-bit little-endian mono samples.
pub fn encode_pcm16(audio: &AudioBuffer) -> Vec<u8> {
    audio
        .samples
        .iter()
        .flat_map(|s| to_i16(*s).to_le_bytes())
        .collect()
}

/// Decode a WAV payload into mono `f32` samples, downmixing multi-channel audio.
pub fn decode_wav(bytes: &[u8]) -> Result<AudioBuffer> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).context("invalid WAV payload")?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("failed reading float samples")?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .context("failed reading integer samples")?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };
    Ok(AudioBuffer::new(samples, spec.sample_rate))
}
