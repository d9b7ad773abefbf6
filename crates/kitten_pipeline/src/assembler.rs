use kitten_core::{AssemblyError, AudioBuffer};

/// Concatenate segments in order with `gap_seconds` of silence between each pair.
///
/// All segments must share one sample rate. Nothing is built until every
/// segment has been checked, so a mismatch never yields a partial buffer.
pub fn assemble(segments: Vec<AudioBuffer>, gap_seconds: f64) -> Result<AudioBuffer, AssemblyError> {
    let first = segments.first().ok_or(AssemblyError::NoSegments)?;
    let sample_rate = first.sample_rate;

    if let Some((segment_index, seg)) = segments
        .iter()
        .enumerate()
        .find(|(_, s)| s.sample_rate != sample_rate)
    {
        return Err(AssemblyError::SampleRateMismatch {
            segment_index,
            expected: sample_rate,
            found: seg.sample_rate,
        });
    }

    let gap = AudioBuffer::silence(sample_rate, gap_seconds);
    let total =
        segments.iter().map(AudioBuffer::len).sum::<usize>() + gap.len() * (segments.len() - 1);
    let mut samples = Vec::with_capacity(total);

    for (i, seg) in segments.into_iter().enumerate() {
        if i > 0 {
            samples.extend_from_slice(&gap.samples);
        }
        samples.extend(seg.samples);
    }

    tracing::debug!(
        "Assembled {} samples ({:.2}s) at {} Hz",
        samples.len(),
        samples.len() as f64 / sample_rate as f64,
        sample_rate
    );
    Ok(AudioBuffer::new(samples, sample_rate))
}
