use kitten_core::ValidationError;

/// Shortest trimmed input worth synthesizing.
pub const MIN_TEXT_CHARS: usize = 3;

/// Reject input before any chunking or synthesis work begins.
///
/// Lengths are counted in characters, not bytes. The size ceiling applies to
/// the raw input; the minimum applies to the trimmed text.
pub fn validate(text: &str, max_total_chars: usize) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let actual = text.chars().count();
    if actual > max_total_chars {
        return Err(ValidationError::TooLong {
            limit: max_total_chars,
            actual,
        });
    }

    let trimmed_len = trimmed.chars().count();
    if trimmed_len < MIN_TEXT_CHARS {
        return Err(ValidationError::TooShort {
            min: MIN_TEXT_CHARS,
            actual: trimmed_len,
        });
    }

    Ok(())
}
