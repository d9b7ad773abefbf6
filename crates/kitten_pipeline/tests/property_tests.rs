//! Property-based tests for the chunker and assembler.
//!
//! Chunking must be lossless, bounded and deterministic on arbitrary text;
//! assembly must preserve length and order for any set of equal-rate segments.

use kitten_core::audio::silence_len;
use kitten_core::AudioBuffer;
use kitten_pipeline::{assemble, TextChunker};
use proptest::prelude::*;

fn non_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Prose-like text: words of at most 12 characters (punctuation included),
/// spaces and paragraph breaks.
fn prose() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            8 => "[a-zA-Z]{1,10}[.!?]{0,2} ",
            1 => Just(" ".to_string()),
            1 => Just("\n\n".to_string()),
            1 => Just("\n \n".to_string()),
        ],
        0..200,
    )
    .prop_map(|parts| parts.concat())
}

/// Prose or loosely spaced character soup with arbitrarily long tokens.
fn any_text() -> impl Strategy<Value = String> {
    prop_oneof![prose(), "[a-zA-Z.! \n]{0,800}"]
}

// ============================================================================
// Chunker Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every chunk fits the limit, whatever the input shape.
    #[test]
    fn chunks_never_exceed_limit(text in any_text(), max in 1usize..120) {
        let chunker = TextChunker::new(max);
        for chunk in chunker.chunk(&text) {
            prop_assert!(chunk.chars().count() <= max, "{:?} exceeds {}", chunk, max);
        }
    }

    /// No chunk is empty or whitespace-only.
    #[test]
    fn chunks_are_never_blank(text in any_text(), max in 1usize..120) {
        for chunk in TextChunker::new(max).chunk(&text) {
            prop_assert!(!chunk.trim().is_empty());
        }
    }

    /// Only whitespace may change: every other character survives, in order.
    #[test]
    fn chunking_loses_no_content(text in any_text(), max in 1usize..120) {
        let chunks = TextChunker::new(max).chunk(&text);
        prop_assert_eq!(non_whitespace(&chunks.concat()), non_whitespace(&text));
    }

    /// Words that fit the limit are never cut.
    #[test]
    fn fitting_words_stay_whole(text in prose(), max in 12usize..120) {
        let original: Vec<&str> = text.split_whitespace().collect();
        prop_assume!(original.iter().all(|w| w.chars().count() <= max));
        let chunks = TextChunker::new(max).chunk(&text);
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        prop_assert_eq!(original, rejoined);
    }

    #[test]
    fn chunking_is_deterministic(text in prose(), max in 1usize..120) {
        let chunker = TextChunker::new(max);
        prop_assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }

    /// Text that already fits comes back as a single trimmed chunk.
    #[test]
    fn short_text_is_one_chunk(text in prose(), extra in 0usize..50) {
        let trimmed = text.trim();
        prop_assume!(!trimmed.is_empty());
        let max = trimmed.chars().count() + extra;
        prop_assert_eq!(TextChunker::new(max).chunk(&text), vec![trimmed.to_string()]);
    }

    /// Non-blank input always yields at least one chunk.
    #[test]
    fn non_blank_text_has_chunks(text in prose(), max in 1usize..120) {
        prop_assume!(!text.trim().is_empty());
        prop_assert!(!TextChunker::new(max).chunk(&text).is_empty());
    }

    /// **Never panics** on arbitrary Unicode, including multi-byte characters.
    #[test]
    fn chunker_never_panics(s in "\\PC{0,600}", max in 1usize..64) {
        let chunks = TextChunker::new(max).chunk(&s);
        for chunk in &chunks {
            prop_assert!(chunk.chars().count() <= max);
        }
    }
}

// ============================================================================
// Assembler Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Output length is the sum of segment lengths plus one gap per boundary,
    /// and each segment lands at its expected offset.
    #[test]
    fn assembly_preserves_length_and_order(
        lens in prop::collection::vec(0usize..500, 1..12),
        rate in prop::sample::select(vec![8_000u32, 16_000, 22_050, 24_000, 44_100]),
        gap in 0.0f64..0.5,
    ) {
        let segments: Vec<AudioBuffer> = lens
            .iter()
            .enumerate()
            .map(|(i, len)| AudioBuffer::new(vec![(i + 1) as f32; *len], rate))
            .collect();
        let out = assemble(segments, gap).unwrap();

        let gap_len = silence_len(rate, gap);
        let expected: usize = lens.iter().sum::<usize>() + gap_len * (lens.len() - 1);
        prop_assert_eq!(out.len(), expected);
        prop_assert_eq!(out.sample_rate, rate);

        let mut offset = 0;
        for (i, len) in lens.iter().enumerate() {
            if i > 0 {
                prop_assert!(out.samples[offset..offset + gap_len].iter().all(|s| *s == 0.0));
                offset += gap_len;
            }
            let value = (i + 1) as f32;
            prop_assert!(out.samples[offset..offset + len].iter().all(|s| *s == value));
            offset += len;
        }
    }

    /// A single odd sample rate anywhere fails the whole assembly.
    #[test]
    fn assembly_rejects_any_rate_mismatch(count in 2usize..8, bad in 1usize..8) {
        let bad = bad % count;
        prop_assume!(bad != 0);
        let segments: Vec<AudioBuffer> = (0..count)
            .map(|i| AudioBuffer::new(vec![0.1; 10], if i == bad { 16_000 } else { 22_050 }))
            .collect();
        prop_assert!(assemble(segments, 0.1).is_err());
    }
}
