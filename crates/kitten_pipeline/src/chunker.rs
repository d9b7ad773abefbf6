//! Splits long text into synthesis-sized chunks.
//!
//! Boundary preference is paragraph > sentence > word > hard character split.
//! A lower level is only used for a unit that still exceeds the limit on its
//! own, and each paragraph is decomposed independently of its neighbours.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static RE_SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+\s+").unwrap());
static RE_PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SENTENCE_SEPARATOR: &str = " ";

/// Rough synthesis throughput used for time estimates.
const CHARS_PER_SECOND: f64 = 100.0;
const PER_CHUNK_OVERHEAD_SECS: f64 = 0.5;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chunk_size: usize,
}

impl TextChunker {
    pub fn new(max_chunk_size: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
        }
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Split `text` into ordered chunks of at most `max_chunk_size` characters.
    ///
    /// Blank input yields no chunks; input that already fits yields exactly one.
    /// Never fails: text without any boundary degrades to fixed-size slices.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let len = char_len(text);
        if len <= self.max_chunk_size {
            return vec![text.to_string()];
        }

        tracing::info!(
            "Chunking text of {} characters into chunks of max {}",
            len,
            self.max_chunk_size
        );

        let mut chunks = Packer::new(self.max_chunk_size, PARAGRAPH_SEPARATOR);
        for paragraph in RE_PARAGRAPH_BREAK.split(text) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            if char_len(paragraph) > self.max_chunk_size {
                for piece in self.split_paragraph(paragraph) {
                    chunks.push(piece);
                }
            } else {
                chunks.push(paragraph.to_string());
            }
        }

        let chunks = chunks.finish();
        tracing::info!("Split into {} chunks", chunks.len());
        chunks
    }

    /// Seconds of engine time `text` is expected to take, chunk overhead included.
    pub fn estimate_processing_time(&self, text: &str) -> Duration {
        Self::estimate(char_len(text), self.chunk(text).len())
    }

    /// Same heuristic for callers that have already chunked the text.
    pub fn estimate(char_count: usize, chunk_count: usize) -> Duration {
        let base = char_count as f64 / CHARS_PER_SECOND;
        let overhead = chunk_count as f64 * PER_CHUNK_OVERHEAD_SECS;
        Duration::from_secs_f64(base + overhead)
    }

    fn split_paragraph(&self, paragraph: &str) -> Vec<String> {
        let mut grouped = Packer::new(self.max_chunk_size, SENTENCE_SEPARATOR);
        for sentence in split_sentences(paragraph) {
            grouped.push(sentence);
        }

        let mut pieces = Vec::new();
        for chunk in grouped.finish() {
            if char_len(&chunk) <= self.max_chunk_size {
                pieces.push(chunk);
            } else {
                pieces.extend(self.split_by_words(&chunk));
            }
        }
        pieces
    }

    fn split_by_words(&self, text: &str) -> Vec<String> {
        let mut words = Packer::new(self.max_chunk_size, SENTENCE_SEPARATOR);
        for word in text.split_whitespace() {
            if char_len(word) > self.max_chunk_size {
                // Only place content is cut mid-token.
                for slice in hard_split(word, self.max_chunk_size) {
                    words.emit(slice);
                }
                continue;
            }
            words.push(word.to_string());
        }
        words.finish()
    }
}

/// Sentences keep their terminating punctuation.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in RE_SENTENCE_END.find_iter(paragraph) {
        let sentence = paragraph[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = m.end();
    }
    let tail = paragraph[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

fn hard_split(word: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Greedy accumulator: appends a piece to the open chunk while
/// `len(open) + len(separator) + len(piece) <= limit`, otherwise starts a new one.
struct Packer {
    limit: usize,
    separator: &'static str,
    open: String,
    open_len: usize,
    done: Vec<String>,
}

impl Packer {
    fn new(limit: usize, separator: &'static str) -> Self {
        Self {
            limit,
            separator,
            open: String::new(),
            open_len: 0,
            done: Vec::new(),
        }
    }

    fn push(&mut self, piece: String) {
        let piece_len = char_len(&piece);
        let sep_len = char_len(self.separator);
        if !self.open.is_empty() && self.open_len + piece_len + sep_len > self.limit {
            self.flush();
        }
        if self.open.is_empty() {
            self.open = piece;
            self.open_len = piece_len;
        } else {
            self.open.push_str(self.separator);
            self.open.push_str(&piece);
            self.open_len += sep_len + piece_len;
        }
    }

    /// Close the open chunk and append `piece` as a chunk of its own.
    fn emit(&mut self, piece: String) {
        self.flush();
        if !piece.trim().is_empty() {
            self.done.push(piece);
        }
    }

    fn flush(&mut self) {
        let open = std::mem::take(&mut self.open);
        self.open_len = 0;
        let trimmed = open.trim();
        if !trimmed.is_empty() {
            self.done.push(trimmed.to_string());
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.done
    }
}
