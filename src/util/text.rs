//! Text helpers shared by the translation and speech adapters.
//!
//! Both upstream endpoints cap request size (translation by URL length,
//! speech by a ~100 character window), so long answers are cut into chunks
//! that end on sentence or clause punctuation where possible.

use std::sync::OnceLock;

use regex::Regex;

/// Sentence-ish pieces: a run of non-delimiters followed by its delimiters.
/// Covers ASCII and Urdu/Arabic punctuation.
fn piece_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[^.!?,;:\n۔؟،؛]+[.!?,;:\n۔؟،؛]*|[.!?,;:\n۔؟،؛]+")
            .expect("chunk boundary regex must compile")
    })
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Chunks prefer punctuation boundaries, then whitespace, and only cut
/// inside a word when a single word exceeds `max_chars`. Chunks are trimmed
/// and never empty.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in piece_pattern().find_iter(text).map(|m| m.as_str()) {
        if char_len(&current) + char_len(piece) <= max_chars {
            current.push_str(piece);
            continue;
        }
        flush(&mut current, &mut chunks);
        if char_len(piece) <= max_chars {
            current.push_str(piece);
            continue;
        }
        for word in piece.split_inclusive(char::is_whitespace) {
            if char_len(&current) + char_len(word) > max_chars {
                flush(&mut current, &mut chunks);
            }
            if char_len(word) <= max_chars {
                current.push_str(word);
            } else {
                let chars: Vec<char> = word.chars().collect();
                for part in chars.chunks(max_chars) {
                    flush(&mut current, &mut chunks);
                    current.extend(part);
                }
            }
        }
    }
    flush(&mut current, &mut chunks);
    chunks
}

/// Truncate to at most `max_chars` characters for log output.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn flush(current: &mut String, chunks: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}
