//! Splitting one long paragraph into a numbered thread.

use crate::cleaning::truncate_with_ellipsis;
use chainpulse_core::{HARD_CHAR_LIMIT, SOFT_CHAR_LIMIT};

/// Prefixes every chunk with `"{i}/{n} "` and re-truncates any chunk the
/// prefix pushed over the hard limit.
pub fn number_chunks(chunks: Vec<String>) -> Vec<String> {
    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let numbered = format!("{}/{} {}", i + 1, total, chunk);
            truncate_with_ellipsis(&numbered, HARD_CHAR_LIMIT)
        })
        .collect()
}

/// Byte ranges of the sentences in `text`, trimmed of surrounding
/// whitespace. A `.` ends a sentence only when whitespace or the end of the
/// text follows it, so URLs, domains and decimals stay whole.
fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let at_boundary = c == '.' && chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            push_trimmed(text, start, i + 1, &mut spans);
            start = i + 1;
        }
    }
    push_trimmed(text, start, text.len(), &mut spans);
    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<(usize, usize)>) {
    let piece = &text[start..end];
    let trimmed = piece.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = piece.len() - piece.trim_start().len();
    spans.push((start + lead, start + lead + trimmed.len()));
}

/// Greedily packs sentences into chunks of at most [`SOFT_CHAR_LIMIT`]
/// characters. Text that already fits is returned unchanged. Each chunk is a
/// slice of the input, so the text between packed sentences is kept as
/// written.
pub fn split_into_thread(text: &str) -> Vec<String> {
    if text.chars().count() <= SOFT_CHAR_LIMIT {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for (start, end) in sentence_spans(text) {
        match current {
            Some((chunk_start, chunk_end)) => {
                if text[chunk_start..end].chars().count() <= SOFT_CHAR_LIMIT {
                    current = Some((chunk_start, end));
                } else {
                    chunks.push(text[chunk_start..chunk_end].to_string());
                    current = Some((start, end));
                }
            }
            None => current = Some((start, end)),
        }
    }
    if let Some((chunk_start, chunk_end)) = current {
        chunks.push(text[chunk_start..chunk_end].to_string());
    }

    if chunks.len() > 1 {
        number_chunks(chunks)
    } else {
        chunks
            .into_iter()
            .map(|chunk| truncate_with_ellipsis(&chunk, HARD_CHAR_LIMIT))
            .collect()
    }
}
