//! Pure cleanup of raw model output. No network, no randomness.

use crate::thread::number_chunks;
use chainpulse_core::{
    ContentError, GeneratedContent, ELLIPSIS, HARD_CHAR_LIMIT, MIN_CONTENT_CHARS,
};
use regex::Regex;
use std::sync::OnceLock;

const MAX_LINES: usize = 3;

/// "Tweet 2:", "3." or "4)" list markers and bullets. Only one or two digit
/// list numbers count, so "2024: the year..." keeps its year.
fn line_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:tweet\s*\d+(?:\s*/\s*\d+)?\s*[:.)\-]?\s*|[1-9]\d?[.)]\s+|[-*•]\s+)",
        )
        .expect("line prefix pattern is valid")
    })
}

fn thread_counter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\(?(\d{1,2})\s*/\s*(\d{1,2})\)?\s+")
            .expect("thread counter pattern is valid")
    })
}

/// Drops a leading list marker. An `i/n` counter is only a marker when
/// `1 <= i <= n`, so "24/7 uptime" is left alone.
fn strip_line_prefix(line: &str) -> String {
    if let Some(caps) = thread_counter().captures(line) {
        let index: u32 = caps[1].parse().unwrap_or(0);
        let total: u32 = caps[2].parse().unwrap_or(0);
        if (1..=total).contains(&index) {
            let end = caps.get(0).map_or(0, |m| m.end());
            return line[end..].to_string();
        }
    }
    line_prefix().replace(line, "").into_owned()
}

fn reply_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:reply|response)\s*:\s*").expect("reply label pattern is valid")
    })
}

fn is_open_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '“' | '‘' | '`')
}

fn is_close_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’' | '`')
}

/// Removes matching quote characters around the whole text, repeatedly.
pub fn strip_wrapping_quotes(text: &str) -> &str {
    let mut current = text.trim();
    loop {
        let mut chars = current.chars();
        match (chars.next(), chars.next_back()) {
            (Some(open), Some(close)) if is_open_quote(open) && is_close_quote(close) => {
                current = current[open.len_utf8()..current.len() - close.len_utf8()].trim();
            }
            _ => return current,
        }
    }
}

/// Cuts text longer than `limit` characters so that, with the ellipsis
/// appended, it is exactly `limit` characters.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.chars().count());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Raw output to at most three cleaned lines, in order.
pub fn clean_lines(raw: &str) -> Vec<String> {
    strip_wrapping_quotes(raw)
        .lines()
        .map(strip_line_prefix)
        .map(|line| strip_wrapping_quotes(&line).to_string())
        .filter(|line| line.chars().count() > MIN_CONTENT_CHARS)
        .map(|line| truncate_with_ellipsis(&line, HARD_CHAR_LIMIT))
        .take(MAX_LINES)
        .collect()
}

/// One surviving line becomes a single post; several become a numbered
/// thread.
pub fn postprocess(raw: &str) -> Result<GeneratedContent, ContentError> {
    let mut lines = clean_lines(raw);
    match lines.len() {
        0 => Err(ContentError::NoValidContent),
        1 => Ok(GeneratedContent::Single(lines.remove(0))),
        _ => Ok(GeneratedContent::Thread(number_chunks(lines))),
    }
}

pub fn clean_reply(raw: &str) -> Result<String, ContentError> {
    let unlabeled = reply_label().replace(strip_wrapping_quotes(raw), "");
    let unquoted = strip_wrapping_quotes(&unlabeled);
    let unlabeled = reply_label().replace(unquoted, "");
    let text = unlabeled.trim();

    let length = text.chars().count();
    if length <= MIN_CONTENT_CHARS {
        return Err(ContentError::ReplyTooShort { length });
    }
    Ok(truncate_with_ellipsis(text, HARD_CHAR_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_wrapping_quotes() {
        assert_eq!(strip_wrapping_quotes("\"hello there\""), "hello there");
        assert_eq!(strip_wrapping_quotes("“curly quoted”"), "curly quoted");
        assert_eq!(strip_wrapping_quotes("'\"nested\"'"), "nested");
        assert_eq!(strip_wrapping_quotes("no quotes"), "no quotes");
        assert_eq!(strip_wrapping_quotes("\""), "\"");
        assert_eq!(strip_wrapping_quotes(""), "");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        let long = "a".repeat(300);
        let truncated = truncate_with_ellipsis(&long, HARD_CHAR_LIMIT);
        assert_eq!(truncated.chars().count(), 280);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().filter(|c| *c == 'a').count(), 277);

        assert_eq!(truncate_with_ellipsis("short", HARD_CHAR_LIMIT), "short");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let long = "é".repeat(281);
        let truncated = truncate_with_ellipsis(&long, HARD_CHAR_LIMIT);
        assert_eq!(truncated.chars().count(), 280);
    }

    #[test]
    fn test_clean_lines_strips_prefixes() {
        let raw = "Tweet 1: Celestia made data availability a product.\n\
                   2/3 Rollups now shop for blockspace like a commodity.\n\
                   3. The next question is who captures the fees.";
        let lines = clean_lines(raw);
        assert_eq!(
            lines,
            vec![
                "Celestia made data availability a product.",
                "Rollups now shop for blockspace like a commodity.",
                "The next question is who captures the fees.",
            ]
        );
    }

    #[test]
    fn test_clean_lines_keeps_numbers_inside_content() {
        let lines = clean_lines("2024 was the year restaking went mainstream.");
        assert_eq!(lines, vec!["2024 was the year restaking went mainstream."]);
    }

    #[test]
    fn test_clean_lines_keeps_leading_figures_that_are_not_numbering() {
        let raw = "24/7 uptime matters more than peak TPS for validators.\n\
                   2024: the year restaking went mainstream.\n\
                   (3/3) Fees are what is left once incentives end.";
        assert_eq!(
            clean_lines(raw),
            vec![
                "24/7 uptime matters more than peak TPS for validators.",
                "2024: the year restaking went mainstream.",
                "Fees are what is left once incentives end.",
            ]
        );
    }

    #[test]
    fn test_strip_line_prefix_counter_bounds() {
        assert_eq!(strip_line_prefix("1/3 Opening line"), "Opening line");
        assert_eq!(strip_line_prefix("0/3 Zero is not a position"), "0/3 Zero is not a position");
        assert_eq!(strip_line_prefix("10) Tenth point"), "Tenth point");
        assert_eq!(strip_line_prefix("100. Not a list"), "100. Not a list");
    }

    #[test]
    fn test_clean_lines_drops_noise_and_caps_at_three() {
        let raw = "First real line of analysis here.\n#Web3\n\n\
                   Second real line of analysis here.\n\
                   Third real line of analysis here.\n\
                   Fourth real line that gets discarded.";
        let lines = clean_lines(raw);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "Third real line of analysis here.");
    }

    #[test]
    fn test_clean_lines_truncates_long_lines() {
        let raw = format!("{}\nshort", "word ".repeat(80));
        let lines = clean_lines(&raw);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].chars().count(), 280);
        assert!(lines[0].ends_with("..."));
    }

    #[test]
    fn test_postprocess_monad_scenario() {
        let raw = "Monad keeps shipping.\nWorth watching the throughput claims.\n#Web3";
        let content = postprocess(raw).unwrap();
        assert_eq!(
            content,
            GeneratedContent::Thread(vec![
                "1/2 Monad keeps shipping.".to_string(),
                "2/2 Worth watching the throughput claims.".to_string(),
            ])
        );
    }

    #[test]
    fn test_postprocess_single_line() {
        let content = postprocess("\"Berachain's liquidity flywheel is live.\"").unwrap();
        assert_eq!(
            content,
            GeneratedContent::Single("Berachain's liquidity flywheel is live.".to_string())
        );
    }

    #[test]
    fn test_postprocess_nothing_valid() {
        assert_eq!(postprocess("#Web3\ngm\n\n"), Err(ContentError::NoValidContent));
        assert_eq!(postprocess(""), Err(ContentError::NoValidContent));
    }

    #[test]
    fn test_every_chunk_within_hard_limit() {
        let raw = (0..3)
            .map(|_| "x".repeat(400))
            .collect::<Vec<_>>()
            .join("\n");
        let content = postprocess(&raw).unwrap();
        assert_eq!(content.len(), 3);
        assert!(content
            .chunks()
            .iter()
            .all(|chunk| chunk.chars().count() <= HARD_CHAR_LIMIT));
    }

    #[test]
    fn test_clean_reply_strips_labels_and_quotes() {
        assert_eq!(
            clean_reply("Reply: \"Restaking risk is still underpriced.\"").unwrap(),
            "Restaking risk is still underpriced."
        );
        assert_eq!(
            clean_reply("\"response: Solid thread, the fee data backs it up.\"").unwrap(),
            "Solid thread, the fee data backs it up."
        );
    }

    #[test]
    fn test_clean_reply_too_short() {
        assert_eq!(
            clean_reply("Reply: \"gm ser\""),
            Err(ContentError::ReplyTooShort { length: 6 })
        );
    }

    #[test]
    fn test_clean_reply_truncates() {
        let reply = clean_reply(&"z".repeat(500)).unwrap();
        assert_eq!(reply.chars().count(), 280);
        assert!(reply.ends_with("..."));
    }
}
