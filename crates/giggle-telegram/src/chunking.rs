// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splitting of replies that exceed Telegram's message length limit.
//!
//! Lengths are counted in UTF-8 bytes, which never undercounts the UTF-16
//! units Telegram measures.

/// Telegram's maximum text message length.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Splits text at a paragraph boundary before `max_len`.
///
/// Priority: double newline > single newline > space > hard split.
pub fn split_at_paragraph_boundary(text: &str, max_len: usize) -> (&str, &str) {
    if text.len() <= max_len {
        return (text, "");
    }

    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let search_region = &text[..cut];

    if let Some(pos) = search_region.rfind("\n\n").filter(|&pos| pos > 0) {
        return (&text[..pos], text[pos + 2..].trim_start());
    }

    if let Some(pos) = search_region.rfind('\n').filter(|&pos| pos > 0) {
        return (&text[..pos], text[pos + 1..].trim_start());
    }

    if let Some(pos) = search_region.rfind(' ').filter(|&pos| pos > 0) {
        return (&text[..pos], &text[pos + 1..]);
    }

    // A single character wider than `max_len` still has to make progress.
    if cut == 0 {
        cut = text.chars().next().map_or(text.len(), char::len_utf8);
    }
    (&text[..cut], &text[cut..])
}

/// Splits `text` into chunks of at most `max_len` bytes.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    loop {
        let (chunk, tail) = split_at_paragraph_boundary(rest, max_len);
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        if tail.is_empty() {
            break;
        }
        rest = tail;
    }
    if chunks.is_empty() {
        chunks.push(text);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(split_at_paragraph_boundary("hello", 10), ("hello", ""));
        assert_eq!(split_message("hello", 10), vec!["hello"]);
        assert_eq!(split_message("", 10), vec![""]);
    }

    #[test]
    fn prefers_paragraph_boundary() {
        let text = "First paragraph.\n\nSecond paragraph that is longer.";
        let (first, rest) = split_at_paragraph_boundary(text, 30);
        assert_eq!(first, "First paragraph.");
        assert_eq!(rest, "Second paragraph that is longer.");
    }

    #[test]
    fn falls_back_to_single_newline() {
        let text = "First line\nSecond line that is longer";
        let (first, rest) = split_at_paragraph_boundary(text, 20);
        assert_eq!(first, "First line");
        assert_eq!(rest, "Second line that is longer");
    }

    #[test]
    fn falls_back_to_space() {
        let text = "OneLongWordThen another word";
        let (first, rest) = split_at_paragraph_boundary(text, 20);
        assert_eq!(first, "OneLongWordThen");
        assert_eq!(rest, "another word");
    }

    #[test]
    fn hard_split_without_whitespace() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let (first, rest) = split_at_paragraph_boundary(text, 10);
        assert_eq!(first, "abcdefghij");
        assert_eq!(rest, "klmnopqrstuvwxyz");
    }

    #[test]
    fn hard_split_respects_char_boundaries() {
        let text = "ééééé";
        let (first, rest) = split_at_paragraph_boundary(text, 3);
        assert_eq!(first, "é");
        assert_eq!(rest, "éééé");

        let chunks = split_message("😂😂", 2);
        assert_eq!(chunks, vec!["😂", "😂"]);
    }

    #[test]
    fn long_reply_fits_telegram_limit() {
        let paragraph = "word ".repeat(99) + "end";
        let reply = vec![paragraph; 10].join("\n\n");
        assert!(reply.len() > 5000);

        let chunks = split_message(&reply, MAX_MESSAGE_LENGTH);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() <= MAX_MESSAGE_LENGTH));
        assert_eq!(chunks.join("\n\n"), reply);
    }

    #[test]
    fn unbroken_reply_is_hard_split() {
        let reply = "x".repeat(5000);
        let chunks = split_message(&reply, MAX_MESSAGE_LENGTH);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), MAX_MESSAGE_LENGTH);
        assert_eq!(chunks[1].len(), 5000 - MAX_MESSAGE_LENGTH);
    }
}
