//! Completed-word and completed-sentence extraction.
//!
//! A trigger offset is the cursor position right after a boundary-completing
//! input (space, punctuation, enter, paste). The resolver never assumes the
//! word ends at `trigger - 1`: it first steps back over the boundary run that
//! completed the word, then expands in both directions, so a cursor that was
//! moved into the middle of a word still yields the whole word.

use crate::script::contains_target_script;
use crate::unicode::{is_sentence_terminator, is_word_boundary};

/// Minimum word length in chars; shorter words are never sent for correction.
pub const MIN_WORD_CHARS: usize = 2;

/// A half-open `[start, end)` char range into a text snapshot, together with
/// the text it covered at detection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl WordSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Why a trigger did not produce a span. These are filters, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoWord,
    NotTargetScript,
    TooShort,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoWord => "no_word",
            SkipReason::NotTargetScript => "not_target_script",
            SkipReason::TooShort => "too_short",
        }
    }
}

/// Extract the most recently completed word around `trigger_offset`.
pub fn resolve_completed_word(buffer: &str, trigger_offset: usize) -> Option<WordSpan> {
    locate_completed_word(buffer, trigger_offset, MIN_WORD_CHARS).ok()
}

/// Like [`resolve_completed_word`], reporting why nothing was found.
pub fn locate_completed_word(
    buffer: &str,
    trigger_offset: usize,
    min_chars: usize,
) -> Result<WordSpan, SkipReason> {
    let chars: Vec<char> = buffer.chars().collect();
    let mut anchor = trigger_offset.min(chars.len());
    while anchor > 0 && is_word_boundary(chars[anchor - 1]) {
        anchor -= 1;
    }

    let mut start = anchor;
    while start > 0 && !is_word_boundary(chars[start - 1]) {
        start -= 1;
    }
    let mut end = anchor;
    while end < chars.len() && !is_word_boundary(chars[end]) {
        end += 1;
    }

    finish_span(&chars, start, end, min_chars)
}

/// Extract the sentence that the terminator at or before `trigger_offset`
/// just closed. The span runs from just after the previous terminator (or
/// line break) to just after the closing terminator, trimmed of whitespace.
pub fn locate_completed_sentence(
    buffer: &str,
    trigger_offset: usize,
    min_chars: usize,
) -> Result<WordSpan, SkipReason> {
    let chars: Vec<char> = buffer.chars().collect();
    let mut end = trigger_offset.min(chars.len());
    while end > 0 && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    if end == 0 || !is_sentence_terminator(chars[end - 1]) {
        return Err(SkipReason::NoWord);
    }

    let mut start = end - 1;
    while start > 0 && !is_sentence_terminator(chars[start - 1]) && chars[start - 1] != '\n' {
        start -= 1;
    }
    while start < end && chars[start].is_whitespace() {
        start += 1;
    }

    finish_span(&chars, start, end, min_chars)
}

fn finish_span(
    chars: &[char],
    start: usize,
    end: usize,
    min_chars: usize,
) -> Result<WordSpan, SkipReason> {
    if start >= end {
        return Err(SkipReason::NoWord);
    }
    let text: String = chars[start..end].iter().collect();
    if !contains_target_script(&text) {
        return Err(SkipReason::NotTargetScript);
    }
    if end - start < min_chars.max(1) {
        return Err(SkipReason::TooShort);
    }
    Ok(WordSpan { text, start, end })
}

/// True when the chars on either side of `[start, end)` are word boundaries
/// or buffer edges.
pub fn is_bounded(chars: &[char], start: usize, end: usize) -> bool {
    let before = start == 0 || chars.get(start - 1).is_some_and(|c| is_word_boundary(*c));
    let after = end >= chars.len() || is_word_boundary(chars[end]);
    before && after
}

/// Char offset of the last occurrence of `needle` in `buffer` that sits on
/// word boundaries on both sides. Substring hits inside longer words are
/// skipped.
pub fn find_last_bounded(buffer: &str, needle: &str) -> Option<usize> {
    let hay: Vec<char> = buffer.chars().collect();
    let pat: Vec<char> = needle.chars().collect();
    if pat.is_empty() || pat.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - pat.len())
        .rev()
        .find(|&i| hay[i..i + pat.len()] == pat[..] && is_bounded(&hay, i, i + pat.len()))
}

/// True when an inserted chunk of text ends in a boundary, i.e. it completes
/// the word before it.
pub fn completes_word(inserted: &str) -> bool {
    inserted.chars().next_back().is_some_and(is_word_boundary)
}

/// True when an inserted chunk closes a sentence.
pub fn completes_sentence(inserted: &str) -> bool {
    inserted
        .trim_end()
        .chars()
        .next_back()
        .is_some_and(is_sentence_terminator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unicode::char_slice;
    use proptest::prelude::*;

    #[test]
    fn test_word_before_space() {
        let span = resolve_completed_word("வநக்கம் ", 8).unwrap();
        assert_eq!(span.text, "வநக்கம்");
        assert_eq!((span.start, span.end), (0, 7));
    }

    #[test]
    fn test_second_word() {
        let buf = "வணக்கம் நல்லது, ";
        let span = resolve_completed_word(buf, 16).unwrap();
        assert_eq!(span.text, "நல்லது");
        assert_eq!((span.start, span.end), (8, 14));
    }

    #[test]
    fn test_trigger_inside_word_relocates() {
        // Cursor moved back into the first word: the whole word is taken,
        // not the clipped prefix ending at trigger - 1.
        let buf = "வநக்கம் நல்லது";
        let span = resolve_completed_word(buf, 3).unwrap();
        assert_eq!(span.text, "வநக்கம்");
        assert_eq!((span.start, span.end), (0, 7));

        let span = resolve_completed_word(buf, 10).unwrap();
        assert_eq!(span.text, "நல்லது");
    }

    #[test]
    fn test_trigger_at_word_start_takes_previous_word() {
        let span = resolve_completed_word("வநக்கம் நல்லது", 8).unwrap();
        assert_eq!(span.text, "வநக்கம்");
    }

    #[test]
    fn test_trigger_past_end_is_clamped() {
        let span = resolve_completed_word("வநக்கம்", 99).unwrap();
        assert_eq!((span.start, span.end), (0, 7));
    }

    #[test]
    fn test_filters() {
        assert_eq!(
            locate_completed_word("hello ", 6, MIN_WORD_CHARS),
            Err(SkipReason::NotTargetScript)
        );
        assert_eq!(
            locate_completed_word("வ ", 2, MIN_WORD_CHARS),
            Err(SkipReason::TooShort)
        );
        assert_eq!(
            locate_completed_word("   ", 3, MIN_WORD_CHARS),
            Err(SkipReason::NoWord)
        );
        assert_eq!(locate_completed_word("", 0, MIN_WORD_CHARS), Err(SkipReason::NoWord));
    }

    #[test]
    fn test_punctuation_is_boundary() {
        let span = resolve_completed_word("(வநக்கம்)", 9).unwrap();
        assert_eq!(span.text, "வநக்கம்");
        assert_eq!((span.start, span.end), (1, 8));
    }

    #[test]
    fn test_sentence_span() {
        let buf = "முதல். இது ஒரு வாக்கியம். ";
        let span = locate_completed_sentence(buf, 26, MIN_WORD_CHARS).unwrap();
        assert_eq!(span.text, "இது ஒரு வாக்கியம்.");
        assert_eq!(char_slice(buf, span.start, span.end), span.text);
    }

    #[test]
    fn test_sentence_requires_terminator() {
        assert_eq!(
            locate_completed_sentence("இது ஒரு ", 8, MIN_WORD_CHARS),
            Err(SkipReason::NoWord)
        );
    }

    #[test]
    fn test_find_last_bounded_skips_inner_matches() {
        // The trailing occurrence is glued into a longer word.
        let buf = "அது அதுவும்";
        assert_eq!(find_last_bounded(buf, "அது"), Some(0));
        assert_eq!(find_last_bounded("அது அது", "அது"), Some(4));
        assert_eq!(find_last_bounded("அதுவும்", "அது"), None);
        assert_eq!(find_last_bounded("x", ""), None);
    }

    #[test]
    fn test_trigger_classification() {
        assert!(completes_word(" "));
        assert!(completes_word("க,"));
        assert!(completes_word("\n"));
        assert!(!completes_word("க"));
        assert!(!completes_word(""));
        assert!(completes_sentence(". "));
        assert!(!completes_sentence(", "));
    }

    fn buffer_strategy() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            4 => prop::sample::select(vec!["வ", "ந", "க்", "க", "ம்", "ண", "ல்", "து", "ா"]),
            1 => prop::sample::select(vec![" ", ",", ".", "\n", "a", "b", "-"]),
        ];
        prop::collection::vec(piece, 0..30).prop_map(|v| v.concat())
    }

    proptest! {
        #[test]
        fn prop_span_matches_buffer_and_is_bounded(buf in buffer_strategy(), trigger in 0usize..40) {
            if let Some(span) = resolve_completed_word(&buf, trigger) {
                let chars: Vec<char> = buf.chars().collect();
                prop_assert!(span.start < span.end);
                prop_assert!(span.end <= chars.len());
                prop_assert_eq!(char_slice(&buf, span.start, span.end), span.text.as_str());
                prop_assert!(is_bounded(&chars, span.start, span.end));
                prop_assert!(span.len() >= MIN_WORD_CHARS);
            }
        }
    }
}
