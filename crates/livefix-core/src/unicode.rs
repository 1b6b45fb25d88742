//! Character-level classification and char-offset helpers.
//!
//! Every offset handed across the engine is a count of Unicode scalar values,
//! never a byte index. The helpers here are the only place that converts.

/// Punctuation that ends or separates words.
///
/// Covers ASCII punctuation, Latin-1 and General Punctuation marks, the
/// Devanagari dandas commonly typed alongside Tamil, and CJK punctuation.
/// Apostrophes count as punctuation, matching `\p{P}`.
pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(c, '¡' | '§' | '«' | '¶' | '·' | '»' | '¿' | '।' | '॥')
        || ('\u{2010}'..='\u{2027}').contains(&c)
        || ('\u{2030}'..='\u{205E}').contains(&c)
        || ('\u{3001}'..='\u{3003}').contains(&c)
        || ('\u{3008}'..='\u{3011}').contains(&c)
}

/// Whitespace or punctuation: a character that can never be part of a word.
pub fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || is_punctuation(c)
}

/// Characters that close a sentence.
pub fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '?' | '!' | '…' | '।' | '॥')
}

/// Number of chars in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the char at `char_idx`, clamped to `s.len()`.
pub fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map_or(s.len(), |(byte, _)| byte)
}

/// Substring by char range. Out-of-range bounds are clamped.
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(s, start);
    let to = byte_offset(s, end.max(start));
    &s[from..to]
}

/// Replace the char range `[start, end)` of `s` with `replacement`.
pub fn splice_chars(s: &str, start: usize, end: usize, replacement: &str) -> String {
    let from = byte_offset(s, start);
    let to = byte_offset(s, end.max(start));
    let mut out = String::with_capacity(s.len() - (to - from) + replacement.len());
    out.push_str(&s[..from]);
    out.push_str(replacement);
    out.push_str(&s[to..]);
    out
}
