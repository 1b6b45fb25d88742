//! In-place replacement of a detected span.

use livefix_core::boundary::{find_last_bounded, is_bounded, WordSpan};
use livefix_core::unicode::{char_len, char_slice, splice_chars};

use crate::host::PageDom;
use crate::surface::Surface;

/// How the replacement position was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceVia {
    /// The stored offsets still demarcate the original word.
    Exact,
    /// Last bounded occurrence of the original word in the current text.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Replaced { start: usize, via: ReplaceVia },
    /// The replacement equals the original; nothing was written.
    Unchanged,
    /// The original word is gone from the text.
    Missed,
}

/// Replace `span` with `replacement`, re-validating the stored offsets first
/// and falling back to a bounded last-occurrence search.
pub fn apply_replacement(
    dom: &mut dyn PageDom,
    surface: &Surface,
    span: &WordSpan,
    replacement: &str,
) -> ApplyOutcome {
    let text = surface.text(dom);
    let target = if span_still_valid(&text, span) {
        Some((span.start, ReplaceVia::Exact))
    } else {
        tracing::debug!(surface = %surface.id, word = %span.text, "mutator: span moved, searching");
        find_last_bounded(&text, &span.text).map(|start| (start, ReplaceVia::Fallback))
    };
    write_at(dom, surface, &text, target, span, replacement)
}

/// Skip the stored offsets and go straight to the last-occurrence search.
pub fn apply_fallback(
    dom: &mut dyn PageDom,
    surface: &Surface,
    span: &WordSpan,
    replacement: &str,
) -> ApplyOutcome {
    let text = surface.text(dom);
    let target = find_last_bounded(&text, &span.text).map(|start| (start, ReplaceVia::Fallback));
    write_at(dom, surface, &text, target, span, replacement)
}

fn span_still_valid(text: &str, span: &WordSpan) -> bool {
    let chars: Vec<char> = text.chars().collect();
    span.start < span.end
        && span.end <= chars.len()
        && char_slice(text, span.start, span.end) == span.text
        && is_bounded(&chars, span.start, span.end)
}

fn write_at(
    dom: &mut dyn PageDom,
    surface: &Surface,
    text: &str,
    target: Option<(usize, ReplaceVia)>,
    span: &WordSpan,
    replacement: &str,
) -> ApplyOutcome {
    let Some((start, via)) = target else {
        tracing::warn!(surface = %surface.id, word = %span.text, "mutator: replacement missed");
        return ApplyOutcome::Missed;
    };
    if replacement == span.text {
        return ApplyOutcome::Unchanged;
    }

    let end = start + char_len(&span.text);
    let updated = splice_chars(text, start, end, replacement);
    surface.set_text(dom, &updated);
    surface.set_cursor(dom, start + char_len(replacement));
    surface.notify_changed(dom);
    tracing::debug!(surface = %surface.id, start, ?via, "mutator: replaced");
    ApplyOutcome::Replaced { start, via }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ChangeEvent, NodeId};
    use crate::memory::MemoryPage;
    use crate::surface::SurfaceRegistry;

    fn setup(text: &str, cursor: usize) -> (MemoryPage, SurfaceRegistry, NodeId) {
        let mut page = MemoryPage::new();
        let root = page.root();
        let input = page.add_text_input(root, "text");
        page.set_value_and_cursor(input, text, cursor);
        let mut reg = SurfaceRegistry::new();
        reg.install(&mut page, root);
        (page, reg, input)
    }

    fn span(text: &str, start: usize, end: usize) -> WordSpan {
        WordSpan {
            text: text.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_identical_replacement_is_noop() {
        let (mut page, reg, input) = setup("வணக்கம் நல்லது", 14);
        let surface = reg.get(reg.by_node(input).unwrap()).unwrap();
        let outcome = apply_replacement(&mut page, surface, &span("வணக்கம்", 0, 7), "வணக்கம்");
        assert_eq!(outcome, ApplyOutcome::Unchanged);
        assert_eq!(page.text(input), "வணக்கம் நல்லது");
        assert_eq!(page.cursor(input), 14);
        assert!(page.dispatched(input).is_empty());
    }

    #[test]
    fn test_exact_replacement_moves_cursor_after_word() {
        let (mut page, reg, input) = setup("வணக்கம் நல்லது", 14);
        let surface = reg.get(reg.by_node(input).unwrap()).unwrap();
        let outcome = apply_replacement(&mut page, surface, &span("வணக்கம்", 0, 7), "வணக்கம");
        assert_eq!(
            outcome,
            ApplyOutcome::Replaced {
                start: 0,
                via: ReplaceVia::Exact
            }
        );
        assert_eq!(page.text(input), "வணக்கம நல்லது");
        assert_eq!(page.cursor(input), 6);
        assert_eq!(
            page.dispatched(input),
            vec![ChangeEvent::Input, ChangeEvent::Change]
        );
    }

    #[test]
    fn test_shifted_span_falls_back_to_last_bounded() {
        // Text was prepended after detection; offsets (0, 7) are stale.
        let (mut page, reg, input) = setup("இன்று வநக்கம் ", 14);
        let surface = reg.get(reg.by_node(input).unwrap()).unwrap();
        let outcome = apply_replacement(&mut page, surface, &span("வநக்கம்", 0, 7), "வணக்கம்");
        assert_eq!(
            outcome,
            ApplyOutcome::Replaced {
                start: 6,
                via: ReplaceVia::Fallback
            }
        );
        assert_eq!(page.text(input), "இன்று வணக்கம் ");
        assert_eq!(page.cursor(input), 13);
    }

    #[test]
    fn test_fallback_never_clips_inside_word() {
        let (mut page, reg, input) = setup("அதுவும் சரி", 11);
        let surface = reg.get(reg.by_node(input).unwrap()).unwrap();
        let outcome = apply_replacement(&mut page, surface, &span("அது", 5, 8), "இது");
        assert_eq!(outcome, ApplyOutcome::Missed);
        assert_eq!(page.text(input), "அதுவும் சரி");
    }

    #[test]
    fn test_forced_fallback_picks_last_occurrence() {
        let (mut page, reg, input) = setup("வநக்கம் வநக்கம்", 15);
        let surface = reg.get(reg.by_node(input).unwrap()).unwrap();
        let outcome = apply_fallback(&mut page, surface, &span("வநக்கம்", 0, 7), "வணக்கம்");
        assert_eq!(
            outcome,
            ApplyOutcome::Replaced {
                start: 8,
                via: ReplaceVia::Fallback
            }
        );
        assert_eq!(page.text(input), "வநக்கம் வணக்கம்");
    }

    #[test]
    fn test_rich_text_replacement() {
        let mut page = MemoryPage::new();
        let root = page.root();
        let region = page.add_editable(root, &["வநக்கம் ", "நண்பா"]);
        let mut reg = SurfaceRegistry::new();
        reg.install(&mut page, root);
        let surface = reg.get(reg.by_node(region).unwrap()).unwrap();
        let outcome = apply_replacement(&mut page, surface, &span("வநக்கம்", 0, 7), "வணக்கம்");
        assert!(matches!(outcome, ApplyOutcome::Replaced { start: 0, .. }));
        assert_eq!(page.text_nodes(region), vec!["வணக்கம் ", "நண்பா"]);
        assert_eq!(page.selection_anchor(region), Some((0, 7)));
    }
}
