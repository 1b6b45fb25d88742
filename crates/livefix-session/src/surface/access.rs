//! Uniform text access over the two surface representations.
//!
//! The accessor is picked once, at registration, from the surface kind.
//! Nothing downstream branches on the kind again.

use livefix_core::unicode::{char_len, char_slice};

use crate::host::{ChangeEvent, NodeId, PageDom, SurfaceKind};

pub trait TextAccess: Sync {
    fn get_text(&self, dom: &dyn PageDom, node: NodeId) -> String;
    fn set_text(&self, dom: &mut dyn PageDom, node: NodeId, text: &str);
    fn get_cursor_offset(&self, dom: &dyn PageDom, node: NodeId) -> Option<usize>;
    fn set_cursor_offset(&self, dom: &mut dyn PageDom, node: NodeId, offset: usize);
    /// Ordered `[start, end)` of a non-collapsed selection.
    fn get_selection(&self, dom: &dyn PageDom, node: NodeId) -> Option<(usize, usize)>;

    /// Fire `input` then `change` so page scripts see the edit.
    fn notify_changed(&self, dom: &mut dyn PageDom, node: NodeId) {
        dom.dispatch(node, ChangeEvent::Input);
        dom.dispatch(node, ChangeEvent::Change);
    }
}

pub fn accessor_for(kind: SurfaceKind) -> &'static dyn TextAccess {
    match kind {
        SurfaceKind::PlainValue => &PlainValueAccess,
        SurfaceKind::RichText => &RichTextAccess,
    }
}

pub struct PlainValueAccess;

impl TextAccess for PlainValueAccess {
    fn get_text(&self, dom: &dyn PageDom, node: NodeId) -> String {
        dom.value(node).unwrap_or_default()
    }

    fn set_text(&self, dom: &mut dyn PageDom, node: NodeId, text: &str) {
        dom.set_value(node, text);
    }

    fn get_cursor_offset(&self, dom: &dyn PageDom, node: NodeId) -> Option<usize> {
        dom.selection_start(node)
    }

    fn set_cursor_offset(&self, dom: &mut dyn PageDom, node: NodeId, offset: usize) {
        dom.set_selection_range(node, offset, offset);
    }

    fn get_selection(&self, dom: &dyn PageDom, node: NodeId) -> Option<(usize, usize)> {
        let start = dom.selection_start(node)?;
        let end = dom.selection_end(node)?;
        (end > start).then_some((start, end))
    }
}

pub struct RichTextAccess;

impl TextAccess for RichTextAccess {
    fn get_text(&self, dom: &dyn PageDom, node: NodeId) -> String {
        dom.text_nodes(node).concat()
    }

    /// Writes only the changed stretch when it falls inside one text node,
    /// so surrounding markup survives. Otherwise the whole text goes into
    /// the first node and the rest are emptied.
    fn set_text(&self, dom: &mut dyn PageDom, node: NodeId, text: &str) {
        let parts = dom.text_nodes(node);
        let old = parts.concat();
        if old == text {
            return;
        }
        let map = TextNodeMap::new(&parts);
        let (prefix, suffix) = common_affixes(&old, text);
        let old_end = char_len(&old) - suffix;
        let new_end = char_len(text) - suffix;

        if let Some(idx) = map.containing(prefix, old_end) {
            let start = map.start_of(idx);
            let current = &parts[idx];
            let mut rewritten = String::new();
            rewritten.push_str(char_slice(current, 0, prefix - start));
            rewritten.push_str(char_slice(text, prefix, new_end));
            rewritten.push_str(char_slice(current, old_end - start, char_len(current)));
            dom.set_text_node(node, idx, &rewritten);
            return;
        }

        dom.set_text_node(node, 0, text);
        for idx in 1..parts.len() {
            if !parts[idx].is_empty() {
                dom.set_text_node(node, idx, "");
            }
        }
    }

    fn get_cursor_offset(&self, dom: &dyn PageDom, node: NodeId) -> Option<usize> {
        let (idx, offset) = dom.selection_anchor(node)?;
        let map = TextNodeMap::new(&dom.text_nodes(node));
        Some(map.flat(idx, offset))
    }

    fn set_cursor_offset(&self, dom: &mut dyn PageDom, node: NodeId, offset: usize) {
        let map = TextNodeMap::new(&dom.text_nodes(node));
        let (idx, within) = map.locate(offset);
        dom.collapse_selection(node, idx, within);
    }

    /// The anchor may sit after the focus when selecting backwards.
    fn get_selection(&self, dom: &dyn PageDom, node: NodeId) -> Option<(usize, usize)> {
        let anchor = dom.selection_anchor(node)?;
        let focus = dom.selection_focus(node)?;
        let map = TextNodeMap::new(&dom.text_nodes(node));
        let (a, b) = (map.flat(anchor.0, anchor.1), map.flat(focus.0, focus.1));
        (a != b).then_some((a.min(b), a.max(b)))
    }
}

/// Flat char offsets ↔ (text node, offset) for a rich-text region.
#[derive(Debug, Clone)]
pub struct TextNodeMap {
    /// (start, len) per text node, in document order.
    spans: Vec<(usize, usize)>,
}

impl TextNodeMap {
    pub fn new(parts: &[String]) -> Self {
        let mut spans = Vec::with_capacity(parts.len());
        let mut start = 0;
        for part in parts {
            let len = char_len(part);
            spans.push((start, len));
            start += len;
        }
        Self { spans }
    }

    pub fn total_len(&self) -> usize {
        self.spans.last().map_or(0, |(s, l)| s + l)
    }

    pub fn start_of(&self, idx: usize) -> usize {
        self.spans.get(idx).map_or(self.total_len(), |(s, _)| *s)
    }

    pub fn flat(&self, idx: usize, offset: usize) -> usize {
        match self.spans.get(idx) {
            Some((start, len)) => start + offset.min(*len),
            None => self.total_len(),
        }
    }

    /// Node and in-node offset of a flat offset. At a node seam the earlier
    /// node wins; past the end clamps to the end of the last node.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        for (idx, (start, len)) in self.spans.iter().enumerate() {
            if offset <= start + len {
                return (idx, offset.saturating_sub(*start));
            }
        }
        match self.spans.last() {
            Some((_, len)) => (self.spans.len() - 1, *len),
            None => (0, 0),
        }
    }

    /// The single node that holds all of `[start, end]`, if any.
    pub fn containing(&self, start: usize, end: usize) -> Option<usize> {
        self.spans
            .iter()
            .position(|(s, l)| *s <= start && end <= s + l)
    }
}

/// Lengths in chars of the common prefix and the non-overlapping common
/// suffix of `a` and `b`.
fn common_affixes(a: &str, b: &str) -> (usize, usize) {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let max_suffix = a.len().min(b.len()) - prefix;
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(max_suffix)
        .take_while(|(x, y)| x == y)
        .count();
    (prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPage;

    #[test]
    fn test_node_map_locate() {
        let parts = vec!["வணக்கம் ".to_string(), "நல்லது".to_string()];
        let map = TextNodeMap::new(&parts);
        assert_eq!(map.total_len(), 14);
        assert_eq!(map.locate(3), (0, 3));
        assert_eq!(map.locate(8), (0, 8));
        assert_eq!(map.locate(9), (1, 1));
        assert_eq!(map.locate(99), (1, 6));
        assert_eq!(map.flat(1, 2), 10);
        assert_eq!(map.containing(9, 14), Some(1));
        assert_eq!(map.containing(6, 10), None);
    }

    #[test]
    fn test_empty_node_map() {
        let map = TextNodeMap::new(&[]);
        assert_eq!(map.locate(5), (0, 0));
        assert_eq!(map.total_len(), 0);
    }

    #[test]
    fn test_common_affixes() {
        assert_eq!(common_affixes("abcXdef", "abcYYdef"), (3, 3));
        assert_eq!(common_affixes("aaa", "aa"), (2, 0));
        assert_eq!(common_affixes("", "x"), (0, 0));
    }

    #[test]
    fn test_rich_set_text_touches_only_changed_node() {
        let mut page = MemoryPage::new();
        let root = page.root();
        let region = page.add_editable(root, &["வநக்கம் ", "நல்லது"]);
        RichTextAccess.set_text(&mut page, region, "வணக்கம் நல்லது");
        assert_eq!(page.text_nodes(region), vec!["வணக்கம் ", "நல்லது"]);
    }

    #[test]
    fn test_rich_set_text_across_nodes_collapses_into_first() {
        let mut page = MemoryPage::new();
        let root = page.root();
        let region = page.add_editable(root, &["அது ", "இது"]);
        RichTextAccess.set_text(&mut page, region, "ஒன்று");
        assert_eq!(page.text_nodes(region), vec!["ஒன்று", ""]);
        assert_eq!(RichTextAccess.get_text(&page, region), "ஒன்று");
    }

    #[test]
    fn test_rich_cursor_round_trip() {
        let mut page = MemoryPage::new();
        let root = page.root();
        let region = page.add_editable(root, &["அது ", "இது"]);
        RichTextAccess.set_cursor_offset(&mut page, region, 6);
        assert_eq!(page.selection_anchor(region), Some((1, 2)));
        assert_eq!(RichTextAccess.get_cursor_offset(&page, region), Some(6));
    }

    #[test]
    fn test_plain_access() {
        let mut page = MemoryPage::new();
        let root = page.root();
        let input = page.add_text_input(root, "text");
        PlainValueAccess.set_text(&mut page, input, "வணக்கம்");
        PlainValueAccess.set_cursor_offset(&mut page, input, 3);
        assert_eq!(PlainValueAccess.get_text(&page, input), "வணக்கம்");
        assert_eq!(PlainValueAccess.get_cursor_offset(&page, input), Some(3));
        PlainValueAccess.notify_changed(&mut page, input);
        assert_eq!(
            page.dispatched(input),
            vec![ChangeEvent::Input, ChangeEvent::Change]
        );
    }

    #[test]
    fn test_selection_ranges() {
        let mut page = MemoryPage::new();
        let root = page.root();
        let input = page.add_text_input(root, "text");
        page.set_value_and_cursor(input, "நான் போறேன்", 0);
        assert_eq!(PlainValueAccess.get_selection(&page, input), None);
        page.select(input, 5, 11);
        assert_eq!(PlainValueAccess.get_selection(&page, input), Some((5, 11)));
        // Typing collapses it again.
        page.type_text(input, "x");
        assert_eq!(PlainValueAccess.get_selection(&page, input), None);

        let region = page.add_editable(root, &["அது ", "இது"]);
        page.select(region, 2, 6);
        assert_eq!(page.selection_focus(region), Some((1, 2)));
        assert_eq!(RichTextAccess.get_selection(&page, region), Some((2, 6)));
    }
}
