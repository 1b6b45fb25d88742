//! In-memory host page.
//!
//! A small element tree with plain fields, textareas and editable regions,
//! a fixed-width text measurer and an overlay list. Used by the test suites
//! and by `fixtool replay` to drive the engine without a browser.

use std::collections::HashMap;

use livefix_core::geometry::{Rect, Viewport};
use livefix_core::unicode::{char_len, splice_chars};

use crate::host::{
    ChangeEvent, FieldMetrics, NodeId, OverlayId, OverlayLayer, PageDom, PageGeometry,
    SurfaceKind,
};
use crate::overlay::{OverlayContent, OverlayView};
use crate::session::InputEvent;
use crate::surface::{RichTextAccess, TextAccess, TextNodeMap};

const DEFAULT_FIELD: Rect = Rect {
    left: 20.0,
    top: 40.0,
    width: 400.0,
    height: 28.0,
};

#[derive(Debug, Clone)]
enum Element {
    Container,
    Input {
        input_type: String,
        value: String,
        cursor: usize,
    },
    TextArea {
        value: String,
        cursor: usize,
    },
    Editable {
        parts: Vec<String>,
        anchor: Option<(usize, usize)>,
    },
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    element: Element,
    marker: bool,
    listeners: usize,
    rect: Rect,
    metrics: Option<FieldMetrics>,
    dispatched: Vec<ChangeEvent>,
    /// Far end of a non-collapsed selection, as a flat char offset.
    extent: Option<usize>,
}

pub struct MemoryPage {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_node: NodeId,
    overlays: Vec<(OverlayId, OverlayView)>,
    next_overlay: u64,
    suggestions_shown: u64,
    focused: Option<NodeId>,
    viewport: Viewport,
    measure_char_width: Option<f32>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    pub fn new() -> Self {
        let root = 1;
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(None, Element::Container));
        Self {
            nodes,
            root,
            next_node: root + 1,
            overlays: Vec::new(),
            next_overlay: 0,
            suggestions_shown: 0,
            focused: None,
            viewport: Viewport {
                width: 1280.0,
                height: 800.0,
                scroll_x: 0.0,
                scroll_y: 0.0,
            },
            measure_char_width: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // -- building ---------------------------------------------------------

    pub fn add_container(&mut self, parent: NodeId) -> NodeId {
        self.insert(parent, Element::Container)
    }

    /// An `<input>` of the given type (`text`, `search`, `password`, ...).
    pub fn add_text_input(&mut self, parent: NodeId, input_type: &str) -> NodeId {
        self.insert(
            parent,
            Element::Input {
                input_type: input_type.to_string(),
                value: String::new(),
                cursor: 0,
            },
        )
    }

    pub fn add_textarea(&mut self, parent: NodeId) -> NodeId {
        self.insert(
            parent,
            Element::TextArea {
                value: String::new(),
                cursor: 0,
            },
        )
    }

    /// A `contenteditable` region holding the given text nodes.
    pub fn add_editable(&mut self, parent: NodeId, parts: &[&str]) -> NodeId {
        self.insert(
            parent,
            Element::Editable {
                parts: parts.iter().map(|p| p.to_string()).collect(),
                anchor: None,
            },
        )
    }

    /// Detach `node` (and its subtree) from its parent.
    pub fn remove(&mut self, node: NodeId) {
        let parent = self.nodes.get_mut(&node).and_then(|n| n.parent.take());
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != node);
        }
    }

    /// Re-attach a detached node under `parent`.
    pub fn append(&mut self, parent: NodeId, node: NodeId) {
        self.remove(node);
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(node);
        }
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.rect = rect;
        }
    }

    pub fn set_metrics(&mut self, node: NodeId, metrics: FieldMetrics) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.metrics = Some(metrics);
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Width per char reported by `measure_text`; `None` makes text
    /// unmeasurable.
    pub fn set_measure_char_width(&mut self, width: Option<f32>) {
        self.measure_char_width = width;
    }

    pub fn set_value_and_cursor(&mut self, node: NodeId, text: &str, cursor: usize) {
        self.set_value(node, text);
        self.set_cursor(node, cursor);
    }

    // -- user actions -----------------------------------------------------

    pub fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Select chars `[start, end)`, leaving the cursor at `start`.
    pub fn select(&mut self, node: NodeId, start: usize, end: usize) {
        self.set_cursor(node, start);
        let len = char_len(&self.text(node));
        if let Some(n) = self.nodes.get_mut(&node) {
            n.extent = (end > start).then_some(end.min(len));
        }
    }

    pub fn set_cursor(&mut self, node: NodeId, offset: usize) {
        let len = char_len(&self.text(node));
        if self.is_editable(node) {
            let map = TextNodeMap::new(&self.text_nodes(node));
            let (idx, within) = map.locate(offset.min(len));
            self.collapse_selection(node, idx, within);
        } else {
            self.set_selection_range(node, offset, offset);
        }
    }

    /// Insert `text` at the cursor, as a keystroke or IME commit would.
    pub fn type_text(&mut self, node: NodeId, text: &str) -> InputEvent {
        self.focus(node);
        self.insert_at_cursor(node, text);
        InputEvent::Inserted(text.to_string())
    }

    /// Type `text` one char at a time, returning one event per char.
    pub fn type_chars(&mut self, node: NodeId, text: &str) -> Vec<InputEvent> {
        text.chars()
            .map(|c| self.type_text(node, c.encode_utf8(&mut [0u8; 4])))
            .collect()
    }

    pub fn paste(&mut self, node: NodeId, text: &str) -> InputEvent {
        self.focus(node);
        self.insert_at_cursor(node, text);
        InputEvent::Paste
    }

    /// Delete the char before the cursor.
    pub fn backspace(&mut self, node: NodeId) -> InputEvent {
        self.focus(node);
        let cursor = self.cursor(node);
        if cursor > 0 {
            let text = self.text(node);
            let updated = splice_chars(&text, cursor - 1, cursor, "");
            self.replace_all(node, &updated);
            self.set_cursor(node, cursor - 1);
        }
        InputEvent::Deleted
    }

    fn insert_at_cursor(&mut self, node: NodeId, inserted: &str) {
        let cursor = self.cursor(node);
        let text = self.text(node);
        let updated = splice_chars(&text, cursor, cursor, inserted);
        self.replace_all(node, &updated);
        self.set_cursor(node, cursor + char_len(inserted));
    }

    fn replace_all(&mut self, node: NodeId, text: &str) {
        if self.is_editable(node) {
            RichTextAccess.set_text(self, node, text);
        } else {
            self.set_value(node, text);
        }
    }

    fn is_editable(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(&node).map(|n| &n.element),
            Some(Element::Editable { .. })
        )
    }

    // -- inspection -------------------------------------------------------

    /// Current text of a field or editable region.
    pub fn text(&self, node: NodeId) -> String {
        match self.nodes.get(&node).map(|n| &n.element) {
            Some(Element::Input { value, .. }) | Some(Element::TextArea { value, .. }) => {
                value.clone()
            }
            Some(Element::Editable { parts, .. }) => parts.concat(),
            _ => String::new(),
        }
    }

    /// Cursor as a flat char offset.
    pub fn cursor(&self, node: NodeId) -> usize {
        match self.nodes.get(&node).map(|n| &n.element) {
            Some(Element::Input { cursor, .. }) | Some(Element::TextArea { cursor, .. }) => {
                *cursor
            }
            Some(Element::Editable { parts, anchor }) => match anchor {
                Some((idx, off)) => TextNodeMap::new(parts).flat(*idx, *off),
                None => char_len(&parts.concat()),
            },
            _ => 0,
        }
    }

    pub fn dispatched(&self, node: NodeId) -> Vec<ChangeEvent> {
        self.nodes
            .get(&node)
            .map(|n| n.dispatched.clone())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.nodes.get(&node).map_or(0, |n| n.listeners)
    }

    pub fn overlays(&self) -> impl Iterator<Item = &OverlayView> {
        self.overlays.iter().map(|(_, v)| v)
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Overlays ever shown, including removed ones.
    pub fn overlays_shown(&self) -> u64 {
        self.next_overlay
    }

    /// Suggestion overlays ever shown, including removed ones.
    pub fn suggestions_shown(&self) -> u64 {
        self.suggestions_shown
    }

    fn insert(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = self.next_node;
        self.next_node += 1;
        let mut node = Node::new(Some(parent), element);
        node.rect = DEFAULT_FIELD;
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    fn subtree(&self, node: NodeId, out: &mut Vec<NodeId>) {
        out.push(node);
        if let Some(n) = self.nodes.get(&node) {
            for &child in &n.children {
                self.subtree(child, out);
            }
        }
    }
}

impl Node {
    fn new(parent: Option<NodeId>, element: Element) -> Self {
        Self {
            parent,
            children: Vec::new(),
            element,
            marker: false,
            listeners: 0,
            rect: Rect::default(),
            metrics: None,
            dispatched: Vec::new(),
            extent: None,
        }
    }
}

impl PageDom for MemoryPage {
    fn matching_inputs(&self, root: NodeId) -> Vec<NodeId> {
        let mut all = Vec::new();
        self.subtree(root, &mut all);
        all.into_iter()
            .filter(|n| self.classify(*n).is_some())
            .collect()
    }

    fn classify(&self, node: NodeId) -> Option<SurfaceKind> {
        match &self.nodes.get(&node)?.element {
            Element::Input { input_type, .. } => matches!(
                input_type.as_str(),
                "text" | "email" | "search"
            )
            .then_some(SurfaceKind::PlainValue),
            Element::TextArea { .. } => Some(SurfaceKind::PlainValue),
            Element::Editable { .. } => Some(SurfaceKind::RichText),
            Element::Container => None,
        }
    }

    fn is_connected(&self, root: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == root {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn has_marker(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.marker)
    }

    fn set_marker(&mut self, node: NodeId, on: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.marker = on;
        }
    }

    fn attach_listeners(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.listeners += 1;
        }
    }

    fn detach_listeners(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.listeners = n.listeners.saturating_sub(1);
        }
    }

    fn value(&self, node: NodeId) -> Option<String> {
        match &self.nodes.get(&node)?.element {
            Element::Input { value, .. } | Element::TextArea { value, .. } => Some(value.clone()),
            _ => None,
        }
    }

    fn set_value(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            match &mut n.element {
                Element::Input { value, cursor, .. } | Element::TextArea { value, cursor } => {
                    *value = text.to_string();
                    // Assigning a value moves the caret to the end.
                    *cursor = char_len(text);
                    n.extent = None;
                }
                _ => {}
            }
        }
    }

    fn selection_start(&self, node: NodeId) -> Option<usize> {
        match &self.nodes.get(&node)?.element {
            Element::Input { cursor, .. } | Element::TextArea { cursor, .. } => Some(*cursor),
            _ => None,
        }
    }

    fn selection_end(&self, node: NodeId) -> Option<usize> {
        let n = self.nodes.get(&node)?;
        match &n.element {
            Element::Input { cursor, .. } | Element::TextArea { cursor, .. } => {
                Some(n.extent.unwrap_or(*cursor))
            }
            _ => None,
        }
    }

    fn set_selection_range(&mut self, node: NodeId, start: usize, end: usize) {
        if let Some(n) = self.nodes.get_mut(&node) {
            if let Element::Input { value, cursor, .. } | Element::TextArea { value, cursor } =
                &mut n.element
            {
                let len = char_len(value);
                *cursor = start.min(len);
                n.extent = (end > start).then_some(end.min(len));
            }
        }
    }

    fn text_nodes(&self, node: NodeId) -> Vec<String> {
        match self.nodes.get(&node).map(|n| &n.element) {
            Some(Element::Editable { parts, .. }) => parts.clone(),
            _ => Vec::new(),
        }
    }

    fn set_text_node(&mut self, node: NodeId, index: usize, text: &str) {
        if let Some(Element::Editable { parts, .. }) =
            self.nodes.get_mut(&node).map(|n| &mut n.element)
        {
            if index < parts.len() {
                parts[index] = text.to_string();
            } else if index == parts.len() {
                parts.push(text.to_string());
            }
        }
    }

    fn selection_anchor(&self, node: NodeId) -> Option<(usize, usize)> {
        match self.nodes.get(&node).map(|n| &n.element) {
            Some(Element::Editable { anchor, .. }) => *anchor,
            _ => None,
        }
    }

    fn selection_focus(&self, node: NodeId) -> Option<(usize, usize)> {
        let n = self.nodes.get(&node)?;
        match (&n.element, n.extent) {
            (Element::Editable { parts, .. }, Some(extent)) => {
                Some(TextNodeMap::new(parts).locate(extent))
            }
            (Element::Editable { anchor, .. }, None) => *anchor,
            _ => None,
        }
    }

    fn collapse_selection(&mut self, node: NodeId, index: usize, offset: usize) {
        if let Some(n) = self.nodes.get_mut(&node) {
            if let Element::Editable { anchor, .. } = &mut n.element {
                *anchor = Some((index, offset));
                n.extent = None;
            }
        }
    }

    fn dispatch(&mut self, node: NodeId, event: ChangeEvent) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.dispatched.push(event);
        }
    }

    fn focused(&self) -> Option<NodeId> {
        self.focused
    }
}

impl PageGeometry for MemoryPage {
    fn bounding_box(&self, node: NodeId) -> Option<Rect> {
        self.nodes.get(&node).map(|n| n.rect)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn field_metrics(&self, node: NodeId) -> Option<FieldMetrics> {
        self.nodes.get(&node)?.metrics
    }

    fn measure_text(&self, _node: NodeId, text: &str) -> Option<f32> {
        self.measure_char_width
            .map(|w| char_len(text) as f32 * w)
    }

    /// Lays every text node out on a single line.
    fn range_rect(&self, node: NodeId, text_node: usize, start: usize, end: usize) -> Option<Rect> {
        let parts = self.text_nodes(node);
        let part = parts.get(text_node)?;
        if start > end || end > char_len(part) {
            return None;
        }
        let before: usize = parts[..text_node].iter().map(|p| char_len(p)).sum();
        let w = self.measure_char_width.unwrap_or(8.0);
        let field = self.bounding_box(node)?;
        Some(Rect::new(
            field.left + (before + start) as f32 * w,
            field.top,
            (end - start) as f32 * w,
            field.height,
        ))
    }
}

impl OverlayLayer for MemoryPage {
    fn show_overlay(&mut self, view: &OverlayView) -> OverlayId {
        self.next_overlay += 1;
        if matches!(view.content, OverlayContent::Suggestion { .. }) {
            self.suggestions_shown += 1;
        }
        let id = OverlayId(self.next_overlay);
        self.overlays.push((id, view.clone()));
        id
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.overlays.retain(|(o, _)| *o != id);
    }
}
