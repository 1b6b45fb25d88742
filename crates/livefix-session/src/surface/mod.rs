//! Tracked text-input surfaces.
//!
//! `SurfaceRegistry` is the only owner of surface identity. Surfaces are
//! created on first sight (install scan or a later insertion) and dropped
//! when their element leaves the tracked root.

mod access;

use std::collections::HashMap;

use livefix_core::types::SurfaceId;
use livefix_core::unicode::char_slice;

pub use access::{accessor_for, PlainValueAccess, RichTextAccess, TextAccess, TextNodeMap};

use crate::host::{MutationRecord, NodeId, PageDom, SurfaceKind};

pub struct Surface {
    pub id: SurfaceId,
    pub node: NodeId,
    pub kind: SurfaceKind,
    generation: u64,
    access: &'static dyn TextAccess,
}

impl Surface {
    fn new(id: SurfaceId, node: NodeId, kind: SurfaceKind) -> Self {
        Self {
            id,
            node,
            kind,
            generation: 0,
            access: accessor_for(kind),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn text(&self, dom: &dyn PageDom) -> String {
        self.access.get_text(dom, self.node)
    }

    pub fn set_text(&self, dom: &mut dyn PageDom, text: &str) {
        self.access.set_text(dom, self.node, text);
    }

    /// Cursor as a char offset. Surfaces without a selection report the end
    /// of their text.
    pub fn cursor(&self, dom: &dyn PageDom) -> usize {
        self.access
            .get_cursor_offset(dom, self.node)
            .unwrap_or_else(|| self.text(dom).chars().count())
    }

    pub fn set_cursor(&self, dom: &mut dyn PageDom, offset: usize) {
        self.access.set_cursor_offset(dom, self.node, offset);
    }

    /// Text under a non-collapsed selection.
    pub fn selected_text(&self, dom: &dyn PageDom) -> Option<String> {
        let (start, end) = self.access.get_selection(dom, self.node)?;
        Some(char_slice(&self.text(dom), start, end).to_string())
    }

    pub fn notify_changed(&self, dom: &mut dyn PageDom) {
        self.access.notify_changed(dom, self.node);
    }
}

/// Result of folding a mutation batch into the registry.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RegistryDelta {
    pub attached: Vec<SurfaceId>,
    pub detached: Vec<SurfaceId>,
}

#[derive(Default)]
pub struct SurfaceRegistry {
    root: Option<NodeId>,
    surfaces: HashMap<SurfaceId, Surface>,
    by_node: HashMap<NodeId, SurfaceId>,
    next_id: u64,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Start tracking below `root` and pick up every eligible element
    /// already present.
    pub fn install(&mut self, dom: &mut dyn PageDom, root: NodeId) -> Vec<SurfaceId> {
        self.root = Some(root);
        let found: Vec<SurfaceId> = dom
            .matching_inputs(root)
            .into_iter()
            .filter_map(|node| self.track(dom, node))
            .collect();
        tracing::debug!(root, attached = found.len(), "registry: installed");
        found
    }

    /// Fold one mutation batch in. Re-adding an element that is already
    /// tracked is a no-op.
    pub fn observe(&mut self, dom: &mut dyn PageDom, record: &MutationRecord) -> RegistryDelta {
        let mut delta = RegistryDelta::default();
        let Some(root) = self.root else {
            return delta;
        };

        if !record.removed.is_empty() {
            let mut gone: Vec<SurfaceId> = self
                .surfaces
                .values()
                .filter(|s| !dom.is_connected(root, s.node))
                .map(|s| s.id)
                .collect();
            gone.sort();
            for id in gone {
                self.detach(dom, id);
                delta.detached.push(id);
            }
        }

        for &added in &record.added {
            if !dom.is_connected(root, added) {
                continue;
            }
            for node in dom.matching_inputs(added) {
                if let Some(id) = self.track(dom, node) {
                    delta.attached.push(id);
                }
            }
        }
        delta
    }

    /// Drop every surface and clear their markers.
    pub fn teardown(&mut self, dom: &mut dyn PageDom) -> Vec<SurfaceId> {
        let mut ids: Vec<SurfaceId> = self.surfaces.keys().copied().collect();
        ids.sort();
        for &id in &ids {
            self.detach(dom, id);
        }
        self.root = None;
        ids
    }

    fn track(&mut self, dom: &mut dyn PageDom, node: NodeId) -> Option<SurfaceId> {
        if self.by_node.contains_key(&node) || dom.has_marker(node) {
            return None;
        }
        let kind = dom.classify(node)?;
        self.next_id += 1;
        let id = SurfaceId(self.next_id);
        dom.set_marker(node, true);
        dom.attach_listeners(node);
        self.surfaces.insert(id, Surface::new(id, node, kind));
        self.by_node.insert(node, id);
        tracing::debug!(surface = %id, node, ?kind, "registry: attached");
        Some(id)
    }

    fn detach(&mut self, dom: &mut dyn PageDom, id: SurfaceId) {
        let Some(surface) = self.surfaces.remove(&id) else {
            return;
        };
        self.by_node.remove(&surface.node);
        dom.detach_listeners(surface.node);
        dom.set_marker(surface.node, false);
        tracing::debug!(surface = %id, node = surface.node, "registry: detached");
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.get_mut(&id)
    }

    pub fn by_node(&self, node: NodeId) -> Option<SurfaceId> {
        self.by_node.get(&node).copied()
    }

    pub fn ids(&self) -> Vec<SurfaceId> {
        let mut ids: Vec<SurfaceId> = self.surfaces.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}
