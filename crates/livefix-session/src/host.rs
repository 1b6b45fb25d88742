//! The host page as seen by the engine.
//!
//! The engine never touches a real document. Everything it needs from the
//! page (element discovery, text access, geometry, overlay rendering) goes
//! through the traits below, which the integration shell implements.
//! Offsets crossing this boundary are char counts.

use livefix_core::geometry::{Rect, Viewport};

use crate::overlay::OverlayView;

/// Opaque handle of a page element.
pub type NodeId = u64;

/// How a surface stores its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Single string property with a linear cursor (text inputs, textareas).
    PlainValue,
    /// Editable region made of text nodes with a selection range.
    RichText,
}

/// Native notifications fired after the engine writes to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Input,
    Change,
}

/// One batch of structural changes below the tracked root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationRecord {
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

/// Handle of a rendered overlay, issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// Layout numbers the positioner needs to place text inside a plain field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldMetrics {
    pub padding_left: f32,
    pub padding_top: f32,
    pub line_height: f32,
    pub scroll_left: f32,
    pub scroll_top: f32,
}

pub trait PageDom {
    /// Eligible elements at or below `root` (including `root` itself).
    fn matching_inputs(&self, root: NodeId) -> Vec<NodeId>;
    /// `None` for elements that are not eligible surfaces.
    fn classify(&self, node: NodeId) -> Option<SurfaceKind>;
    /// True while `node` is still attached below `root`.
    fn is_connected(&self, root: NodeId, node: NodeId) -> bool;

    fn has_marker(&self, node: NodeId) -> bool;
    fn set_marker(&mut self, node: NodeId, on: bool);
    fn attach_listeners(&mut self, node: NodeId);
    fn detach_listeners(&mut self, node: NodeId);

    // Plain value fields
    fn value(&self, node: NodeId) -> Option<String>;
    fn set_value(&mut self, node: NodeId, value: &str);
    fn selection_start(&self, node: NodeId) -> Option<usize>;
    fn selection_end(&self, node: NodeId) -> Option<usize>;
    fn set_selection_range(&mut self, node: NodeId, start: usize, end: usize);

    // Rich text regions
    fn text_nodes(&self, node: NodeId) -> Vec<String>;
    fn set_text_node(&mut self, node: NodeId, index: usize, text: &str);
    /// Selection anchor as (text node index, char offset within it).
    fn selection_anchor(&self, node: NodeId) -> Option<(usize, usize)>;
    /// Other end of the selection, same shape as the anchor.
    fn selection_focus(&self, node: NodeId) -> Option<(usize, usize)>;
    fn collapse_selection(&mut self, node: NodeId, index: usize, offset: usize);

    fn dispatch(&mut self, node: NodeId, event: ChangeEvent);
    /// Element holding keyboard focus, if any.
    fn focused(&self) -> Option<NodeId>;
}

pub trait PageGeometry {
    /// Client-space bounding box of `node`.
    fn bounding_box(&self, node: NodeId) -> Option<Rect>;
    fn viewport(&self) -> Viewport;
    fn field_metrics(&self, node: NodeId) -> Option<FieldMetrics>;
    /// Width of `text` rendered in `node`'s font, via an offscreen proxy.
    fn measure_text(&self, node: NodeId, text: &str) -> Option<f32>;
    /// Client-space rect of chars `[start, end)` of one text node.
    fn range_rect(&self, node: NodeId, text_node: usize, start: usize, end: usize)
        -> Option<Rect>;
}

pub trait OverlayLayer {
    fn show_overlay(&mut self, view: &OverlayView) -> OverlayId;
    fn remove_overlay(&mut self, id: OverlayId);
}

/// Everything the engine needs from a page.
pub trait HostPage: PageDom + PageGeometry + OverlayLayer {}

impl<T: PageDom + PageGeometry + OverlayLayer> HostPage for T {}
