//! Suggestion overlay geometry.
//!
//! `compute_anchor` finds the client-space rect of a span inside its field;
//! `place_overlay` turns that into a page-space overlay rect clamped to the
//! viewport. Both are pure. Anything that cannot be measured degrades to
//! the field's own bounding box, and a field without a box to a zero rect.

use livefix_core::boundary::WordSpan;
use livefix_core::geometry::{Rect, Side, Viewport};
use livefix_core::settings::{OverlaySettings, RenderStyle};
use livefix_core::types::SurfaceId;
use livefix_core::unicode::{char_len, char_slice};
use unicode_width::UnicodeWidthStr;

use crate::host::{NodeId, PageDom, PageGeometry, SurfaceKind};
use crate::surface::{Surface, TextNodeMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Page-space rect of the span the overlay refers to.
    pub anchor: Rect,
    /// Page-space rect of the overlay itself.
    pub rect: Rect,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    Suggestion {
        surface: SurfaceId,
        original: String,
        corrected: String,
        alternatives: Vec<String>,
        style: RenderStyle,
    },
    /// Short-lived confirmation after a replacement was applied.
    Feedback { surface: SurfaceId, applied: String },
    /// Badge marking a field that currently holds Tamil text.
    ScriptIndicator { surface: SurfaceId },
}

const INDICATOR_WIDTH: f32 = 44.0;
const INDICATOR_HEIGHT: f32 = 18.0;
/// Inset from the field's right edge and lift above its top edge.
const INDICATOR_INSET: f32 = 5.0;
const INDICATOR_LIFT: f32 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub content: OverlayContent,
    pub placement: Placement,
}

pub fn compute_anchor<H>(
    host: &H,
    surface: &Surface,
    span: &WordSpan,
    settings: &OverlaySettings,
) -> Rect
where
    H: PageDom + PageGeometry,
{
    let field = host.bounding_box(surface.node).unwrap_or_default();
    let measured = match surface.kind {
        SurfaceKind::PlainValue => plain_anchor(host, surface, field, span, settings),
        SurfaceKind::RichText => rich_anchor(host, surface.node, span),
    };
    measured.unwrap_or(field)
}

fn plain_anchor<H>(
    host: &H,
    surface: &Surface,
    field: Rect,
    span: &WordSpan,
    settings: &OverlaySettings,
) -> Option<Rect>
where
    H: PageDom + PageGeometry,
{
    let text = surface.text(host);
    if text.is_empty() || span.end > char_len(&text) || span.start >= span.end {
        return None;
    }
    let prefix = char_slice(&text, 0, span.start);
    let line_index = prefix.matches('\n').count();
    let line_prefix = prefix.rsplit('\n').next().unwrap_or(prefix);
    let word = char_slice(&text, span.start, span.end);

    let measure = |s: &str| {
        host.measure_text(surface.node, s)
            .unwrap_or_else(|| s.width() as f32 * settings.fallback_char_width)
    };
    let metrics = host.field_metrics(surface.node).unwrap_or_default();
    let line_height = if metrics.line_height > 0.0 {
        metrics.line_height
    } else {
        field.height
    };

    Some(Rect::new(
        field.left + metrics.padding_left - metrics.scroll_left + measure(line_prefix),
        field.top + metrics.padding_top - metrics.scroll_top + line_index as f32 * line_height,
        measure(word),
        line_height,
    ))
}

fn rich_anchor<H>(host: &H, node: NodeId, span: &WordSpan) -> Option<Rect>
where
    H: PageDom + PageGeometry,
{
    let parts = host.text_nodes(node);
    let map = TextNodeMap::new(&parts);
    if span.start >= span.end || span.end > map.total_len() {
        return None;
    }
    // Resolve the start forward across a seam so the rect lands in the node
    // that actually holds the first char.
    let (idx, offset) = map.locate(span.start + 1);
    let start = offset - 1;
    let node_len = char_len(parts.get(idx)?);
    let end = (start + span.len()).min(node_len);
    host.range_rect(node, idx, start, end)
}

/// Place an overlay of the configured size below the field, aligned with
/// the anchor where possible, flipped above when it would leave the
/// viewport, and clamped horizontally within the margins.
pub fn place_overlay(
    anchor: Rect,
    field: Rect,
    viewport: Viewport,
    settings: &OverlaySettings,
) -> Placement {
    let (sx, sy) = (viewport.scroll_x, viewport.scroll_y);
    let field_left = field.left + sx;

    let word_x = anchor.left - field.left;
    let mut left = if word_x > 0.0 {
        (field_left + word_x - settings.word_lead).max(field_left)
    } else {
        field_left
    };
    if left + settings.width > sx + viewport.width {
        left = sx + viewport.width - settings.width - settings.margin;
    }
    if left < sx + settings.margin {
        left = sx + settings.margin;
    }

    let mut top = field.bottom() + sy + settings.gap;
    let mut side = Side::Below;
    if top + settings.height > sy + viewport.height {
        top = field.top + sy - settings.above_offset;
        side = Side::Above;
    }

    Placement {
        anchor: anchor.translate(sx, sy),
        rect: Rect::new(left, top, settings.width, settings.height),
        side,
    }
}

/// Badge pinned just above the field's top-right corner, in page space.
pub fn indicator_placement<H>(host: &H, surface: &Surface) -> Placement
where
    H: PageDom + PageGeometry,
{
    let viewport = host.viewport();
    let field = host
        .bounding_box(surface.node)
        .unwrap_or_default()
        .translate(viewport.scroll_x, viewport.scroll_y);
    Placement {
        anchor: field,
        rect: Rect::new(
            field.right() - INDICATOR_INSET - INDICATOR_WIDTH,
            field.top - INDICATOR_LIFT,
            INDICATOR_WIDTH,
            INDICATOR_HEIGHT,
        ),
        side: Side::Above,
    }
}

/// `compute_anchor` followed by `place_overlay` against the live page.
pub fn position_overlay<H>(
    host: &H,
    surface: &Surface,
    span: &WordSpan,
    settings: &OverlaySettings,
) -> Placement
where
    H: PageDom + PageGeometry,
{
    let field = host.bounding_box(surface.node).unwrap_or_default();
    let anchor = compute_anchor(host, surface, span, settings);
    place_overlay(anchor, field, host.viewport(), settings)
}
