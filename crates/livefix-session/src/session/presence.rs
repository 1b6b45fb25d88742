use livefix_core::script::contains_target_script;
use livefix_core::types::SurfaceId;

use super::CorrectionSession;
use crate::host::HostPage;
use crate::overlay::{indicator_placement, OverlayContent, OverlayView};

impl<H: HostPage> CorrectionSession<H> {
    /// Show or hide the surface's script badge to match its current text.
    pub(super) fn sync_indicator(&mut self, id: SurfaceId) {
        let Some(surface) = self.registry.get(id) else {
            self.drop_indicator(id);
            return;
        };
        let wanted = self.enabled && contains_target_script(&surface.text(&self.host));
        let present = self.indicators.contains_key(&id);
        if wanted && !present {
            let view = OverlayView {
                placement: indicator_placement(&self.host, surface),
                content: OverlayContent::ScriptIndicator { surface: id },
            };
            let overlay = self.host.show_overlay(&view);
            self.indicators.insert(id, overlay);
            tracing::trace!(surface = %id, "session: indicator on");
        } else if !wanted && present {
            self.drop_indicator(id);
        }
    }

    pub(super) fn sync_all_indicators(&mut self) {
        for id in self.registry.ids() {
            self.sync_indicator(id);
        }
    }

    pub(super) fn drop_indicator(&mut self, id: SurfaceId) {
        if let Some(overlay) = self.indicators.remove(&id) {
            self.host.remove_overlay(overlay);
            tracing::trace!(surface = %id, "session: indicator off");
        }
    }

    pub(super) fn drop_all_indicators(&mut self) {
        for (_, overlay) in self.indicators.drain() {
            self.host.remove_overlay(overlay);
        }
    }

    pub fn has_indicator(&self, surface: SurfaceId) -> bool {
        self.indicators.contains_key(&surface)
    }

    /// Tracked surface whose element holds keyboard focus.
    pub fn focused_surface(&self) -> Option<SurfaceId> {
        self.host.focused().and_then(|node| self.registry.by_node(node))
    }

    /// Trimmed selected text of `surface`, when it contains Tamil.
    pub fn selected_target_text(&self, surface: SurfaceId) -> Option<String> {
        let selected = self.registry.get(surface)?.selected_text(&self.host)?;
        let trimmed = selected.trim();
        contains_target_script(trimmed).then(|| trimmed.to_string())
    }
}
