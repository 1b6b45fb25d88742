//! Suggestion lifecycle controller.
//!
//! `CorrectionSession` owns the host page, the surface registry, the shared
//! correction cache and every active suggestion. It is single-threaded and
//! never blocks: service calls leave as `CorrectionTicket`s (drained with
//! `take_requests`) and their results come back via `receive_correction`.
//! Time only advances through the `now` arguments and `tick`.
//!
//! Per surface there is at most one non-terminal suggestion. Every exit
//! from a non-terminal state goes through `resolve`, which removes the
//! overlay and cancels the expiry timer.
//!
//! Independently of suggestions, each surface holding Tamil text carries a
//! script badge overlay while the session is enabled.

mod detect;
mod lifecycle;
mod presence;
mod types;

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use livefix_core::cache::CorrectionCache;
use livefix_core::settings::Settings;
use livefix_core::types::{Granularity, SurfaceId};

pub use types::{
    CorrectionTicket, InputEvent, Suggestion, SuggestionId, SuggestionState, Transition,
};

use crate::host::{HostPage, MutationRecord, NodeId, OverlayId};
use crate::surface::SurfaceRegistry;
use crate::timers::{TimerKind, Timers};

/// A detection waiting out its debounce delay.
#[derive(Debug, Clone, Copy)]
struct DetectTrigger {
    offset: usize,
    granularity: Granularity,
    /// Set for typed boundaries; the char before `offset` must still be one
    /// when the debounce runs out.
    after_boundary: bool,
}

pub struct CorrectionSession<H: HostPage> {
    host: H,
    settings: Settings,
    registry: SurfaceRegistry,
    cache: CorrectionCache,
    timers: Timers,

    active: HashMap<SurfaceId, Suggestion>,
    triggers: HashMap<SurfaceId, DetectTrigger>,
    feedback: HashSet<OverlayId>,
    indicators: HashMap<SurfaceId, OverlayId>,

    outbox: Vec<CorrectionTicket>,
    transitions: Vec<Transition>,

    enabled: bool,
    next_suggestion: u64,
}

impl<H: HostPage> CorrectionSession<H> {
    pub fn new(host: H, settings: Settings) -> Self {
        let cache = CorrectionCache::new(settings.cache.max_entries);
        Self {
            host,
            settings,
            registry: SurfaceRegistry::new(),
            cache,
            timers: Timers::new(),
            active: HashMap::new(),
            triggers: HashMap::new(),
            feedback: HashSet::new(),
            indicators: HashMap::new(),
            outbox: Vec::new(),
            transitions: Vec::new(),
            enabled: true,
            next_suggestion: 0,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CorrectionCache {
        &self.cache
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_installed(&self) -> bool {
        self.registry.root().is_some()
    }

    /// Start tracking eligible elements below `root`.
    pub fn install(&mut self, root: NodeId) -> Vec<SurfaceId> {
        let ids = self.registry.install(&mut self.host, root);
        for &id in &ids {
            self.sync_indicator(id);
        }
        ids
    }

    /// Resolve every active suggestion as ignored, drop all timers and
    /// overlays, and detach from every surface.
    pub fn teardown(&mut self) -> Vec<SurfaceId> {
        self.resolve_all(SuggestionState::Ignored);
        for overlay in self.feedback.drain() {
            self.host.remove_overlay(overlay);
        }
        self.drop_all_indicators();
        self.timers.clear();
        self.triggers.clear();
        self.outbox.clear();
        let ids = self.registry.teardown(&mut self.host);
        tracing::debug!(surfaces = ids.len(), "session: torn down");
        ids
    }

    /// Disabling resolves every active suggestion as ignored, hides the
    /// script badges and suppresses new detections until re-enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.resolve_all(SuggestionState::Ignored);
            for (surface, _) in self.triggers.drain() {
                self.timers.cancel(TimerKind::Detect(surface));
            }
            self.outbox.clear();
            self.drop_all_indicators();
        } else {
            self.sync_all_indicators();
        }
        tracing::debug!(enabled, "session: enabled changed");
    }

    /// Fold a structural change of the page in. Surfaces that left the page
    /// lose their suggestion (expired) and their sentence cache entries.
    pub fn handle_mutation(&mut self, record: &MutationRecord) -> crate::surface::RegistryDelta {
        let delta = self.registry.observe(&mut self.host, record);
        for &surface in &delta.detached {
            self.resolve(surface, SuggestionState::Expired);
            if self.triggers.remove(&surface).is_some() {
                self.timers.cancel(TimerKind::Detect(surface));
            }
            self.drop_indicator(surface);
            self.cache.invalidate_surface(surface);
        }
        for &surface in &delta.attached {
            self.sync_indicator(surface);
        }
        delta
    }

    /// Fire every timer due at `now`.
    pub fn tick(&mut self, now: Instant) {
        for timer in self.timers.due(now) {
            match timer {
                TimerKind::Detect(surface) => {
                    if let Some(trigger) = self.triggers.remove(&surface) {
                        self.detect(surface, trigger, now);
                    }
                }
                TimerKind::Expire(id) => {
                    let surface = self
                        .active
                        .values()
                        .find(|s| s.id == id && s.state == SuggestionState::Shown)
                        .map(|s| s.surface);
                    if let Some(surface) = surface {
                        tracing::debug!(suggestion = %id, "session: visibility window elapsed");
                        self.resolve(surface, SuggestionState::Expired);
                    }
                }
                TimerKind::Feedback(overlay) => {
                    if self.feedback.remove(&overlay) {
                        self.host.remove_overlay(overlay);
                    }
                }
            }
        }
    }

    pub fn active_suggestion(&self, surface: SurfaceId) -> Option<&Suggestion> {
        self.active.get(&surface)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn surface_generation(&self, surface: SurfaceId) -> Option<u64> {
        self.registry.get(surface).map(|s| s.generation())
    }

    /// Take queued service calls, clearing the internal buffer.
    pub fn take_requests(&mut self) -> Vec<CorrectionTicket> {
        std::mem::take(&mut self.outbox)
    }

    /// Take the transition log, clearing the internal buffer.
    pub fn take_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    fn next_suggestion_id(&mut self) -> SuggestionId {
        self.next_suggestion += 1;
        SuggestionId(self.next_suggestion)
    }

    fn resolve_all(&mut self, state: SuggestionState) {
        let mut surfaces: Vec<SurfaceId> = self.active.keys().copied().collect();
        surfaces.sort();
        for surface in surfaces {
            self.resolve(surface, state);
        }
    }
}
