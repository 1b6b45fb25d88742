//! Deadline queue driven by the caller's clock.
//!
//! The session never sleeps. The host calls `tick(now)` and every timer whose
//! deadline has passed fires in deadline order. Each `TimerKind` has at most
//! one pending deadline; scheduling it again restarts it.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use livefix_core::types::SurfaceId;

use crate::host::OverlayId;
use crate::session::SuggestionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Debounced word detection for a surface.
    Detect(SurfaceId),
    /// Visibility window of a shown suggestion.
    Expire(SuggestionId),
    /// Removal of a transient feedback overlay.
    Feedback(OverlayId),
}

#[derive(Default)]
pub struct Timers {
    queue: BTreeMap<(Instant, u64), TimerKind>,
    index: HashMap<TimerKind, (Instant, u64)>,
    seq: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TimerKind, at: Instant) {
        self.cancel(kind);
        self.seq += 1;
        let slot = (at, self.seq);
        self.queue.insert(slot, kind);
        self.index.insert(kind, slot);
    }

    /// Returns whether a pending timer was removed.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.index.remove(&kind) {
            Some(slot) => {
                self.queue.remove(&slot);
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.index.contains_key(&kind)
    }

    /// Pop every timer due at `now`, earliest first.
    pub fn due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        while let Some((&slot, _)) = self.queue.first_key_value() {
            if slot.0 > now {
                break;
            }
            if let Some(kind) = self.queue.remove(&slot) {
                self.index.remove(&kind);
                fired.push(kind);
            }
        }
        fired
    }

    pub fn kinds(&self) -> impl Iterator<Item = &TimerKind> {
        self.queue.values()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.first_key_value().map(|((at, _), _)| *at)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
