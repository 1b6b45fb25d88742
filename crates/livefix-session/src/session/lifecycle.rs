use std::time::{Duration, Instant};

use livefix_core::boundary::WordSpan;
use livefix_core::cache::{normalize_word, CacheEntry};
use livefix_core::service::{CorrectionResponse, ServiceFailure};
use livefix_core::types::SurfaceId;
use livefix_core::unicode::char_len;

use super::types::{CorrectionTicket, Suggestion, SuggestionState, Transition};
use super::CorrectionSession;
use crate::host::HostPage;
use crate::mutator::{apply_fallback, apply_replacement, ApplyOutcome};
use crate::overlay::{position_overlay, OverlayContent, OverlayView};
use crate::timers::TimerKind;

impl<H: HostPage> CorrectionSession<H> {
    /// Hand back the result of a ticket from `take_requests`.
    ///
    /// Successful responses always land in the cache. The suggestion itself
    /// only moves on when it is still the surface's pending suggestion and
    /// the surface has not changed since detection.
    pub fn receive_correction(
        &mut self,
        ticket: &CorrectionTicket,
        result: Result<CorrectionResponse, ServiceFailure>,
        now: Instant,
    ) {
        if let Ok(response) = &result {
            if !response.corrected_text.trim().is_empty() {
                self.cache.put(
                    ticket.key.clone(),
                    CacheEntry {
                        corrected_text: response.corrected_text.clone(),
                        suggestions: response.suggestions.clone().unwrap_or_default(),
                        fetched_at_generation: ticket.generation,
                    },
                );
            }
        }

        let surface = ticket.surface;
        let created_at = self
            .active
            .get(&surface)
            .filter(|s| s.id == ticket.suggestion && s.state == SuggestionState::Pending)
            .map(|s| s.generation);
        let Some(created_at) = created_at else {
            tracing::debug!(suggestion = %ticket.suggestion, "receive: owner gone, discarded");
            return;
        };
        if self.surface_generation(surface) != Some(created_at) {
            tracing::debug!(suggestion = %ticket.suggestion, "receive: surface changed, discarded");
            self.resolve(surface, SuggestionState::Superseded);
            return;
        }

        let response = match result {
            Ok(response) => response,
            Err(failure) => {
                tracing::warn!(
                    suggestion = %ticket.suggestion,
                    kind = failure.kind(),
                    error = %failure,
                    "receive: service failure"
                );
                self.resolve(surface, SuggestionState::Expired);
                return;
            }
        };

        let unchanged = response.corrected_text.trim().is_empty()
            || self.active.get(&surface).is_some_and(|s| {
                normalize_word(&response.corrected_text) == normalize_word(&s.span.text)
            });
        if unchanged {
            tracing::debug!(suggestion = %ticket.suggestion, "receive: no change needed");
            self.resolve(surface, SuggestionState::Expired);
            return;
        }

        if let Some(suggestion) = self.active.get_mut(&surface) {
            suggestion.corrected = Some(response.corrected_text);
            suggestion.alternatives = response.suggestions.unwrap_or_default();
            let (id, from) = (suggestion.id, suggestion.state);
            self.transitions.push(Transition {
                suggestion: id,
                surface,
                from: Some(from),
                to: SuggestionState::Shown,
            });
        }
        self.show(surface, now);
    }

    /// Apply the shown suggestion on `surface`.
    ///
    /// When the surface changed since detection the stored offsets are not
    /// trusted: the word is searched for by bounded last occurrence and the
    /// suggestion ends as superseded rather than applied. Returns `None`
    /// when nothing is shown on the surface.
    pub fn accept(&mut self, surface_id: SurfaceId, now: Instant) -> Option<ApplyOutcome> {
        let (span, corrected, created_at) = match self.active.get(&surface_id) {
            Some(s) if s.state == SuggestionState::Shown => {
                (s.span.clone(), s.corrected.clone()?, s.generation)
            }
            _ => return None,
        };
        let surface = self.registry.get(surface_id)?;
        let fresh = surface.generation() == created_at;
        let outcome = if fresh {
            apply_replacement(&mut self.host, surface, &span, &corrected)
        } else {
            tracing::debug!(surface = %surface_id, "accept: surface changed, using fallback");
            apply_fallback(&mut self.host, surface, &span, &corrected)
        };

        let state = match outcome {
            ApplyOutcome::Missed => SuggestionState::Superseded,
            _ if fresh => SuggestionState::Applied,
            _ => SuggestionState::Superseded,
        };
        self.resolve(surface_id, state);

        if let ApplyOutcome::Replaced { start, .. } = outcome {
            if let Some(surface) = self.registry.get_mut(surface_id) {
                surface.bump_generation();
            }
            let applied = WordSpan {
                start,
                end: start + char_len(&corrected),
                text: corrected,
            };
            self.show_feedback(surface_id, applied, now);
            self.sync_indicator(surface_id);
        }
        Some(outcome)
    }

    /// Replace `original` with `corrected` wherever it is still typed, for
    /// corrections computed outside the live flow (e.g. over a whole
    /// paragraph). The focused surface is tried first, then every other
    /// tracked surface in attach order. Each try is a bounded
    /// last-occurrence search. Returns `None` when no surface holds
    /// `original`.
    pub fn apply_correction(
        &mut self,
        original: &str,
        corrected: &str,
        now: Instant,
    ) -> Option<(SurfaceId, ApplyOutcome)> {
        if original.trim().is_empty() {
            return None;
        }
        let span = WordSpan {
            start: 0,
            end: char_len(original),
            text: original.to_string(),
        };
        let focused = self.focused_surface();
        let mut order: Vec<SurfaceId> = focused.into_iter().collect();
        order.extend(self.registry.ids().into_iter().filter(|id| Some(*id) != focused));

        for id in order {
            let Some(surface) = self.registry.get(id) else {
                continue;
            };
            let outcome = apply_fallback(&mut self.host, surface, &span, corrected);
            match outcome {
                ApplyOutcome::Missed => continue,
                ApplyOutcome::Unchanged => return Some((id, outcome)),
                ApplyOutcome::Replaced { start, .. } => {
                    if let Some(surface) = self.registry.get_mut(id) {
                        surface.bump_generation();
                    }
                    let applied = WordSpan {
                        start,
                        end: start + char_len(corrected),
                        text: corrected.to_string(),
                    };
                    tracing::debug!(surface = %id, start, "session: correction applied");
                    self.show_feedback(id, applied, now);
                    self.sync_indicator(id);
                    return Some((id, outcome));
                }
            }
        }
        tracing::debug!(original, "session: correction target not found");
        None
    }

    /// Dismiss the shown suggestion on `surface`. Returns whether one was
    /// shown.
    pub fn ignore(&mut self, surface: SurfaceId) -> bool {
        let shown = self
            .active
            .get(&surface)
            .is_some_and(|s| s.state == SuggestionState::Shown);
        if shown {
            self.resolve(surface, SuggestionState::Ignored);
        }
        shown
    }

    /// The single exit from a non-terminal state. Removes the overlay and
    /// cancels the expiry timer unconditionally.
    pub(super) fn resolve(&mut self, surface: SurfaceId, state: SuggestionState) -> Option<Suggestion> {
        debug_assert!(state.is_terminal());
        let mut suggestion = self.active.remove(&surface)?;
        self.timers.cancel(TimerKind::Expire(suggestion.id));
        if let Some(overlay) = suggestion.overlay.take() {
            self.host.remove_overlay(overlay);
        }
        let from = suggestion.state;
        suggestion.state = state;
        self.transitions.push(Transition {
            suggestion: suggestion.id,
            surface,
            from: Some(from),
            to: state,
        });
        tracing::debug!(suggestion = %suggestion.id, %from, to = %state, "session: resolved");
        Some(suggestion)
    }

    pub(super) fn record(
        &mut self,
        suggestion: &Suggestion,
        from: Option<SuggestionState>,
        to: SuggestionState,
    ) {
        self.transitions.push(Transition {
            suggestion: suggestion.id,
            surface: suggestion.surface,
            from,
            to,
        });
    }

    /// Render the overlay for the surface's suggestion and start its
    /// visibility window.
    pub(super) fn show(&mut self, surface_id: SurfaceId, now: Instant) {
        let (Some(surface), Some(suggestion)) =
            (self.registry.get(surface_id), self.active.get(&surface_id))
        else {
            return;
        };
        let view = OverlayView {
            content: OverlayContent::Suggestion {
                surface: surface_id,
                original: suggestion.span.text.clone(),
                corrected: suggestion.corrected.clone().unwrap_or_default(),
                alternatives: suggestion.alternatives.clone(),
                style: suggestion.style,
            },
            placement: position_overlay(&self.host, surface, &suggestion.span, &self.settings.overlay),
        };
        let overlay = self.host.show_overlay(&view);
        let visible = Duration::from_millis(self.settings.suggestion.visible_ms);
        if let Some(suggestion) = self.active.get_mut(&surface_id) {
            suggestion.state = SuggestionState::Shown;
            suggestion.overlay = Some(overlay);
            self.timers
                .schedule(TimerKind::Expire(suggestion.id), now + visible);
            tracing::debug!(
                suggestion = %suggestion.id,
                left = view.placement.rect.left,
                top = view.placement.rect.top,
                "session: shown"
            );
        }
    }

    fn show_feedback(&mut self, surface_id: SurfaceId, applied: WordSpan, now: Instant) {
        let feedback_ms = self.settings.suggestion.feedback_ms;
        if feedback_ms == 0 {
            return;
        }
        let Some(surface) = self.registry.get(surface_id) else {
            return;
        };
        let view = OverlayView {
            placement: position_overlay(&self.host, surface, &applied, &self.settings.overlay),
            content: OverlayContent::Feedback {
                surface: surface_id,
                applied: applied.text,
            },
        };
        let overlay = self.host.show_overlay(&view);
        self.feedback.insert(overlay);
        self.timers.schedule(
            TimerKind::Feedback(overlay),
            now + Duration::from_millis(feedback_ms),
        );
    }
}
