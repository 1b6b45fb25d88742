use std::time::{Duration, Instant};

use livefix_core::boundary::{
    completes_sentence, completes_word, locate_completed_sentence, locate_completed_word,
    SkipReason,
};
use livefix_core::cache::CacheKey;
use livefix_core::service::CorrectionRequest;
use livefix_core::settings::RenderStyle;
use livefix_core::types::{Granularity, SurfaceId};
use livefix_core::unicode::{char_slice, is_sentence_terminator, is_word_boundary};

use super::types::{CorrectionTicket, InputEvent, Suggestion, SuggestionState};
use super::{CorrectionSession, DetectTrigger};
use crate::host::{HostPage, NodeId};
use crate::timers::TimerKind;

impl<H: HostPage> CorrectionSession<H> {
    /// Process one input notification for `node`. Returns `false` when the
    /// node is not a tracked surface.
    pub fn handle_input(&mut self, node: NodeId, event: &InputEvent, now: Instant) -> bool {
        let Some(id) = self.registry.by_node(node) else {
            return false;
        };
        if event.changes_text() {
            if let Some(surface) = self.registry.get_mut(id) {
                surface.bump_generation();
            }
        }
        // A deletion may have taken the boundary that armed the trigger.
        if *event == InputEvent::Deleted && self.triggers.remove(&id).is_some() {
            self.timers.cancel(TimerKind::Detect(id));
        }
        self.sync_indicator(id);
        if !self.enabled {
            return true;
        }
        let Some(granularity) = self.trigger_granularity(id, event) else {
            return true;
        };
        let Some(surface) = self.registry.get(id) else {
            return true;
        };
        let trigger = DetectTrigger {
            offset: surface.cursor(&self.host),
            granularity,
            after_boundary: matches!(event, InputEvent::Inserted(_)),
        };

        let debounce = self.settings.detection.debounce_ms;
        if debounce == 0 {
            self.detect(id, trigger, now);
        } else {
            // A newer trigger restarts the delay.
            self.triggers.insert(id, trigger);
            self.timers
                .schedule(TimerKind::Detect(id), now + Duration::from_millis(debounce));
        }
        true
    }

    fn trigger_granularity(&self, id: SurfaceId, event: &InputEvent) -> Option<Granularity> {
        let sentences = self.settings.detection.sentence_correction;
        match event {
            InputEvent::Inserted(text) => {
                if sentences && completes_sentence(text) {
                    Some(Granularity::Sentence)
                } else if completes_word(text) {
                    Some(Granularity::Word)
                } else {
                    None
                }
            }
            InputEvent::Paste | InputEvent::Submit => {
                if sentences && self.ends_sentence_at_cursor(id) {
                    Some(Granularity::Sentence)
                } else {
                    Some(Granularity::Word)
                }
            }
            InputEvent::Deleted => None,
        }
    }

    fn ends_sentence_at_cursor(&self, id: SurfaceId) -> bool {
        let Some(surface) = self.registry.get(id) else {
            return false;
        };
        let text = surface.text(&self.host);
        char_slice(&text, 0, surface.cursor(&self.host))
            .trim_end()
            .chars()
            .next_back()
            .is_some_and(is_sentence_terminator)
    }

    /// Resolve the span around the trigger, supersede whatever the surface
    /// had going, then consult the cache or queue a service call.
    pub(super) fn detect(&mut self, id: SurfaceId, trigger: DetectTrigger, now: Instant) {
        if !self.enabled {
            return;
        }
        let Some(surface) = self.registry.get(id) else {
            return;
        };
        let generation = surface.generation();
        let text = surface.text(&self.host);
        if trigger.after_boundary && !boundary_before(&text, trigger.offset) {
            tracing::debug!(
                surface = %id,
                reason = SkipReason::NoWord.as_str(),
                "detect: boundary gone"
            );
            return;
        }
        let min_chars = self.settings.detection.min_word_chars;
        let located = match trigger.granularity {
            Granularity::Word => locate_completed_word(&text, trigger.offset, min_chars),
            Granularity::Sentence => locate_completed_sentence(&text, trigger.offset, min_chars),
        };
        let span = match located {
            Ok(span) => span,
            Err(reason) => {
                tracing::debug!(surface = %id, reason = reason.as_str(), "detect: skipped");
                return;
            }
        };

        self.resolve(id, SuggestionState::Superseded);

        let key = CacheKey::for_span(trigger.granularity, &span.text, id);
        let cached = self.cache.lookup(&key, generation).cloned();
        if let Some(entry) = &cached {
            if entry.is_unchanged(&span.text) {
                tracing::debug!(surface = %id, word = %span.text, "detect: cached as correct");
                return;
            }
        }

        let (style, operation) = match trigger.granularity {
            Granularity::Word => (
                self.settings.suggestion.style,
                self.settings.service.word_operation,
            ),
            Granularity::Sentence => (
                RenderStyle::SentenceTooltip,
                self.settings.service.sentence_operation,
            ),
        };
        let suggestion_id = self.next_suggestion_id();
        let mut suggestion = Suggestion {
            id: suggestion_id,
            surface: id,
            granularity: trigger.granularity,
            span,
            generation,
            state: SuggestionState::Pending,
            corrected: None,
            alternatives: Vec::new(),
            style,
            key: key.clone(),
            overlay: None,
        };

        match cached {
            Some(entry) => {
                tracing::debug!(surface = %id, word = %suggestion.span.text, "detect: cache hit");
                suggestion.corrected = Some(entry.corrected_text);
                suggestion.alternatives = entry.suggestions;
                self.record(&suggestion, None, SuggestionState::Shown);
                self.active.insert(id, suggestion);
                self.show(id, now);
            }
            None => {
                tracing::debug!(surface = %id, word = %suggestion.span.text, "detect: requesting");
                self.outbox.push(CorrectionTicket {
                    suggestion: suggestion_id,
                    surface: id,
                    generation,
                    key,
                    request: CorrectionRequest {
                        text: suggestion.span.text.clone(),
                        operation,
                    },
                });
                self.record(&suggestion, None, SuggestionState::Pending);
                self.active.insert(id, suggestion);
            }
        }
    }
}

/// True when the char just before `offset` is a word boundary.
fn boundary_before(text: &str, offset: usize) -> bool {
    offset
        .checked_sub(1)
        .and_then(|i| text.chars().nth(i))
        .is_some_and(is_word_boundary)
}
