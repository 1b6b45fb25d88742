mod context;
mod presence;
mod rich_text;

use std::time::{Duration, Instant};

use livefix_core::service::{
    CorrectionResponse, CorrectionService, ServiceFailure, StaticCorrections,
};
use livefix_core::settings::Settings;
use livefix_core::types::SurfaceId;

use crate::host::NodeId;
use crate::memory::MemoryPage;
use crate::overlay::OverlayContent;
use crate::session::{CorrectionSession, CorrectionTicket, SuggestionState, Transition};

pub(super) struct Fixture {
    pub session: CorrectionSession<MemoryPage>,
    pub input: NodeId,
    pub surface: SurfaceId,
    pub t0: Instant,
}

pub(super) fn fixture() -> Fixture {
    fixture_with(Settings::default())
}

pub(super) fn fixture_with(settings: Settings) -> Fixture {
    let mut page = MemoryPage::new();
    let root = page.root();
    let input = page.add_text_input(root, "text");
    let mut session = CorrectionSession::new(page, settings);
    let surface = session.install(root)[0];
    Fixture {
        session,
        input,
        surface,
        t0: Instant::now(),
    }
}

pub(super) fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

impl Fixture {
    /// Type `text` char by char into `node` at time `now`.
    pub fn type_into(&mut self, node: NodeId, text: &str, now: Instant) {
        let events = self.session.host_mut().type_chars(node, text);
        for event in &events {
            self.session.handle_input(node, event, now);
        }
    }

    pub fn type_str(&mut self, text: &str, now: Instant) {
        self.type_into(self.input, text, now);
    }

    /// Type and let the debounce delay run out.
    pub fn type_and_settle(&mut self, text: &str, now: Instant) -> Instant {
        self.type_str(text, now);
        let later = now + ms(self.session.settings().detection.debounce_ms);
        self.session.tick(later);
        later
    }

    /// Answer every queued ticket with `service`.
    pub fn respond_with(&mut self, service: &dyn CorrectionService, now: Instant) -> usize {
        let tickets = self.session.take_requests();
        for ticket in &tickets {
            let result = service.correct(&ticket.request);
            self.session.receive_correction(ticket, result, now);
        }
        tickets.len()
    }

    pub fn respond_fallback(&mut self, now: Instant) -> usize {
        self.respond_with(&StaticCorrections::fallback(), now)
    }

    pub fn fail_all(&mut self, failure: ServiceFailure, now: Instant) -> usize {
        let tickets = self.session.take_requests();
        for ticket in &tickets {
            self.session
                .receive_correction(ticket, Err(failure.clone()), now);
        }
        tickets.len()
    }

    pub fn text(&self) -> String {
        self.session.host().text(self.input)
    }

    pub fn state(&self) -> Option<SuggestionState> {
        self.session
            .active_suggestion(self.surface)
            .map(|s| s.state)
    }

    pub fn suggestion_overlays(&self) -> usize {
        suggestion_overlays(&self.session)
    }

    pub fn feedback_overlays(&self) -> usize {
        self.session
            .host()
            .overlays()
            .filter(|v| matches!(v.content, OverlayContent::Feedback { .. }))
            .count()
    }

    /// `to` states of the transition log, in order.
    pub fn trail(&mut self) -> Vec<SuggestionState> {
        self.session
            .take_transitions()
            .into_iter()
            .map(|t: Transition| t.to)
            .collect()
    }
}

pub(super) fn suggestion_overlays(session: &CorrectionSession<MemoryPage>) -> usize {
    session
        .host()
        .overlays()
        .filter(|v| matches!(v.content, OverlayContent::Suggestion { .. }))
        .count()
}

pub(super) fn response(corrected: &str) -> Result<CorrectionResponse, ServiceFailure> {
    Ok(CorrectionResponse {
        corrected_text: corrected.to_string(),
        ..CorrectionResponse::default()
    })
}

pub(super) fn only_ticket(session: &mut CorrectionSession<MemoryPage>) -> CorrectionTicket {
    let mut tickets = session.take_requests();
    assert_eq!(tickets.len(), 1, "expected exactly one ticket, got {tickets:?}");
    tickets.remove(0)
}
