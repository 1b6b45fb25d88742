use std::sync::Arc;
use std::time::{Duration, Instant};

use livefix_core::service::CorrectionService;
use livefix_core::settings::Settings;
use livefix_core::types::SurfaceId;
use livefix_session::{
    ApplyOutcome, CorrectionSession, CorrectionTicket, HostPage, InputEvent, MutationRecord, NodeId,
    RegistryDelta, Transition,
};

use crate::client::{CorrectionClient, CorrectionResult, Submission};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine is already installed")]
    AlreadyInstalled,
    #[error("engine is not installed")]
    NotInstalled,
    #[error("node {0} is not a tracked surface")]
    UnknownNode(NodeId),
    #[error("unknown surface {0}")]
    UnknownSurface(SurfaceId),
    #[error("no suggestion is shown on {0}")]
    NoActiveSuggestion(SurfaceId),
    #[error("no tracked field contains {0:?}")]
    TextNotFound(String),
}

/// One live-correction instance bound to a host page.
///
/// Input, page mutations and user decisions are handled synchronously by
/// the session; service calls run on the client's worker threads and come
/// back through `poll` or `wait_for_requests`.
pub struct LiveCorrectionEngine<H: HostPage> {
    session: CorrectionSession<H>,
    client: CorrectionClient,
}

impl<H: HostPage> LiveCorrectionEngine<H> {
    pub fn new(host: H, service: Arc<dyn CorrectionService>, settings: Settings) -> Self {
        let client = CorrectionClient::new(service, settings.service.workers);
        Self {
            session: CorrectionSession::new(host, settings),
            client,
        }
    }

    pub fn session(&self) -> &CorrectionSession<H> {
        &self.session
    }

    pub fn host(&self) -> &H {
        self.session.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.session.host_mut()
    }

    pub fn client(&self) -> &CorrectionClient {
        &self.client
    }

    /// Take the session's transition log, clearing it.
    pub fn take_transitions(&mut self) -> Vec<Transition> {
        self.session.take_transitions()
    }

    pub fn install(&mut self, root: NodeId) -> Result<Vec<SurfaceId>, EngineError> {
        if self.session.is_installed() {
            return Err(EngineError::AlreadyInstalled);
        }
        let ids = self.session.install(root);
        tracing::info!(root, surfaces = ids.len(), "engine: installed");
        Ok(ids)
    }

    /// Detach from the page. Calls still in flight complete in the
    /// background and are only cached.
    pub fn teardown(&mut self) -> Result<Vec<SurfaceId>, EngineError> {
        if !self.session.is_installed() {
            return Err(EngineError::NotInstalled);
        }
        Ok(self.session.teardown())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.session.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.session.is_enabled()
    }

    pub fn handle_input(
        &mut self,
        node: NodeId,
        event: &InputEvent,
        now: Instant,
    ) -> Result<(), EngineError> {
        if !self.session.is_installed() {
            return Err(EngineError::NotInstalled);
        }
        if !self.session.handle_input(node, event, now) {
            return Err(EngineError::UnknownNode(node));
        }
        self.flush_requests();
        Ok(())
    }

    pub fn handle_mutation(&mut self, record: &MutationRecord) -> Result<RegistryDelta, EngineError> {
        if !self.session.is_installed() {
            return Err(EngineError::NotInstalled);
        }
        Ok(self.session.handle_mutation(record))
    }

    pub fn accept(&mut self, surface: SurfaceId, now: Instant) -> Result<ApplyOutcome, EngineError> {
        self.known(surface)?;
        self.session
            .accept(surface, now)
            .ok_or(EngineError::NoActiveSuggestion(surface))
    }

    pub fn ignore(&mut self, surface: SurfaceId) -> Result<(), EngineError> {
        self.known(surface)?;
        if self.session.ignore(surface) {
            Ok(())
        } else {
            Err(EngineError::NoActiveSuggestion(surface))
        }
    }

    /// Write a correction computed outside the live flow back into the page.
    /// The focused field is tried first, then the others.
    pub fn apply_correction(
        &mut self,
        original: &str,
        corrected: &str,
        now: Instant,
    ) -> Result<(SurfaceId, ApplyOutcome), EngineError> {
        if !self.session.is_installed() {
            return Err(EngineError::NotInstalled);
        }
        self.session
            .apply_correction(original, corrected, now)
            .ok_or_else(|| EngineError::TextNotFound(original.to_string()))
    }

    /// Selected text of `surface`, trimmed, if it contains Tamil.
    pub fn selected_text(&self, surface: SurfaceId) -> Result<Option<String>, EngineError> {
        self.known(surface)?;
        Ok(self.session.selected_target_text(surface))
    }

    /// Fire due debounce, expiry and feedback timers.
    pub fn tick(&mut self, now: Instant) {
        self.session.tick(now);
        self.flush_requests();
    }

    /// Earliest pending timer, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.timers().next_deadline()
    }

    /// Deliver every finished service call. Returns how many tickets were
    /// answered.
    pub fn poll(&mut self, now: Instant) -> usize {
        self.flush_requests();
        let done = self.client.try_recv();
        self.deliver(done, now)
    }

    /// Like `poll`, but waits up to `timeout` for the first call to finish.
    pub fn wait_for_requests(&mut self, timeout: Duration, now: Instant) -> usize {
        self.flush_requests();
        let done = self.client.recv_timeout(timeout);
        self.deliver(done, now)
    }

    fn deliver(&mut self, done: Vec<(CorrectionTicket, CorrectionResult)>, now: Instant) -> usize {
        let n = done.len();
        for (ticket, result) in done {
            self.session.receive_correction(&ticket, result, now);
        }
        n
    }

    fn flush_requests(&mut self) {
        for ticket in self.session.take_requests() {
            if self.client.submit(ticket) == Submission::Coalesced {
                tracing::trace!("engine: request shared with an in-flight call");
            }
        }
    }

    fn known(&self, surface: SurfaceId) -> Result<(), EngineError> {
        if self.session.registry().get(surface).is_some() {
            Ok(())
        } else {
            Err(EngineError::UnknownSurface(surface))
        }
    }
}
