use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use livefix_core::cache::CacheKey;
use livefix_core::service::{
    CorrectionRequest, CorrectionResponse, CorrectionService, ServiceFailure,
};
use livefix_session::CorrectionTicket;

pub type CorrectionResult = Result<CorrectionResponse, ServiceFailure>;

// ---------------------------------------------------------------------------
// Work / Result types
// ---------------------------------------------------------------------------

struct RequestWork {
    key: CacheKey,
    request: CorrectionRequest,
}

struct RequestResult {
    key: CacheKey,
    result: CorrectionResult,
}

/// How `submit` handled a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// A new service call was queued.
    Issued,
    /// A call for the same key is already outstanding; the ticket shares
    /// its result.
    Coalesced,
}

// ---------------------------------------------------------------------------
// CorrectionClient
// ---------------------------------------------------------------------------

/// Runs correction service calls on background threads.
///
/// At most one call per cache key is outstanding at any time. Every ticket
/// submitted while a call for its key is in flight is answered with a copy
/// of that call's result.
pub struct CorrectionClient {
    work_tx: mpsc::Sender<RequestWork>,
    result_rx: Mutex<mpsc::Receiver<RequestResult>>,
    in_flight: HashMap<CacheKey, Vec<CorrectionTicket>>,
    calls_issued: u64,
}

impl CorrectionClient {
    pub fn new(service: Arc<dyn CorrectionService>, workers: usize) -> Self {
        let (work_tx, work_rx) = mpsc::channel::<RequestWork>();
        let (result_tx, result_rx) = mpsc::channel::<RequestResult>();
        let work_rx = Arc::new(Mutex::new(work_rx));

        for i in 0..workers.max(1) {
            let service = Arc::clone(&service);
            let rx = Arc::clone(&work_rx);
            let tx = result_tx.clone();
            thread::Builder::new()
                .name(format!("livefix-request-{i}"))
                .spawn(move || request_worker(rx, tx, service))
                .expect("failed to spawn request worker");
        }

        Self {
            work_tx,
            result_rx: Mutex::new(result_rx),
            in_flight: HashMap::new(),
            calls_issued: 0,
        }
    }

    pub fn submit(&mut self, ticket: CorrectionTicket) -> Submission {
        if let Some(waiting) = self.in_flight.get_mut(&ticket.key) {
            tracing::debug!(suggestion = %ticket.suggestion, "client: coalesced");
            waiting.push(ticket);
            return Submission::Coalesced;
        }
        let work = RequestWork {
            key: ticket.key.clone(),
            request: ticket.request.clone(),
        };
        tracing::debug!(
            suggestion = %ticket.suggestion,
            operation = ticket.request.operation.as_str(),
            "client: issued"
        );
        self.in_flight.insert(ticket.key.clone(), vec![ticket]);
        self.calls_issued += 1;
        if self.work_tx.send(work).is_err() {
            tracing::warn!("client: request workers are gone");
        }
        Submission::Issued
    }

    /// Collect every finished call without blocking. Each waiting ticket is
    /// paired with its own copy of the result.
    pub fn try_recv(&mut self) -> Vec<(CorrectionTicket, CorrectionResult)> {
        let mut done = Vec::new();
        while let Some(finished) = self.try_recv_one() {
            self.settle(finished, &mut done);
        }
        done
    }

    /// Block until at least one call finishes or `timeout` passes, then
    /// collect everything else that is ready.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Vec<(CorrectionTicket, CorrectionResult)> {
        let mut done = Vec::new();
        if self.in_flight.is_empty() {
            return done;
        }
        let deadline = Instant::now() + timeout;
        let first = {
            let Ok(rx) = self.result_rx.lock() else {
                return done;
            };
            rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                .ok()
        };
        if let Some(finished) = first {
            self.settle(finished, &mut done);
        }
        done.extend(self.try_recv());
        done
    }

    /// Number of distinct keys with a call outstanding.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Total service calls issued since construction.
    pub fn calls_issued(&self) -> u64 {
        self.calls_issued
    }

    fn try_recv_one(&self) -> Option<RequestResult> {
        let rx = self.result_rx.lock().ok()?;
        rx.try_recv().ok()
    }

    fn settle(
        &mut self,
        finished: RequestResult,
        done: &mut Vec<(CorrectionTicket, CorrectionResult)>,
    ) {
        let Some(tickets) = self.in_flight.remove(&finished.key) else {
            return;
        };
        for ticket in tickets {
            done.push((ticket, finished.result.clone()));
        }
    }
}

// ---------------------------------------------------------------------------
// Worker threads
// ---------------------------------------------------------------------------

fn request_worker(
    rx: Arc<Mutex<mpsc::Receiver<RequestWork>>>,
    tx: mpsc::Sender<RequestResult>,
    service: Arc<dyn CorrectionService>,
) {
    loop {
        // Hold the lock only while waiting for the next item.
        let work = {
            let Ok(rx) = rx.lock() else { return };
            match rx.recv() {
                Ok(work) => work,
                Err(_) => return,
            }
        };
        let result = service.correct(&work.request);
        if let Err(failure) = &result {
            tracing::debug!(kind = failure.kind(), "worker: call failed");
        }
        if tx
            .send(RequestResult {
                key: work.key,
                result,
            })
            .is_err()
        {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livefix_core::service::{Operation, StaticCorrections};
    use livefix_core::types::SurfaceId;
    use livefix_session::SuggestionId;

    fn ticket(id: u64, surface: u64, word: &str) -> CorrectionTicket {
        CorrectionTicket {
            suggestion: SuggestionId(id),
            surface: SurfaceId(surface),
            generation: 1,
            key: CacheKey::word(word),
            request: CorrectionRequest {
                text: word.to_string(),
                operation: Operation::LiveGrammar,
            },
        }
    }

    fn collect(client: &mut CorrectionClient, want: usize) -> Vec<(CorrectionTicket, CorrectionResult)> {
        let mut got = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while got.len() < want && Instant::now() < deadline {
            got.extend(client.recv_timeout(Duration::from_millis(100)));
        }
        got
    }

    #[test]
    fn test_single_call_round_trip() {
        let mut client = CorrectionClient::new(Arc::new(StaticCorrections::fallback()), 1);
        assert_eq!(client.submit(ticket(1, 1, "வநக்கம்")), Submission::Issued);
        let got = collect(&mut client, 1);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].1.as_ref().unwrap().corrected_text, "வணக்கம்");
        assert_eq!(client.in_flight(), 0);
    }

    #[test]
    fn test_duplicate_keys_share_one_call() {
        let mut client = CorrectionClient::new(Arc::new(StaticCorrections::fallback()), 2);
        assert_eq!(client.submit(ticket(1, 1, "வநக்கம்")), Submission::Issued);
        assert_eq!(client.submit(ticket(2, 2, "வநக்கம்")), Submission::Coalesced);
        assert_eq!(client.calls_issued(), 1);
        let got = collect(&mut client, 2);
        let ids: Vec<_> = got.iter().map(|(t, _)| t.suggestion).collect();
        assert_eq!(ids, vec![SuggestionId(1), SuggestionId(2)]);
    }

    #[test]
    fn test_nothing_in_flight_returns_immediately() {
        let mut client = CorrectionClient::new(Arc::new(StaticCorrections::fallback()), 1);
        let start = Instant::now();
        assert!(client.recv_timeout(Duration::from_secs(5)).is_empty());
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
