use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;

use livefix_core::http::HttpCorrectionService;
use livefix_core::service::{CorrectionService, StaticCorrections};
use livefix_core::settings::Settings;
use livefix_engine::{EngineError, LiveCorrectionEngine};
use livefix_session::{ApplyOutcome, MemoryPage, SuggestionState, Transition};

use super::{die, exit_with};

/// Where replayed requests are answered.
pub enum ServiceChoice {
    /// Built-in spelling table.
    Offline,
    /// `{ "wrong": "right" }` JSON file.
    Table(String),
    /// The HTTP service, optionally at another endpoint.
    Live(Option<String>),
}

pub struct ReplayOptions {
    pub rich: bool,
    pub accept: bool,
    pub keystroke_ms: u64,
}

#[derive(Debug)]
pub struct ReplayReport {
    pub transitions: Vec<Transition>,
    pub outcomes: Vec<ApplyOutcome>,
    pub text: String,
    pub calls: u64,
}

pub fn build_service(settings: &Settings, choice: &ServiceChoice) -> Arc<dyn CorrectionService> {
    match choice {
        ServiceChoice::Offline => Arc::new(StaticCorrections::fallback()),
        ServiceChoice::Table(path) => {
            let json = die!(fs::read_to_string(path), "Error reading {path}: {}");
            Arc::new(die!(StaticCorrections::from_json(&json), "Error in {path}: {}"))
        }
        ServiceChoice::Live(endpoint) => {
            let mut service = settings.service.clone();
            if let Some(endpoint) = endpoint {
                service.endpoint = endpoint.clone();
            }
            Arc::new(HttpCorrectionService::from_settings(&service))
        }
    }
}

/// Type `text` one character at a time into a fresh in-memory field.
///
/// Keystrokes are `keystroke_ms` apart on a simulated clock. Before every
/// keystroke due timers fire and all outstanding service calls are waited
/// for, so answers always arrive before the next keystroke. With `accept`,
/// each suggestion is accepted as soon as it is shown.
pub fn run_replay(
    settings: &Settings,
    service: Arc<dyn CorrectionService>,
    text: &str,
    options: &ReplayOptions,
) -> Result<ReplayReport, EngineError> {
    let mut page = MemoryPage::new();
    let root = page.root();
    let node = if options.rich {
        page.add_editable(root, &[""])
    } else {
        page.add_text_input(root, "text")
    };
    let mut engine = LiveCorrectionEngine::new(page, service, settings.clone());
    let surface = engine
        .install(root)?
        .first()
        .copied()
        .ok_or(EngineError::UnknownNode(node))?;

    let wait = Duration::from_millis(settings.service.timeout_ms + 1_000);
    let step = Duration::from_millis(options.keystroke_ms);
    let mut outcomes = Vec::new();
    let mut transitions = Vec::new();
    let mut now = Instant::now();

    let mut settle = |engine: &mut LiveCorrectionEngine<MemoryPage>, now: Instant| {
        engine.tick(now);
        while engine.client().in_flight() > 0 {
            if engine.wait_for_requests(wait, now) == 0 {
                tracing::warn!("replay: service did not answer in time");
                break;
            }
        }
        let shown = engine
            .session()
            .active_suggestion(surface)
            .is_some_and(|s| s.state == SuggestionState::Shown);
        if options.accept && shown {
            if let Ok(outcome) = engine.accept(surface, now) {
                outcomes.push(outcome);
                // Back to the end of the field before typing on.
                let end = engine.host().text(node).chars().count();
                engine.host_mut().set_cursor(node, end);
            }
        }
    };

    for c in text.chars() {
        settle(&mut engine, now);
        let event = engine.host_mut().type_text(node, c.encode_utf8(&mut [0; 4]));
        engine.handle_input(node, &event, now)?;
        transitions.extend(engine.take_transitions());
        now += step;
    }
    // Let the last debounce run out.
    now += Duration::from_millis(settings.detection.debounce_ms);
    settle(&mut engine, now);
    transitions.extend(engine.take_transitions());

    Ok(ReplayReport {
        transitions,
        outcomes,
        text: engine.host().text(node),
        calls: engine.client().calls_issued(),
    })
}

pub fn replay(
    settings: &Settings,
    choice: &ServiceChoice,
    text: &str,
    options: &ReplayOptions,
    as_json: bool,
) {
    let service = build_service(settings, choice);
    let report = match run_replay(settings, service, text, options) {
        Ok(report) => report,
        Err(e) => exit_with(&format!("Error: {e}")),
    };

    if as_json {
        for t in &report.transitions {
            println!(
                "{}",
                json!({
                    "suggestion": t.suggestion.to_string(),
                    "surface": t.surface.to_string(),
                    "from": t.from.map(|s| s.as_str()),
                    "to": t.to.as_str(),
                })
            );
        }
        println!(
            "{}",
            json!({ "text": report.text, "calls": report.calls, "applied": report.outcomes.len() })
        );
        return;
    }

    for t in &report.transitions {
        let from = t.from.map_or("-", |s| s.as_str());
        println!("{} {}: {from} -> {}", t.suggestion, t.surface, t.to);
    }
    println!("calls: {}", report.calls);
    println!("text: {}", report.text);
}
