use std::fmt;

use livefix_core::boundary::WordSpan;
use livefix_core::cache::CacheKey;
use livefix_core::service::CorrectionRequest;
use livefix_core::settings::RenderStyle;
use livefix_core::types::{Granularity, SurfaceId};

use crate::host::OverlayId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuggestionId(pub u64);

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "suggestion-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuggestionState {
    /// Request in flight.
    Pending,
    /// Overlay visible.
    Shown,
    Applied,
    Ignored,
    Expired,
    Superseded,
}

impl SuggestionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SuggestionState::Pending | SuggestionState::Shown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionState::Pending => "pending",
            SuggestionState::Shown => "shown",
            SuggestionState::Applied => "applied",
            SuggestionState::Ignored => "ignored",
            SuggestionState::Expired => "expired",
            SuggestionState::Superseded => "superseded",
        }
    }
}

impl fmt::Display for SuggestionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input notifications forwarded by the host, after the field has been
/// updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Text typed or committed by an IME.
    Inserted(String),
    Deleted,
    Paste,
    /// Enter in a single-line field; the text itself is unchanged.
    Submit,
}

impl InputEvent {
    pub fn changes_text(&self) -> bool {
        !matches!(self, InputEvent::Submit)
    }
}

/// One correction lifecycle on one surface.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub surface: SurfaceId,
    pub granularity: Granularity,
    pub span: WordSpan,
    /// Surface generation when the span was detected.
    pub generation: u64,
    pub state: SuggestionState,
    pub corrected: Option<String>,
    pub alternatives: Vec<String>,
    pub style: RenderStyle,
    pub(crate) key: CacheKey,
    pub(crate) overlay: Option<OverlayId>,
}

impl Suggestion {
    pub fn original(&self) -> &str {
        &self.span.text
    }

    pub fn overlay(&self) -> Option<OverlayId> {
        self.overlay
    }
}

/// A service call the session wants made. The caller runs it and hands the
/// result back through `receive_correction` together with the ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionTicket {
    pub suggestion: SuggestionId,
    pub surface: SurfaceId,
    pub generation: u64,
    pub key: CacheKey,
    pub request: CorrectionRequest,
}

/// One state change, as recorded in the transition log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub suggestion: SuggestionId,
    pub surface: SurfaceId,
    /// `None` when the suggestion was just created.
    pub from: Option<SuggestionState>,
    pub to: SuggestionState,
}
