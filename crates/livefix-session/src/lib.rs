//! Stateful live-correction core.
//!
//! `CorrectionSession` tracks the text surfaces of one host page, turns
//! completed words into correction requests, and drives each suggestion
//! from detection through to apply, ignore, expiry or supersession. The
//! page itself is reached only through the traits in [`host`].

pub mod host;
pub mod memory;
pub mod mutator;
pub mod overlay;
pub mod session;
pub mod surface;
pub mod timers;

#[cfg(test)]
mod tests;

pub use host::{
    ChangeEvent, FieldMetrics, HostPage, MutationRecord, NodeId, OverlayId, OverlayLayer,
    PageDom, PageGeometry, SurfaceKind,
};
pub use memory::MemoryPage;
pub use mutator::{ApplyOutcome, ReplaceVia};
pub use overlay::{OverlayContent, OverlayView, Placement};
pub use session::{
    CorrectionSession, CorrectionTicket, InputEvent, Suggestion, SuggestionId, SuggestionState,
    Transition,
};
pub use surface::{RegistryDelta, Surface, SurfaceRegistry};
