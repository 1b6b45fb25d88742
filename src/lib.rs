//! Live spelling correction for Tamil text fields.
//!
//! [`LiveCorrectionEngine`] ties a [`CorrectionSession`] (detection, the
//! suggestion state machine, text replacement and overlay placement) to a
//! [`CorrectionClient`] that runs service calls on worker threads.

pub mod client;
pub mod engine;
pub mod trace_init;


pub use client::{CorrectionClient, CorrectionResult, Submission};
pub use engine::{EngineError, LiveCorrectionEngine};

pub use livefix_core::service::{
    CorrectionRequest, CorrectionResponse, CorrectionService, Operation, ServiceFailure,
    StaticCorrections,
};
pub use livefix_core::http::HttpCorrectionService;
pub use livefix_core::settings::{load_settings, parse_settings_toml, Settings, SettingsError};
pub use livefix_core::types::{Granularity, SurfaceId};
pub use livefix_session::{
    ApplyOutcome, CorrectionSession, HostPage, InputEvent, MemoryPage, MutationRecord, NodeId,
    SuggestionState, Transition,
};
