//! Roundbell: a drift-aware interval-workout timer engine.
//!
//! A workout is an ordered set of round groups (rounds x work seconds x
//! pause seconds). [`build_timeline`] expands one into a phase sequence, and
//! [`TimerEngine`] drives a ~60 Hz countdown through it, speaking lookahead
//! cues and playing boundary tones via pluggable capability ports.
//!
//! Platform capabilities (speech, tone output, haptics, visibility) are
//! trait objects under [`ports`]; real and no-op implementations live under
//! [`adapters`], so the engine runs headless with every capability absent.
//! `start`/`resume` spawn the scheduling loop and must be called inside a
//! tokio runtime.
//!
//! ```no_run
//! use std::sync::Arc;
//! use roundbell::adapters::{AlwaysVisible, CpalToneOutput, NullHapticMotor,
//!     NullSpeechSynthesizer, SystemClock};
//! use roundbell::{AudioSettings, RoundGroup, SpeechNotifier, TimerEngine,
//!     ToneService, WorkoutConfig};
//!
//! # async fn run() -> Result<(), roundbell::DomainError> {
//! let config = WorkoutConfig {
//!     groups: vec![RoundGroup {
//!         id: "tabata".into(),
//!         rounds: 8,
//!         work_seconds: 20.0,
//!         pause_seconds: 10.0,
//!     }],
//! };
//!
//! let speech = SpeechNotifier::new(Arc::new(NullSpeechSynthesizer::new()));
//! let tone = ToneService::new(Arc::new(CpalToneOutput::new()?), Arc::new(NullHapticMotor));
//! let engine = TimerEngine::new(
//!     config,
//!     AudioSettings::default(),
//!     speech,
//!     tone,
//!     Arc::new(SystemClock),
//!     Arc::new(AlwaysVisible::new()),
//! );
//!
//! engine.start();
//! // ... observe engine.state() / engine.subscribe() from the UI ...
//! engine.cleanup();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use app::{SpeakOptions, SpeechNotifier, TimerEngine, ToneService, VoicePreferences};
pub use domain::{
    build_timeline, AudioSettings, DomainError, PhaseKind, RoundGroup, TimelineItem, TimerEvent,
    TimerState, TimerStatus, WorkoutConfig, COUNTDOWN_SECONDS,
};
