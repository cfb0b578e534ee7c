pub mod engine;
pub mod speech;
pub mod tone;

pub use engine::TimerEngine;
pub use speech::{SpeakOptions, SpeechNotifier, VoicePreferences};
pub use tone::ToneService;
