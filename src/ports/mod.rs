pub mod audio;
pub mod clock;
pub mod haptics;
pub mod speech;
pub mod visibility;

pub use audio::{SequencedTone, ToneOutput, ToneSpec, Waveform};
pub use clock::Clock;
pub use haptics::{HapticMotor, VibrationPattern};
pub use speech::{SpeechSynthesizer, Utterance, Voice};
pub use visibility::VisibilitySource;
