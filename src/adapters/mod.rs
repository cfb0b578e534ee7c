pub mod clock;
pub mod headless;
pub mod tone_cpal;

pub use clock::SystemClock;
pub use headless::{AlwaysVisible, NullHapticMotor, NullSpeechSynthesizer, NullToneOutput};
pub use tone_cpal::CpalToneOutput;
