//! No-op capability adapters for platforms (or tests) without speech,
//! audio, haptics, or visibility reporting. The engine runs unchanged
//! against these; only the cues disappear.

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::domain::DomainError;
use crate::ports::{
    HapticMotor, SequencedTone, SpeechSynthesizer, ToneOutput, ToneSpec, Utterance,
    VibrationPattern, VisibilitySource, Voice,
};

/// A speech port for platforms without a speech engine.
pub struct NullSpeechSynthesizer {
    changed_tx: broadcast::Sender<()>,
}

impl NullSpeechSynthesizer {
    pub fn new() -> Self {
        Self {
            changed_tx: broadcast::channel(1).0,
        }
    }
}

impl Default for NullSpeechSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for NullSpeechSynthesizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn subscribe_voices_changed(&self) -> broadcast::Receiver<()> {
        self.changed_tx.subscribe()
    }

    async fn speak(&self, _utterance: &Utterance) -> Result<(), DomainError> {
        Err(DomainError::SpeechUnsupported)
    }

    fn cancel(&self) {}
}

/// A tone port that discards every tone.
pub struct NullToneOutput;

impl ToneOutput for NullToneOutput {
    fn play(&self, _spec: &ToneSpec) -> Result<(), DomainError> {
        Ok(())
    }

    fn play_sequence(&self, _tones: &[SequencedTone]) -> Result<(), DomainError> {
        Ok(())
    }
}

/// A haptics port for platforms without a vibration motor.
pub struct NullHapticMotor;

impl HapticMotor for NullHapticMotor {
    fn is_supported(&self) -> bool {
        false
    }

    fn vibrate(&self, _pattern: &VibrationPattern) -> Result<(), DomainError> {
        Ok(())
    }
}

/// A visibility source for hosts that are never backgrounded.
pub struct AlwaysVisible {
    tx: watch::Sender<bool>,
}

impl AlwaysVisible {
    pub fn new() -> Self {
        Self {
            tx: watch::channel(true).0,
        }
    }
}

impl Default for AlwaysVisible {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilitySource for AlwaysVisible {
    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
