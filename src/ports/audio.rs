use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Oscillator waveform for synthesized tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// Parameters for one short synthesized tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration_seconds: f32,
    pub waveform: Waveform,
    /// Peak amplitude, 0.0 - 1.0.
    pub volume: f32,
}

impl ToneSpec {
    pub fn new(frequency_hz: f32, duration_seconds: f32, waveform: Waveform, volume: f32) -> Self {
        Self {
            frequency_hz,
            duration_seconds,
            waveform,
            volume,
        }
    }
}

/// One tone positioned inside a multi-tone cue, offset from the cue's start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequencedTone {
    pub offset_seconds: f32,
    pub spec: ToneSpec,
}

impl SequencedTone {
    pub fn new(offset_seconds: f32, spec: ToneSpec) -> Self {
        Self {
            offset_seconds,
            spec,
        }
    }
}

/// Port for audible tone output.
///
/// Implementations lazily initialize their output device on first use and
/// must not block: `play` hands the tone off and returns immediately.
/// Tones are brief and non-overlapping by construction, so no queueing
/// contract is required.
pub trait ToneOutput: Send + Sync {
    /// Schedule one tone for playback.
    fn play(&self, spec: &ToneSpec) -> Result<(), DomainError>;

    /// Schedule a multi-tone cue. Offsets are relative to a common start,
    /// so gaps between tones are preserved exactly.
    fn play_sequence(&self, tones: &[SequencedTone]) -> Result<(), DomainError>;
}
