use std::sync::Arc;

use tracing::warn;

use crate::ports::{HapticMotor, SequencedTone, ToneOutput, ToneSpec, VibrationPattern, Waveform};

/// Boundary tone played at every phase transition.
const BOUNDARY_FREQUENCY_HZ: f32 = 880.0;
const BOUNDARY_DURATION_SECONDS: f32 = 0.1;
/// A work phase gets a longer, louder cue so it stands out from rest
/// transitions without introducing a second pitch.
const WORK_ENTRY_DURATION_SECONDS: f32 = 0.25;
const WORK_ENTRY_VOLUME_BOOST: f32 = 1.5;
/// Ascending three-beep countdown: two low beeps, then one at the boundary
/// pitch, spaced 0.85 s apart.
const COUNTDOWN_LOW_FREQUENCY_HZ: f32 = 660.0;
const COUNTDOWN_BEEP_DURATION_SECONDS: f32 = 0.08;
const COUNTDOWN_GAP_SECONDS: f32 = 0.85;

/// Fire-and-forget tones and haptic pulses.
///
/// Every failure is caught and logged here so callers in the tick loop can
/// cue without error handling; a dead speaker or missing motor must never
/// stall the countdown.
#[derive(Clone)]
pub struct ToneService {
    output: Arc<dyn ToneOutput>,
    haptics: Arc<dyn HapticMotor>,
}

impl ToneService {
    pub fn new(output: Arc<dyn ToneOutput>, haptics: Arc<dyn HapticMotor>) -> Self {
        Self { output, haptics }
    }

    /// Play an arbitrary tone.
    pub fn play_beep(&self, spec: ToneSpec) {
        if let Err(e) = self.output.play(&spec) {
            warn!(error = %e, "Tone playback failed");
        }
    }

    /// The short tone marking a phase transition.
    pub fn play_boundary_beep(&self, volume: f32) {
        self.play_beep(ToneSpec::new(
            BOUNDARY_FREQUENCY_HZ,
            BOUNDARY_DURATION_SECONDS,
            Waveform::Sine,
            volume,
        ));
    }

    /// The emphasized tone for transitions into a work phase.
    pub fn play_work_entry_beep(&self, volume: f32) {
        self.play_beep(ToneSpec::new(
            BOUNDARY_FREQUENCY_HZ,
            WORK_ENTRY_DURATION_SECONDS,
            Waveform::Sine,
            (volume * WORK_ENTRY_VOLUME_BOOST).min(1.0),
        ));
    }

    /// The ascending three-beep cue hosts play over the pre-workout
    /// countdown: low, low, then the boundary pitch.
    pub fn play_countdown_beeps(&self, volume: f32) {
        let beep = |frequency_hz| {
            ToneSpec::new(
                frequency_hz,
                COUNTDOWN_BEEP_DURATION_SECONDS,
                Waveform::Sine,
                volume,
            )
        };
        let tones = [
            SequencedTone::new(0.0, beep(COUNTDOWN_LOW_FREQUENCY_HZ)),
            SequencedTone::new(COUNTDOWN_GAP_SECONDS, beep(COUNTDOWN_LOW_FREQUENCY_HZ)),
            SequencedTone::new(COUNTDOWN_GAP_SECONDS * 2.0, beep(BOUNDARY_FREQUENCY_HZ)),
        ];
        if let Err(e) = self.output.play_sequence(&tones) {
            warn!(error = %e, "Tone playback failed");
        }
    }

    /// Trigger a vibration. No-op where the platform has no motor.
    pub fn vibrate(&self, pattern: impl Into<VibrationPattern>) {
        if !self.haptics.is_supported() {
            return;
        }
        if let Err(e) = self.haptics.vibrate(&pattern.into()) {
            warn!(error = %e, "Vibration failed");
        }
    }

    /// Short double tap before a phase transition.
    pub fn vibrate_warning(&self) {
        self.vibrate(vec![50, 40]);
    }

    /// Single pulse at a phase boundary.
    pub fn vibrate_boundary(&self) {
        self.vibrate(80);
    }

    /// Longer pattern marking workout completion.
    pub fn vibrate_completion(&self) {
        self.vibrate(vec![200, 100, 200]);
    }
}
