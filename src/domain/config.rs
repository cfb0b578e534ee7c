use serde::{Deserialize, Serialize};

/// One group of rounds in a workout: `rounds` repetitions of
/// `work_seconds` of effort, each followed by `pause_seconds` of rest.
///
/// Configurations are validated by the editing layer before they reach the
/// engine: `rounds` is a positive integer and both durations are
/// non-negative. The engine never mutates a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundGroup {
    /// Stable identifier assigned by the editor.
    pub id: String,
    /// Number of work rounds in this group.
    pub rounds: u32,
    /// Duration of each work phase in seconds.
    pub work_seconds: f64,
    /// Duration of the rest phase after each work phase.
    /// Zero means no rest phase is emitted at all.
    pub pause_seconds: f64,
}

/// An ordered sequence of round groups making up one workout.
///
/// Immutable once handed to a [`TimerEngine`](crate::app::TimerEngine) for a
/// run; only the external editor mutates it between runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutConfig {
    pub groups: Vec<RoundGroup>,
}

impl WorkoutConfig {
    /// Total scheduled duration of all phases, excluding the leading
    /// countdown. Used by hosts for previews.
    pub fn total_duration_seconds(&self) -> f64 {
        self.groups
            .iter()
            .map(|g| g.rounds as f64 * (g.work_seconds + g.pause_seconds))
            .sum()
    }

    /// Total number of work rounds across all groups.
    pub fn total_rounds(&self) -> u32 {
        self.groups.iter().map(|g| g.rounds).sum()
    }
}

/// Live audio/notification settings, owned by the settings layer.
///
/// The engine only reads these; [`update_settings`](crate::app::TimerEngine::update_settings)
/// swaps the whole value so runtime toggles apply mid-run without a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Speak phase announcements and warning cues.
    pub voice_enabled: bool,
    /// Play a boundary tone at phase transitions.
    pub beep_enabled: bool,
    /// Trigger haptic pulses at warnings and transitions.
    pub vibration_enabled: bool,
    /// Tone volume, 0.0 - 1.0.
    pub beep_volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            voice_enabled: true,
            beep_enabled: true,
            vibration_enabled: false,
            beep_volume: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(rounds: u32, work: f64, pause: f64) -> RoundGroup {
        RoundGroup {
            id: "g".to_string(),
            rounds,
            work_seconds: work,
            pause_seconds: pause,
        }
    }

    #[test]
    fn test_total_duration() {
        let config = WorkoutConfig {
            groups: vec![group(2, 30.0, 10.0), group(1, 20.0, 0.0)],
        };
        assert_eq!(config.total_duration_seconds(), 100.0);
        assert_eq!(config.total_rounds(), 3);
    }

    #[test]
    fn test_empty_config() {
        let config = WorkoutConfig::default();
        assert_eq!(config.total_duration_seconds(), 0.0);
        assert_eq!(config.total_rounds(), 0);
    }

    #[test]
    fn test_audio_settings_default() {
        let settings = AudioSettings::default();
        assert!(settings.voice_enabled);
        assert!(settings.beep_enabled);
        assert!(!settings.vibration_enabled);
        assert_eq!(settings.beep_volume, 0.2);
    }
}
