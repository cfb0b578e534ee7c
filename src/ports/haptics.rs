use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A haptic request: a single pulse or an on/off millisecond pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VibrationPattern {
    /// One pulse of the given duration in milliseconds.
    Pulse(u64),
    /// Alternating on/off durations in milliseconds, starting with on.
    Pattern(Vec<u64>),
}

impl From<u64> for VibrationPattern {
    fn from(ms: u64) -> Self {
        VibrationPattern::Pulse(ms)
    }
}

impl From<Vec<u64>> for VibrationPattern {
    fn from(pattern: Vec<u64>) -> Self {
        VibrationPattern::Pattern(pattern)
    }
}

/// Port for haptic feedback.
pub trait HapticMotor: Send + Sync {
    /// Whether this platform has a vibration capability.
    fn is_supported(&self) -> bool;

    /// Trigger a vibration. No-op where unsupported.
    fn vibrate(&self, pattern: &VibrationPattern) -> Result<(), DomainError>;
}
