use serde::{Deserialize, Serialize};

/// The kind of one timed segment of a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    /// The fixed pre-workout countdown.
    Countdown,
    /// An effort round.
    Work,
    /// Rest between rounds.
    Pause,
}

impl PhaseKind {
    /// The timer status displayed while this phase is active.
    pub fn status(&self) -> TimerStatus {
        match self {
            PhaseKind::Countdown => TimerStatus::Countdown,
            PhaseKind::Work => TimerStatus::Work,
            PhaseKind::Pause => TimerStatus::Pause,
        }
    }
}

/// One entry in the derived timeline for a run.
///
/// Produced once per `start()` by [`build_timeline`](crate::domain::build_timeline),
/// consumed read-only by the tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub kind: PhaseKind,
    pub group_index: usize,
    pub round: u32,
    pub duration_seconds: f64,
}

/// Timer state machine.
///
/// Transitions:
/// - Idle -> Countdown (start)
/// - Countdown -> Work, Work -> Pause, Pause -> Work (phase boundaries)
/// - {Countdown, Work, Pause} -> Paused (pause) -> same phase (resume)
/// - last phase -> Complete (terminal; only reset exits it, back to Idle)
///
/// `Paused` is a meta-state: the suspended phase is recorded in
/// `TimerState::prev_status` so resume restores it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Countdown,
    Work,
    Pause,
    Paused,
    Complete,
}

impl TimerStatus {
    /// True while an actual timed phase is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            TimerStatus::Countdown | TimerStatus::Work | TimerStatus::Pause
        )
    }

    /// Check if the run can be paused from this state.
    #[must_use]
    pub fn can_pause(&self) -> bool {
        self.is_running()
    }

    /// Check if this state ends a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TimerStatus::Complete)
    }
}

/// The externally observed timer snapshot.
///
/// Written only by the tick loop and the imperative engine API; external
/// readers get consistent clones. `remaining_seconds` can dip negative
/// mid-tick but is corrected before the snapshot lock is released, so
/// observers never see a negative value. `total_elapsed_seconds` is
/// monotonically non-decreasing for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub status: TimerStatus,
    pub current_group_index: usize,
    pub current_round: u32,
    pub remaining_seconds: f64,
    pub total_elapsed_seconds: f64,
    /// The phase suspended by `pause()`, if any.
    pub prev_status: Option<TimerStatus>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            status: TimerStatus::Idle,
            current_group_index: 0,
            current_round: 1,
            remaining_seconds: 0.0,
            total_elapsed_seconds: 0.0,
            prev_status: None,
        }
    }
}

/// Events pushed to observers at state changes.
///
/// Delivered over a broadcast channel; hosts that prefer polling can ignore
/// them and read the snapshot instead.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum TimerEvent {
    /// Status changed outside a phase boundary (pause, resume, reset).
    StatusChanged {
        from: TimerStatus,
        to: TimerStatus,
    },
    /// A new timeline item became the current phase.
    PhaseStarted {
        kind: PhaseKind,
        group_index: usize,
        round: u32,
        duration_seconds: f64,
    },
    /// The pre-transition warning fired for the current phase.
    Warning {
        upcoming: PhaseKind,
    },
    /// The run finished.
    Completed,
}
