use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{SpeakOptions, SpeechNotifier, ToneService};
use crate::domain::{
    build_timeline, AudioSettings, PhaseKind, TimelineItem, TimerEvent, TimerState, TimerStatus,
    WorkoutConfig,
};
use crate::ports::{Clock, VisibilitySource};

/// Seconds before a phase boundary at which the lookahead cue fires.
const WARNING_SECONDS: f64 = 5.0;
/// Cadence of the scheduling loop, ~60 Hz. Correctness does not depend on
/// this: ticks accumulate measured wall-clock deltas, not fixed steps.
const TICK_INTERVAL: Duration = Duration::from_millis(16);
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Mutable per-run bookkeeping, separate from the observable snapshot.
struct RunCore {
    timeline: Vec<TimelineItem>,
    idx: usize,
    /// Time reference of the previous tick. None means the next tick
    /// establishes a fresh reference and contributes zero delta.
    last_tick: Option<Instant>,
    warned_for_current: bool,
    hidden_since: Option<Instant>,
}

struct RunHandles {
    tick: JoinHandle<()>,
    visibility: JoinHandle<()>,
}

struct EngineInner {
    config: WorkoutConfig,
    settings: RwLock<AudioSettings>,
    clock: Arc<dyn Clock>,
    visibility: Arc<dyn VisibilitySource>,
    speech: SpeechNotifier,
    tone: ToneService,
    state: RwLock<TimerState>,
    // Lock order: core before state, always.
    core: Mutex<RunCore>,
    run: Mutex<Option<RunHandles>>,
    events: broadcast::Sender<TimerEvent>,
}

/// The interval-workout timer engine.
///
/// Owns the observable [`TimerState`] snapshot and drives a ~60 Hz tick loop
/// through the derived phase timeline, firing speech, tone, and haptic cues
/// at warnings and boundaries. Cheap to clone; all clones share one engine.
///
/// Timing always wins over cues: notification calls are fire-and-forget and
/// their failures never reach the tick loop. `start` and `resume` spawn the
/// loop and must run inside a tokio runtime.
#[derive(Clone)]
pub struct TimerEngine {
    inner: Arc<EngineInner>,
}

impl TimerEngine {
    pub fn new(
        config: WorkoutConfig,
        settings: AudioSettings,
        speech: SpeechNotifier,
        tone: ToneService,
        clock: Arc<dyn Clock>,
        visibility: Arc<dyn VisibilitySource>,
    ) -> Self {
        let timeline = build_timeline(&config);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(EngineInner {
                config,
                settings: RwLock::new(settings),
                clock,
                visibility,
                speech,
                tone,
                state: RwLock::new(TimerState::default()),
                core: Mutex::new(RunCore {
                    timeline,
                    idx: 0,
                    last_tick: None,
                    warned_for_current: false,
                    hidden_since: None,
                }),
                run: Mutex::new(None),
                events,
            }),
        }
    }

    /// Begin a run: rebuild the timeline, install the countdown phase, and
    /// start the scheduling loop plus the visibility watcher.
    ///
    /// Silently refuses when the configuration has no groups; that is a
    /// caller contract violation, not a runtime error.
    pub fn start(&self) {
        if self.inner.config.groups.is_empty() {
            warn!("Refusing to start: workout configuration has no groups");
            return;
        }

        self.inner.halt_run();

        let first = {
            let mut core = self.inner.core.lock();
            let mut state = self.inner.state.write();
            core.timeline = build_timeline(&self.inner.config);
            core.idx = 0;
            // Establish the time reference here so the loop's first tick
            // contributes exactly the time elapsed since start.
            core.last_tick = Some(self.inner.clock.now());
            core.warned_for_current = false;
            core.hidden_since = None;

            let item = core.timeline[0].clone();
            *state = TimerState {
                status: item.kind.status(),
                current_group_index: item.group_index,
                current_round: item.round.max(1),
                remaining_seconds: item.duration_seconds,
                total_elapsed_seconds: 0.0,
                prev_status: None,
            };
            item
        };

        if self.inner.settings.read().voice_enabled {
            self.inner
                .speech
                .speak("Starting workout", SpeakOptions::default());
        }

        info!(
            groups = self.inner.config.groups.len(),
            phases = self.inner.core.lock().timeline.len(),
            "Workout started"
        );
        let _ = self.inner.events.send(TimerEvent::PhaseStarted {
            kind: first.kind,
            group_index: first.group_index,
            round: first.round,
            duration_seconds: first.duration_seconds,
        });

        self.spawn_run();
    }

    /// Suspend the current phase. Valid only while countdown, work, or rest
    /// is running; a no-op otherwise. Remaining time is preserved exactly.
    pub fn pause(&self) {
        let from = {
            let mut core = self.inner.core.lock();
            let mut state = self.inner.state.write();
            if !state.status.can_pause() {
                return;
            }
            let from = state.status;
            state.prev_status = Some(from);
            state.status = TimerStatus::Paused;
            core.last_tick = None;
            core.hidden_since = None;
            from
        };

        self.inner.halt_run();
        debug!(?from, "Run paused");
        let _ = self.inner.events.send(TimerEvent::StatusChanged {
            from,
            to: TimerStatus::Paused,
        });
    }

    /// Resume a paused run in the exact phase it was suspended in, with a
    /// fresh time reference so the paused interval contributes no delta.
    pub fn resume(&self) {
        let restored = {
            let mut core = self.inner.core.lock();
            let mut state = self.inner.state.write();
            if state.status != TimerStatus::Paused || state.remaining_seconds <= 0.0 {
                return;
            }
            // Missing prev_status means the snapshot was tampered with
            // externally; fall back to the work phase.
            let restored = state.prev_status.take().unwrap_or(TimerStatus::Work);
            state.status = restored;
            // Fresh time reference: the paused interval must contribute no
            // delta when ticking resumes.
            core.last_tick = Some(self.inner.clock.now());
            restored
        };

        debug!(?restored, "Run resumed");
        let _ = self.inner.events.send(TimerEvent::StatusChanged {
            from: TimerStatus::Paused,
            to: restored,
        });
        self.spawn_run();
    }

    /// Abandon the run and return to idle. Always valid.
    pub fn reset(&self) {
        self.inner.halt_run();

        let from = {
            let mut core = self.inner.core.lock();
            let mut state = self.inner.state.write();
            core.timeline = build_timeline(&self.inner.config);
            core.idx = 0;
            core.last_tick = None;
            core.warned_for_current = false;
            core.hidden_since = None;
            let from = state.status;
            *state = TimerState::default();
            from
        };

        debug!(?from, "Run reset");
        if from != TimerStatus::Idle {
            let _ = self.inner.events.send(TimerEvent::StatusChanged {
                from,
                to: TimerStatus::Idle,
            });
        }
    }

    /// Release the scheduling loop and visibility watcher. Idempotent; must
    /// be called when the engine is discarded to avoid leaked tasks.
    pub fn cleanup(&self) {
        self.inner.halt_run();
        debug!("Engine cleaned up");
    }

    /// Hot-swap the live audio settings. Applies to future cue decisions;
    /// in-flight timing is unaffected.
    pub fn update_settings(&self, settings: AudioSettings) {
        *self.inner.settings.write() = settings;
    }

    /// Current observable snapshot.
    pub fn state(&self) -> TimerState {
        self.inner.state.read().clone()
    }

    /// Subscribe to push notifications of state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.inner.events.subscribe()
    }

    fn spawn_run(&self) {
        let mut run = self.inner.run.lock();

        let tick_inner = Arc::downgrade(&self.inner);
        let tick = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(inner) = tick_inner.upgrade() else {
                    break;
                };
                if !inner.tick() {
                    inner.halt_run();
                    break;
                }
            }
        });

        let watch_inner = Arc::downgrade(&self.inner);
        let mut updates = self.inner.visibility.subscribe();
        let visibility = tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let visible = *updates.borrow();
                let Some(inner) = watch_inner.upgrade() else {
                    break;
                };
                inner.handle_visibility(visible);
            }
        });

        *run = Some(RunHandles { tick, visibility });
    }
}

impl EngineInner {
    /// One scheduling callback. Returns false when the loop must halt.
    fn tick(&self) -> bool {
        let mut core = self.core.lock();
        let mut state = self.state.write();
        if !state.status.is_running() {
            return false;
        }

        let now = self.clock.now();
        let delta = match core.last_tick.replace(now) {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f64(),
            None => 0.0,
        };

        self.advance_locked(&mut core, &mut state, delta)
    }

    /// Advance the run by a measured wall-clock delta: accumulate elapsed
    /// time, fire the once-per-phase warning cue, and cross phase boundaries.
    ///
    /// Both locks are held for the whole call, so `remaining_seconds` is
    /// never observably negative even though it dips below zero here before
    /// the boundary is handled. Returns false on completion.
    fn advance_locked(&self, core: &mut RunCore, state: &mut TimerState, delta: f64) -> bool {
        state.total_elapsed_seconds += delta;
        state.remaining_seconds -= delta;

        if !core.warned_for_current
            && state.remaining_seconds > 0.0
            && state.remaining_seconds <= WARNING_SECONDS
        {
            core.warned_for_current = true;
            let settings = self.settings.read().clone();
            if let Some(next) = core.timeline.get(core.idx + 1) {
                if settings.voice_enabled {
                    match (state.status, next.kind) {
                        (TimerStatus::Work, PhaseKind::Pause) => self
                            .speech
                            .speak_at_countdown(PhaseKind::Pause, WARNING_SECONDS as u32),
                        (TimerStatus::Pause | TimerStatus::Countdown, PhaseKind::Work) => self
                            .speech
                            .speak_at_countdown(PhaseKind::Work, WARNING_SECONDS as u32),
                        _ => {}
                    }
                }
                let _ = self.events.send(TimerEvent::Warning {
                    upcoming: next.kind,
                });
            }
            if settings.vibration_enabled {
                self.tone.vibrate_warning();
            }
        }

        if state.remaining_seconds <= 0.0 {
            core.idx += 1;

            if core.idx >= core.timeline.len() {
                let from = state.status;
                state.status = TimerStatus::Complete;
                state.remaining_seconds = 0.0;
                state.prev_status = None;
                core.last_tick = None;
                core.hidden_since = None;

                let settings = self.settings.read().clone();
                if settings.voice_enabled {
                    self.speech.speak("Workout complete", SpeakOptions::default());
                }
                if settings.vibration_enabled {
                    self.tone.vibrate_completion();
                }

                info!(
                    total_elapsed = state.total_elapsed_seconds,
                    "Workout complete"
                );
                let _ = self.events.send(TimerEvent::StatusChanged {
                    from,
                    to: TimerStatus::Complete,
                });
                let _ = self.events.send(TimerEvent::Completed);
                return false;
            }

            let item = core.timeline[core.idx].clone();
            let settings = self.settings.read().clone();
            if settings.beep_enabled {
                if item.kind == PhaseKind::Work {
                    self.tone.play_work_entry_beep(settings.beep_volume);
                } else {
                    self.tone.play_boundary_beep(settings.beep_volume);
                }
            }
            if settings.vibration_enabled {
                self.tone.vibrate_boundary();
            }

            state.current_group_index = item.group_index;
            state.current_round = item.round.max(1);
            state.remaining_seconds = item.duration_seconds;
            state.status = item.kind.status();
            core.warned_for_current = false;

            debug!(
                kind = ?item.kind,
                group = item.group_index,
                round = item.round,
                "Phase started"
            );
            let _ = self.events.send(TimerEvent::PhaseStarted {
                kind: item.kind,
                group_index: item.group_index,
                round: item.round,
                duration_seconds: item.duration_seconds,
            });
        }

        true
    }

    /// Fold a hidden interval back into the run so OS-level suspension of
    /// the scheduling loop does not pause the workout.
    fn handle_visibility(&self, visible: bool) {
        let mut core = self.core.lock();
        if !self.state.read().status.is_running() {
            core.hidden_since = None;
            return;
        }

        let now = self.clock.now();
        if !visible {
            debug!("Context hidden");
            core.hidden_since = Some(now);
            return;
        }

        let Some(hidden_at) = core.hidden_since.take() else {
            return;
        };

        // Only fold the portion the tick loop did not already observe, in
        // case the host kept delivering ticks while hidden.
        let fold_from = match core.last_tick {
            Some(last) if last > hidden_at => last,
            _ => hidden_at,
        };
        let gap = now.saturating_duration_since(fold_from).as_secs_f64();
        core.last_tick = Some(now);
        if gap <= 0.0 {
            return;
        }

        debug!(gap_seconds = gap, "Folding hidden interval into run");
        let mut state = self.state.write();
        self.advance_locked(&mut core, &mut state, gap);
    }

    fn halt_run(&self) {
        if let Some(handles) = self.run.lock().take() {
            handles.tick.abort();
            handles.visibility.abort();
        }
    }
}
