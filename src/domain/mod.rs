pub mod config;
pub mod error;
pub mod timeline;
pub mod timer;

pub use config::{AudioSettings, RoundGroup, WorkoutConfig};
pub use error::DomainError;
pub use timeline::{build_timeline, COUNTDOWN_SECONDS};
pub use timer::{PhaseKind, TimelineItem, TimerEvent, TimerState, TimerStatus};
