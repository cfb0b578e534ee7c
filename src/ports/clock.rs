use std::time::Instant;

/// Port for reading monotonic wall time.
///
/// All engine timing flows through this so tests can drive the tick loop
/// with a fake clock instead of real elapsed time.
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;
}
