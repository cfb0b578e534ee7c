use tokio::sync::watch;

/// Port for execution-context visibility (e.g. tab backgrounding).
///
/// The engine subscribes only while a run is live and folds hidden intervals
/// back into its timing so a suspended render loop does not silently pause
/// the workout.
pub trait VisibilitySource: Send + Sync {
    /// Subscribe to visibility updates. The channel value is `true` while
    /// the context is visible.
    fn subscribe(&self) -> watch::Receiver<bool>;
}
