use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::DomainError;

/// A voice offered by the platform speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Engine-assigned voice name, e.g. "Google US English".
    pub name: String,
    /// BCP-47 language tag, e.g. "en-US".
    pub language: String,
}

/// One fully resolved text-to-speech request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    /// Speaking rate multiplier, 1.0 = engine default.
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// None lets the engine pick its system default voice.
    pub voice: Option<Voice>,
}

/// Port for platform text-to-speech synthesis.
///
/// Implementations wrap one platform speech engine. Voice catalogs load
/// asynchronously on some platforms, so the catalog may be empty right after
/// construction; implementations signal changes via `subscribe_voices_changed`.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Whether a speech engine exists at all on this platform.
    fn is_supported(&self) -> bool;

    /// The currently known voice catalog. May be empty until loading
    /// completes, or forever on platforms without voices.
    fn voices(&self) -> Vec<Voice>;

    /// Subscribe to voice-catalog change notifications.
    ///
    /// Platforms that never fire this are tolerated; callers must pair the
    /// subscription with a load timeout.
    fn subscribe_voices_changed(&self) -> broadcast::Receiver<()>;

    /// Speak one utterance to completion.
    ///
    /// Resolves when the utterance finishes, errors, or is cancelled —
    /// callers rely on this to drain their queue, so it must always resolve.
    async fn speak(&self, utterance: &Utterance) -> Result<(), DomainError>;

    /// Stop the in-flight utterance, if any.
    ///
    /// Causes a pending `speak` future to resolve promptly.
    fn cancel(&self);
}
