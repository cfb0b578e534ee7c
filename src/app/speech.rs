use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::PhaseKind;
use crate::ports::{SpeechSynthesizer, Utterance, Voice};

/// How long to wait for the platform voice catalog before forcing the queue
/// to drain with whatever voices exist. Some platforms never fire the
/// voices-changed notification, and the queue must not stall forever.
const VOICES_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Preferred high-quality voice when no explicit preference matches.
const WELL_KNOWN_VOICE: &str = "Google US English";

/// Stored voice selection and prosody preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct VoicePreferences {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// Exact voice name to prefer.
    pub voice_name: Option<String>,
    /// Language-tag prefix to prefer, e.g. "en-GB".
    pub voice_language: Option<String>,
}

impl Default for VoicePreferences {
    fn default() -> Self {
        Self {
            rate: 1.1,
            pitch: 1.0,
            volume: 1.0,
            voice_name: None,
            voice_language: None,
        }
    }
}

/// Per-call options for [`SpeechNotifier::speak`].
#[derive(Debug, Clone, Default)]
pub struct SpeakOptions {
    /// Cancel the in-flight utterance and clear the queue before enqueuing.
    pub immediate: bool,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
}

struct QueueInner {
    pending: VecDeque<String>,
    speaking: bool,
    voices: Vec<Voice>,
    voices_loaded: bool,
}

struct NotifierShared {
    synth: Arc<dyn SpeechSynthesizer>,
    queue: Mutex<QueueInner>,
    prefs: RwLock<VoicePreferences>,
    loader: Mutex<Option<JoinHandle<()>>>,
}

/// Serializes text-to-speech so exactly one utterance plays at a time.
///
/// Messages are queued FIFO and never dropped unless a caller asks for an
/// immediate interrupt. Completion of each utterance (success, error, or
/// cancellation) drains the next pending message from the utterance's own
/// completion path, never synchronously from the enqueue call.
///
/// Must be constructed inside a tokio runtime: the voice-catalog loader and
/// queue drain run as spawned tasks.
#[derive(Clone)]
pub struct SpeechNotifier {
    shared: Arc<NotifierShared>,
}

impl SpeechNotifier {
    pub fn new(synth: Arc<dyn SpeechSynthesizer>) -> Self {
        let supported = synth.is_supported();
        let voices = if supported { synth.voices() } else { Vec::new() };
        let loaded = supported && !voices.is_empty();

        let shared = Arc::new(NotifierShared {
            synth,
            queue: Mutex::new(QueueInner {
                pending: VecDeque::new(),
                speaking: false,
                voices,
                voices_loaded: loaded,
            }),
            prefs: RwLock::new(VoicePreferences::default()),
            loader: Mutex::new(None),
        });

        if supported && !loaded {
            let task_shared = Arc::clone(&shared);
            let handle = tokio::spawn(load_voices(task_shared));
            *shared.loader.lock() = Some(handle);
        } else if !supported {
            warn!("Speech synthesis not supported on this platform");
        }

        Self { shared }
    }

    /// Enqueue a message, or interrupt the current one if `immediate` is set.
    ///
    /// No-op (with a warning) when the platform has no speech engine.
    pub fn speak(&self, message: impl Into<String>, options: SpeakOptions) {
        if !self.shared.synth.is_supported() {
            warn!("Speech synthesis not supported, dropping message");
            return;
        }

        if options.immediate {
            // Clear first: cancellation resolves the in-flight utterance,
            // whose completion path would otherwise drain a stale message.
            self.shared.queue.lock().pending.clear();
            self.shared.synth.cancel();
        }

        if options.rate.is_some() || options.pitch.is_some() || options.volume.is_some() {
            let mut prefs = self.shared.prefs.write();
            if let Some(rate) = options.rate {
                prefs.rate = rate;
            }
            if let Some(pitch) = options.pitch {
                prefs.pitch = pitch;
            }
            if let Some(volume) = options.volume {
                prefs.volume = volume;
            }
        }

        self.shared.queue.lock().pending.push_back(message.into());
        drain(&self.shared);
    }

    /// Speak the fixed pre-transition phrase: "Work in N seconds" or
    /// "Rest in N seconds". No-op for zero seconds.
    pub fn speak_at_countdown(&self, kind: PhaseKind, seconds: u32) {
        if seconds == 0 {
            return;
        }
        let phase = match kind {
            PhaseKind::Work => "Work",
            _ => "Rest",
        };
        self.speak(
            format!("{} in {} seconds", phase, seconds),
            SpeakOptions::default(),
        );
    }

    /// Stop the current utterance and discard everything pending.
    pub fn cancel(&self) {
        self.shared.synth.cancel();
        let mut queue = self.shared.queue.lock();
        queue.pending.clear();
        queue.speaking = false;
    }

    /// Cancel and release the voice-catalog loader. Idempotent; call once at
    /// teardown.
    pub fn cleanup(&self) {
        self.cancel();
        if let Some(handle) = self.shared.loader.lock().take() {
            handle.abort();
        }
    }

    /// Whether the voice catalog has finished loading (or been forced ready).
    pub fn is_ready(&self) -> bool {
        self.shared.synth.is_supported() && self.shared.queue.lock().voices_loaded
    }

    /// The currently known voice catalog.
    pub fn available_voices(&self) -> Vec<Voice> {
        self.shared.queue.lock().voices.clone()
    }

    /// Replace the stored voice preferences.
    pub fn set_voice_preferences(&self, prefs: VoicePreferences) {
        *self.shared.prefs.write() = prefs;
    }
}

/// Wait for the voice catalog, forcing readiness after a timeout so the
/// queue never stalls on platforms that never announce their voices.
async fn load_voices(shared: Arc<NotifierShared>) {
    let mut changed = shared.synth.subscribe_voices_changed();
    let timeout = tokio::time::sleep(VOICES_LOAD_TIMEOUT);
    tokio::pin!(timeout);

    loop {
        tokio::select! {
            _ = &mut timeout => {
                let voices = shared.synth.voices();
                if voices.is_empty() {
                    warn!("Voice catalog load timed out with no voices, using system default");
                } else {
                    debug!(voices = voices.len(), "Voice catalog load forced after timeout");
                }
                let mut queue = shared.queue.lock();
                queue.voices = voices;
                queue.voices_loaded = true;
                break;
            }
            result = changed.recv() => {
                // A lagged receiver just missed intermediate notifications;
                // the catalog read below still sees the latest state.
                if matches!(result, Err(broadcast::error::RecvError::Closed)) {
                    let mut queue = shared.queue.lock();
                    queue.voices_loaded = true;
                    break;
                }
                let voices = shared.synth.voices();
                if !voices.is_empty() {
                    debug!(voices = voices.len(), "Voice catalog loaded");
                    let mut queue = shared.queue.lock();
                    queue.voices = voices;
                    queue.voices_loaded = true;
                    break;
                }
                // Spurious notification with an empty catalog: keep waiting.
            }
        }
    }

    drain(&shared);
}

/// Pop the next pending message and speak it, unless an utterance is already
/// in flight or voices are still loading. Re-drains from the spawned
/// completion path.
fn drain(shared: &Arc<NotifierShared>) {
    let (text, voices) = {
        let mut queue = shared.queue.lock();
        if queue.speaking || !queue.voices_loaded {
            return;
        }
        let Some(text) = queue.pending.pop_front() else {
            return;
        };
        queue.speaking = true;
        (text, queue.voices.clone())
    };

    let prefs = shared.prefs.read().clone();
    let utterance = Utterance {
        text,
        rate: prefs.rate,
        pitch: prefs.pitch,
        volume: prefs.volume,
        voice: best_voice(&voices, &prefs).cloned(),
    };

    let task_shared = Arc::clone(shared);
    tokio::spawn(async move {
        if let Err(e) = task_shared.synth.speak(&utterance).await {
            warn!(error = %e, "Utterance failed");
        }
        task_shared.queue.lock().speaking = false;
        drain(&task_shared);
    });
}

/// Resolve the preferred voice: exact name, then language prefix, then the
/// well-known high-quality voice, then any English voice, then the first
/// available. None means the engine's system default.
fn best_voice<'a>(voices: &'a [Voice], prefs: &VoicePreferences) -> Option<&'a Voice> {
    if voices.is_empty() {
        return None;
    }

    if let Some(name) = &prefs.voice_name {
        if let Some(voice) = voices.iter().find(|v| &v.name == name) {
            return Some(voice);
        }
    }

    if let Some(language) = &prefs.voice_language {
        if let Some(voice) = voices.iter().find(|v| v.language.starts_with(language.as_str())) {
            return Some(voice);
        }
    }

    if let Some(voice) = voices.iter().find(|v| v.name.contains(WELL_KNOWN_VOICE)) {
        return Some(voice);
    }

    if let Some(voice) = voices.iter().find(|v| v.language.starts_with("en")) {
        return Some(voice);
    }

    voices.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{broadcast, Semaphore};

    use crate::domain::DomainError;

    struct FakeSynth {
        supported: bool,
        /// When set, utterances block on `gate` until a permit arrives
        /// (either from the test or from `cancel`).
        manual: bool,
        voices: RwLock<Vec<Voice>>,
        changed_tx: broadcast::Sender<()>,
        spoken: Mutex<Vec<Utterance>>,
        gate: Semaphore,
        cancels: AtomicUsize,
    }

    impl FakeSynth {
        fn build(supported: bool, manual: bool, voices: Vec<Voice>) -> Arc<Self> {
            Arc::new(Self {
                supported,
                manual,
                voices: RwLock::new(voices),
                changed_tx: broadcast::channel(8).0,
                spoken: Mutex::new(Vec::new()),
                gate: Semaphore::new(0),
                cancels: AtomicUsize::new(0),
            })
        }

        fn instant(voices: Vec<Voice>) -> Arc<Self> {
            Self::build(true, false, voices)
        }

        fn gated(voices: Vec<Voice>) -> Arc<Self> {
            Self::build(true, true, voices)
        }

        fn unsupported() -> Arc<Self> {
            Self::build(false, false, Vec::new())
        }

        fn spoken_texts(&self) -> Vec<String> {
            self.spoken.lock().iter().map(|u| u.text.clone()).collect()
        }

        fn publish_voices(&self, voices: Vec<Voice>) {
            *self.voices.write() = voices;
            let _ = self.changed_tx.send(());
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynth {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn voices(&self) -> Vec<Voice> {
            self.voices.read().clone()
        }

        fn subscribe_voices_changed(&self) -> broadcast::Receiver<()> {
            self.changed_tx.subscribe()
        }

        async fn speak(&self, utterance: &Utterance) -> Result<(), DomainError> {
            self.spoken.lock().push(utterance.clone());
            if self.manual {
                if let Ok(permit) = self.gate.acquire().await {
                    permit.forget();
                }
            }
            Ok(())
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            if self.manual {
                self.gate.add_permits(1);
            }
        }
    }

    fn voice(name: &str, language: &str) -> Voice {
        Voice {
            name: name.to_string(),
            language: language.to_string(),
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("condition not met in time");
    }

    #[tokio::test]
    async fn test_messages_speak_in_fifo_order() {
        let synth = FakeSynth::instant(vec![voice("Alpha", "en-US")]);
        let notifier = SpeechNotifier::new(synth.clone() as Arc<dyn SpeechSynthesizer>);

        notifier.speak("one", SpeakOptions::default());
        notifier.speak("two", SpeakOptions::default());
        notifier.speak("three", SpeakOptions::default());

        wait_until(|| synth.spoken.lock().len() == 3).await;
        assert_eq!(synth.spoken_texts(), vec!["one", "two", "three"]);
        notifier.cleanup();
    }

    #[tokio::test]
    async fn test_single_flight_waits_for_completion() {
        let synth = FakeSynth::gated(vec![voice("Alpha", "en-US")]);
        let notifier = SpeechNotifier::new(synth.clone() as Arc<dyn SpeechSynthesizer>);

        notifier.speak("first", SpeakOptions::default());
        notifier.speak("second", SpeakOptions::default());

        wait_until(|| synth.spoken.lock().len() == 1).await;
        // Second message stays queued while the first is in flight.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(synth.spoken_texts(), vec!["first"]);

        synth.gate.add_permits(1);
        wait_until(|| synth.spoken.lock().len() == 2).await;
        assert_eq!(synth.spoken_texts(), vec!["first", "second"]);
        notifier.cleanup();
    }

    #[tokio::test]
    async fn test_immediate_cancels_and_clears_queue() {
        let synth = FakeSynth::gated(vec![voice("Alpha", "en-US")]);
        let notifier = SpeechNotifier::new(synth.clone() as Arc<dyn SpeechSynthesizer>);

        notifier.speak("slow", SpeakOptions::default());
        notifier.speak("stale", SpeakOptions::default());
        wait_until(|| synth.spoken.lock().len() == 1).await;

        notifier.speak(
            "urgent",
            SpeakOptions {
                immediate: true,
                ..Default::default()
            },
        );

        wait_until(|| synth.spoken.lock().len() == 2).await;
        assert_eq!(synth.spoken_texts(), vec!["slow", "urgent"]);
        assert!(synth.cancels.load(Ordering::SeqCst) >= 1);
        notifier.cleanup();
    }

    #[tokio::test]
    async fn test_unsupported_platform_is_noop() {
        let synth = FakeSynth::unsupported();
        let notifier = SpeechNotifier::new(synth.clone() as Arc<dyn SpeechSynthesizer>);

        notifier.speak("hello", SpeakOptions::default());
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(synth.spoken.lock().is_empty());
        assert!(!notifier.is_ready());
        notifier.cleanup();
    }

    #[tokio::test]
    async fn test_countdown_phrases() {
        let synth = FakeSynth::instant(vec![voice("Alpha", "en-US")]);
        let notifier = SpeechNotifier::new(synth.clone() as Arc<dyn SpeechSynthesizer>);

        notifier.speak_at_countdown(PhaseKind::Work, 5);
        notifier.speak_at_countdown(PhaseKind::Pause, 5);
        notifier.speak_at_countdown(PhaseKind::Work, 0); // dropped

        wait_until(|| synth.spoken.lock().len() == 2).await;
        assert_eq!(
            synth.spoken_texts(),
            vec!["Work in 5 seconds", "Rest in 5 seconds"]
        );
        notifier.cleanup();
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_timeout_forces_readiness() {
        // Catalog stays empty and voices-changed never fires.
        let synth = FakeSynth::instant(Vec::new());
        let notifier = SpeechNotifier::new(synth.clone() as Arc<dyn SpeechSynthesizer>);

        notifier.speak("queued early", SpeakOptions::default());
        assert!(!notifier.is_ready());
        assert!(synth.spoken.lock().is_empty());

        tokio::time::sleep(VOICES_LOAD_TIMEOUT + Duration::from_millis(100)).await;

        wait_until(|| synth.spoken.lock().len() == 1).await;
        assert!(notifier.is_ready());
        // No voices were ever available, so the system default is used.
        assert!(synth.spoken.lock()[0].voice.is_none());
        notifier.cleanup();
    }

    #[tokio::test(start_paused = true)]
    async fn test_voices_changed_unblocks_queue() {
        let synth = FakeSynth::instant(Vec::new());
        let notifier = SpeechNotifier::new(synth.clone() as Arc<dyn SpeechSynthesizer>);

        notifier.speak("waiting", SpeakOptions::default());
        tokio::task::yield_now().await;
        assert!(synth.spoken.lock().is_empty());

        synth.publish_voices(vec![voice("Google US English", "en-US")]);

        wait_until(|| synth.spoken.lock().len() == 1).await;
        assert!(notifier.is_ready());
        assert_eq!(
            synth.spoken.lock()[0].voice.as_ref().unwrap().name,
            "Google US English"
        );
        notifier.cleanup();
    }

    #[tokio::test]
    async fn test_lagged_voices_receiver_keeps_waiting() {
        let synth = FakeSynth::instant(Vec::new());
        let notifier = SpeechNotifier::new(synth.clone() as Arc<dyn SpeechSynthesizer>);
        notifier.speak("patient", SpeakOptions::default());

        // Let the loader subscribe, then overflow the notification channel
        // while the catalog is still empty.
        tokio::task::yield_now().await;
        for _ in 0..20 {
            let _ = synth.changed_tx.send(());
        }
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        // Lagging behind notifications is not the same as the catalog being
        // final: the queue must stay gated.
        assert!(!notifier.is_ready());
        assert!(synth.spoken.lock().is_empty());

        synth.publish_voices(vec![voice("Google US English", "en-US")]);
        wait_until(|| synth.spoken.lock().len() == 1).await;
        assert!(notifier.is_ready());
        assert_eq!(
            synth.spoken.lock()[0].voice.as_ref().unwrap().name,
            "Google US English"
        );
        notifier.cleanup();
    }

    #[test]
    fn test_voice_preference_resolution_order() {
        let catalog = vec![
            voice("Deutsch Stimme", "de-DE"),
            voice("Google US English", "en-US"),
            voice("British Voice", "en-GB"),
            voice("Custom Favourite", "fr-FR"),
        ];

        let mut prefs = VoicePreferences::default();
        assert_eq!(
            best_voice(&catalog, &prefs).unwrap().name,
            "Google US English"
        );

        prefs.voice_name = Some("Custom Favourite".to_string());
        assert_eq!(best_voice(&catalog, &prefs).unwrap().name, "Custom Favourite");

        prefs.voice_name = Some("Missing".to_string());
        prefs.voice_language = Some("en-GB".to_string());
        assert_eq!(best_voice(&catalog, &prefs).unwrap().name, "British Voice");
    }

    #[test]
    fn test_voice_resolution_fallbacks() {
        let prefs = VoicePreferences::default();

        // No Google voice, no English: first voice wins.
        let catalog = vec![voice("Voix", "fr-FR"), voice("Stimme", "de-DE")];
        assert_eq!(best_voice(&catalog, &prefs).unwrap().name, "Voix");

        // Any English beats the first entry.
        let catalog = vec![voice("Voix", "fr-FR"), voice("Plain English", "en-AU")];
        assert_eq!(best_voice(&catalog, &prefs).unwrap().name, "Plain English");

        assert!(best_voice(&[], &prefs).is_none());
    }
}
