use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::domain::DomainError;
use crate::ports::{SequencedTone, ToneOutput, ToneSpec, Waveform};

type RingProducer = ringbuf::HeapProd<f32>;
type RingConsumer = ringbuf::HeapCons<f32>;

/// Linear attack length. Keeps the oscillator from starting with a click.
const ATTACK_SECONDS: f32 = 0.01;
/// Silent tail appended after the decay, matching the synth's stop margin.
const TAIL_SECONDS: f32 = 0.05;
/// Gain floor the exponential decay targets.
const MIN_GAIN: f32 = 0.001;
/// Ring capacity in seconds of audio; tones are well under a second.
const RING_SECONDS: usize = 2;

/// Commands sent to the tone thread.
enum ToneCommand {
    Play(ToneSpec),
    PlaySequence(Vec<SequencedTone>),
    Shutdown,
}

/// Synthesize one tone into samples: linear attack to peak volume, then
/// exponential decay to the gain floor, then a short silent tail.
fn render_tone(spec: &ToneSpec, sample_rate: u32) -> Vec<f32> {
    let duration = spec.duration_seconds.max(0.0);
    let volume = spec.volume.clamp(0.0, 1.0);
    let total_samples = ((duration + TAIL_SECONDS) * sample_rate as f32).ceil() as usize;
    let attack = ATTACK_SECONDS.min(duration);

    let mut samples = Vec::with_capacity(total_samples);
    for i in 0..total_samples {
        let t = i as f32 / sample_rate as f32;
        let phase = (t * spec.frequency_hz).fract();

        let raw = match spec.waveform {
            Waveform::Sine => (phase * std::f32::consts::TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        };

        let envelope = if volume <= 0.0 || t >= duration {
            0.0
        } else if t < attack {
            volume * (t / attack)
        } else if duration > attack {
            let progress = (t - attack) / (duration - attack);
            volume * (MIN_GAIN / volume.max(MIN_GAIN)).powf(progress)
        } else {
            MIN_GAIN
        };

        samples.push(raw * envelope);
    }
    samples
}

/// Render a multi-tone cue into one buffer: each tone is synthesized on its
/// own and mixed in at its offset, so gaps between tones come out as real
/// silence in the ring instead of relying on playback timing.
fn render_sequence(tones: &[SequencedTone], sample_rate: u32) -> Vec<f32> {
    let total_seconds = tones
        .iter()
        .map(|t| t.offset_seconds.max(0.0) + t.spec.duration_seconds.max(0.0) + TAIL_SECONDS)
        .fold(0.0_f32, f32::max);
    let mut mixed = vec![0.0_f32; (total_seconds * sample_rate as f32).ceil() as usize];

    for tone in tones {
        let start = (tone.offset_seconds.max(0.0) * sample_rate as f32) as usize;
        for (i, sample) in render_tone(&tone.spec, sample_rate).iter().enumerate() {
            if let Some(slot) = mixed.get_mut(start + i) {
                *slot = (*slot + sample).clamp(-1.0, 1.0);
            }
        }
    }
    mixed
}

/// Output stream plus the producer feeding its sample ring, created lazily
/// on the tone thread.
struct Playback {
    stream: Stream,
    producer: RingProducer,
    sample_rate: u32,
}

fn init_playback() -> Result<Playback, DomainError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| DomainError::AudioDevice {
            message: "No default output device available".to_string(),
        })?;

    let supported = device
        .default_output_config()
        .map_err(|e| DomainError::AudioDevice {
            message: format!("Failed to get default output config: {}", e),
        })?;
    let sample_format = supported.sample_format();
    let config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;

    let ring = HeapRb::<f32>::new(sample_rate as usize * RING_SECONDS);
    let (producer, mut consumer): (RingProducer, RingConsumer) = ring.split();

    let stream = match sample_format {
        SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = consumer.try_pop().unwrap_or(0.0);
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }
            },
            |err| error!(?err, "Tone stream error"),
            None,
        ),
        SampleFormat::I16 => device.build_output_stream(
            &config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = consumer.try_pop().unwrap_or(0.0);
                    let converted = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
                    for out in frame.iter_mut() {
                        *out = converted;
                    }
                }
            },
            |err| error!(?err, "Tone stream error"),
            None,
        ),
        other => {
            return Err(DomainError::AudioDevice {
                message: format!("Unsupported output sample format: {:?}", other),
            });
        }
    }
    .map_err(|e| DomainError::AudioDevice {
        message: format!("Failed to build output stream: {}", e),
    })?;

    stream.play().map_err(|e| DomainError::AudioDevice {
        message: format!("Failed to start output stream: {}", e),
    })?;

    debug!(sample_rate, channels, "Tone output stream created");
    Ok(Playback {
        stream,
        producer,
        sample_rate,
    })
}

/// Tone thread runner - creates the Stream on this thread since it is not
/// Send, and only on the first tone so idle hosts never touch the device.
fn tone_thread_main(mut cmd_rx: mpsc::Receiver<ToneCommand>) {
    let mut playback: Option<Playback> = None;

    while let Some(cmd) = cmd_rx.blocking_recv() {
        if matches!(cmd, ToneCommand::Shutdown) {
            break;
        }

        if playback.is_none() {
            match init_playback() {
                Ok(p) => playback = Some(p),
                Err(e) => {
                    warn!(error = %e, "Tone output unavailable, dropping tone");
                    continue;
                }
            }
        }
        let Some(playback) = playback.as_mut() else {
            continue;
        };

        // Platforms can auto-suspend idle streams; resuming an
        // already-playing stream is a no-op.
        if let Err(e) = playback.stream.play() {
            warn!(error = %e, "Failed to resume tone stream");
            continue;
        }

        let samples = match &cmd {
            ToneCommand::Play(spec) => render_tone(spec, playback.sample_rate),
            ToneCommand::PlaySequence(tones) => render_sequence(tones, playback.sample_rate),
            ToneCommand::Shutdown => break,
        };
        let pushed = playback.producer.push_slice(&samples);
        if pushed < samples.len() {
            warn!(
                dropped = samples.len() - pushed,
                "Tone ring full, truncating tone"
            );
        }
    }
    debug!("Tone thread shutting down");
}

/// cpal-based tone synthesis.
///
/// Uses a dedicated tone thread to own the non-Send Stream; [`play`] only
/// hands the spec off over a channel and never blocks the caller.
///
/// [`play`]: ToneOutput::play
pub struct CpalToneOutput {
    cmd_tx: mpsc::Sender<ToneCommand>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl CpalToneOutput {
    pub fn new() -> Result<Self, DomainError> {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        let thread_handle = thread::Builder::new()
            .name("tone-output".to_string())
            .spawn(move || tone_thread_main(cmd_rx))
            .map_err(|e| DomainError::AudioDevice {
                message: format!("Failed to spawn tone thread: {}", e),
            })?;

        Ok(Self {
            cmd_tx,
            thread_handle: Mutex::new(Some(thread_handle)),
        })
    }
}

impl ToneOutput for CpalToneOutput {
    fn play(&self, spec: &ToneSpec) -> Result<(), DomainError> {
        self.cmd_tx
            .try_send(ToneCommand::Play(*spec))
            .map_err(|_| DomainError::Audio("Tone thread unavailable".to_string()))
    }

    fn play_sequence(&self, tones: &[SequencedTone]) -> Result<(), DomainError> {
        self.cmd_tx
            .try_send(ToneCommand::PlaySequence(tones.to_vec()))
            .map_err(|_| DomainError::Audio("Tone thread unavailable".to_string()))
    }
}

impl Drop for CpalToneOutput {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(ToneCommand::Shutdown);
        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
    }
}
