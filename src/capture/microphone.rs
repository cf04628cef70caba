//! Microphone capture via `cpal`, encoded to WAV with `hound`.
//!
//! [`MicrophoneBackend`] implements [`DeviceBackend`] on top of the system
//! default input device.  `cpal::Stream` is not `Send`, so the stream lives
//! on a dedicated audio thread; sample batches cross to the session side
//! over a std mpsc channel.
//!
//! The finished clip is delivered as a single flushed chunk at finalize time
//! (a WAV header carries the data length, so the file cannot be emitted
//! piecemeal).  The session's chunk buffer handles that shape the same as an
//! incremental stream.

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;

use super::device::{DeviceBackend, DeviceStream, EncodedChunk};
use super::resample::{downmix_to_mono, resample_to_16k};
use super::session::CaptureError;

/// Sample rate of every encoded clip, in Hz.
pub const CLIP_SAMPLE_RATE: u32 = 16_000;

/// How long the flush waits for straggler sample batches from the audio
/// thread before declaring the stream drained.
const DRAIN_GRACE: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// MicrophoneBackend
// ---------------------------------------------------------------------------

/// Device backend for the system default microphone.
pub struct MicrophoneBackend;

impl MicrophoneBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MicrophoneBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceBackend for MicrophoneBackend {
    async fn acquire(&self) -> Result<Box<dyn DeviceStream>, CaptureError> {
        let stream = MicrophoneStream::open()?;
        Ok(Box::new(stream))
    }
}

// ---------------------------------------------------------------------------
// MicrophoneStream
// ---------------------------------------------------------------------------

/// A live capture stream whose cpal half runs on its own thread.
///
/// Sending on `shutdown_tx` (or dropping this struct) stops the hardware
/// stream and releases the device.
struct MicrophoneStream {
    samples_rx: std_mpsc::Receiver<Vec<f32>>,
    shutdown_tx: std_mpsc::Sender<()>,
    sample_rate: u32,
    channels: u16,
}

impl MicrophoneStream {
    fn open() -> Result<Self, CaptureError> {
        let (ready_tx, ready_rx) = std_mpsc::channel();
        let (samples_tx, samples_rx) = std_mpsc::channel::<Vec<f32>>();
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel::<()>();

        let _worker = std::thread::Builder::new()
            .name("microphone-capture".into())
            .spawn(move || match build_stream(samples_tx) {
                Ok((stream, sample_rate, channels)) => {
                    if ready_tx.send(Ok((sample_rate, channels))).is_err() {
                        return;
                    }
                    // Park here so the !Send stream stays alive on this
                    // thread until the session lets go.
                    let _ = shutdown_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok((sample_rate, channels))) => {
                log::debug!("microphone: stream open ({sample_rate} Hz, {channels} ch)");
                Ok(Self {
                    samples_rx,
                    shutdown_tx,
                    sample_rate,
                    channels,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CaptureError::DeviceUnavailable(
                "audio thread exited before the stream opened".into(),
            )),
        }
    }
}

#[async_trait]
impl DeviceStream for MicrophoneStream {
    fn begin_encoding(&mut self, _tx: mpsc::Sender<EncodedChunk>) {
        // Everything is buffered on the audio side and flushed as one WAV
        // chunk in finalize(); nothing is pushed incrementally.
    }

    async fn finalize(&mut self) -> Option<EncodedChunk> {
        // Stop the hardware stream, then drain every buffered sample batch.
        // Once the audio thread drops the stream the sender disconnects and
        // the drain loop ends; until then the grace timeout covers batches
        // still in flight from the capture callback.
        let _ = self.shutdown_tx.send(());

        let mut samples = Vec::new();
        while let Ok(batch) = self.samples_rx.recv_timeout(DRAIN_GRACE) {
            samples.extend_from_slice(&batch);
        }

        if samples.is_empty() {
            log::warn!("microphone: no samples captured before finalize");
            return None;
        }

        let mono = downmix_to_mono(&samples, self.channels);
        let pcm = resample_to_16k(&mono, self.sample_rate);

        match encode_wav(&pcm) {
            Ok(bytes) => Some(EncodedChunk::new(bytes)),
            Err(e) => {
                log::error!("microphone: WAV encoding failed: {e}");
                None
            }
        }
    }
}

impl Drop for MicrophoneStream {
    fn drop(&mut self) {
        // Releases the device even when finalize() never ran.
        let _ = self.shutdown_tx.send(());
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build and start a cpal input stream on the calling thread.
///
/// The capture callback forwards each hardware buffer over `tx`; send errors
/// (receiver dropped) are ignored so the audio thread never panics.
fn build_stream(
    tx: std_mpsc::Sender<Vec<f32>>,
) -> Result<(cpal::Stream, u32, u16), CaptureError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or_else(|| {
        CaptureError::DeviceUnavailable("no input device on the default audio host".into())
    })?;

    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let config: cpal::StreamConfig = supported.into();

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(data.to_vec());
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

    Ok((stream, sample_rate, channels))
}

/// Encode 16 kHz mono `f32` PCM as a 16-bit WAV file in memory.
fn encode_wav(samples: &[f32]) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: CLIP_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(quantized)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
