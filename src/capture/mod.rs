//! Capture pipeline — microphone acquisition → chunk buffering → finalized clip.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → DeviceBackend::acquire → DeviceStream (push-based chunks)
//!           → CaptureSession (state machine, clip ceiling) → AudioPayload
//! ```
//!
//! [`CaptureSession`] is the state machine that owns one bounded recording
//! attempt.  [`MicrophoneBackend`] is the concrete device layer built on
//! `cpal`; tests drive the session through mock backends instead.

pub mod device;
pub mod microphone;
pub mod resample;
pub mod session;
pub mod state;

pub use device::{DeviceBackend, DeviceStream, EncodedChunk};
pub use microphone::{MicrophoneBackend, CLIP_SAMPLE_RATE};
pub use resample::{downmix_to_mono, resample_to_16k};
pub use session::{AudioPayload, CaptureError, CaptureSession, MAX_CLIP_SECS};
pub use state::SessionState;
