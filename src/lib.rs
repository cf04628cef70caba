//! LingoLink capture-and-relay client.
//!
//! Records a short clip of microphone audio, relays it to the LingoLink
//! speech-translation service, and returns the transcript / translation /
//! synthesized-audio result.
//!
//! Two components compose in strict producer → consumer order:
//!
//! * [`capture::CaptureSession`] — one bounded recording attempt, from
//!   microphone acquisition to a finalized [`capture::AudioPayload`].
//! * [`relay::HttpRelayClient`] — the single request/response exchange that
//!   sends a payload and returns a [`relay::Translation`] (or a typed
//!   [`relay::RelayError`]).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use lingolink::capture::{CaptureSession, MicrophoneBackend};
//! use lingolink::config::AppConfig;
//! use lingolink::lang::TargetLang;
//! use lingolink::relay::{HttpRelayClient, Relay};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//!
//! let mut session = CaptureSession::new(MicrophoneBackend::new());
//! session.set_target_lang(TargetLang::Es);
//!
//! // No manual stop signal, so recording runs to the clip ceiling.
//! let (_stop_tx, stop_rx) = tokio::sync::mpsc::channel(1);
//! let payload = session.record(stop_rx).await?;
//!
//! let client = HttpRelayClient::from_config(&config.relay);
//! let translation = client.send(payload).await?;
//! println!("{}", translation.detected_display());
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod lang;
pub mod relay;
