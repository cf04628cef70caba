//! Core `Relay` trait and `HttpRelayClient` implementation.
//!
//! `HttpRelayClient` performs the single multipart POST against the
//! translation service's processing endpoint.  All connection details come
//! from [`RelayConfig`]; nothing is hardcoded beyond the endpoint path.

use async_trait::async_trait;
use reqwest::multipart;
use thiserror::Error;

use crate::capture::AudioPayload;
use crate::config::RelayConfig;

use super::result::{decode_response, Translation};

/// Path of the service's single processing endpoint, relative to the
/// configured base URL.
const PROCESS_PATH: &str = "/process_audio";

// ---------------------------------------------------------------------------
// RelayError
// ---------------------------------------------------------------------------

/// Errors that can occur during a relay exchange.
///
/// Every `send` resolves to either a populated [`Translation`] or exactly
/// one of these kinds — nothing escapes as an untyped fault.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The exchange could not be established or timed out.
    #[error("could not reach the translation service: {0}")]
    NetworkUnreachable(String),

    /// The response body could not be decoded into the expected shape.
    #[error("unintelligible response from the translation service: {0}")]
    MalformedResponse(String),

    /// The transport exchange completed, but the service reported an error
    /// of its own.
    #[error("translation service rejected the clip: {0}")]
    RemoteRejected(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RelayError::MalformedResponse(e.to_string())
        } else {
            RelayError::NetworkUnreachable(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Relay trait
// ---------------------------------------------------------------------------

/// Async trait for the audio → translation exchange.
///
/// Implementors must be `Send + Sync` so they can be shared across threads
/// (e.g. wrapped in `Arc<dyn Relay>`).  The payload is consumed: each clip
/// is sent at most once, and the relay performs no retry of its own.
#[async_trait]
pub trait Relay: Send + Sync {
    async fn send(&self, payload: AudioPayload) -> Result<Translation, RelayError>;
}

// ---------------------------------------------------------------------------
// HttpRelayClient
// ---------------------------------------------------------------------------

/// Multipart POST client for the translation service.
pub struct HttpRelayClient {
    client: reqwest::Client,
    config: RelayConfig,
}

impl HttpRelayClient {
    /// Build a client from relay config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &RelayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// The configured service base URL — also what audio locators resolve
    /// against.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

/// Full URL of the processing endpoint for a given base.
fn endpoint_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), PROCESS_PATH)
}

#[async_trait]
impl Relay for HttpRelayClient {
    /// One best-effort multipart exchange.
    ///
    /// An empty clip body is still forwarded — the service is authoritative
    /// on rejecting empty clips.  The transport status code is ignored; the
    /// decoded body alone decides the outcome, so a 500 carrying an `error`
    /// field surfaces as [`RelayError::RemoteRejected`], not as a transport
    /// failure.
    async fn send(&self, payload: AudioPayload) -> Result<Translation, RelayError> {
        let url = endpoint_url(&self.config.base_url);
        let target = payload.target_lang();

        let clip = multipart::Part::bytes(payload.into_bytes())
            .file_name(AudioPayload::FILE_NAME)
            .mime_str(AudioPayload::CONTENT_TYPE)
            .expect("clip content tag is a valid MIME string");
        let form = multipart::Form::new()
            .part("audio", clip)
            .text("target_lang", target.code());

        log::debug!("relay: POST {url} (target_lang={target})");
        let response = self.client.post(&url).multipart(form).send().await?;

        let body = response.text().await?;
        decode_response(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
