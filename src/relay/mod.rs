//! Relay — the single exchange with the translation service.
//!
//! This module provides:
//! * [`Relay`] — async trait implemented by relay backends.
//! * [`HttpRelayClient`] — multipart POST client for the real service.
//! * [`Translation`] — decoded success result, with audio-locator resolution.
//! * [`RelayError`] — the typed failure kinds a `send` can yield.
//!
//! One call to [`Relay::send`] is one best-effort request/response pair: no
//! streaming, no retry, no mid-flight cancellation.  Retry policy, if any,
//! belongs to the caller.

pub mod client;
pub mod result;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{HttpRelayClient, Relay, RelayError};
pub use result::Translation;
