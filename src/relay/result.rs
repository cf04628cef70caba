//! Decoding of the translation service's response body.
//!
//! The service answers every processing request with a JSON object.  An
//! `error` field marks a remote-reported failure — the exchange completed at
//! the transport level, but the service could not process the clip.  That
//! field is authoritative: it is checked before the success fields and
//! independently of the HTTP status code.

use serde::Deserialize;

use super::client::RelayError;

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

/// Successful outcome of one relay exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Transcript of the recognized speech, verbatim from the service.
    pub detected_text: String,
    /// Auto-detected source language code.
    pub source_lang: String,
    /// The transcript translated into the requested target language.
    pub translated_text: String,
    /// Relative locator of the synthesized speech clip, when the service
    /// produced one.  Resolve against the base URL before playback.
    pub audio_ref: Option<String>,
}

impl Translation {
    /// Display form for the recognized speech: `"hola (es)"`.
    pub fn detected_display(&self) -> String {
        format!("{} ({})", self.detected_text, self.source_lang)
    }

    /// Resolve the audio locator against the service base URL.
    ///
    /// Returns `None` when the service produced no audio.  The join always
    /// carries exactly one `/` regardless of how the two halves are written.
    pub fn resolve_audio_url(&self, base_url: &str) -> Option<String> {
        self.audio_ref
            .as_deref()
            .map(|path| join_url(base_url, path))
    }
}

/// Join a base URL and a relative path with exactly one separating slash.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ---------------------------------------------------------------------------
// Wire decoding
// ---------------------------------------------------------------------------

/// Wire shape of a service response.
///
/// Every field is optional so error-only bodies still decode; presence of
/// the transcript fields is enforced in [`decode_response`].  The service
/// also echoes the request's `target_lang`, which the client ignores.
#[derive(Debug, Deserialize)]
struct WireResponse {
    original_text: Option<String>,
    source_lang: Option<String>,
    translated_text: Option<String>,
    audio_url: Option<String>,
    error: Option<String>,
}

/// Decode a response body into a [`Translation`].
///
/// # Errors
///
/// * [`RelayError::RemoteRejected`] when the body carries an `error` field.
/// * [`RelayError::MalformedResponse`] when the body is not JSON or lacks
///   any of the transcript fields.
pub(crate) fn decode_response(body: &str) -> Result<Translation, RelayError> {
    let wire: WireResponse = serde_json::from_str(body)
        .map_err(|e| RelayError::MalformedResponse(e.to_string()))?;

    if let Some(message) = wire.error {
        return Err(RelayError::RemoteRejected(message));
    }

    match (wire.original_text, wire.source_lang, wire.translated_text) {
        (Some(detected_text), Some(source_lang), Some(translated_text)) => Ok(Translation {
            detected_text,
            source_lang,
            translated_text,
            audio_ref: wire.audio_url,
        }),
        _ => Err(RelayError::MalformedResponse(
            "response is missing transcript fields".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- decode_response ----------------------------------------------------

    #[test]
    fn success_body_without_audio_decodes_cleanly() {
        let body = r#"{
            "original_text": "hola",
            "source_lang": "es",
            "translated_text": "hello"
        }"#;

        let translation = decode_response(body).expect("success");
        assert_eq!(translation.detected_text, "hola");
        assert_eq!(translation.source_lang, "es");
        assert_eq!(translation.translated_text, "hello");
        assert!(translation.audio_ref.is_none());
        assert!(translation.resolve_audio_url("http://host:5000").is_none());
    }

    #[test]
    fn success_body_with_audio_keeps_relative_locator() {
        let body = r#"{
            "original_text": "hola",
            "source_lang": "es",
            "translated_text": "hello",
            "audio_url": "/a.mp3"
        }"#;

        let translation = decode_response(body).expect("success");
        // Returned untouched; resolution is a separate, explicit step.
        assert_eq!(translation.audio_ref.as_deref(), Some("/a.mp3"));
    }

    #[test]
    fn error_field_maps_to_remote_rejected() {
        let err = decode_response(r#"{"error": "x"}"#).err().expect("must fail");
        match err {
            RelayError::RemoteRejected(message) => assert_eq!(message, "x"),
            other => panic!("expected RemoteRejected, got {other:?}"),
        }
    }

    #[test]
    fn error_field_wins_over_transcript_fields() {
        // A body that carries both is still a remote-reported failure.
        let body = r#"{
            "original_text": "hola",
            "source_lang": "es",
            "translated_text": "hello",
            "error": "TTS generation failed"
        }"#;

        let err = decode_response(body).err().expect("must fail");
        assert!(matches!(err, RelayError::RemoteRejected(_)));
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = decode_response("<html>502 Bad Gateway</html>")
            .err()
            .expect("must fail");
        assert!(matches!(err, RelayError::MalformedResponse(_)));
    }

    #[test]
    fn missing_transcript_field_is_malformed() {
        let body = r#"{"original_text": "hola", "source_lang": "es"}"#;
        let err = decode_response(body).err().expect("must fail");
        assert!(matches!(err, RelayError::MalformedResponse(_)));
    }

    #[test]
    fn echoed_target_lang_is_ignored() {
        let body = r#"{
            "original_text": "hola",
            "source_lang": "es",
            "translated_text": "hello",
            "target_lang": "en"
        }"#;

        assert!(decode_response(body).is_ok());
    }

    // ---- join_url / resolve_audio_url --------------------------------------

    #[test]
    fn resolves_audio_url_exactly() {
        let translation = Translation {
            detected_text: "hola".into(),
            source_lang: "es".into(),
            translated_text: "hello".into(),
            audio_ref: Some("/audio/out.wav".into()),
        };

        assert_eq!(
            translation.resolve_audio_url("http://host:5000").as_deref(),
            Some("http://host:5000/audio/out.wav")
        );
    }

    #[test]
    fn join_never_doubles_or_drops_the_slash() {
        let expect = "http://host:5000/audio/out.wav";
        assert_eq!(join_url("http://host:5000", "/audio/out.wav"), expect);
        assert_eq!(join_url("http://host:5000/", "/audio/out.wav"), expect);
        assert_eq!(join_url("http://host:5000", "audio/out.wav"), expect);
        assert_eq!(join_url("http://host:5000/", "audio/out.wav"), expect);
    }

    // ---- display ------------------------------------------------------------

    #[test]
    fn detected_display_includes_source_lang() {
        let translation = Translation {
            detected_text: "hola".into(),
            source_lang: "es".into(),
            translated_text: "hello".into(),
            audio_ref: None,
        };

        assert_eq!(translation.detected_display(), "hola (es)");
    }
}
