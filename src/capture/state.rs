//! Capture session states.
//!
//! [`SessionState`] drives the session's state machine.  The front-end reads
//! it to render the appropriate status line.

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// States of one capture session.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──start()───────────▶ Recording
///      ──device denied─────▶ Error
///
/// Recording ──stop() / deadline──▶ Stopping ──finalize──▶ Done
/// ```
///
/// `Idle` is the initial state; `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No recording attempt has started yet.
    Idle,

    /// The microphone is held exclusively; chunks are being buffered.
    Recording,

    /// A stop trigger won; the device stream is flushing its tail chunk.
    Stopping,

    /// The session finalized and produced its payload.
    Done,

    /// Microphone acquisition failed.  The session owner is still intact and
    /// may create a fresh session.
    Error,
}

impl SessionState {
    /// Returns `true` once the session can never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Done | SessionState::Error)
    }

    /// Returns `true` while the session holds the microphone.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Stopping)
    }

    /// A short human-readable label suitable for a status line.
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Listening",
            SessionState::Stopping => "Stopping",
            SessionState::Done => "Stopped",
            SessionState::Error => "Error",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- is_terminal ---

    #[test]
    fn idle_is_not_terminal() {
        assert!(!SessionState::Idle.is_terminal());
    }

    #[test]
    fn recording_is_not_terminal() {
        assert!(!SessionState::Recording.is_terminal());
    }

    #[test]
    fn stopping_is_not_terminal() {
        assert!(!SessionState::Stopping.is_terminal());
    }

    #[test]
    fn done_is_terminal() {
        assert!(SessionState::Done.is_terminal());
    }

    #[test]
    fn error_is_terminal() {
        assert!(SessionState::Error.is_terminal());
    }

    // ---- is_active ---

    #[test]
    fn only_recording_and_stopping_are_active() {
        assert!(!SessionState::Idle.is_active());
        assert!(SessionState::Recording.is_active());
        assert!(SessionState::Stopping.is_active());
        assert!(!SessionState::Done.is_active());
        assert!(!SessionState::Error.is_active());
    }

    // ---- label / Default ---

    #[test]
    fn labels_are_distinct() {
        let labels = [
            SessionState::Idle.label(),
            SessionState::Recording.label(),
            SessionState::Stopping.label(),
            SessionState::Done.label(),
            SessionState::Error.label(),
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in labels.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
    }
}
