//! Capture session state machine.
//!
//! [`CaptureSession`] owns one bounded recording attempt: it acquires the
//! microphone through a [`DeviceBackend`], buffers encoded chunks as the
//! device layer pushes them, enforces the clip-length ceiling, and yields a
//! single [`AudioPayload`] when the session finalizes.
//!
//! Every external event — a chunk arrival, a manual stop request, the
//! deadline elapsing — reaches the machine through `&mut self`, so no two
//! transitions can ever interleave.  The deadline is just another caller of
//! [`CaptureSession::stop`]: whichever trigger fires first wins and the
//! loser hits the idempotent guard.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::lang::TargetLang;

use super::device::{DeviceBackend, DeviceStream, EncodedChunk};
use super::state::SessionState;

/// Ceiling on a single clip's wall-clock duration, in seconds.
///
/// Recording stops automatically once this much time has elapsed, exactly as
/// if `stop()` had been called.  Override per session with
/// [`CaptureSession::with_max_clip`].
pub const MAX_CLIP_SECS: u64 = 5;

/// Capacity of the chunk channel between the device layer and the session.
const CHUNK_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors a capture session can surface.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The microphone was denied or no input device is available.
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),

    /// `start()` was called while another capture was still in progress.
    #[error("a capture session is already active")]
    SessionActive,
}

// ---------------------------------------------------------------------------
// AudioPayload
// ---------------------------------------------------------------------------

/// The finalized clip of one capture session.
///
/// Immutable once built; moved into [`crate::relay::Relay::send`] and
/// consumed there.  The byte body may be empty (stop before any data
/// arrived) — the translation service is authoritative on rejecting empty
/// clips, so the payload is still forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    bytes: Vec<u8>,
    target: TargetLang,
}

impl AudioPayload {
    /// Content tag of every clip this client produces.
    pub const CONTENT_TYPE: &'static str = "audio/wav";

    /// Filename hint attached to the multipart upload.
    pub const FILE_NAME: &'static str = "speech.wav";

    pub(crate) fn new(bytes: Vec<u8>, target: TargetLang) -> Self {
        Self { bytes, target }
    }

    /// The encoded clip bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the payload, yielding the clip bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns `true` when the session stopped before any audio arrived.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Language the service should translate the clip into.
    pub fn target_lang(&self) -> TargetLang {
        self.target
    }
}

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

/// One bounded recording attempt, from device acquisition to a finalized
/// [`AudioPayload`].
///
/// A session moves `Idle → Recording → Stopping → Done`, with `Error`
/// reachable when the microphone cannot be acquired.  `Done` and `Error` are
/// terminal: a finished session is discarded and a fresh one created for the
/// next clip.  The single-active-session rule is the machine's own guard —
/// `start()` on anything but `Idle` is rejected.
pub struct CaptureSession<B: DeviceBackend> {
    backend: B,
    state: SessionState,
    chunks: Vec<EncodedChunk>,
    stream: Option<Box<dyn DeviceStream>>,
    deadline: Option<Instant>,
    max_clip: Duration,
    target: TargetLang,
}

impl<B: DeviceBackend> CaptureSession<B> {
    /// Create an idle session on top of `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: SessionState::Idle,
            chunks: Vec::new(),
            stream: None,
            deadline: None,
            max_clip: Duration::from_secs(MAX_CLIP_SECS),
            target: TargetLang::default(),
        }
    }

    /// Override the clip ceiling (defaults to [`MAX_CLIP_SECS`]).
    pub fn with_max_clip(mut self, max_clip: Duration) -> Self {
        self.max_clip = max_clip;
        self
    }

    /// Current state of the machine.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Language the finalized payload will carry.
    pub fn target_lang(&self) -> TargetLang {
        self.target
    }

    /// Change the target language.  The payload carries whatever value is
    /// current when the session finalizes.
    pub fn set_target_lang(&mut self, target: TargetLang) {
        self.target = target;
    }

    /// Instant at which recording stops automatically; `None` unless the
    /// session is currently `Recording`.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Number of chunks buffered so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Begin recording: acquire the microphone, clear the chunk buffer, arm
    /// the deadline and enter `Recording`.
    ///
    /// Returns the receiving end of the chunk stream; the caller forwards
    /// each arrival into [`chunk_arrived`](Self::chunk_arrived) (or lets
    /// [`record`](Self::record) do so).
    ///
    /// # Errors
    ///
    /// * [`CaptureError::SessionActive`] when the session is not `Idle`.
    /// * [`CaptureError::DeviceUnavailable`] when the microphone is denied;
    ///   the session enters `Error` and retains no device handle.
    pub async fn start(&mut self) -> Result<mpsc::Receiver<EncodedChunk>, CaptureError> {
        if self.state != SessionState::Idle {
            log::warn!(
                "capture: start() rejected — session is {}",
                self.state.label()
            );
            return Err(CaptureError::SessionActive);
        }

        let mut stream = match self.backend.acquire().await {
            Ok(stream) => stream,
            Err(e) => {
                self.state = SessionState::Error;
                log::error!("capture: microphone acquisition failed: {e}");
                return Err(e);
            }
        };

        self.chunks.clear();
        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        stream.begin_encoding(tx);
        self.stream = Some(stream);
        self.deadline = Some(Instant::now() + self.max_clip);
        self.state = SessionState::Recording;
        log::debug!("capture: Idle → Recording (ceiling {:?})", self.max_clip);

        Ok(rx)
    }

    /// Append a chunk delivered by the device layer.
    ///
    /// Chunks arriving outside `Recording` are dropped: the buffer is
    /// read-only once the session leaves that state.
    pub fn chunk_arrived(&mut self, chunk: EncodedChunk) {
        if self.state != SessionState::Recording {
            log::warn!(
                "capture: dropping {} byte chunk — session is {}",
                chunk.len(),
                self.state.label()
            );
            return;
        }
        self.chunks.push(chunk);
    }

    /// Stop recording and finalize the clip.
    ///
    /// Valid from `Recording` only; from any other state this is a no-op
    /// returning `None`.  The guard makes the manual-stop / deadline race
    /// safe: both triggers call `stop()`, the first wins, the second finds
    /// the session already out of `Recording`.
    pub async fn stop(&mut self) -> Option<AudioPayload> {
        if self.state != SessionState::Recording {
            log::debug!("capture: stop() ignored — session is {}", self.state.label());
            return None;
        }
        Some(self.finalize().await)
    }

    /// Flush the device stream, release the handle and build the payload.
    ///
    /// Callers must have verified `state == Recording`.
    async fn finalize(&mut self) -> AudioPayload {
        self.state = SessionState::Stopping;
        self.deadline = None;
        log::debug!("capture: Recording → Stopping");

        if let Some(mut stream) = self.stream.take() {
            if let Some(tail) = stream.finalize().await {
                self.chunks.push(tail);
            }
            // Dropping the stream releases the exclusive device handle.
        }

        let bytes: Vec<u8> = self
            .chunks
            .iter()
            .flat_map(|chunk| chunk.bytes.iter().copied())
            .collect();

        self.state = SessionState::Done;
        log::debug!(
            "capture: Stopping → Done ({} chunks, {} bytes)",
            self.chunks.len(),
            bytes.len()
        );

        AudioPayload::new(bytes, self.target)
    }

    // -----------------------------------------------------------------------
    // Driver
    // -----------------------------------------------------------------------

    /// Drive a full recording to completion.
    ///
    /// Starts the session, then processes chunk arrivals, the manual stop
    /// signal (`stop_rx`) and the deadline serially in one select loop.
    /// Whichever stop trigger fires first ends the loop; any chunks already
    /// in flight are handed to the machine before the single finalize.
    ///
    /// # Errors
    ///
    /// Propagates the [`start`](Self::start) errors; the recording phase
    /// itself cannot fail.
    pub async fn record(
        &mut self,
        mut stop_rx: mpsc::Receiver<()>,
    ) -> Result<AudioPayload, CaptureError> {
        let mut chunk_rx = self.start().await?;
        // Armed by start(); the fallback never fires.
        let deadline = self.deadline.unwrap_or_else(Instant::now);

        let mut stream_open = true;
        let mut stop_open = true;
        loop {
            tokio::select! {
                chunk = chunk_rx.recv(), if stream_open => match chunk {
                    Some(chunk) => self.chunk_arrived(chunk),
                    None => stream_open = false,
                },
                stop = stop_rx.recv(), if stop_open => match stop {
                    Some(()) => {
                        log::debug!("capture: manual stop requested");
                        break;
                    }
                    None => stop_open = false,
                },
                _ = tokio::time::sleep_until(deadline) => {
                    log::debug!("capture: clip ceiling reached");
                    break;
                }
            }
        }

        // Hand over chunks already in flight before the stream is flushed.
        while let Ok(chunk) = chunk_rx.try_recv() {
            self.chunk_arrived(chunk);
        }

        Ok(self.finalize().await)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::device::MockBackend;

    fn granted() -> CaptureSession<MockBackend> {
        CaptureSession::new(MockBackend::granting())
    }

    /// Forward everything the device already queued into the machine.
    fn drain(session: &mut CaptureSession<MockBackend>, rx: &mut mpsc::Receiver<EncodedChunk>) {
        while let Ok(chunk) = rx.try_recv() {
            session.chunk_arrived(chunk);
        }
    }

    // ---- start ---

    #[tokio::test]
    async fn start_enters_recording_and_arms_deadline() {
        let mut session = granted();
        let _rx = session.start().await.expect("start");

        assert_eq!(session.state(), SessionState::Recording);
        assert!(session.deadline().is_some());
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let mut session = granted();
        let _rx = session.start().await.expect("first start");

        let err = session.start().await.err().expect("second start must fail");
        assert!(matches!(err, CaptureError::SessionActive));
        // The rejection leaves the running session untouched.
        assert_eq!(session.state(), SessionState::Recording);
    }

    #[tokio::test]
    async fn start_after_done_is_rejected() {
        let mut session = granted();
        let _rx = session.start().await.expect("start");
        session.stop().await.expect("payload");

        let err = session.start().await.err().expect("restart must fail");
        assert!(matches!(err, CaptureError::SessionActive));
        assert_eq!(session.state(), SessionState::Done);
    }

    #[tokio::test]
    async fn denied_device_is_terminal_and_typed() {
        let mut session = CaptureSession::new(MockBackend::denied());

        let err = session.start().await.err().expect("start must fail");
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
        assert_eq!(session.state(), SessionState::Error);

        // Terminal: a later stop is a no-op and yields nothing.
        assert!(session.stop().await.is_none());
        assert_eq!(session.state(), SessionState::Error);
    }

    // ---- stop ---

    #[tokio::test]
    async fn immediate_stop_yields_empty_payload() {
        let mut session = granted();
        let _rx = session.start().await.expect("start");

        let payload = session.stop().await.expect("payload");
        assert_eq!(session.state(), SessionState::Done);
        assert!(payload.is_empty());
        assert_eq!(payload.bytes(), &[] as &[u8]);
    }

    #[tokio::test]
    async fn stop_from_idle_is_a_noop() {
        let mut session = granted();

        assert!(session.stop().await.is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn second_stop_never_double_finalizes() {
        let mut session = granted();
        let _rx = session.start().await.expect("start");

        assert!(session.stop().await.is_some());
        assert!(session.stop().await.is_none());
        assert_eq!(session.state(), SessionState::Done);
    }

    #[tokio::test]
    async fn stop_clears_the_deadline() {
        let mut session = granted();
        let _rx = session.start().await.expect("start");
        assert!(session.deadline().is_some());

        session.stop().await.expect("payload");
        assert!(session.deadline().is_none());
    }

    // ---- chunk buffering ---

    #[tokio::test]
    async fn chunks_concatenate_in_arrival_order() {
        let backend = MockBackend::granting()
            .with_live_chunks(vec![vec![1, 2], vec![3]])
            .with_tail(vec![4, 5]);
        let mut session = CaptureSession::new(backend);

        let mut rx = session.start().await.expect("start");
        drain(&mut session, &mut rx);
        assert_eq!(session.chunk_count(), 2);

        let payload = session.stop().await.expect("payload");
        // Live chunks in order, flushed tail last.
        assert_eq!(payload.bytes(), &[1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn chunk_after_finalize_is_dropped() {
        let mut session = granted();
        let _rx = session.start().await.expect("start");
        session.stop().await.expect("payload");

        session.chunk_arrived(EncodedChunk::new(vec![9]));
        assert_eq!(session.chunk_count(), 0);
    }

    #[tokio::test]
    async fn chunk_before_start_is_dropped() {
        let mut session = granted();
        session.chunk_arrived(EncodedChunk::new(vec![9]));
        assert_eq!(session.chunk_count(), 0);
    }

    // ---- target language ---

    #[tokio::test]
    async fn payload_carries_language_set_at_stop_time() {
        let mut session = granted();
        let _rx = session.start().await.expect("start");

        // The picker changes mid-recording; the last value wins.
        session.set_target_lang(TargetLang::Fr);
        session.set_target_lang(TargetLang::Hi);

        let payload = session.stop().await.expect("payload");
        assert_eq!(payload.target_lang(), TargetLang::Hi);
    }

    #[test]
    fn payload_constants() {
        assert_eq!(AudioPayload::FILE_NAME, "speech.wav");
        assert_eq!(AudioPayload::CONTENT_TYPE, "audio/wav");
    }

    // ---- record driver ---

    #[tokio::test]
    async fn record_manual_stop_collects_live_chunks() {
        let backend = MockBackend::granting().with_live_chunks(vec![vec![10], vec![20]]);
        let mut session = CaptureSession::new(backend);
        session.set_target_lang(TargetLang::Es);

        let (stop_tx, stop_rx) = mpsc::channel(1);
        stop_tx.send(()).await.expect("queue stop");

        let payload = session.record(stop_rx).await.expect("record");
        assert_eq!(session.state(), SessionState::Done);
        assert_eq!(payload.bytes(), &[10, 20]);
        assert_eq!(payload.target_lang(), TargetLang::Es);
    }

    #[tokio::test]
    async fn record_deadline_fires_automatic_stop() {
        let backend = MockBackend::granting()
            .with_live_chunks(vec![vec![1], vec![2]])
            .with_tail(vec![3]);
        let mut session =
            CaptureSession::new(backend).with_max_clip(Duration::from_millis(40));

        // Keep the manual stop channel open but silent; only the deadline
        // can end this recording.
        let (_stop_tx, stop_rx) = mpsc::channel(1);

        let payload = session.record(stop_rx).await.expect("record");
        assert_eq!(session.state(), SessionState::Done);
        assert_eq!(payload.bytes(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn deadline_and_manual_stop_finalize_exactly_once() {
        // Force both triggers into the same turn: a zero ceiling and a
        // pre-queued manual stop.
        let mut session = granted().with_max_clip(Duration::from_millis(0));

        let (stop_tx, stop_rx) = mpsc::channel(1);
        stop_tx.send(()).await.expect("queue stop");

        let payload = session.record(stop_rx).await.expect("record");
        assert!(payload.is_empty());
        assert_eq!(session.state(), SessionState::Done);

        // The losing trigger resolves to the idempotent guard.
        assert!(session.stop().await.is_none());
    }

    #[tokio::test]
    async fn record_propagates_device_denial() {
        let mut session = CaptureSession::new(MockBackend::denied());
        let (_stop_tx, stop_rx) = mpsc::channel(1);

        let err = session.record(stop_rx).await.err().expect("must fail");
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
        assert_eq!(session.state(), SessionState::Error);
    }

    #[tokio::test]
    async fn record_survives_closed_stop_channel() {
        // Dropping the stop sender must not stop the recording; the deadline
        // still governs the clip.
        let backend = MockBackend::granting().with_tail(vec![7]);
        let mut session =
            CaptureSession::new(backend).with_max_clip(Duration::from_millis(40));

        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);
        drop(stop_tx);

        let payload = session.record(stop_rx).await.expect("record");
        assert_eq!(payload.bytes(), &[7]);
    }
}
