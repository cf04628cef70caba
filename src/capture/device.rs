//! Device-layer traits for microphone access and chunk encoding.
//!
//! [`DeviceBackend`] hands out exclusively-owned [`DeviceStream`]s.  A stream
//! delivers [`EncodedChunk`]s push-based over an mpsc channel while recording
//! runs and flushes its buffered tail on [`DeviceStream::finalize`].  Dropping
//! the stream releases the underlying device handle, so a session can never
//! leak the microphone regardless of which path it takes out of recording.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::session::CaptureError;

// ---------------------------------------------------------------------------
// EncodedChunk
// ---------------------------------------------------------------------------

/// A single buffer of encoded clip bytes as delivered by the device layer.
///
/// The bytes are opaque to the session; concatenating every chunk of a
/// session in arrival order yields the finished clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    /// Encoded audio bytes.
    pub bytes: Vec<u8>,
}

impl EncodedChunk {
    /// Wrap raw encoded bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Number of bytes in this chunk.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when the chunk carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DeviceBackend / DeviceStream
// ---------------------------------------------------------------------------

/// Grants exclusive access to a microphone input device.
#[async_trait]
pub trait DeviceBackend: Send + Sync {
    /// Request the microphone.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::DeviceUnavailable`] when access is denied or
    /// no input device exists.
    async fn acquire(&self) -> Result<Box<dyn DeviceStream>, CaptureError>;
}

/// An exclusively-owned, live encoding stream.
///
/// Dropping the stream releases the device handle.
#[async_trait]
pub trait DeviceStream: Send {
    /// Start encoding and deliver chunks to `tx` as they become available.
    ///
    /// Implementations may push incrementally or buffer internally until
    /// [`finalize`](Self::finalize); the session treats both identically.
    /// Send errors (receiver dropped) must be swallowed so the device layer
    /// never panics.
    fn begin_encoding(&mut self, tx: mpsc::Sender<EncodedChunk>);

    /// Stop encoding and flush any buffered-but-undelivered chunk.
    async fn finalize(&mut self) -> Option<EncodedChunk>;
}

// ---------------------------------------------------------------------------
// MockBackend  (test-only)
// ---------------------------------------------------------------------------

/// A test double that grants (or denies) a scripted stream without touching
/// any hardware.
#[cfg(test)]
pub struct MockBackend {
    grant: bool,
    live_chunks: Vec<Vec<u8>>,
    tail: Option<Vec<u8>>,
}

#[cfg(test)]
impl MockBackend {
    /// A backend whose `acquire` always succeeds with an empty stream.
    pub fn granting() -> Self {
        Self {
            grant: true,
            live_chunks: Vec::new(),
            tail: None,
        }
    }

    /// A backend whose `acquire` always fails with `DeviceUnavailable`.
    pub fn denied() -> Self {
        Self {
            grant: false,
            live_chunks: Vec::new(),
            tail: None,
        }
    }

    /// Chunks the stream pushes over the channel as soon as encoding begins.
    pub fn with_live_chunks(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.live_chunks = chunks;
        self
    }

    /// The chunk `finalize` flushes.
    pub fn with_tail(mut self, tail: Vec<u8>) -> Self {
        self.tail = Some(tail);
        self
    }
}

#[cfg(test)]
#[async_trait]
impl DeviceBackend for MockBackend {
    async fn acquire(&self) -> Result<Box<dyn DeviceStream>, CaptureError> {
        if !self.grant {
            return Err(CaptureError::DeviceUnavailable("access denied".into()));
        }
        Ok(Box::new(MockStream {
            live_chunks: self.live_chunks.clone(),
            tail: self.tail.clone(),
        }))
    }
}

#[cfg(test)]
struct MockStream {
    live_chunks: Vec<Vec<u8>>,
    tail: Option<Vec<u8>>,
}

#[cfg(test)]
#[async_trait]
impl DeviceStream for MockStream {
    fn begin_encoding(&mut self, tx: mpsc::Sender<EncodedChunk>) {
        for bytes in self.live_chunks.drain(..) {
            let _ = tx.try_send(EncodedChunk::new(bytes));
        }
    }

    async fn finalize(&mut self) -> Option<EncodedChunk> {
        self.tail.take().map(EncodedChunk::new)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
