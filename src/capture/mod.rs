//! Body capture subsystem.
//!
//! # Data Flow
//! ```text
//! inbound body ──▶ request.rs (read ≤ max, rebuild body) ──▶ inner service
//!                         │
//!                         └─▶ CapturedBody (request copy)
//!
//! inner response body ──▶ response.rs (CaptureBody, pass-through) ──▶ client
//!                                │
//!                                └─▶ oneshot ──▶ CapturedBody (response copy)
//! ```
//!
//! # Design Decisions
//! - Capture is a side channel: forwarded bytes are never substituted
//! - One bounded buffer type enforces the byte cap for both directions
//! - Running out of capacity is not an error, it only sets `truncated`

pub mod request;
pub mod response;

use bytes::{Bytes, BytesMut};

pub use request::read_request_body;
pub use response::CaptureBody;

/// A bounded copy of a request or response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedBody {
    /// Captured bytes, never longer than the configured maximum.
    pub bytes: Bytes,
    /// More bytes were seen than could be kept.
    pub truncated: bool,
    /// Reading the body failed; `bytes` holds what was read before.
    pub read_error: Option<String>,
}

impl CapturedBody {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Append-only buffer that silently stops growing at `max` bytes.
#[derive(Debug)]
pub struct BoundedBuffer {
    buf: BytesMut,
    max: usize,
    truncated: bool,
}

impl BoundedBuffer {
    pub fn new(max: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max,
            truncated: false,
        }
    }

    /// Mirror `chunk`, keeping only what fits. Returns the number of bytes
    /// actually kept.
    pub fn push(&mut self, chunk: &[u8]) -> usize {
        let room = self.remaining();
        let take = room.min(chunk.len());
        if take < chunk.len() {
            self.truncated = true;
        }
        self.buf.extend_from_slice(&chunk[..take]);
        take
    }

    /// Bytes that can still be stored.
    pub fn remaining(&self) -> usize {
        self.max - self.buf.len()
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Some offered bytes did not fit.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self, read_error: Option<String>) -> CapturedBody {
        CapturedBody {
            bytes: self.buf.freeze(),
            truncated: self.truncated,
            read_error,
        }
    }
}
