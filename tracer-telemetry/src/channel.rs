//! Telemetry channels: buffering and delivery of envelopes.
//!
//! Channels are shared between tracer instances, so every implementation
//! synchronises its own buffers.

use std::collections::VecDeque;
use std::io::Write;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracer_config::DEFAULT_ENDPOINT;
use tracing::{debug, warn};

use crate::envelope::Envelope;

/// Errors surfaced by channel implementations.
///
/// These never escape a tracer: the telemetry client logs and drops them.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Writing to the underlying sink failed.
    #[error("channel i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },
    /// An envelope could not be serialized.
    #[error("channel serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
    /// The backend refused the payload.
    #[error("telemetry rejected: {reason}")]
    Rejected {
        /// Human-readable reason.
        reason: String,
    },
}

impl ChannelError {
    /// Helper to construct rejection errors from string-like values.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Result alias for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Transport boundary of the telemetry client.
pub trait TelemetryChannel: Send + Sync {
    /// Accepts an envelope for delivery; implementations may buffer it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the envelope cannot be accepted.
    fn send(&self, envelope: Envelope) -> ChannelResult<()>;

    /// Delivers everything buffered before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when delivery fails.
    fn flush(&self) -> ChannelResult<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Buffers stay usable after a panic elsewhere poisoned the lock.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Channel keeping envelopes in memory.
///
/// Sent envelopes stay pending until [`flush`](TelemetryChannel::flush) moves
/// them to the delivered list.
#[derive(Debug, Default)]
pub struct InMemoryChannel {
    pending: Mutex<Vec<Envelope>>,
    delivered: Mutex<Vec<Envelope>>,
}

impl InMemoryChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Envelopes sent but not yet flushed.
    #[must_use]
    pub fn pending(&self) -> Vec<Envelope> {
        lock(&self.pending).clone()
    }

    /// Envelopes delivered by previous flushes, in send order.
    #[must_use]
    pub fn delivered(&self) -> Vec<Envelope> {
        lock(&self.delivered).clone()
    }

    /// Removes and returns the delivered envelopes.
    pub fn take_delivered(&self) -> Vec<Envelope> {
        mem::take(&mut *lock(&self.delivered))
    }
}

impl TelemetryChannel for InMemoryChannel {
    fn send(&self, envelope: Envelope) -> ChannelResult<()> {
        lock(&self.pending).push(envelope);
        Ok(())
    }

    fn flush(&self) -> ChannelResult<()> {
        let drained = mem::take(&mut *lock(&self.pending));
        lock(&self.delivered).extend(drained);
        Ok(())
    }
}

/// Channel that buffers envelopes and emits them as JSON through `tracing`
/// on flush.
///
/// Each event carries the ingestion endpoint the envelope is addressed to.
#[derive(Debug)]
pub struct LogChannel {
    endpoint: String,
    pending: Mutex<Vec<Envelope>>,
}

impl LogChannel {
    /// Creates an empty channel addressed to `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Endpoint reported on every emitted event.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl TelemetryChannel for LogChannel {
    fn send(&self, envelope: Envelope) -> ChannelResult<()> {
        lock(&self.pending).push(envelope);
        Ok(())
    }

    fn flush(&self) -> ChannelResult<()> {
        let drained = mem::take(&mut *lock(&self.pending));
        for envelope in drained {
            let json = serde_json::to_string(&envelope)?;
            debug!(
                target: "aitracer::telemetry",
                endpoint = %self.endpoint,
                kind = %envelope.name,
                envelope = %json,
                "telemetry"
            );
        }
        Ok(())
    }
}

/// Channel writing newline-delimited JSON envelopes to a writer on flush.
///
/// Envelopes that could not be written stay pending for the next flush.
pub struct WriterChannel<W> {
    pending: Mutex<VecDeque<Envelope>>,
    writer: Mutex<W>,
}

impl<W> WriterChannel<W>
where
    W: Write + Send,
{
    /// Wraps the supplied writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            writer: Mutex::new(writer),
        }
    }

    /// Number of envelopes waiting for the next flush.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Returns the underlying writer, discarding anything not yet flushed.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W> TelemetryChannel for WriterChannel<W>
where
    W: Write + Send,
{
    fn send(&self, envelope: Envelope) -> ChannelResult<()> {
        lock(&self.pending).push_back(envelope);
        Ok(())
    }

    fn flush(&self) -> ChannelResult<()> {
        let mut pending = lock(&self.pending);
        let mut writer = lock(&self.writer);
        while let Some(envelope) = pending.front() {
            let mut line = match serde_json::to_vec(envelope) {
                Ok(line) => line,
                Err(err) => {
                    pending.pop_front();
                    warn!(
                        error = %err,
                        remaining = pending.len(),
                        "dropping envelope that cannot be serialized"
                    );
                    return Err(err.into());
                }
            };
            line.push(b'\n');
            if let Err(err) = writer.write_all(&line) {
                warn!(
                    error = %err,
                    remaining = pending.len(),
                    "telemetry write failed; envelopes kept for the next flush"
                );
                return Err(err.into());
            }
            pending.pop_front();
        }
        writer.flush()?;
        Ok(())
    }
}
