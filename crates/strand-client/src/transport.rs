//! The seam between this client and the native store.
//!
//! A transport registers interest for an operation and later delivers
//! exactly one completion (or, for reads, an in-order stream of deliveries)
//! from threads the client does not control. Completion payloads use the
//! layouts of [`crate::codec`], carried in [`NativeBuf`]s whose ownership
//! transfers with the delivery.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::buffer::NativeBuf;
use crate::completion::ReplyHandle;
use crate::types::{ConfigVersion, LogId, Lsn};

/// Identifies an in-flight operation for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpToken(pub u64);

/// Allocator of operation tokens, one per client handle.
pub(crate) struct TokenSource(AtomicU64);

impl TokenSource {
    pub(crate) fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub(crate) fn next(&self) -> OpToken {
        OpToken(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// Single-completion reply end handed to the transport.
pub type Reply = ReplyHandle<NativeBuf>;

/// In-order sink for the deliveries of one read call. An empty buffer is a
/// heartbeat; dropping the sender ends the stream.
pub type ReadSink = mpsc::UnboundedSender<NativeBuf>;

/// Asynchronous interface to the native store.
///
/// Implementations deliver each completion exactly once, in order for read
/// streams. [`Transport::cancel`] only prevents future deliveries: it never
/// interrupts a completion that is already being decoded, and cancelling a
/// finished or unknown token is a no-op.
pub trait Transport: Send + Sync + 'static {
    /// Request one durable append. The completion carries an
    /// append-completion payload.
    fn start_append(
        &self,
        token: OpToken,
        log_id: LogId,
        payload: &[u8],
        key: Option<&[u8]>,
        reply: Reply,
    );

    /// Request an atomic batch append of a pre-encoded batch blob. The
    /// completion carries an append-completion payload whose LSN is the
    /// batch base.
    fn start_append_batch(&self, token: OpToken, log_id: LogId, blob: &[u8], reply: Reply);

    /// Start a read of `[from, until]`. Deliveries flow through `sink` in
    /// increasing LSN order until cancelled or the stream ends.
    fn start_read(&self, token: OpToken, log_id: LogId, from: Lsn, until: Lsn, sink: ReadSink);

    /// Fetch a config value. The completion carries a versioned-read
    /// payload whose value is the store's version envelope.
    fn start_config_get(&self, token: OpToken, key: &str, reply: Reply);

    /// Conditionally store a config value. The completion carries a
    /// versioned-write payload.
    fn start_config_put(
        &self,
        token: OpToken,
        key: &str,
        value: &[u8],
        expected: ConfigVersion,
        reply: Reply,
    );

    /// Cancel an in-flight operation.
    fn cancel(&self, token: OpToken);
}
