//! The client handle: appends, batch appends, and reader construction.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::codec;
use crate::completion::{self, CompletionFuture};
use crate::config::{ClientConfig, Compression};
use crate::config_store::VersionedConfigStore;
use crate::error::{Op, StrandError, StrandResult};
use crate::reader::LogReader;
use crate::status::STATUS_OK;
use crate::transport::{OpToken, TokenSource, Transport};
use crate::types::{LogId, Lsn};

pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) tokens: TokenSource,
}

impl ClientInner {
    pub(crate) fn next_token(&self) -> OpToken {
        self.tokens.next()
    }
}

/// Handle to one cluster connection.
///
/// Cheap to clone; one handle may serve concurrent callers on different
/// logs. LSN monotonicity is guaranteed per log only among operations issued
/// through the same handle.
#[derive(Clone)]
pub struct StrandClient {
    inner: Arc<ClientInner>,
}

impl StrandClient {
    /// Connect to a cluster through the given transport. The configuration
    /// is normalized on the way in.
    pub fn connect(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let config = config.normalized();
        debug!(endpoint = %config.endpoint(), "client connected");
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                tokens: TokenSource::new(),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The versioned config store reached through this connection.
    pub fn config_store(&self) -> VersionedConfigStore {
        VersionedConfigStore::new(self.inner.clone())
    }

    fn check_log_id(&self, log_id: LogId) -> StrandResult<()> {
        if log_id.is_user_range() {
            Ok(())
        } else {
            Err(StrandError::InvalidLogId(log_id.as_u64()))
        }
    }

    fn check_payload(&self, len: usize) -> StrandResult<()> {
        let limit = self.inner.config.max_payload_bytes;
        if len > limit {
            Err(StrandError::PayloadTooLarge { size: len, limit })
        } else {
            Ok(())
        }
    }

    /// Append one payload to a log and return its assigned sequence number.
    ///
    /// The write is requested exactly once; retrying after a transient
    /// failure is the caller's decision and may duplicate the record unless
    /// the caller tracks idempotency itself.
    pub async fn append(
        &self,
        log_id: LogId,
        payload: &[u8],
        key: Option<&[u8]>,
    ) -> StrandResult<Lsn> {
        self.check_log_id(log_id)?;
        self.check_payload(payload.len())?;
        let (token, future) = self.issue_append(log_id, payload, key);
        self.finish_append(Op::Append, log_id, token, future, None)
            .await
    }

    /// Like [`append`](Self::append), bounded by a caller deadline. On
    /// expiry the native operation is actively cancelled before the timeout
    /// is returned, so no native-side resources are left behind.
    pub async fn append_with_timeout(
        &self,
        log_id: LogId,
        payload: &[u8],
        key: Option<&[u8]>,
        timeout: Duration,
    ) -> StrandResult<Lsn> {
        self.check_log_id(log_id)?;
        self.check_payload(payload.len())?;
        let (token, future) = self.issue_append(log_id, payload, key);
        self.finish_append(Op::Append, log_id, token, future, Some(timeout))
            .await
    }

    fn issue_append(
        &self,
        log_id: LogId,
        payload: &[u8],
        key: Option<&[u8]>,
    ) -> (OpToken, CompletionFuture<crate::buffer::NativeBuf>) {
        let (reply, future) = completion::pair();
        let token = self.inner.next_token();
        self.inner
            .transport
            .start_append(token, log_id, payload, key, reply);
        (token, future)
    }

    async fn finish_append(
        &self,
        op: Op,
        log_id: LogId,
        token: OpToken,
        future: CompletionFuture<crate::buffer::NativeBuf>,
        timeout: Option<Duration>,
    ) -> StrandResult<Lsn> {
        let delivered = match timeout {
            None => future.await,
            Some(limit) => match tokio::time::timeout(limit, future).await {
                Ok(delivered) => delivered,
                Err(_) => {
                    warn!(%log_id, ?limit, "append deadline expired, cancelling");
                    self.inner.transport.cancel(token);
                    return Err(StrandError::Timeout { op });
                }
            },
        };
        let buf = delivered.ok_or(StrandError::ChannelClosed { op })?;
        let ack = codec::decode_append_completion(buf)?;
        if ack.status != STATUS_OK {
            return Err(StrandError::remote(op, log_id, ack.status));
        }
        debug!(%log_id, lsn = %ack.lsn, "append acknowledged");
        Ok(ack.lsn)
    }

    /// Append several payloads as one atomic batch.
    ///
    /// Either the whole batch is stored, with contiguous sequence numbers
    /// returned in payload order, or none of it is. Compression is applied
    /// before transmission and is invisible to readers.
    pub async fn append_batch(
        &self,
        log_id: LogId,
        payloads: &[Vec<u8>],
        compression: Compression,
    ) -> StrandResult<Vec<Lsn>> {
        self.check_log_id(log_id)?;
        if payloads.is_empty() {
            return Ok(Vec::new());
        }
        for payload in payloads {
            self.check_payload(payload.len())?;
        }
        let blob = codec::encode_batch_blob(payloads, compression)?;

        let (reply, future) = completion::pair();
        let token = self.inner.next_token();
        self.inner
            .transport
            .start_append_batch(token, log_id, &blob, reply);
        let base = self
            .finish_append(Op::AppendBatch, log_id, token, future, None)
            .await?;
        Ok((0..payloads.len() as u64)
            .map(|i| Lsn::new(base.as_u64() + i))
            .collect())
    }

    /// Start an ordered read of `[from, until]`.
    ///
    /// The stream is not restartable: to resume from a given point, open a
    /// new reader with a new `from`. Pass [`Lsn::MAX`] as `until` for an
    /// unbounded tail.
    pub fn open_reader(&self, log_id: LogId, from: Lsn, until: Lsn) -> StrandResult<LogReader> {
        self.check_log_id(log_id)?;
        let (sink, deliveries) = mpsc::unbounded_channel();
        let token = self.inner.next_token();
        self.inner
            .transport
            .start_read(token, log_id, from, until, sink);
        debug!(%log_id, %from, %until, "read started");
        Ok(LogReader::new(
            log_id,
            until,
            deliveries,
            token,
            self.inner.transport.clone(),
            Duration::from_millis(self.inner.config.read_quiescence_ms),
        ))
    }
}
