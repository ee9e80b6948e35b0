//! Ordered record stream over one log.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::buffer::NativeBuf;
use crate::codec::{self, GapKind, LogRecord, ReadDeliveryKind};
use crate::error::{Op, StrandError, StrandResult};
use crate::transport::{OpToken, Transport};
use crate::types::{LogId, Lsn};

/// Streaming reader for one log range, produced by
/// [`StrandClient::open_reader`](crate::client::StrandClient::open_reader).
///
/// Records and gaps come back in increasing LSN order; the last delivered
/// position never decreases. Dropping the reader cancels the native read.
pub struct LogReader {
    log_id: LogId,
    until: Lsn,
    deliveries: UnboundedReceiver<NativeBuf>,
    pending: VecDeque<LogRecord>,
    last_delivered: Lsn,
    quiescence: Duration,
    token: OpToken,
    transport: Arc<dyn Transport>,
    done: bool,
    cancelled: bool,
}

impl LogReader {
    pub(crate) fn new(
        log_id: LogId,
        until: Lsn,
        deliveries: UnboundedReceiver<NativeBuf>,
        token: OpToken,
        transport: Arc<dyn Transport>,
        quiescence: Duration,
    ) -> Self {
        Self {
            log_id,
            until,
            deliveries,
            pending: VecDeque::new(),
            last_delivered: Lsn::INVALID,
            quiescence,
            token,
            transport,
            done: false,
            cancelled: false,
        }
    }

    pub fn log_id(&self) -> LogId {
        self.log_id
    }

    /// Highest position delivered so far; [`Lsn::INVALID`] before the first
    /// entry.
    pub fn last_delivered(&self) -> Lsn {
        self.last_delivered
    }

    /// Next entry of the stream.
    ///
    /// Returns `None` once the range is exhausted. Heartbeat deliveries keep
    /// the stream alive but do not extend the quiescence window: if nothing
    /// substantial arrives within it, a transient timeout is surfaced and
    /// the caller may poll again.
    pub async fn next(&mut self) -> Option<StrandResult<LogRecord>> {
        let deadline = tokio::time::Instant::now() + self.quiescence;
        loop {
            if let Some(entry) = self.pending.pop_front() {
                return self.deliver(entry);
            }
            if self.done {
                return None;
            }
            let delivered = tokio::time::timeout_at(deadline, self.deliveries.recv()).await;
            match delivered {
                Err(_) => {
                    debug!(log_id = %self.log_id, "read quiescence window expired");
                    return Some(Err(StrandError::Timeout { op: Op::Read }));
                }
                Ok(None) => {
                    self.finish();
                    if self.last_delivered >= self.until {
                        return None;
                    }
                    return Some(Err(StrandError::ChannelClosed { op: Op::Read }));
                }
                Ok(Some(buf)) => match codec::decode_read_delivery(buf) {
                    Ok(ReadDeliveryKind::Heartbeat) => {
                        debug!(log_id = %self.log_id, "read heartbeat");
                    }
                    Ok(ReadDeliveryKind::Records(records)) => {
                        self.pending
                            .extend(records.into_iter().map(LogRecord::Data));
                    }
                    Ok(ReadDeliveryKind::Gap(gap)) => {
                        if gap.kind == GapKind::DataLoss {
                            warn!(log_id = %self.log_id, lo = %gap.lo, hi = %gap.hi, "data loss gap");
                        }
                        self.pending.push_back(LogRecord::Gap(gap));
                    }
                    Ok(ReadDeliveryKind::Failed(code)) => {
                        self.finish();
                        return Some(Err(StrandError::remote(Op::Read, self.log_id, code)));
                    }
                    Err(err) => {
                        self.finish();
                        return Some(Err(err));
                    }
                },
            }
        }
    }

    fn deliver(&mut self, entry: LogRecord) -> Option<StrandResult<LogRecord>> {
        let lo = match &entry {
            LogRecord::Data(rec) => rec.lsn,
            LogRecord::Gap(gap) => gap.lo,
        };
        if lo > self.until {
            self.finish();
            return None;
        }
        if lo <= self.last_delivered {
            self.finish();
            return Some(Err(StrandError::codec(format!(
                "out-of-order delivery: {lo} after {}",
                self.last_delivered
            ))));
        }
        let hi = entry.upper_lsn();
        self.last_delivered = hi;
        if hi >= self.until {
            self.finish();
        }
        Some(Ok(entry))
    }

    fn finish(&mut self) {
        self.done = true;
        if !self.cancelled {
            self.cancelled = true;
            self.transport.cancel(self.token);
        }
    }
}

impl Drop for LogReader {
    fn drop(&mut self) {
        if !self.cancelled {
            self.cancelled = true;
            self.transport.cancel(self.token);
        }
    }
}
