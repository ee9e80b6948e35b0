//! Reader with persisted consumer progress.

use tracing::{debug, warn};

use crate::client::StrandClient;
use crate::codec::{self, LogRecord};
use crate::config_store::VersionedConfigStore;
use crate::error::{StrandError, StrandResult};
use crate::reader::LogReader;
use crate::status::Status;
use crate::types::{ConfigVersion, LogId, Lsn};

/// Lifecycle of a [`CheckpointedReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Uninitialized,
    Reading,
    Checkpointing,
}

/// A log reader that persists its position in the versioned config store
/// and resumes past it after a restart.
///
/// Checkpointing is caller-triggered: call [`checkpoint`](Self::checkpoint)
/// whenever the records delivered so far are durably processed. A version
/// conflict on the write is retried once against the returned current
/// version; a second consecutive conflict means another writer owns the
/// checkpoint and is surfaced instead of retried forever.
pub struct CheckpointedReader {
    client: StrandClient,
    store: VersionedConfigStore,
    consumer: String,
    log_id: LogId,
    state: ReaderState,
    reader: Option<LogReader>,
    last_seen_version: ConfigVersion,
    last_data_lsn: Lsn,
}

impl CheckpointedReader {
    pub fn new(client: &StrandClient, consumer: impl Into<String>, log_id: LogId) -> Self {
        Self {
            store: client.config_store(),
            client: client.clone(),
            consumer: consumer.into(),
            log_id,
            state: ReaderState::Uninitialized,
            reader: None,
            last_seen_version: ConfigVersion::EMPTY,
            last_data_lsn: Lsn::INVALID,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Last checkpointable position: the highest data LSN delivered, or the
    /// resumed checkpoint before any delivery.
    pub fn position(&self) -> Lsn {
        self.last_data_lsn
    }

    fn key(&self) -> String {
        format!("ckpt/{}/{}", self.consumer, self.log_id)
    }

    /// Load the stored checkpoint and start reading after it, up to
    /// `until`. A consumer that has never checkpointed starts from
    /// [`Lsn::OLDEST`].
    pub async fn start(&mut self, until: Lsn) -> StrandResult<()> {
        if self.state != ReaderState::Uninitialized {
            return Err(StrandError::InvalidState(
                "checkpointed reader already started".into(),
            ));
        }
        let from = match self.store.get(&self.key()).await {
            Ok((value, version)) => {
                let (ckpt_log, ckpt_lsn) = codec::decode_checkpoint(&value)?;
                if ckpt_log != self.log_id {
                    return Err(StrandError::codec(format!(
                        "checkpoint names log {ckpt_log}, reader is on {}",
                        self.log_id
                    )));
                }
                self.last_seen_version = version;
                self.last_data_lsn = ckpt_lsn;
                debug!(consumer = %self.consumer, log_id = %self.log_id, %ckpt_lsn, "resuming past checkpoint");
                ckpt_lsn.next()
            }
            Err(err) if err.status() == Some(Status::NotFound) => {
                debug!(consumer = %self.consumer, log_id = %self.log_id, "no checkpoint, starting from the oldest record");
                Lsn::OLDEST
            }
            Err(err) => return Err(err),
        };
        self.reader = Some(self.client.open_reader(self.log_id, from, until)?);
        self.state = ReaderState::Reading;
        Ok(())
    }

    /// Next entry of the stream. Data records advance the checkpointable
    /// position; gaps pass through without moving it.
    pub async fn next(&mut self) -> Option<StrandResult<LogRecord>> {
        if self.state != ReaderState::Reading {
            return Some(Err(StrandError::InvalidState(
                "checkpointed reader is not reading".into(),
            )));
        }
        let reader = self.reader.as_mut()?;
        let entry = reader.next().await;
        if let Some(Ok(LogRecord::Data(record))) = &entry {
            self.last_data_lsn = record.lsn;
        }
        entry
    }

    /// Persist the current position.
    ///
    /// Returns the new checkpoint version. Retries exactly once when the
    /// conditional write reports a version conflict; a second conflict in a
    /// row is returned to the caller.
    pub async fn checkpoint(&mut self) -> StrandResult<ConfigVersion> {
        if self.state != ReaderState::Reading {
            return Err(StrandError::InvalidState(
                "checkpointed reader is not reading".into(),
            ));
        }
        if self.last_data_lsn == Lsn::INVALID {
            return Err(StrandError::InvalidState(
                "nothing delivered yet, no position to checkpoint".into(),
            ));
        }
        self.state = ReaderState::Checkpointing;
        let result = self.write_checkpoint().await;
        self.state = ReaderState::Reading;
        result
    }

    async fn write_checkpoint(&mut self) -> StrandResult<ConfigVersion> {
        let key = self.key();
        let value = codec::encode_checkpoint(self.log_id, self.last_data_lsn);
        match self.store.put(&key, &value, self.last_seen_version).await {
            Ok((version, _)) => {
                self.last_seen_version = version;
                debug!(consumer = %self.consumer, lsn = %self.last_data_lsn, %version, "checkpoint stored");
                Ok(version)
            }
            Err(StrandError::VersionConflict { current, .. }) => {
                warn!(consumer = %self.consumer, %current, "checkpoint version conflict, retrying once");
                match self.store.put(&key, &value, current).await {
                    Ok((version, _)) => {
                        self.last_seen_version = version;
                        Ok(version)
                    }
                    Err(err) => {
                        if let StrandError::VersionConflict { current, .. } = &err {
                            warn!(
                                consumer = %self.consumer,
                                %current,
                                "second checkpoint conflict in a row, surfacing"
                            );
                        }
                        Err(err)
                    }
                }
            }
            Err(err) => Err(err),
        }
    }
}
