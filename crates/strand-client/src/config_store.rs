//! Optimistic-concurrency client for the store's versioned config space.
//!
//! This is the one consistency-critical path of the client: it is the
//! primitive by which external consumers perform safe concurrent metadata
//! updates, checkpoint advancement included. A conditional write that loses
//! the race fails with the store's actual current version and value, so a
//! read-modify-write loop costs at most two round trips even under
//! contention.

use std::sync::Arc;

use tracing::debug;

use crate::client::ClientInner;
use crate::codec;
use crate::completion;
use crate::error::{Op, StrandError, StrandResult};
use crate::status::{Status, STATUS_OK};
use crate::types::ConfigVersion;

/// Handle to the versioned config store, obtained from
/// [`StrandClient::config_store`](crate::client::StrandClient::config_store).
#[derive(Clone)]
pub struct VersionedConfigStore {
    inner: Arc<ClientInner>,
}

impl VersionedConfigStore {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Fetch a value and its current version. Fails NotFound for a key that
    /// has never been written.
    pub async fn get(&self, key: &str) -> StrandResult<(Vec<u8>, ConfigVersion)> {
        let (reply, future) = completion::pair();
        let token = self.inner.next_token();
        self.inner.transport.start_config_get(token, key, reply);
        let buf = future
            .await
            .ok_or(StrandError::ChannelClosed { op: Op::ConfigGet })?;
        let completion = codec::decode_value_completion(buf)?;
        if completion.status != STATUS_OK {
            return Err(StrandError::remote(Op::ConfigGet, key, completion.status));
        }
        let envelope = completion
            .value
            .ok_or_else(|| StrandError::codec("read completion reported OK without a value"))?;
        let (version, value) = codec::decode_config_value(&envelope)?;
        debug!(key, %version, "config value fetched");
        Ok((value, version))
    }

    /// Conditionally store a value.
    ///
    /// Succeeds only when `expected` matches the store's current version, or
    /// when `expected` is [`ConfigVersion::EMPTY`] and the key does not yet
    /// exist; the new version and stored value come back. A losing write
    /// fails with [`StrandError::VersionConflict`] carrying the store's
    /// actual current version and value.
    pub async fn put(
        &self,
        key: &str,
        value: &[u8],
        expected: ConfigVersion,
    ) -> StrandResult<(ConfigVersion, Vec<u8>)> {
        let (reply, future) = completion::pair();
        let token = self.inner.next_token();
        self.inner
            .transport
            .start_config_put(token, key, value, expected, reply);
        let buf = future
            .await
            .ok_or(StrandError::ChannelClosed { op: Op::ConfigPut })?;
        let completion = codec::decode_write_completion(buf)?;
        match completion.status {
            STATUS_OK => {
                let (version, value) = completion.result.ok_or_else(|| {
                    StrandError::codec("write completion reported OK without state")
                })?;
                debug!(key, %version, "config value stored");
                Ok((version, value))
            }
            code if code == Status::VersionMismatch.as_raw() => {
                let (current, value) = completion.result.ok_or_else(|| {
                    StrandError::codec("version mismatch without the current state")
                })?;
                debug!(key, %current, "config write lost the version race");
                Err(StrandError::VersionConflict { current, value })
            }
            code => Err(StrandError::remote(Op::ConfigPut, key, code)),
        }
    }
}
