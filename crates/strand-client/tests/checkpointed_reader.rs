use std::sync::Arc;

use strand_client::testing::{tracked_buf, MemoryStore};
use strand_client::{
    codec, ClientConfig, ConfigVersion, LogId, LogRecord, Lsn, OpToken, ReadSink, ReaderState,
    Reply, Status, StrandClient, StrandError, CheckpointedReader, Transport,
};

fn log(n: u64) -> LogId {
    LogId::new(n).expect("test log id")
}

fn client_with(store: &MemoryStore) -> StrandClient {
    StrandClient::connect(ClientConfig::default(), Arc::new(store.clone()))
}

async fn seed(client: &StrandClient, log_id: LogId, count: u8) -> Vec<Lsn> {
    let mut lsns = Vec::new();
    for i in 0..count {
        lsns.push(
            client
                .append(log_id, format!("rec-{i}").as_bytes(), None)
                .await
                .expect("seed append"),
        );
    }
    lsns
}

#[tokio::test]
async fn fresh_consumer_starts_from_the_oldest_record() {
    let store = MemoryStore::new();
    let client = client_with(&store);
    seed(&client, log(1), 3).await;

    let mut reader = CheckpointedReader::new(&client, "etl", log(1));
    assert_eq!(reader.state(), ReaderState::Uninitialized);
    reader.start(Lsn::new(3)).await.expect("start");
    assert_eq!(reader.state(), ReaderState::Reading);

    let first = reader.next().await.expect("entry").expect("clean");
    match first {
        LogRecord::Data(rec) => assert_eq!(rec.lsn, Lsn::OLDEST),
        other => panic!("unexpected entry: {other:?}"),
    }
}

#[tokio::test]
async fn resume_never_redelivers_checkpointed_records() {
    let store = MemoryStore::new();
    let client = client_with(&store);
    let lsns = seed(&client, log(1), 5).await;

    let mut reader = CheckpointedReader::new(&client, "etl", log(1));
    reader.start(Lsn::MAX).await.expect("start");
    for _ in 0..3 {
        reader.next().await.expect("entry").expect("clean");
    }
    assert_eq!(reader.position(), lsns[2]);
    reader.checkpoint().await.expect("checkpoint");
    drop(reader);

    let mut resumed = CheckpointedReader::new(&client, "etl", log(1));
    resumed.start(Lsn::MAX).await.expect("restart");
    assert_eq!(resumed.position(), lsns[2]);
    let next = resumed.next().await.expect("entry").expect("clean");
    match next {
        LogRecord::Data(rec) => {
            assert!(rec.lsn > lsns[2], "re-delivered {} after checkpointing {}", rec.lsn, lsns[2]);
            assert_eq!(rec.lsn, lsns[3]);
        }
        other => panic!("unexpected entry: {other:?}"),
    }
}

#[tokio::test]
async fn single_version_conflict_is_retried_with_the_returned_version() {
    let store = MemoryStore::new();
    let client = client_with(&store);
    seed(&client, log(1), 2).await;

    let mut reader = CheckpointedReader::new(&client, "etl", log(1));
    reader.start(Lsn::MAX).await.expect("start");
    reader.next().await.expect("entry").expect("clean");

    // An external writer claims the checkpoint key after the reader loaded
    // its (absent) state.
    let configs = client.config_store();
    configs
        .put(
            "ckpt/etl/1",
            &codec::encode_checkpoint(log(1), Lsn::OLDEST),
            ConfigVersion::EMPTY,
        )
        .await
        .expect("external write");

    // First put conflicts against the external version, the retry wins.
    let version = reader.checkpoint().await.expect("checkpoint retried");
    assert_eq!(version, ConfigVersion::new(2));
    assert_eq!(reader.state(), ReaderState::Reading);
}

/// Transport that delegates to [`MemoryStore`] but makes every conditional
/// config write lose, as if a duplicate consumer kept overwriting the key.
#[derive(Clone)]
struct ContendedStore {
    inner: MemoryStore,
}

impl Transport for ContendedStore {
    fn start_append(
        &self,
        token: OpToken,
        log_id: LogId,
        payload: &[u8],
        key: Option<&[u8]>,
        reply: Reply,
    ) {
        self.inner.start_append(token, log_id, payload, key, reply);
    }

    fn start_append_batch(&self, token: OpToken, log_id: LogId, blob: &[u8], reply: Reply) {
        self.inner.start_append_batch(token, log_id, blob, reply);
    }

    fn start_read(&self, token: OpToken, log_id: LogId, from: Lsn, until: Lsn, sink: ReadSink) {
        self.inner.start_read(token, log_id, from, until, sink);
    }

    fn start_config_get(&self, token: OpToken, key: &str, reply: Reply) {
        self.inner.start_config_get(token, key, reply);
    }

    fn start_config_put(
        &self,
        _token: OpToken,
        _key: &str,
        _value: &[u8],
        expected: ConfigVersion,
        reply: Reply,
    ) {
        // Whatever the writer expected, somebody else just moved the version.
        let current = ConfigVersion::new(expected.as_u64() + 1);
        reply.complete(tracked_buf(codec::encode_write_completion(
            Status::VersionMismatch.as_raw(),
            Some((current, b"someone else")),
        )));
    }

    fn cancel(&self, token: OpToken) {
        self.inner.cancel(token);
    }
}

#[tokio::test]
async fn repeated_conflicts_are_surfaced_not_retried_forever() {
    let inner = MemoryStore::new();
    let client = StrandClient::connect(
        ClientConfig::default(),
        Arc::new(ContendedStore {
            inner: inner.clone(),
        }),
    );
    seed(&client, log(1), 1).await;

    let mut reader = CheckpointedReader::new(&client, "etl", log(1));
    reader.start(Lsn::MAX).await.expect("start");
    reader.next().await.expect("entry").expect("clean");

    let err = reader.checkpoint().await.expect_err("second conflict surfaces");
    match err {
        StrandError::VersionConflict { value, .. } => assert_eq!(value, b"someone else"),
        other => panic!("unexpected error: {other}"),
    }
    // The reader stays usable; retry policy now belongs to the caller.
    assert_eq!(reader.state(), ReaderState::Reading);
}

#[tokio::test]
async fn lifecycle_misuse_is_rejected() {
    let store = MemoryStore::new();
    let client = client_with(&store);
    seed(&client, log(1), 1).await;

    let mut reader = CheckpointedReader::new(&client, "etl", log(1));
    let err = reader.checkpoint().await.expect_err("not started");
    assert!(matches!(err, StrandError::InvalidState(_)));

    reader.start(Lsn::MAX).await.expect("start");
    let err = reader.start(Lsn::MAX).await.expect_err("double start");
    assert!(matches!(err, StrandError::InvalidState(_)));

    // Started but nothing delivered yet: no position to persist.
    let mut idle = CheckpointedReader::new(&client, "idle", log(1));
    idle.start(Lsn::MAX).await.expect("start");
    let err = idle.checkpoint().await.expect_err("no position yet");
    assert!(matches!(err, StrandError::InvalidState(_)));
}
