//! In-process store used by the crate's tests.
//!
//! [`MemoryStore`] implements [`Transport`] against plain maps, delivering
//! completions inline in the wire encodings of [`crate::codec`]. Every
//! buffer it hands over is allocated through a counting pair, so tests can
//! assert that adopt and release stay balanced across success, failure, and
//! fuzzed paths.

use std::collections::HashMap;
use std::slice;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::buffer::NativeBuf;
use crate::codec::{self, DataRecord, GapKind, GapRecord, LogRecord};
use crate::status::{Status, STATUS_OK};
use crate::transport::{OpToken, ReadSink, Reply, Transport};
use crate::types::{ConfigVersion, LogId, Lsn};

static ALLOC_BALANCE: AtomicIsize = AtomicIsize::new(0);

unsafe fn tracked_release(ptr: *mut u8, len: usize) {
    ALLOC_BALANCE.fetch_sub(1, Ordering::SeqCst);
    drop(unsafe { Box::from_raw(slice::from_raw_parts_mut(ptr, len) as *mut [u8]) });
}

fn leak_tracked(bytes: Vec<u8>) -> (*mut u8, usize) {
    ALLOC_BALANCE.fetch_add(1, Ordering::SeqCst);
    let boxed = bytes.into_boxed_slice();
    let len = boxed.len();
    (Box::into_raw(boxed) as *mut u8, len)
}

/// Wrap bytes in a [`NativeBuf`] whose release is counted.
pub fn tracked_buf(bytes: Vec<u8>) -> NativeBuf {
    let (ptr, len) = leak_tracked(bytes);
    unsafe { NativeBuf::from_raw(ptr, len, tracked_release) }
        .expect("boxed allocation is never null")
}

/// Net tracked allocations currently alive. Zero when every adopted buffer
/// has been released exactly once.
pub fn native_alloc_balance() -> isize {
    ALLOC_BALANCE.load(Ordering::SeqCst)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn entry_lo(entry: &LogRecord) -> Lsn {
    match entry {
        LogRecord::Data(rec) => rec.lsn,
        LogRecord::Gap(gap) => gap.lo,
    }
}

/// Build a batch delivery: OK status, slot count, then one
/// `{pointer, length}` slot per record, each pointing at a leaked encoded
/// record the decoder adopts and releases.
pub fn build_records_delivery(records: &[DataRecord]) -> NativeBuf {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&STATUS_OK.to_le_bytes());
    bytes.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for record in records {
        let encoded = codec::encode_record(record).expect("test record encodes");
        let (ptr, len) = leak_tracked(encoded);
        bytes.extend_from_slice(&(ptr as u64).to_le_bytes());
        bytes.extend_from_slice(&(len as u64).to_le_bytes());
    }
    tracked_buf(bytes)
}

fn build_gap_delivery(gap: &GapRecord) -> NativeBuf {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&Status::Gap.as_raw().to_le_bytes());
    bytes.extend_from_slice(&(gap.kind as u32).to_le_bytes());
    bytes.extend_from_slice(&gap.log_id.as_u64().to_le_bytes());
    bytes.extend_from_slice(&gap.lo.as_u64().to_le_bytes());
    bytes.extend_from_slice(&gap.hi.as_u64().to_le_bytes());
    tracked_buf(bytes)
}

fn build_entry_delivery(entry: &LogRecord) -> NativeBuf {
    match entry {
        LogRecord::Data(rec) => build_records_delivery(slice::from_ref(rec)),
        LogRecord::Gap(gap) => build_gap_delivery(gap),
    }
}

struct Tail {
    token: OpToken,
    log_id: LogId,
    until: Lsn,
    next: Lsn,
    sink: ReadSink,
}

#[derive(Default)]
struct State {
    logs: HashMap<u64, Vec<LogRecord>>,
    next_lsn: HashMap<u64, u64>,
    configs: HashMap<String, (ConfigVersion, Vec<u8>)>,
    tails: Vec<Tail>,
    fail_next_append: Option<u32>,
    hold_next_append: bool,
    /// Replies swallowed by `hold_next_append`; kept alive so the caller
    /// stays pending instead of seeing a dropped transport.
    #[allow(dead_code)]
    held: Vec<Reply>,
    cancelled: Vec<OpToken>,
}

impl State {
    fn assign_lsns(&mut self, log_id: LogId, count: u64) -> Lsn {
        let next = self
            .next_lsn
            .entry(log_id.as_u64())
            .or_insert(Lsn::OLDEST.as_u64());
        let base = *next;
        *next += count;
        Lsn::new(base)
    }

    fn push_entries(&mut self, log_id: LogId, entries: Vec<LogRecord>) {
        self.logs
            .entry(log_id.as_u64())
            .or_default()
            .extend(entries.iter().cloned());
        for tail in self.tails.iter_mut().filter(|tail| tail.log_id == log_id) {
            for entry in &entries {
                let lo = entry_lo(entry);
                if lo < tail.next || lo > tail.until {
                    continue;
                }
                let _ = tail.sink.send(build_entry_delivery(entry));
                tail.next = entry.upper_lsn().next();
            }
        }
    }

    fn reply_append(
        &mut self,
        log_id: LogId,
        count: u64,
        build: impl FnOnce(Lsn) -> Vec<LogRecord>,
        reply: Reply,
    ) {
        if self.hold_next_append {
            self.hold_next_append = false;
            self.held.push(reply);
            return;
        }
        if let Some(code) = self.fail_next_append.take() {
            reply.complete(tracked_buf(codec::encode_append_completion(
                code,
                log_id,
                Lsn::INVALID,
                0,
            )));
            return;
        }
        let base = self.assign_lsns(log_id, count);
        self.push_entries(log_id, build(base));
        reply.complete(tracked_buf(codec::encode_append_completion(
            STATUS_OK,
            log_id,
            base,
            now_ms(),
        )));
    }
}

/// In-memory rendition of the native store, for tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next append (or batch append) with the given status.
    pub fn fail_next_append(&self, status: Status) {
        self.state.lock().fail_next_append = Some(status.as_raw());
    }

    /// Swallow the next append: no completion is ever delivered for it.
    /// Used to exercise caller deadlines and cancellation.
    pub fn hold_next_append(&self) {
        self.state.lock().hold_next_append = true;
    }

    /// Operations cancelled so far.
    pub fn cancelled_count(&self) -> usize {
        self.state.lock().cancelled.len()
    }

    /// Send an empty (heartbeat) delivery to every open reader of the log.
    pub fn send_heartbeat(&self, log_id: LogId) {
        let state = self.state.lock();
        for tail in state.tails.iter().filter(|tail| tail.log_id == log_id) {
            let _ = tail.sink.send(tracked_buf(Vec::new()));
        }
    }

    /// Record a gap covering `[lo, hi]` in the log's timeline and advance
    /// the next sequence number past it.
    pub fn inject_gap(&self, log_id: LogId, kind: GapKind, lo: Lsn, hi: Lsn) {
        let mut state = self.state.lock();
        let next = state
            .next_lsn
            .entry(log_id.as_u64())
            .or_insert(Lsn::OLDEST.as_u64());
        *next = (*next).max(hi.as_u64() + 1);
        state.push_entries(
            log_id,
            vec![LogRecord::Gap(GapRecord {
                log_id,
                kind,
                lo,
                hi,
            })],
        );
    }

    /// Records currently stored for a log.
    pub fn stored_records(&self, log_id: LogId) -> Vec<DataRecord> {
        self.state
            .lock()
            .logs
            .get(&log_id.as_u64())
            .map(|timeline| {
                timeline
                    .iter()
                    .filter_map(|entry| match entry {
                        LogRecord::Data(rec) => Some(rec.clone()),
                        LogRecord::Gap(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Transport for MemoryStore {
    fn start_append(
        &self,
        _token: OpToken,
        log_id: LogId,
        payload: &[u8],
        _key: Option<&[u8]>,
        reply: Reply,
    ) {
        let payload = payload.to_vec();
        self.state.lock().reply_append(
            log_id,
            1,
            move |base| {
                vec![LogRecord::Data(DataRecord {
                    log_id,
                    lsn: base,
                    payload,
                })]
            },
            reply,
        );
    }

    fn start_append_batch(&self, _token: OpToken, log_id: LogId, blob: &[u8], reply: Reply) {
        let payloads = match codec::decode_batch_blob(blob) {
            Ok(payloads) => payloads,
            Err(_) => {
                reply.complete(tracked_buf(codec::encode_append_completion(
                    Status::BadPayload.as_raw(),
                    log_id,
                    Lsn::INVALID,
                    0,
                )));
                return;
            }
        };
        self.state.lock().reply_append(
            log_id,
            payloads.len() as u64,
            move |base| {
                payloads
                    .into_iter()
                    .enumerate()
                    .map(|(i, payload)| {
                        LogRecord::Data(DataRecord {
                            log_id,
                            lsn: Lsn::new(base.as_u64() + i as u64),
                            payload,
                        })
                    })
                    .collect()
            },
            reply,
        );
    }

    fn start_read(&self, token: OpToken, log_id: LogId, from: Lsn, until: Lsn, sink: ReadSink) {
        let mut state = self.state.lock();
        let timeline = state
            .logs
            .get(&log_id.as_u64())
            .cloned()
            .unwrap_or_default();
        let mut next = from;
        let mut batch: Vec<DataRecord> = Vec::new();
        for entry in timeline
            .iter()
            .filter(|entry| entry.upper_lsn() >= from && entry_lo(entry) <= until)
        {
            match entry {
                LogRecord::Data(rec) => batch.push(rec.clone()),
                LogRecord::Gap(gap) => {
                    if !batch.is_empty() {
                        let _ = sink.send(build_records_delivery(&batch));
                        batch.clear();
                    }
                    let _ = sink.send(build_gap_delivery(gap));
                }
            }
            next = entry.upper_lsn().next();
        }
        if !batch.is_empty() {
            let _ = sink.send(build_records_delivery(&batch));
        }
        state.tails.push(Tail {
            token,
            log_id,
            until,
            next,
            sink,
        });
    }

    fn start_config_get(&self, _token: OpToken, key: &str, reply: Reply) {
        let state = self.state.lock();
        let bytes = match state.configs.get(key) {
            Some((version, value)) => codec::encode_value_completion(
                STATUS_OK,
                Some(&codec::encode_config_value(*version, value)),
            ),
            None => codec::encode_value_completion(Status::NotFound.as_raw(), None),
        };
        reply.complete(tracked_buf(bytes));
    }

    fn start_config_put(
        &self,
        _token: OpToken,
        key: &str,
        value: &[u8],
        expected: ConfigVersion,
        reply: Reply,
    ) {
        let mut state = self.state.lock();
        let current = state.configs.get(key).cloned();
        let matches = match &current {
            None => expected.is_empty(),
            Some((version, _)) => *version == expected,
        };
        let bytes = if matches {
            let version = ConfigVersion::new(current.map(|(v, _)| v.as_u64()).unwrap_or(0) + 1);
            state
                .configs
                .insert(key.to_string(), (version, value.to_vec()));
            codec::encode_write_completion(STATUS_OK, Some((version, value)))
        } else {
            let (version, value) = current.unwrap_or((ConfigVersion::EMPTY, Vec::new()));
            codec::encode_write_completion(
                Status::VersionMismatch.as_raw(),
                Some((version, value.as_slice())),
            )
        };
        reply.complete(tracked_buf(bytes));
    }

    fn cancel(&self, token: OpToken) {
        let mut state = self.state.lock();
        state.cancelled.push(token);
        state.tails.retain(|tail| tail.token != token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::ptr;
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn noop_waker() -> Waker {
        unsafe fn clone(_: *const ()) -> RawWaker {
            RawWaker::new(ptr::null(), &VTABLE)
        }
        unsafe fn wake(_: *const ()) {}
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, wake, wake, wake);
        let raw = RawWaker::new(ptr::null(), &VTABLE);
        unsafe { Waker::from_raw(raw) }
    }

    fn poll_ready(future: &mut crate::completion::CompletionFuture<NativeBuf>) -> NativeBuf {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        match Pin::new(future).poll(&mut cx) {
            Poll::Ready(Some(buf)) => buf,
            other => panic!("completion not delivered: {other:?}"),
        }
    }

    #[test]
    fn cas_versions_advance_from_one() {
        let store = MemoryStore::new();
        let (reply, mut future) = crate::completion::pair();
        store.start_config_put(OpToken(1), "k", b"v", ConfigVersion::EMPTY, reply);
        let buf = poll_ready(&mut future);
        let completion = codec::decode_write_completion(buf).unwrap();
        assert_eq!(completion.status, STATUS_OK);
        assert_eq!(
            completion.result,
            Some((ConfigVersion::new(1), b"v".to_vec()))
        );
    }

    #[test]
    fn mismatch_reports_current_state() {
        let store = MemoryStore::new();
        let (reply, mut future) = crate::completion::pair();
        store.start_config_put(OpToken(1), "k", b"first", ConfigVersion::EMPTY, reply);
        let _ = poll_ready(&mut future);

        let (reply, mut future) = crate::completion::pair();
        store.start_config_put(OpToken(2), "k", b"second", ConfigVersion::EMPTY, reply);
        let buf = poll_ready(&mut future);
        let completion = codec::decode_write_completion(buf).unwrap();
        assert_eq!(completion.status, Status::VersionMismatch.as_raw());
        assert_eq!(
            completion.result,
            Some((ConfigVersion::new(1), b"first".to_vec()))
        );
    }
}
