//! Binary layouts for stored records and asynchronous completion payloads.
//!
//! All integers are little-endian. Decode functions consume the native
//! buffer by value: whatever path they exit through, the buffer's release
//! runs exactly once when it drops. Batch decoding adopts each slot's
//! payload allocation independently before copying it out, so per-record
//! releases also run on partial failures.

use byteorder::{ByteOrder, LittleEndian};

use crate::buffer::{NativeBuf, ReleaseFn};
use crate::config::Compression;
use crate::error::{StrandError, StrandResult};
use crate::status::Status;
use crate::types::{ConfigVersion, LogId, Lsn};

/// Fixed header preceding a stored record's payload: log id, sequence
/// number, payload length.
pub const RECORD_HEADER_LEN: usize = 8 + 8 + 4;

/// Append completion: status, log id, sequence number, timestamp.
pub const APPEND_COMPLETION_LEN: usize = 4 + 8 + 8 + 8;

/// One slot of a batch read buffer: payload pointer and length.
pub const READ_SLOT_LEN: usize = 8 + 8;

/// Gap payload: kind, log id, first and last missing sequence number.
pub const GAP_PAYLOAD_LEN: usize = 4 + 8 + 8 + 8;

/// One stored unit of a log. The payload is caller-owned: whatever native
/// buffer backed it has already been copied out and released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecord {
    pub log_id: LogId,
    pub lsn: Lsn,
    pub payload: Vec<u8>,
}

/// Kind of a gap in a read range.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapKind {
    /// Benign bridge between epochs; nothing was lost.
    Bridge = 0,
    /// Range with no records (trimmed or never written).
    Hole = 1,
    /// Records existed but are unrecoverable.
    DataLoss = 2,
    /// Range removed by retention.
    Trim = 3,
}

impl TryFrom<u32> for GapKind {
    type Error = StrandError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => GapKind::Bridge,
            1 => GapKind::Hole,
            2 => GapKind::DataLoss,
            3 => GapKind::Trim,
            other => return Err(StrandError::codec(format!("unknown gap kind: {other}"))),
        })
    }
}

/// A gap delivered in place of records for `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapRecord {
    pub log_id: LogId,
    pub kind: GapKind,
    pub lo: Lsn,
    pub hi: Lsn,
}

/// What a reader yields: a record, or a distinguishable gap. Gaps are never
/// silently skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Data(DataRecord),
    Gap(GapRecord),
}

impl LogRecord {
    /// Highest sequence number this entry accounts for.
    pub fn upper_lsn(&self) -> Lsn {
        match self {
            LogRecord::Data(rec) => rec.lsn,
            LogRecord::Gap(gap) => gap.hi,
        }
    }
}

/// Decoded append completion. Scalar fields are present regardless of
/// status; `lsn` is [`Lsn::INVALID`] on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendCompletion {
    pub status: u32,
    pub log_id: LogId,
    pub lsn: Lsn,
    pub timestamp_ms: u64,
}

/// Decoded versioned-config read completion. The value exists only when the
/// status is OK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCompletion {
    pub status: u32,
    pub value: Option<Vec<u8>>,
}

/// Decoded versioned-config write completion. Version and value exist only
/// when the status is OK or VersionMismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCompletion {
    pub status: u32,
    pub result: Option<(ConfigVersion, Vec<u8>)>,
}

/// Decoded config-status payload. The reason string is present regardless
/// of status and may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStatus {
    pub status: u32,
    pub version: ConfigVersion,
    pub reason: String,
}

/// Content of one read delivery.
#[derive(Debug)]
pub enum ReadDeliveryKind {
    /// Empty delivery; the stream is alive but has nothing to hand over.
    Heartbeat,
    /// Batch of records, in increasing LSN order.
    Records(Vec<DataRecord>),
    /// A gap in the range.
    Gap(GapRecord),
    /// The stream failed with a raw status to classify.
    Failed(u32),
}

fn ensure_len(bytes: &[u8], required: usize, what: &str) -> StrandResult<()> {
    if bytes.len() < required {
        return Err(StrandError::codec(format!(
            "{what} truncated: {} of {required} bytes",
            bytes.len()
        )));
    }
    Ok(())
}

fn ensure_consumed(bytes: &[u8], consumed: usize, what: &str) -> StrandResult<()> {
    if bytes.len() != consumed {
        return Err(StrandError::codec(format!(
            "{what} has {} trailing bytes",
            bytes.len() - consumed
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stored record

/// Encode a record as its fixed header followed by the payload.
pub fn encode_record(record: &DataRecord) -> StrandResult<Vec<u8>> {
    if record.payload.len() > u32::MAX as usize {
        return Err(StrandError::codec("record payload exceeds u32::MAX"));
    }
    let mut buf = Vec::with_capacity(RECORD_HEADER_LEN + record.payload.len());
    buf.extend_from_slice(&record.log_id.as_u64().to_le_bytes());
    buf.extend_from_slice(&record.lsn.as_u64().to_le_bytes());
    buf.extend_from_slice(&(record.payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(&record.payload);
    Ok(buf)
}

/// Decode a record, copying the payload out of the native allocation. The
/// buffer is released when this returns, on success and failure alike.
pub fn decode_record(buf: NativeBuf) -> StrandResult<DataRecord> {
    let bytes = buf.as_slice();
    ensure_len(bytes, RECORD_HEADER_LEN, "record header")?;
    let log_id = LogId::from_raw(LittleEndian::read_u64(&bytes[0..8]));
    let lsn = Lsn::new(LittleEndian::read_u64(&bytes[8..16]));
    let payload_len = LittleEndian::read_u32(&bytes[16..20]) as usize;
    ensure_len(&bytes[RECORD_HEADER_LEN..], payload_len, "record payload")?;
    ensure_consumed(bytes, RECORD_HEADER_LEN + payload_len, "record")?;
    let payload = bytes[RECORD_HEADER_LEN..RECORD_HEADER_LEN + payload_len].to_vec();
    Ok(DataRecord {
        log_id,
        lsn,
        payload,
    })
}

// ---------------------------------------------------------------------------
// Append completion

pub fn encode_append_completion(
    status: u32,
    log_id: LogId,
    lsn: Lsn,
    timestamp_ms: u64,
) -> Vec<u8> {
    let mut buf = [0u8; APPEND_COMPLETION_LEN];
    LittleEndian::write_u32(&mut buf[0..4], status);
    LittleEndian::write_u64(&mut buf[4..12], log_id.as_u64());
    LittleEndian::write_u64(&mut buf[12..20], lsn.as_u64());
    LittleEndian::write_u64(&mut buf[20..28], timestamp_ms);
    buf.to_vec()
}

pub fn decode_append_completion(buf: NativeBuf) -> StrandResult<AppendCompletion> {
    let bytes = buf.as_slice();
    ensure_len(bytes, APPEND_COMPLETION_LEN, "append completion")?;
    ensure_consumed(bytes, APPEND_COMPLETION_LEN, "append completion")?;
    Ok(AppendCompletion {
        status: LittleEndian::read_u32(&bytes[0..4]),
        log_id: LogId::from_raw(LittleEndian::read_u64(&bytes[4..12])),
        lsn: Lsn::new(LittleEndian::read_u64(&bytes[12..20])),
        timestamp_ms: LittleEndian::read_u64(&bytes[20..28]),
    })
}

// ---------------------------------------------------------------------------
// Versioned-config completions

pub fn encode_value_completion(status: u32, value: Option<&[u8]>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&status.to_le_bytes());
    if let Some(value) = value {
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        buf.extend_from_slice(value);
    }
    buf
}

/// Decode a versioned-config read completion. A value is parsed only for an
/// OK status; any other status must carry nothing beyond the code.
pub fn decode_value_completion(buf: NativeBuf) -> StrandResult<ValueCompletion> {
    let bytes = buf.as_slice();
    ensure_len(bytes, 4, "value completion")?;
    let status = LittleEndian::read_u32(&bytes[0..4]);
    if status != crate::status::STATUS_OK {
        ensure_consumed(bytes, 4, "value completion")?;
        return Ok(ValueCompletion {
            status,
            value: None,
        });
    }
    ensure_len(&bytes[4..], 4, "value length")?;
    let len = LittleEndian::read_u32(&bytes[4..8]) as usize;
    ensure_len(&bytes[8..], len, "value")?;
    ensure_consumed(bytes, 8 + len, "value completion")?;
    Ok(ValueCompletion {
        status,
        value: Some(bytes[8..8 + len].to_vec()),
    })
}

pub fn encode_write_completion(status: u32, result: Option<(ConfigVersion, &[u8])>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&status.to_le_bytes());
    if let Some((version, value)) = result {
        buf.extend_from_slice(&version.as_u64().to_le_bytes());
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        buf.extend_from_slice(value);
    }
    buf
}

/// Decode a versioned-config write completion. Version and value are parsed
/// only for OK or VersionMismatch; any other status must carry nothing
/// beyond the code.
pub fn decode_write_completion(buf: NativeBuf) -> StrandResult<WriteCompletion> {
    let bytes = buf.as_slice();
    ensure_len(bytes, 4, "write completion")?;
    let status = LittleEndian::read_u32(&bytes[0..4]);
    let carries_state =
        status == crate::status::STATUS_OK || status == Status::VersionMismatch.as_raw();
    if !carries_state {
        ensure_consumed(bytes, 4, "write completion")?;
        return Ok(WriteCompletion {
            status,
            result: None,
        });
    }
    ensure_len(&bytes[4..], 8 + 4, "write completion version")?;
    let version = ConfigVersion::new(LittleEndian::read_u64(&bytes[4..12]));
    let len = LittleEndian::read_u32(&bytes[12..16]) as usize;
    ensure_len(&bytes[16..], len, "write completion value")?;
    ensure_consumed(bytes, 16 + len, "write completion")?;
    Ok(WriteCompletion {
        status,
        result: Some((version, bytes[16..16 + len].to_vec())),
    })
}

pub fn encode_config_status(status: u32, version: ConfigVersion, reason: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&status.to_le_bytes());
    buf.extend_from_slice(&version.as_u64().to_le_bytes());
    buf.extend_from_slice(&(reason.len() as u32).to_le_bytes());
    buf.extend_from_slice(reason.as_bytes());
    buf
}

/// Decode a config-status payload. The reason is present regardless of
/// status and may be empty.
pub fn decode_config_status(buf: NativeBuf) -> StrandResult<ConfigStatus> {
    let bytes = buf.as_slice();
    ensure_len(bytes, 4 + 8 + 4, "config status")?;
    let status = LittleEndian::read_u32(&bytes[0..4]);
    let version = ConfigVersion::new(LittleEndian::read_u64(&bytes[4..12]));
    let len = LittleEndian::read_u32(&bytes[12..16]) as usize;
    ensure_len(&bytes[16..], len, "config status reason")?;
    ensure_consumed(bytes, 16 + len, "config status")?;
    let reason = String::from_utf8(bytes[16..16 + len].to_vec())
        .map_err(|err| StrandError::codec(format!("config status reason utf8 error: {err}")))?;
    Ok(ConfigStatus {
        status,
        version,
        reason,
    })
}

// ---------------------------------------------------------------------------
// Versioned-config value envelope

/// Encode the store-side envelope of a config value: its version followed
/// by the opaque caller bytes.
pub fn encode_config_value(version: ConfigVersion, value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + value.len());
    buf.extend_from_slice(&version.as_u64().to_le_bytes());
    buf.extend_from_slice(value);
    buf
}

pub fn decode_config_value(bytes: &[u8]) -> StrandResult<(ConfigVersion, Vec<u8>)> {
    ensure_len(bytes, 8, "config value envelope")?;
    let version = ConfigVersion::new(LittleEndian::read_u64(&bytes[0..8]));
    Ok((version, bytes[8..].to_vec()))
}

// ---------------------------------------------------------------------------
// Read deliveries

/// Decode one read delivery. An empty buffer is a heartbeat. Otherwise the
/// leading status selects the shape: OK carries a slot table of records,
/// Gap carries a gap payload, anything else is a stream failure.
///
/// Each slot's payload allocation is adopted with the same release function
/// as the delivery buffer and released independently once its bytes are
/// copied out.
pub fn decode_read_delivery(buf: NativeBuf) -> StrandResult<ReadDeliveryKind> {
    if buf.is_empty() {
        return Ok(ReadDeliveryKind::Heartbeat);
    }
    let release = buf.release_fn();
    let bytes = buf.as_slice();
    ensure_len(bytes, 4, "read delivery")?;
    let status = LittleEndian::read_u32(&bytes[0..4]);
    if status == crate::status::STATUS_OK {
        let records = decode_record_slots(&bytes[4..], release)?;
        return Ok(ReadDeliveryKind::Records(records));
    }
    if status == Status::Gap.as_raw() {
        let gap = decode_gap_payload(&bytes[4..])?;
        return Ok(ReadDeliveryKind::Gap(gap));
    }
    ensure_consumed(bytes, 4, "read failure delivery")?;
    Ok(ReadDeliveryKind::Failed(status))
}

fn decode_gap_payload(bytes: &[u8]) -> StrandResult<GapRecord> {
    ensure_len(bytes, GAP_PAYLOAD_LEN, "gap payload")?;
    ensure_consumed(bytes, GAP_PAYLOAD_LEN, "gap payload")?;
    let kind = GapKind::try_from(LittleEndian::read_u32(&bytes[0..4]))?;
    Ok(GapRecord {
        log_id: LogId::from_raw(LittleEndian::read_u64(&bytes[4..12])),
        kind,
        lo: Lsn::new(LittleEndian::read_u64(&bytes[12..20])),
        hi: Lsn::new(LittleEndian::read_u64(&bytes[20..28])),
    })
}

/// Decode the slot table of a batch delivery: a count followed by N
/// `{pointer, length}` slots at increasing offsets.
///
/// Every slot allocation that can be parsed is adopted before any record is
/// decoded, so a malformed slot or record cannot leak the others.
fn decode_record_slots(bytes: &[u8], release: ReleaseFn) -> StrandResult<Vec<DataRecord>> {
    ensure_len(bytes, 4, "slot count")?;
    let count = LittleEndian::read_u32(&bytes[0..4]) as usize;
    let table = &bytes[4..];
    ensure_len(table, count * READ_SLOT_LEN, "slot table")?;
    ensure_consumed(table, count * READ_SLOT_LEN, "slot table")?;

    let mut adopted = Vec::with_capacity(count);
    let mut parse_error = None;
    for slot in 0..count {
        let off = slot * READ_SLOT_LEN;
        let ptr = LittleEndian::read_u64(&table[off..off + 8]) as *mut u8;
        let len = LittleEndian::read_u64(&table[off + 8..off + 16]) as usize;
        match unsafe { NativeBuf::from_raw(ptr, len, release) } {
            Some(payload) => adopted.push(payload),
            None => {
                parse_error
                    .get_or_insert_with(|| StrandError::codec(format!("null pointer in slot {slot}")));
            }
        }
    }
    if let Some(err) = parse_error {
        // Adopted allocations release as `adopted` drops here.
        return Err(err);
    }

    let mut records = Vec::with_capacity(count);
    for payload in adopted {
        records.push(decode_record(payload)?);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Batch append blob

/// Encode a batch of payloads into one append blob: compression tag, entry
/// count, uncompressed body length, then the (possibly compressed) body of
/// length-prefixed entries.
pub fn encode_batch_blob(payloads: &[Vec<u8>], compression: Compression) -> StrandResult<Vec<u8>> {
    let mut body = Vec::new();
    for payload in payloads {
        if payload.len() > u32::MAX as usize {
            return Err(StrandError::codec("batch entry exceeds u32::MAX"));
        }
        body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        body.extend_from_slice(payload);
    }
    let raw_len = body.len();
    let body = match compression {
        Compression::None => body,
        Compression::Zstd => zstd::bulk::compress(&body, 0)
            .map_err(|err| StrandError::codec(format!("zstd compress: {err}")))?,
    };
    let mut buf = Vec::with_capacity(1 + 4 + 4 + body.len());
    buf.push(compression as u8);
    buf.extend_from_slice(&(payloads.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(raw_len as u32).to_le_bytes());
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decode a batch append blob back into its payloads.
pub fn decode_batch_blob(bytes: &[u8]) -> StrandResult<Vec<Vec<u8>>> {
    ensure_len(bytes, 1 + 4 + 4, "batch blob header")?;
    let compression = match bytes[0] {
        0 => Compression::None,
        1 => Compression::Zstd,
        other => {
            return Err(StrandError::codec(format!(
                "unknown batch compression tag: {other}"
            )))
        }
    };
    let count = LittleEndian::read_u32(&bytes[1..5]) as usize;
    let raw_len = LittleEndian::read_u32(&bytes[5..9]) as usize;
    let body = match compression {
        Compression::None => bytes[9..].to_vec(),
        Compression::Zstd => zstd::bulk::decompress(&bytes[9..], raw_len)
            .map_err(|err| StrandError::codec(format!("zstd decompress: {err}")))?,
    };
    if body.len() != raw_len {
        return Err(StrandError::codec(format!(
            "batch body is {} bytes, header says {raw_len}",
            body.len()
        )));
    }
    let mut payloads = Vec::with_capacity(count);
    let mut off = 0usize;
    for _ in 0..count {
        ensure_len(&body[off..], 4, "batch entry length")?;
        let len = LittleEndian::read_u32(&body[off..off + 4]) as usize;
        off += 4;
        ensure_len(&body[off..], len, "batch entry")?;
        payloads.push(body[off..off + len].to_vec());
        off += len;
    }
    ensure_consumed(&body, off, "batch blob")?;
    Ok(payloads)
}

// ---------------------------------------------------------------------------
// Checkpoint value

/// Encode a consumer checkpoint: the log and the last durably-processed
/// sequence number.
pub fn encode_checkpoint(log_id: LogId, lsn: Lsn) -> Vec<u8> {
    let mut buf = [0u8; 16];
    LittleEndian::write_u64(&mut buf[0..8], log_id.as_u64());
    LittleEndian::write_u64(&mut buf[8..16], lsn.as_u64());
    buf.to_vec()
}

pub fn decode_checkpoint(bytes: &[u8]) -> StrandResult<(LogId, Lsn)> {
    ensure_len(bytes, 16, "checkpoint value")?;
    ensure_consumed(bytes, 16, "checkpoint value")?;
    Ok((
        LogId::from_raw(LittleEndian::read_u64(&bytes[0..8])),
        Lsn::new(LittleEndian::read_u64(&bytes[8..16])),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::STATUS_OK;

    fn record(log: u64, lsn: u64, payload: &[u8]) -> DataRecord {
        DataRecord {
            log_id: LogId::new(log).unwrap(),
            lsn: Lsn::new(lsn),
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn record_round_trip() {
        let rec = record(7, 42, b"hello");
        let encoded = encode_record(&rec).unwrap();
        assert_eq!(encoded.len(), RECORD_HEADER_LEN + 5);
        let decoded = decode_record(NativeBuf::from_vec(encoded)).unwrap();
        assert_eq!(decoded, rec);
    }

    #[test]
    fn truncated_record_fails_and_releases() {
        let rec = record(7, 42, b"hello");
        let mut encoded = encode_record(&rec).unwrap();
        encoded.truncate(RECORD_HEADER_LEN + 2);
        let err = decode_record(NativeBuf::from_vec(encoded)).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn append_completion_round_trip() {
        let encoded =
            encode_append_completion(STATUS_OK, LogId::new(3).unwrap(), Lsn::new(9), 1234);
        let decoded = decode_append_completion(NativeBuf::from_vec(encoded)).unwrap();
        assert_eq!(decoded.status, STATUS_OK);
        assert_eq!(decoded.log_id.as_u64(), 3);
        assert_eq!(decoded.lsn, Lsn::new(9));
        assert_eq!(decoded.timestamp_ms, 1234);
    }

    #[test]
    fn value_completion_has_no_payload_on_failure() {
        let encoded = encode_value_completion(Status::NotFound.as_raw(), None);
        let decoded = decode_value_completion(NativeBuf::from_vec(encoded)).unwrap();
        assert_eq!(decoded.status, Status::NotFound.as_raw());
        assert_eq!(decoded.value, None);

        // A failure status followed by payload bytes is malformed.
        let bogus = encode_value_completion(Status::NotFound.as_raw(), Some(b"x"));
        assert!(decode_value_completion(NativeBuf::from_vec(bogus)).is_err());
    }

    #[test]
    fn write_completion_carries_state_on_mismatch() {
        let encoded = encode_write_completion(
            Status::VersionMismatch.as_raw(),
            Some((ConfigVersion::new(4), b"current")),
        );
        let decoded = decode_write_completion(NativeBuf::from_vec(encoded)).unwrap();
        assert_eq!(decoded.status, Status::VersionMismatch.as_raw());
        assert_eq!(
            decoded.result,
            Some((ConfigVersion::new(4), b"current".to_vec()))
        );

        let encoded = encode_write_completion(Status::AccessDenied.as_raw(), None);
        let decoded = decode_write_completion(NativeBuf::from_vec(encoded)).unwrap();
        assert_eq!(decoded.result, None);
    }

    #[test]
    fn config_status_reason_may_be_empty() {
        let encoded = encode_config_status(STATUS_OK, ConfigVersion::new(1), "");
        let decoded = decode_config_status(NativeBuf::from_vec(encoded)).unwrap();
        assert_eq!(decoded.reason, "");

        let encoded =
            encode_config_status(Status::Exists.as_raw(), ConfigVersion::new(2), "already there");
        let decoded = decode_config_status(NativeBuf::from_vec(encoded)).unwrap();
        assert_eq!(decoded.status, Status::Exists.as_raw());
        assert_eq!(decoded.version, ConfigVersion::new(2));
        assert_eq!(decoded.reason, "already there");
    }

    #[test]
    fn config_value_envelope_round_trip() {
        let encoded = encode_config_value(ConfigVersion::new(5), b"ckpt");
        let (version, value) = decode_config_value(&encoded).unwrap();
        assert_eq!(version, ConfigVersion::new(5));
        assert_eq!(value, b"ckpt");
    }

    #[test]
    fn batch_blob_round_trip_uncompressed() {
        let payloads = vec![b"hello".to_vec(), b"world".to_vec(), Vec::new()];
        let blob = encode_batch_blob(&payloads, Compression::None).unwrap();
        assert_eq!(decode_batch_blob(&blob).unwrap(), payloads);
    }

    #[test]
    fn batch_blob_round_trip_zstd() {
        let payloads: Vec<Vec<u8>> = (0..32).map(|i| vec![i as u8; 256]).collect();
        let blob = encode_batch_blob(&payloads, Compression::Zstd).unwrap();
        assert!(blob.len() < 32 * 256);
        assert_eq!(decode_batch_blob(&blob).unwrap(), payloads);
    }

    #[test]
    fn checkpoint_round_trip() {
        let encoded = encode_checkpoint(LogId::new(12).unwrap(), Lsn::new(42));
        let (log_id, lsn) = decode_checkpoint(&encoded).unwrap();
        assert_eq!(log_id.as_u64(), 12);
        assert_eq!(lsn, Lsn::new(42));
    }

    #[test]
    fn gap_kind_rejects_unknown() {
        assert!(GapKind::try_from(9).is_err());
    }
}
