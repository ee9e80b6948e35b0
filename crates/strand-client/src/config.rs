use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Default cluster endpoint host.
const DEFAULT_HOST: &str = "127.0.0.1";

/// Default cluster endpoint port.
const DEFAULT_PORT: u16 = 4440;

/// Default per-append payload limit.
const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024; // 1 MiB

/// Hard upper bound on the payload limit; the store rejects larger appends
/// regardless of client configuration.
const MAX_PAYLOAD_LIMIT: usize = 32 * 1024 * 1024; // 32 MiB

/// Default time a reader waits for a non-empty delivery before surfacing a
/// timeout. Heartbeats keep the stream alive but do not extend this.
const DEFAULT_READ_QUIESCENCE_MS: u64 = 30_000;

/// Floor for the quiescence window.
const MIN_READ_QUIESCENCE_MS: u64 = 10;

/// Compression applied to batch appends before transmission. Transparent to
/// readers: records come back uncompressed.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    None = 0,
    Zstd = 1,
}

impl Default for Compression {
    fn default() -> Self {
        Self::None
    }
}

/// Process-level configuration for a client handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host of the cluster endpoint.
    pub host: String,

    /// Port of the cluster endpoint.
    pub port: u16,

    /// Largest payload accepted by [`append`](crate::client::StrandClient::append);
    /// larger payloads fail before any native call.
    pub max_payload_bytes: usize,

    /// How long a reader waits for a non-empty delivery before surfacing a
    /// transient timeout (milliseconds).
    pub read_quiescence_ms: u64,

    /// Compression applied by `append_batch` when the caller does not pick
    /// one explicitly.
    pub batch_compression: Compression,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            read_quiescence_ms: DEFAULT_READ_QUIESCENCE_MS,
            batch_compression: Compression::default(),
        }
    }
}

impl ClientConfig {
    /// Returns a copy with out-of-range values clamped to safe bounds.
    pub fn normalized(mut self) -> Self {
        if self.max_payload_bytes == 0 {
            self.max_payload_bytes = DEFAULT_MAX_PAYLOAD_BYTES;
        }
        self.max_payload_bytes = self.max_payload_bytes.min(MAX_PAYLOAD_LIMIT);
        if self.read_quiescence_ms < MIN_READ_QUIESCENCE_MS {
            self.read_quiescence_ms = MIN_READ_QUIESCENCE_MS;
        }
        self
    }

    /// The `host:port` endpoint string.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClientConfig(endpoint={}, max_payload_bytes={}, read_quiescence_ms={}, batch_compression={:?})",
            self.endpoint(),
            self.max_payload_bytes,
            self.read_quiescence_ms,
            self.batch_compression
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_reasonable() {
        let cfg = ClientConfig::default();
        assert!(cfg.max_payload_bytes > 0);
        assert!(cfg.max_payload_bytes <= MAX_PAYLOAD_LIMIT);
        assert!(cfg.read_quiescence_ms >= MIN_READ_QUIESCENCE_MS);
        assert_eq!(cfg.endpoint(), "127.0.0.1:4440");
    }

    #[test]
    fn normalized_clamps_bounds() {
        let cfg = ClientConfig {
            max_payload_bytes: 0,
            read_quiescence_ms: 0,
            ..ClientConfig::default()
        }
        .normalized();
        assert_eq!(cfg.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
        assert_eq!(cfg.read_quiescence_ms, MIN_READ_QUIESCENCE_MS);

        let cfg = ClientConfig {
            max_payload_bytes: usize::MAX,
            ..ClientConfig::default()
        }
        .normalized();
        assert_eq!(cfg.max_payload_bytes, MAX_PAYLOAD_LIMIT);
    }

    #[test]
    fn serde_round_trip() {
        let cfg = ClientConfig {
            host: "store.example".to_string(),
            port: 7440,
            batch_compression: Compression::Zstd,
            ..ClientConfig::default()
        };
        let json = serde_json::to_string(&cfg).expect("serialize");
        let decoded: ClientConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(cfg, decoded);
    }
}
