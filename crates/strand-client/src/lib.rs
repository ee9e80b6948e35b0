//! Client bindings for the Strand distributed log store.
//!
//! The crate bridges the store's asynchronous, callback-driven native
//! transport into a request/response API: appends against named logs,
//! ordered reads with explicit gap records, optimistically-versioned config
//! updates, and checkpointed consumer progress on top of both. Buffers that
//! cross the native boundary are owned by [`buffer::NativeBuf`] and released
//! exactly once; raw failure codes are classified once, at the boundary, by
//! [`status`].

pub mod buffer;
pub mod checkpoint;
pub mod client;
pub mod codec;
pub mod completion;
pub mod config;
pub mod config_store;
pub mod error;
pub mod reader;
pub mod status;
pub mod testing;
pub mod transport;
pub mod types;

pub use buffer::NativeBuf;
pub use checkpoint::{CheckpointedReader, ReaderState};
pub use client::StrandClient;
pub use codec::{DataRecord, GapKind, GapRecord, LogRecord};
pub use config::{ClientConfig, Compression};
pub use config_store::VersionedConfigStore;
pub use error::{Op, StrandError, StrandResult};
pub use reader::LogReader;
pub use status::{classify, ErrorCategory, Status, STATUS_OK};
pub use transport::{OpToken, ReadSink, Reply, Transport};
pub use types::{ConfigVersion, LogId, Lsn};
