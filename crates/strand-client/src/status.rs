//! The closed set of failure codes reported by the native store, and their
//! classification into retry/surface categories.
//!
//! Every native status is classified exactly once at the client boundary;
//! nothing downstream branches on raw integers.

use std::fmt::{self, Display};

/// Wire value reported for a successful operation.
pub const STATUS_OK: u32 = 0;

/// Category a failure code belongs to, driving retry and surfacing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Worth retrying under caller policy; the request itself was fine.
    Transient,
    /// The caller must change the request; retrying verbatim cannot succeed.
    Permanent,
    /// Optimistic-concurrency conflict; the authoritative state accompanies
    /// the failure so the caller can re-read-and-retry without another
    /// round trip.
    Conflict,
    /// Data or process corruption. Must not be retried; surface immediately.
    Fatal,
}

impl ErrorCategory {
    /// Whether a generic retry wrapper may re-issue the operation.
    #[inline]
    pub const fn is_retryable(self) -> bool {
        matches!(self, ErrorCategory::Transient)
    }
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Transient => write!(f, "transient"),
            ErrorCategory::Permanent => write!(f, "permanent"),
            ErrorCategory::Conflict => write!(f, "conflict"),
            ErrorCategory::Fatal => write!(f, "fatal"),
        }
    }
}

macro_rules! status_codes {
    ($( $name:ident = $value:literal => $category:ident, )+) => {
        /// Failure code reported by the native store.
        ///
        /// The set is closed: codes the store may add later arrive as raw
        /// integers that fail [`Status::try_from`] and classify as
        /// [`ErrorCategory::Fatal`] via [`classify`].
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Status {
            $( $name = $value, )+
        }

        impl Status {
            /// Every defined code, in wire order.
            pub const ALL: &'static [Status] = &[ $( Status::$name, )+ ];

            /// Raw wire value of this code.
            #[inline]
            pub const fn as_raw(self) -> u32 {
                self as u32
            }

            /// The category this code belongs to.
            pub const fn category(self) -> ErrorCategory {
                match self {
                    $( Status::$name => ErrorCategory::$category, )+
                }
            }
        }

        impl TryFrom<u32> for Status {
            type Error = u32;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok(Status::$name), )+
                    other => Err(other),
                }
            }
        }
    };
}

status_codes! {
    NotFound = 1 => Permanent,
    Timeout = 2 => Transient,
    NoSequencer = 3 => Transient,
    ConnFailed = 4 => Transient,
    NotConnected = 5 => Transient,
    TooBig = 6 => Permanent,
    TooMany = 7 => Permanent,
    NoSpace = 8 => Transient,
    Overloaded = 9 => Transient,
    Pending = 10 => Transient,
    PendingFull = 11 => Transient,
    Failed = 12 => Fatal,
    SequencerNoBuffers = 13 => Transient,
    WouldBlock = 14 => Transient,
    Aborted = 15 => Permanent,
    InProgress = 16 => Transient,
    Cancelled = 17 => Permanent,
    NotStorage = 18 => Permanent,
    Again = 19 => Transient,
    Partial = 20 => Transient,
    Gap = 21 => Fatal,
    Truncated = 22 => Fatal,
    Stale = 23 => Permanent,
    NoSslConfig = 24 => Permanent,
    ProtoNoSupport = 25 => Permanent,
    ProtocolError = 26 => Fatal,
    PeerClosed = 27 => Transient,
    SequencerSysLimit = 28 => Transient,
    Rebuilding = 29 => Transient,
    Redirected = 30 => Transient,
    RetryNeeded = 31 => Transient,
    BadPayload = 32 => Permanent,
    NoSslContext = 33 => Permanent,
    NotReady = 34 => Transient,
    Dropped = 35 => Transient,
    Forwarded = 36 => Transient,
    NotSupported = 37 => Permanent,
    NotInServerConfig = 38 => Permanent,
    Isolated = 39 => Transient,
    SslRequired = 40 => Permanent,
    CallbackRegistered = 41 => Fatal,
    LowOnSpace = 42 => Transient,
    PeerUnavailable = 43 => Transient,
    NotInConfig = 44 => Permanent,
    NoBuffers = 45 => Transient,
    NothingToDo = 46 => Permanent,
    InvalidParam = 47 => Permanent,
    InvalidCluster = 48 => Permanent,
    AccessDenied = 49 => Permanent,
    AlreadyInProgress = 50 => Permanent,
    IsLog = 51 => Permanent,
    Exists = 52 => Permanent,
    Shutdown = 53 => Permanent,
    Internal = 54 => Fatal,
    NotMaster = 55 => Transient,
    InvalidConfig = 56 => Permanent,
    UpToDate = 57 => Permanent,
    Empty = 58 => Permanent,
    DestinationMismatch = 59 => Permanent,
    InvalidThread = 60 => Fatal,
    Disabled = 61 => Permanent,
    Expired = 62 => Permanent,
    BadMessage = 63 => Fatal,
    Duplicate = 64 => Permanent,
    InvalidAttributes = 65 => Permanent,
    NotEmpty = 66 => Permanent,
    NotDirty = 67 => Permanent,
    WriteStreamUnknown = 68 => Permanent,
    WriteStreamBroken = 69 => Permanent,
    WriteStreamIgnored = 70 => Permanent,
    VersionMismatch = 71 => Conflict,
    ConditionMismatch = 72 => Conflict,
    SourceStateMismatch = 73 => Conflict,
    MaintenanceClash = 74 => Conflict,
    ChecksumMismatch = 75 => Fatal,
    DataLoss = 76 => Fatal,
    MalformedRecord = 77 => Fatal,
    LogsSectionMissing = 78 => Permanent,
    MetadataMissing = 79 => Permanent,
    MetadataMalformed = 80 => Fatal,
    EpochNotReady = 81 => Transient,
    EpochInvalid = 82 => Permanent,
    SequencerActivation = 83 => Transient,
    SequencerMigration = 84 => Transient,
    AppendRateLimited = 85 => Transient,
    ReadRateLimited = 86 => Transient,
    LogRemoved = 87 => Permanent,
    TrimLimitExceeded = 88 => Permanent,
    SnapshotInProgress = 89 => Transient,
    SnapshotFailed = 90 => Fatal,
    RecoveryInProgress = 91 => Transient,
    RecoveryFailed = 92 => Fatal,
    StorageDegraded = 93 => Transient,
    StorageFailed = 94 => Fatal,
    ShardUnavailable = 95 => Transient,
    ShardMissing = 96 => Permanent,
    ReplicationFailed = 97 => Transient,
    QuorumLost = 98 => Transient,
    LeaderChanged = 99 => Transient,
    SessionExpired = 100 => Permanent,
    SessionInvalid = 101 => Permanent,
    TokenExpired = 102 => Permanent,
    TokenInvalid = 103 => Permanent,
    TlsHandshakeFailed = 104 => Transient,
    HostUnreachable = 105 => Transient,
    HostMisconfigured = 106 => Permanent,
    ClientShutdown = 107 => Permanent,
    BufferExhausted = 108 => Transient,
    QueueFull = 109 => Transient,
    BacklogExceeded = 110 => Permanent,
    ThrottledSequencer = 111 => Transient,
    CompactionInProgress = 112 => Transient,
    MaintenanceInProgress = 113 => Transient,
    SystemLimit = 114 => Permanent,
    NoMemory = 115 => Fatal,
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Classify a raw wire status into a category.
///
/// Total over the full `u32` range: defined codes use their assigned
/// category, anything unrecognized is treated as [`ErrorCategory::Fatal`].
pub fn classify(raw: u32) -> ErrorCategory {
    match Status::try_from(raw) {
        Ok(status) => status.category(),
        Err(_) => ErrorCategory::Fatal,
    }
}
