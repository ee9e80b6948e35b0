//! Value types shared across the client: log identifiers, sequence numbers,
//! and config store versions.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::error::{StrandError, StrandResult};

/// Identifier for a named log ("topic") in the store.
///
/// The full 64-bit space is partitioned: `[MIN_USER, MAX_USER]` is available
/// to callers, the remainder is reserved for internal logs, and two sentinel
/// values denote "no log". [`LogId::new`] enforces the user range so that an
/// out-of-range id is rejected before any native call is issued.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LogId(u64);

impl LogId {
    /// Sentinel meaning "no log".
    pub const INVALID: LogId = LogId(0);
    /// Alternate sentinel meaning "no log" (all bits set).
    pub const INVALID_ALT: LogId = LogId(u64::MAX);
    /// Smallest id available to callers.
    pub const MIN_USER: u64 = 1;
    /// Largest id available to callers; ids above are reserved.
    pub const MAX_USER: u64 = (1 << 62) - 1;

    /// Construct a validated user-range log id.
    pub fn new(raw: u64) -> StrandResult<Self> {
        if (Self::MIN_USER..=Self::MAX_USER).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(StrandError::InvalidLogId(raw))
        }
    }

    /// Construct without range validation. Reserved for decoding values that
    /// originated on the server side.
    #[inline]
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether the id falls in the caller-visible range.
    #[inline]
    pub const fn is_user_range(self) -> bool {
        self.0 >= Self::MIN_USER && self.0 <= Self::MAX_USER
    }
}

impl Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<LogId> for u64 {
    #[inline]
    fn from(value: LogId) -> Self {
        value.0
    }
}

/// Log sequence number: the position of a record within a single log's
/// total order.
///
/// Sequence numbers returned by successive appends through one client handle
/// are strictly increasing; a reader's last delivered LSN is non-decreasing
/// across a session.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Lsn(pub u64);

impl Lsn {
    /// Sentinel meaning "no position".
    pub const INVALID: Lsn = Lsn(0);
    /// The minimum readable position of any log.
    pub const OLDEST: Lsn = Lsn(1);
    /// Upper bound, used as "read to end".
    pub const MAX: Lsn = Lsn(u64::MAX);

    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The position after this one. Saturates at [`Lsn::MAX`].
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The position before this one, if any.
    #[inline]
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<u64> for Lsn {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Lsn> for u64 {
    #[inline]
    fn from(value: Lsn) -> Self {
        value.0
    }
}

/// Revision counter for a value in the versioned config store.
///
/// [`ConfigVersion::EMPTY`] denotes "does not yet exist" and is the expected
/// version for a first write.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConfigVersion(pub u64);

impl ConfigVersion {
    /// Version of a key that has never been written.
    pub const EMPTY: ConfigVersion = ConfigVersion(0);

    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<u64> for ConfigVersion {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ConfigVersion> for u64 {
    #[inline]
    fn from(value: ConfigVersion) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_id_range_is_enforced() {
        assert!(LogId::new(1).is_ok());
        assert!(LogId::new(LogId::MAX_USER).is_ok());
        assert!(LogId::new(0).is_err());
        assert!(LogId::new(LogId::MAX_USER + 1).is_err());
        assert!(LogId::new(u64::MAX).is_err());
    }

    #[test]
    fn sentinels_are_outside_user_range() {
        assert!(!LogId::INVALID.is_user_range());
        assert!(!LogId::INVALID_ALT.is_user_range());
    }

    #[test]
    fn lsn_ordering_and_navigation() {
        assert!(Lsn::INVALID < Lsn::OLDEST);
        assert!(Lsn::OLDEST < Lsn::MAX);
        assert_eq!(Lsn::new(41).next(), Lsn::new(42));
        assert_eq!(Lsn::new(42).prev(), Some(Lsn::new(41)));
        assert_eq!(Lsn::INVALID.prev(), None);
        assert_eq!(Lsn::MAX.next(), Lsn::MAX);
    }

    #[test]
    fn config_version_empty() {
        assert!(ConfigVersion::EMPTY.is_empty());
        assert!(!ConfigVersion::new(1).is_empty());
        assert!(ConfigVersion::EMPTY < ConfigVersion::new(1));
    }
}
