use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::OsRng;
use rand::Rng;
use std::fmt::{Debug, Display};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Random value generated once per process, bytes 4..9 of every id.
static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(|| {
    let mut bytes = [0u8; 5];
    OsRng.fill(&mut bytes);
    log::debug!("Initialized object id process value");
    bytes
});

static COUNTER: LazyLock<AtomicU32> =
    LazyLock::new(|| AtomicU32::new(OsRng.gen_range(0..=COUNTER_MASK)));

/// A 12-byte unique identifier for stored documents.
///
/// Layout, all fields big-endian:
///
/// | bytes | content                                  |
/// |-------|------------------------------------------|
/// | 0..4  | seconds since the Unix epoch             |
/// | 4..9  | random value, fixed for the process      |
/// | 9..12 | counter, seeded randomly, wraps at 2^24  |
///
/// Ids generated by one process are therefore unique and ordered by creation
/// time at second granularity. The textual form is 24 lowercase hex characters.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::common::ObjectId;
///
/// let id = ObjectId::new();
/// let parsed: ObjectId = id.to_hex().parse()?;
/// assert_eq!(id, parsed);
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
pub struct ObjectId {
    bytes: [u8; 12],
}

impl ObjectId {
    /// Generates a new unique `ObjectId` stamped with the current time.
    pub fn new() -> Self {
        let timestamp = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        ObjectId::with_timestamp(timestamp)
    }

    fn with_timestamp(timestamp: u32) -> Self {
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        ObjectId { bytes }
    }

    /// Creates an `ObjectId` from its raw bytes.
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        ObjectId { bytes }
    }

    /// Parses an `ObjectId` from its 24 character hex representation.
    pub fn parse_str(hex: &str) -> DocStoreResult<ObjectId> {
        if hex.len() != 24 || !hex.is_ascii() {
            log::error!("Invalid object id length {} for '{}'", hex.len(), hex);
            return Err(DocStoreError::new(
                &format!("Invalid object id '{}': expected 24 hex characters", hex),
                ErrorKind::EncodingError,
            ));
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &hex[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| {
                log::error!("Invalid hex digits '{}' in object id '{}'", pair, hex);
                DocStoreError::new(
                    &format!("Invalid object id '{}': non hex characters", hex),
                    ErrorKind::EncodingError,
                )
            })?;
        }
        Ok(ObjectId { bytes })
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.bytes
    }

    /// Gets the creation time embedded in this id.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let mut seconds = [0u8; 4];
        seconds.copy_from_slice(&self.bytes[0..4]);
        let seconds = u32::from_be_bytes(seconds) as i64;
        Utc.timestamp_opt(seconds, 0)
            .single()
            .unwrap_or_default()
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

impl FromStr for ObjectId {
    type Err = DocStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId(\"{}\")", self.to_hex())
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl serde::Serialize for ObjectId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$oid", &self.to_hex())?;
        map.end()
    }
}
