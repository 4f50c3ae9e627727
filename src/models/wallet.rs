//! Core ledger types
//!
//! A `Wallet` is the per-user running balance; a `LedgerEntry` is one
//! immutable balance mutation. The wallet balance is always the sum of
//! signed entry deltas, and each entry snapshots the balance after it
//! was applied.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub type UserId = u64;

/// Audit marker appended to a rolled-back entry's description.
/// The entry's monetary fields are never touched; only a compensating
/// entry changes the balance.
pub const ROLLBACK_MARKER: &str = " [ROLLED BACK]";

/// Entry ID - a 64-bit snowflake-style ID for ledger entries
///
/// Structure (u64):
/// - 44 bits: Timestamp (milliseconds since epoch)
/// - 20 bits: Sequence (per-process counter)
///
/// Time-sortable, so insertion order and ID order agree within a
/// process. Serialized as a string in JSON to stay safe for consumers
/// that truncate u64 to a double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

impl EntryId {
    /// Create an EntryId from a raw u64
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Generate a fresh, unique EntryId
    pub fn generate() -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64;

        let seq = SEQUENCE.fetch_add(1, Ordering::SeqCst) % (1 << 20);

        Self((timestamp_ms << 20) | seq)
    }

    /// Get the raw u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Timestamp component (milliseconds since epoch)
    pub fn timestamp_ms(&self) -> u64 {
        self.0 >> 20
    }

    /// Parse from a decimal string
    pub fn from_str(s: &str) -> Result<Self, String> {
        s.parse::<u64>().map(Self).map_err(|e| format!("Invalid EntryId: {}", e))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for EntryId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u64>().map(EntryId).map_err(serde::de::Error::custom)
    }
}

/// Direction of a balance mutation
///
/// The amount on an entry is always a positive magnitude; the sign is
/// carried here, not by the number.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    /// The compensating direction (credit <-> debit)
    pub fn reverse(self) -> Self {
        match self {
            TransactionType::Credit => TransactionType::Debit,
            TransactionType::Debit => TransactionType::Credit,
        }
    }
}

/// Per-user balance row
///
/// Balance is in minor units (e.g. paise) and signed: the ledger
/// primitive does not enforce a floor, sufficiency checks belong to
/// callers. `version` increments on every committed mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: UserId,
    pub balance: i64,
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One immutable balance mutation
///
/// Monetary fields never change after insert. The single permitted
/// in-place update is appending `ROLLBACK_MARKER` to `description`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub user_id: UserId,
    /// Positive magnitude in minor units
    pub amount: i64,
    pub entry_type: TransactionType,
    pub description: String,
    /// Wallet balance immediately after this entry was applied
    pub balance_after: i64,
    /// Creation timestamp (ms)
    pub created_at: i64,
}

impl LedgerEntry {
    /// Signed delta this entry contributed to the balance
    pub fn signed_delta(&self) -> i64 {
        match self.entry_type {
            TransactionType::Credit => self.amount,
            TransactionType::Debit => -self.amount,
        }
    }

    /// Whether this entry already carries the rollback audit marker
    pub fn is_rolled_back(&self) -> bool {
        self.description.ends_with(ROLLBACK_MARKER)
    }

    /// Description used for the compensating entry of `original`
    pub fn rollback_description(original: EntryId) -> String {
        format!("Rollback of {}", original)
    }
}
