//! Persistence layer for the wallet ledger
//!
//! The ledger core is written against `WalletStore`, never a concrete
//! database. Each balance mutation runs inside `run_atomic`, which
//! gives the closure exclusive access to one user's wallet row and
//! commits all writes together or none - the row-lock analog of
//! `SELECT ... FOR UPDATE` in the SQL rendition of this system.

pub mod memory;
pub mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use crate::models::{EntryId, LedgerEntry, LedgerError, UserId, Wallet};

/// Operations available inside an atomic unit of work.
///
/// Writes are staged: nothing becomes visible to other callers until
/// the closure passed to `run_atomic` returns Ok.
pub trait WalletTxn {
    fn find_wallet(&mut self, user_id: UserId) -> Result<Option<Wallet>, LedgerError>;

    /// Create the wallet row if absent, otherwise update its balance.
    /// Bumps the version counter either way.
    fn upsert_wallet(&mut self, user_id: UserId, balance: i64) -> Result<Wallet, LedgerError>;

    fn insert_entry(&mut self, entry: LedgerEntry) -> Result<(), LedgerError>;

    fn find_entry(&mut self, entry_id: EntryId) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Replace an entry's description. The only legal mutation of a
    /// committed entry; monetary fields stay frozen.
    fn update_entry_description(
        &mut self,
        entry_id: EntryId,
        description: String,
    ) -> Result<(), LedgerError>;
}

pub trait WalletStore: Send + Sync {
    fn find_wallet(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError>;

    fn find_entry(&self, entry_id: EntryId) -> Result<Option<LedgerEntry>, LedgerError>;

    /// All entries for a user in insertion order
    fn entries_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Execute `f` with exclusive access to `user_id`'s wallet row.
    ///
    /// Concurrent calls for the same user serialize; different users
    /// proceed in parallel. If `f` returns Err, no staged write is
    /// visible afterwards.
    fn run_atomic<T>(
        &self,
        user_id: UserId,
        f: &mut dyn FnMut(&mut dyn WalletTxn) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError>;
}
