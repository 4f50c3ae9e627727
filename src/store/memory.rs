//! In-memory wallet store
//!
//! Used by tests and simulations. Writes inside an atomic unit go to a
//! copy-on-write staging buffer and are applied to the shared maps only
//! when the closure succeeds, so a failed unit leaves no trace.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::common_utils::get_current_timestamp_ms;
use crate::models::{EntryId, LedgerEntry, LedgerError, UserId, Wallet};
use crate::store::{WalletStore, WalletTxn};

#[derive(Default)]
pub struct MemoryStore {
    wallets: RwLock<HashMap<UserId, Wallet>>,
    entries: RwLock<HashMap<u64, LedgerEntry>>,
    user_entries: RwLock<HashMap<UserId, Vec<EntryId>>>,
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().unwrap();
        locks.entry(user_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

struct MemTxn<'a> {
    store: &'a MemoryStore,
    staged_wallet: Option<Wallet>,
    staged_entries: Vec<LedgerEntry>,
    staged_descriptions: Vec<(EntryId, String)>,
}

impl<'a> MemTxn<'a> {
    fn new(store: &'a MemoryStore) -> Self {
        Self {
            store,
            staged_wallet: None,
            staged_entries: Vec::new(),
            staged_descriptions: Vec::new(),
        }
    }

    fn commit(self) {
        if let Some(wallet) = self.staged_wallet {
            self.store.wallets.write().unwrap().insert(wallet.user_id, wallet);
        }

        if !self.staged_entries.is_empty() {
            let mut entries = self.store.entries.write().unwrap();
            let mut user_entries = self.store.user_entries.write().unwrap();
            for entry in self.staged_entries {
                user_entries.entry(entry.user_id).or_default().push(entry.entry_id);
                entries.insert(entry.entry_id.as_u64(), entry);
            }
        }

        if !self.staged_descriptions.is_empty() {
            let mut entries = self.store.entries.write().unwrap();
            for (entry_id, description) in self.staged_descriptions {
                if let Some(entry) = entries.get_mut(&entry_id.as_u64()) {
                    entry.description = description;
                }
            }
        }
    }
}

impl WalletTxn for MemTxn<'_> {
    fn find_wallet(&mut self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        if let Some(wallet) = &self.staged_wallet {
            if wallet.user_id == user_id {
                return Ok(Some(wallet.clone()));
            }
        }
        Ok(self.store.wallets.read().unwrap().get(&user_id).cloned())
    }

    fn upsert_wallet(&mut self, user_id: UserId, balance: i64) -> Result<Wallet, LedgerError> {
        let now = get_current_timestamp_ms();
        let prior = self.find_wallet(user_id)?;

        let wallet = match prior {
            Some(w) => Wallet { balance, version: w.version + 1, updated_at: now, ..w },
            None => Wallet { user_id, balance, version: 1, created_at: now, updated_at: now },
        };

        self.staged_wallet = Some(wallet.clone());
        Ok(wallet)
    }

    fn insert_entry(&mut self, entry: LedgerEntry) -> Result<(), LedgerError> {
        self.staged_entries.push(entry);
        Ok(())
    }

    fn find_entry(&mut self, entry_id: EntryId) -> Result<Option<LedgerEntry>, LedgerError> {
        let mut found = self
            .staged_entries
            .iter()
            .find(|e| e.entry_id == entry_id)
            .cloned()
            .or_else(|| self.store.entries.read().unwrap().get(&entry_id.as_u64()).cloned());

        // Overlay a staged description update, if any
        if let Some(entry) = &mut found {
            if let Some((_, desc)) =
                self.staged_descriptions.iter().rev().find(|(id, _)| *id == entry_id)
            {
                entry.description = desc.clone();
            }
        }

        Ok(found)
    }

    fn update_entry_description(
        &mut self,
        entry_id: EntryId,
        description: String,
    ) -> Result<(), LedgerError> {
        self.staged_descriptions.push((entry_id, description));
        Ok(())
    }
}

impl WalletStore for MemoryStore {
    fn find_wallet(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        Ok(self.wallets.read().unwrap().get(&user_id).cloned())
    }

    fn find_entry(&self, entry_id: EntryId) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self.entries.read().unwrap().get(&entry_id.as_u64()).cloned())
    }

    fn entries_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let entries = self.entries.read().unwrap();
        let ids = self.user_entries.read().unwrap();
        Ok(ids
            .get(&user_id)
            .map(|ids| ids.iter().filter_map(|id| entries.get(&id.as_u64()).cloned()).collect())
            .unwrap_or_default())
    }

    fn run_atomic<T>(
        &self,
        user_id: UserId,
        f: &mut dyn FnMut(&mut dyn WalletTxn) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let mut txn = MemTxn::new(self);
        match f(&mut txn) {
            Ok(value) => {
                txn.commit();
                Ok(value)
            }
            // Staged writes are dropped with the txn
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;

    fn entry(user_id: UserId, amount: i64, balance_after: i64) -> LedgerEntry {
        LedgerEntry {
            entry_id: EntryId::generate(),
            user_id,
            amount,
            entry_type: TransactionType::Credit,
            description: "test".to_string(),
            balance_after,
            created_at: get_current_timestamp_ms(),
        }
    }

    #[test]
    fn test_commit_makes_writes_visible() {
        let store = MemoryStore::new();

        store
            .run_atomic(1, &mut |txn| {
                txn.upsert_wallet(1, 100)?;
                txn.insert_entry(entry(1, 100, 100))?;
                Ok(())
            })
            .unwrap();

        assert_eq!(store.find_wallet(1).unwrap().unwrap().balance, 100);
        assert_eq!(store.entries_for_user(1).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_unit_leaves_no_trace() {
        let store = MemoryStore::new();

        let result: Result<(), _> = store.run_atomic(1, &mut |txn| {
            txn.upsert_wallet(1, 100)?;
            txn.insert_entry(entry(1, 100, 100))?;
            Err(LedgerError::Store("simulated failure".to_string()))
        });

        assert!(result.is_err());
        assert!(store.find_wallet(1).unwrap().is_none());
        assert!(store.entries_for_user(1).unwrap().is_empty());
    }

    #[test]
    fn test_txn_reads_see_staged_writes() {
        let store = MemoryStore::new();

        store
            .run_atomic(7, &mut |txn| {
                txn.upsert_wallet(7, 50)?;
                // The staged row is visible within the unit
                assert_eq!(txn.find_wallet(7)?.unwrap().balance, 50);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_version_increments() {
        let store = MemoryStore::new();

        store.run_atomic(3, &mut |txn| txn.upsert_wallet(3, 10).map(|_| ())).unwrap();
        store.run_atomic(3, &mut |txn| txn.upsert_wallet(3, 20).map(|_| ())).unwrap();

        let wallet = store.find_wallet(3).unwrap().unwrap();
        assert_eq!(wallet.balance, 20);
        assert_eq!(wallet.version, 2);
    }
}
