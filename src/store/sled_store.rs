//! Sled-backed wallet store
//!
//! Process-local durable storage. One tree, prefixed keys:
//!
//! - `w/<user_be>`          -> bincode Wallet
//! - `e/<entry_be>`         -> bincode LedgerEntry
//! - `u/<user_be><entry_be>`-> () index, per-user insertion order
//!
//! Entry ids are time-sorted, so big-endian index keys iterate in
//! insertion order. Atomicity comes from staging every write of a unit
//! into one `sled::Batch`; serialization per user comes from the same
//! lock registry the in-memory store uses.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::common_utils::get_current_timestamp_ms;
use crate::models::{EntryId, LedgerEntry, LedgerError, UserId, Wallet};
use crate::store::{WalletStore, WalletTxn};

fn wallet_key(user_id: UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(b'w');
    key.extend_from_slice(&user_id.to_be_bytes());
    key
}

fn entry_key(entry_id: EntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(b'e');
    key.extend_from_slice(&entry_id.as_u64().to_be_bytes());
    key
}

fn index_key(user_id: UserId, entry_id: EntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.push(b'u');
    key.extend_from_slice(&user_id.to_be_bytes());
    key.extend_from_slice(&entry_id.as_u64().to_be_bytes());
    key
}

fn index_prefix(user_id: UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(b'u');
    key.extend_from_slice(&user_id.to_be_bytes());
    key
}

fn store_err(ctx: &str, e: impl Display) -> LedgerError {
    LedgerError::Store(format!("{}: {}", ctx, e))
}

pub struct SledStore {
    db: sled::Db,
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let db = sled::open(path).map_err(|e| store_err("Failed to open sled db", e))?;
        Ok(Self { db, user_locks: Mutex::new(HashMap::new()) })
    }

    fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().unwrap();
        locks.entry(user_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    fn get_wallet(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        match self.db.get(wallet_key(user_id)).map_err(|e| store_err("Failed to read wallet", e))? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| store_err("Corrupt wallet record", e)),
            None => Ok(None),
        }
    }

    fn get_entry(&self, entry_id: EntryId) -> Result<Option<LedgerEntry>, LedgerError> {
        match self.db.get(entry_key(entry_id)).map_err(|e| store_err("Failed to read entry", e))? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| store_err("Corrupt entry record", e)),
            None => Ok(None),
        }
    }
}

struct SledTxn<'a> {
    store: &'a SledStore,
    staged_wallet: Option<Wallet>,
    staged_entries: Vec<LedgerEntry>,
    staged_descriptions: Vec<(EntryId, String)>,
}

impl<'a> SledTxn<'a> {
    fn new(store: &'a SledStore) -> Self {
        Self {
            store,
            staged_wallet: None,
            staged_entries: Vec::new(),
            staged_descriptions: Vec::new(),
        }
    }

    fn commit(mut self) -> Result<(), LedgerError> {
        let mut batch = sled::Batch::default();

        // Description updates may target an entry staged in this unit
        for (entry_id, description) in std::mem::take(&mut self.staged_descriptions) {
            if let Some(entry) = self.staged_entries.iter_mut().find(|e| e.entry_id == entry_id) {
                entry.description = description;
                continue;
            }
            let mut entry = self
                .store
                .get_entry(entry_id)?
                .ok_or(LedgerError::EntryNotFound(entry_id.as_u64()))?;
            entry.description = description;
            let bytes = bincode::serialize(&entry)
                .map_err(|e| store_err("Failed to encode entry", e))?;
            batch.insert(entry_key(entry_id), bytes);
        }

        if let Some(wallet) = &self.staged_wallet {
            let bytes = bincode::serialize(wallet)
                .map_err(|e| store_err("Failed to encode wallet", e))?;
            batch.insert(wallet_key(wallet.user_id), bytes);
        }

        for entry in &self.staged_entries {
            let bytes =
                bincode::serialize(entry).map_err(|e| store_err("Failed to encode entry", e))?;
            batch.insert(entry_key(entry.entry_id), bytes);
            batch.insert(index_key(entry.user_id, entry.entry_id), &[][..]);
        }

        self.store
            .db
            .apply_batch(batch)
            .map_err(|e| store_err("Failed to commit batch", e))?;
        self.store.db.flush().map_err(|e| store_err("Failed to flush", e))?;
        Ok(())
    }
}

impl WalletTxn for SledTxn<'_> {
    fn find_wallet(&mut self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        if let Some(wallet) = &self.staged_wallet {
            if wallet.user_id == user_id {
                return Ok(Some(wallet.clone()));
            }
        }
        self.store.get_wallet(user_id)
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
        let mut found = match self.staged_entries.iter().find(|e| e.entry_id == entry_id) {
            Some(e) => Some(e.clone()),
            None => self.store.get_entry(entry_id)?,
        };

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

impl WalletStore for SledStore {
    fn find_wallet(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        self.get_wallet(user_id)
    }

    fn find_entry(&self, entry_id: EntryId) -> Result<Option<LedgerEntry>, LedgerError> {
        self.get_entry(entry_id)
    }

    fn entries_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut entries = Vec::new();
        for item in self.db.scan_prefix(index_prefix(user_id)) {
            let (key, _) = item.map_err(|e| store_err("Failed to scan entry index", e))?;
            let id_bytes: [u8; 8] = key[key.len() - 8..]
                .try_into()
                .map_err(|_| LedgerError::Store("Malformed index key".to_string()))?;
            let entry_id = EntryId::new(u64::from_be_bytes(id_bytes));
            if let Some(entry) = self.get_entry(entry_id)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn run_atomic<T>(
        &self,
        user_id: UserId,
        f: &mut dyn FnMut(&mut dyn WalletTxn) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let mut txn = SledTxn::new(self);
        match f(&mut txn) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(e) => Err(e),
        }
    }
}
