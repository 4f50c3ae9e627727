//! Wallet ledger core
//!
//! Owns per-user balance state and the append-only transaction log.
//! Every mutation runs as one atomic unit against the store: read
//! balance, compute, upsert wallet, append entry. Two concurrent calls
//! for the same user cannot observe the same stale balance because the
//! store serializes units per user.

use std::sync::Arc;

use log::{info, warn};

use crate::common_utils::get_current_timestamp_ms;
use crate::models::{
    EntryId, LedgerEntry, LedgerError, TransactionType, UserId, Wallet, ROLLBACK_MARKER,
};
use crate::store::WalletStore;

pub struct WalletLedger<S: WalletStore> {
    store: Arc<S>,
}

impl<S: WalletStore> WalletLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Current balance in minor units; 0 for an absent wallet.
    /// Absence is "nothing happened yet", not a fault.
    pub fn get_balance(&self, user_id: UserId) -> Result<i64, LedgerError> {
        Ok(self.store.find_wallet(user_id)?.map(|w| w.balance).unwrap_or(0))
    }

    /// Explicit wallet creation. Idempotent: an existing wallet is
    /// returned untouched.
    pub fn ensure_wallet(&self, user_id: UserId) -> Result<Wallet, LedgerError> {
        self.store.run_atomic(user_id, &mut |txn| match txn.find_wallet(user_id)? {
            Some(wallet) => Ok(wallet),
            None => txn.upsert_wallet(user_id, 0),
        })
    }

    /// Apply one balance mutation and append its ledger entry.
    ///
    /// `amount` is a positive magnitude; the sign comes from
    /// `entry_type`. The primitive performs no debit-sufficiency check,
    /// so the balance may go negative - business rules such as minimum
    /// balance live in callers.
    pub fn create_transaction(
        &self,
        user_id: UserId,
        amount: i64,
        entry_type: TransactionType,
        description: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(format!(
                "amount must be positive, got {}",
                amount
            )));
        }

        let entry_id = EntryId::generate();
        let now = get_current_timestamp_ms();

        let entry = self.store.run_atomic(user_id, &mut |txn| {
            let balance = txn.find_wallet(user_id)?.map(|w| w.balance).unwrap_or(0);

            let new_balance = match entry_type {
                TransactionType::Credit => balance.checked_add(amount),
                TransactionType::Debit => balance.checked_sub(amount),
            }
            .ok_or(LedgerError::BalanceOverflow { user_id })?;

            txn.upsert_wallet(user_id, new_balance)?;

            let entry = LedgerEntry {
                entry_id,
                user_id,
                amount,
                entry_type,
                description: description.to_string(),
                balance_after: new_balance,
                created_at: now,
            };
            txn.insert_entry(entry.clone())?;
            Ok(entry)
        })?;

        info!(
            "ledger: {} {} user={} entry={} balance_after={}",
            entry.entry_type, entry.amount, user_id, entry.entry_id, entry.balance_after
        );
        Ok(entry)
    }

    /// Reverse a committed entry with a compensating entry.
    ///
    /// The reversal applies the opposite type to the *current* balance
    /// - a forward-dated compensating entry, not a point-in-time
    /// revert, so rolling back an old entry after later activity yields
    /// a net-correct balance whose audit trail is not a literal undo.
    ///
    /// Returns `Ok(None)` without touching any balance when the entry
    /// or its wallet is absent, or when the entry was already rolled
    /// back; a reversal can therefore never be applied twice.
    pub fn rollback_transaction(
        &self,
        entry_id: EntryId,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        // Resolve the owning user outside the lock; the authoritative
        // re-read happens inside the unit.
        let user_id = match self.store.find_entry(entry_id)? {
            Some(entry) => entry.user_id,
            None => {
                warn!("rollback: entry {} not found, nothing to do", entry_id);
                return Ok(None);
            }
        };

        let reversal_id = EntryId::generate();
        let now = get_current_timestamp_ms();

        let reversal = self.store.run_atomic(user_id, &mut |txn| {
            let original = match txn.find_entry(entry_id)? {
                Some(entry) => entry,
                None => return Ok(None),
            };
            if original.is_rolled_back() {
                return Ok(None);
            }

            let wallet = match txn.find_wallet(user_id)? {
                Some(wallet) => wallet,
                None => return Ok(None),
            };

            let reverse_type = original.entry_type.reverse();
            let new_balance = match reverse_type {
                TransactionType::Credit => wallet.balance.checked_add(original.amount),
                TransactionType::Debit => wallet.balance.checked_sub(original.amount),
            }
            .ok_or(LedgerError::BalanceOverflow { user_id })?;

            txn.upsert_wallet(user_id, new_balance)?;

            let reversal = LedgerEntry {
                entry_id: reversal_id,
                user_id,
                amount: original.amount,
                entry_type: reverse_type,
                description: LedgerEntry::rollback_description(entry_id),
                balance_after: new_balance,
                created_at: now,
            };
            txn.insert_entry(reversal.clone())?;

            txn.update_entry_description(
                entry_id,
                format!("{}{}", original.description, ROLLBACK_MARKER),
            )?;

            Ok(Some(reversal))
        })?;

        match &reversal {
            Some(entry) => info!(
                "ledger: rolled back entry {} for user {} via {} balance_after={}",
                entry_id, user_id, entry.entry_id, entry.balance_after
            ),
            None => warn!(
                "rollback: entry {} already rolled back or wallet missing, nothing to do",
                entry_id
            ),
        }
        Ok(reversal)
    }

    /// Full entry history for a user, in insertion order.
    pub fn entries(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.store.entries_for_user(user_id)
    }

    /// Lookup of a single entry; `Ok(None)` when absent.
    pub fn find_entry(&self, entry_id: EntryId) -> Result<Option<LedgerEntry>, LedgerError> {
        self.store.find_entry(entry_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn test_ledger() -> WalletLedger<MemoryStore> {
        WalletLedger::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_absent_wallet_is_zero() {
        let ledger = test_ledger();
        assert_eq!(ledger.get_balance(999).unwrap(), 0);
    }

    #[test]
    fn test_ensure_wallet_idempotent() {
        let ledger = test_ledger();

        let first = ledger.ensure_wallet(1).unwrap();
        assert_eq!(first.balance, 0);
        assert_eq!(first.version, 1);

        ledger.create_transaction(1, 100, TransactionType::Credit, "top-up").unwrap();
        let again = ledger.ensure_wallet(1).unwrap();
        assert_eq!(again.balance, 100, "existing wallet must not be reset");
    }

    #[test]
    fn test_validation_rejects_before_persistence() {
        let ledger = test_ledger();

        let err = ledger.create_transaction(1, -5, TransactionType::Credit, "bad").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AMOUNT");

        let err = ledger.create_transaction(1, 0, TransactionType::Debit, "bad").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AMOUNT");

        // No side effects at all
        assert_eq!(ledger.get_balance(1).unwrap(), 0);
        assert!(ledger.entries(1).unwrap().is_empty());
    }

    #[test]
    fn test_debit_may_go_negative() {
        let ledger = test_ledger();

        let entry = ledger.create_transaction(1, 300, TransactionType::Debit, "fee").unwrap();
        assert_eq!(entry.balance_after, -300);
        assert_eq!(ledger.get_balance(1).unwrap(), -300);
    }

    #[test]
    fn test_credit_overflow_aborts_unit() {
        let ledger = test_ledger();

        ledger.create_transaction(1, i64::MAX, TransactionType::Credit, "max").unwrap();
        let err = ledger.create_transaction(1, 1, TransactionType::Credit, "boom").unwrap_err();
        assert_eq!(err.error_code(), "BALANCE_OVERFLOW");

        // Failed unit left nothing behind
        assert_eq!(ledger.get_balance(1).unwrap(), i64::MAX);
        assert_eq!(ledger.entries(1).unwrap().len(), 1);
    }

    #[test]
    fn test_double_rollback_compensates_once() {
        let ledger = test_ledger();

        let entry = ledger.create_transaction(1, 100, TransactionType::Credit, "top-up").unwrap();

        assert!(ledger.rollback_transaction(entry.entry_id).unwrap().is_some());
        assert_eq!(ledger.get_balance(1).unwrap(), 0);

        // Second rollback is a no-op keyed off the audit marker
        assert!(ledger.rollback_transaction(entry.entry_id).unwrap().is_none());
        assert_eq!(ledger.get_balance(1).unwrap(), 0);
        assert_eq!(ledger.entries(1).unwrap().len(), 2);
    }

    #[test]
    fn test_rollback_of_rollback_entry() {
        let ledger = test_ledger();

        let entry = ledger.create_transaction(1, 100, TransactionType::Credit, "top-up").unwrap();
        let reversal = ledger.rollback_transaction(entry.entry_id).unwrap().unwrap();

        // The compensating entry is itself a normal entry and can be
        // reversed, restoring the credit
        let second = ledger.rollback_transaction(reversal.entry_id).unwrap().unwrap();
        assert_eq!(second.entry_type, TransactionType::Credit);
        assert_eq!(ledger.get_balance(1).unwrap(), 100);
    }
}
