use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use wallet_ledger::models::{LedgerError, TransactionType};
use wallet_ledger::store::{SledStore, WalletStore};
use wallet_ledger::wallet_ledger::WalletLedger;

fn open_ledger(dir: &TempDir) -> WalletLedger<SledStore> {
    WalletLedger::new(Arc::new(SledStore::open(dir.path()).unwrap()))
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let t1 = {
        let ledger = open_ledger(&dir);
        let t1 = ledger.create_transaction(1, 500, TransactionType::Credit, "top-up").unwrap();
        ledger.create_transaction(1, 200, TransactionType::Debit, "purchase").unwrap();
        t1
    };

    // Fresh handle over the same files
    let ledger = open_ledger(&dir);
    assert_eq!(ledger.get_balance(1).unwrap(), 300);

    let entries = ledger.entries(1).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].entry_id, t1.entry_id);
    assert_eq!(entries[0].balance_after, 500);
    assert_eq!(entries[1].balance_after, 300);
}

#[test]
fn test_rollback_marker_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let original = {
        let ledger = open_ledger(&dir);
        let original =
            ledger.create_transaction(2, 100, TransactionType::Credit, "top-up").unwrap();
        ledger.rollback_transaction(original.entry_id).unwrap().unwrap();
        original
    };

    let ledger = open_ledger(&dir);
    assert_eq!(ledger.get_balance(2).unwrap(), 0);

    let marked = ledger.find_entry(original.entry_id).unwrap().unwrap();
    assert!(marked.is_rolled_back());
    assert_eq!(marked.amount, 100);

    // Marker still blocks a second compensation after reopen
    assert!(ledger.rollback_transaction(original.entry_id).unwrap().is_none());
    assert_eq!(ledger.get_balance(2).unwrap(), 0);
}

#[test]
fn test_failed_unit_leaves_no_partial_writes() {
    let dir = TempDir::new().unwrap();
    let store = SledStore::open(dir.path()).unwrap();

    let result: Result<(), _> = store.run_atomic(5, &mut |txn| {
        txn.upsert_wallet(5, 999)?;
        Err(LedgerError::Store("simulated connection loss".to_string()))
    });
    assert!(result.is_err());

    assert!(store.find_wallet(5).unwrap().is_none());
    assert!(store.entries_for_user(5).unwrap().is_empty());
}

#[test]
fn test_concurrent_credits_on_sled() {
    let dir = TempDir::new().unwrap();
    let ledger = Arc::new(open_ledger(&dir));
    let user = 9;
    let threads: i64 = 4;
    let per_thread: i64 = 25;

    let mut handles = vec![];
    for _ in 0..threads {
        let ledger = Arc::clone(&ledger);
        handles.push(thread::spawn(move || {
            for _ in 0..per_thread {
                ledger.create_transaction(user, 10, TransactionType::Credit, "credit").unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(ledger.get_balance(user).unwrap(), 10 * threads * per_thread);
    let entries = ledger.entries(user).unwrap();
    assert_eq!(entries.len(), (threads * per_thread) as usize);

    let mut running = 0;
    for entry in &entries {
        running += entry.signed_delta();
        assert_eq!(entry.balance_after, running);
    }
}

#[test]
fn test_history_order_is_insertion_order() {
    let dir = TempDir::new().unwrap();
    let ledger = open_ledger(&dir);

    for i in 1..=5 {
        ledger.create_transaction(3, i, TransactionType::Credit, "op").unwrap();
    }

    let entries = ledger.entries(3).unwrap();
    let amounts: Vec<i64> = entries.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![1, 2, 3, 4, 5]);
}
