// Read-only wallet endpoints: balance and transaction history
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::api::{ledger_error_response, success_response, WalletData};
use crate::models::api_response::ApiResponse;
use crate::models::{CurrencyConverter, LedgerEntry, TransactionType, UserId};
use crate::store::WalletStore;
use crate::wallet_ledger::WalletLedger;

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub transaction_id: String,
    pub entry_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub balance_after: Decimal,
    pub created_at: i64,
    pub rolled_back: bool,
}

pub struct WalletQuery<S: WalletStore> {
    ledger: Arc<WalletLedger<S>>,
    converter: CurrencyConverter,
}

impl<S: WalletStore> WalletQuery<S> {
    pub fn new(ledger: Arc<WalletLedger<S>>, converter: CurrencyConverter) -> Self {
        Self { ledger, converter }
    }

    fn to_view(&self, entry: &LedgerEntry) -> EntryView {
        EntryView {
            transaction_id: entry.entry_id.to_string(),
            entry_type: entry.entry_type,
            amount: self.converter.to_decimal(entry.amount),
            description: entry.description.clone(),
            balance_after: self.converter.to_decimal(entry.balance_after),
            created_at: entry.created_at,
            rolled_back: entry.is_rolled_back(),
        }
    }

    /// GET /wallet/:user_id/balance
    ///
    /// An absent wallet reads as zero balance, never an error.
    pub async fn get_balance(&self, user_id: UserId) -> ApiResponse<WalletData> {
        match self.ledger.get_balance(user_id) {
            Ok(balance) => success_response(WalletData {
                user_id,
                balance: self.converter.to_decimal(balance),
                currency: self.converter.currency().to_string(),
            }),
            Err(e) => ledger_error_response(&e),
        }
    }

    /// GET /wallet/:user_id/transactions
    pub async fn get_transactions(&self, user_id: UserId) -> ApiResponse<Vec<EntryView>> {
        match self.ledger.entries(user_id) {
            Ok(entries) => {
                success_response(entries.iter().map(|e| self.to_view(e)).collect())
            }
            Err(e) => ledger_error_response(&e),
        }
    }
}
