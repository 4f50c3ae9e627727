// Payment orchestration: gateway verification then ledger mutation
//
// Flow for confirm:
// 1. Validate amount at the decimal boundary
// 2. Verify the payment with the gateway
// 3. Only on a true result, credit the wallet
// 4. Return the new balance
//
// The ledger is never invoked for an unverified payment.

use std::sync::Arc;

use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::{error_codes, error_response, ledger_error_response, success_response};
use crate::gateway::PaymentGateway;
use crate::models::api_response::ApiResponse;
use crate::models::{CurrencyConverter, EntryId, LedgerError, TransactionType, UserId};
use crate::store::WalletStore;
use crate::wallet_ledger::WalletLedger;

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_id: String,
    pub user_id: UserId,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RollbackRequest {
    pub transaction_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub user_id: UserId,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateWalletRequest {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct PaymentConfirmData {
    pub status: String,
    pub transaction_id: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct RollbackData {
    pub status: String,
    /// Whether a compensating entry was written; false when the
    /// original transaction was absent or already rolled back
    pub compensated: bool,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WalletData {
    pub user_id: UserId,
    pub balance: Decimal,
    pub currency: String,
}

pub struct PaymentHandler<S: WalletStore> {
    ledger: Arc<WalletLedger<S>>,
    gateway: Arc<dyn PaymentGateway>,
    converter: CurrencyConverter,
}

impl<S: WalletStore> PaymentHandler<S> {
    pub fn new(
        ledger: Arc<WalletLedger<S>>,
        gateway: Arc<dyn PaymentGateway>,
        converter: CurrencyConverter,
    ) -> Self {
        Self { ledger, gateway, converter }
    }

    fn validate_amount(&self, amount: Decimal) -> Result<i64, LedgerError> {
        let minor = self.converter.to_minor_units(amount)?;
        if minor <= 0 {
            return Err(LedgerError::InvalidAmount(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        Ok(minor)
    }

    /// POST /payments/confirm
    pub async fn handle_confirm(
        &self,
        req: ConfirmPaymentRequest,
    ) -> ApiResponse<PaymentConfirmData> {
        let minor = match self.validate_amount(req.amount) {
            Ok(v) => v,
            Err(e) => return ledger_error_response(&e),
        };

        let verified = match self.gateway.verify_payment(&req.payment_id).await {
            Ok(v) => v,
            Err(e) => {
                return error_response(
                    error_codes::GATEWAY_ERROR,
                    format!("Payment verification failed: {}", e),
                );
            }
        };

        if !verified {
            warn!("payment {} not verified, wallet untouched", req.payment_id);
            return error_response(
                error_codes::PAYMENT_NOT_VERIFIED,
                format!("Payment {} was not verified by the gateway", req.payment_id),
            );
        }

        let description = format!("Payment {} confirmed", req.payment_id);
        match self.ledger.create_transaction(
            req.user_id,
            minor,
            TransactionType::Credit,
            &description,
        ) {
            Ok(entry) => success_response(PaymentConfirmData {
                status: "success".to_string(),
                transaction_id: entry.entry_id.to_string(),
                balance: self.converter.to_decimal(entry.balance_after),
            }),
            Err(e) => ledger_error_response(&e),
        }
    }

    /// POST /payments/rollback
    pub async fn handle_rollback(&self, req: RollbackRequest) -> ApiResponse<RollbackData> {
        let entry_id = match EntryId::from_str(&req.transaction_id) {
            Ok(id) => id,
            Err(e) => return error_response(error_codes::INVALID_REQUEST, e),
        };

        match self.ledger.rollback_transaction(entry_id) {
            Ok(Some(reversal)) => success_response(RollbackData {
                status: "rollback_success".to_string(),
                compensated: true,
                transaction_id: Some(reversal.entry_id.to_string()),
            }),
            // Absent or already rolled back: the no-op is still a
            // success at the HTTP boundary
            Ok(None) => success_response(RollbackData {
                status: "rollback_success".to_string(),
                compensated: false,
                transaction_id: None,
            }),
            Err(e) => ledger_error_response(&e),
        }
    }

    /// POST /payments/withdraw
    ///
    /// The sufficiency check lives here, not in the ledger primitive.
    /// Concurrent withdrawals may still drive the balance negative;
    /// that is the documented trade-off of keeping business rules out
    /// of the core.
    pub async fn handle_withdraw(&self, req: WithdrawRequest) -> ApiResponse<PaymentConfirmData> {
        let minor = match self.validate_amount(req.amount) {
            Ok(v) => v,
            Err(e) => return ledger_error_response(&e),
        };

        let balance = match self.ledger.get_balance(req.user_id) {
            Ok(b) => b,
            Err(e) => return ledger_error_response(&e),
        };
        if balance < minor {
            return error_response(
                error_codes::INSUFFICIENT_BALANCE,
                format!(
                    "Insufficient balance: have {}, need {}",
                    self.converter.to_decimal(balance),
                    req.amount
                ),
            );
        }

        match self.ledger.create_transaction(
            req.user_id,
            minor,
            TransactionType::Debit,
            "Withdrawal",
        ) {
            Ok(entry) => success_response(PaymentConfirmData {
                status: "success".to_string(),
                transaction_id: entry.entry_id.to_string(),
                balance: self.converter.to_decimal(entry.balance_after),
            }),
            Err(e) => ledger_error_response(&e),
        }
    }

    /// POST /wallet/create
    pub async fn handle_create_wallet(&self, req: CreateWalletRequest) -> ApiResponse<WalletData> {
        match self.ledger.ensure_wallet(req.user_id) {
            Ok(wallet) => success_response(WalletData {
                user_id: wallet.user_id,
                balance: self.converter.to_decimal(wallet.balance),
                currency: self.converter.currency().to_string(),
            }),
            Err(e) => ledger_error_response(&e),
        }
    }
}
