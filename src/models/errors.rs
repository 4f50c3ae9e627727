// Error types for the wallet ledger
use std::fmt;

#[derive(Debug, Clone)]
pub enum LedgerError {
    // Validation errors - rejected before any persistence call
    InvalidAmount(String),
    InvalidPrecision { value: String, expected: u32 },

    // Checked arithmetic failed inside the atomic unit
    BalanceOverflow { user_id: u64 },

    // Strict lookup paths only; absence on get_balance is 0 and
    // absence on rollback is a no-op
    EntryNotFound(u64),
    WalletNotFound(u64),

    // Persistence failure, propagated to the caller
    Store(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            Self::InvalidPrecision { value, expected } => {
                write!(f, "Invalid precision for {}, expected {} decimals", value, expected)
            }
            Self::BalanceOverflow { user_id } => {
                write!(f, "Balance overflow for user {}", user_id)
            }
            Self::EntryNotFound(id) => write!(f, "Transaction {} not found", id),
            Self::WalletNotFound(user_id) => write!(f, "Wallet for user {} not found", user_id),
            Self::Store(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<anyhow::Error> for LedgerError {
    fn from(err: anyhow::Error) -> Self {
        LedgerError::Store(format!("{:#}", err))
    }
}

// Error code mapping for API responses
impl LedgerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidPrecision { .. } => "INVALID_PRECISION",
            Self::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
            Self::EntryNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::WalletNotFound(_) => "WALLET_NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InvalidPrecision { .. }
                | Self::BalanceOverflow { .. }
                | Self::EntryNotFound(_)
                | Self::WalletNotFound(_)
        )
    }
}
