pub mod api_response;
pub mod errors;
pub mod money;
pub mod wallet;

pub use errors::LedgerError;
pub use money::CurrencyConverter;
pub use wallet::{EntryId, LedgerEntry, TransactionType, UserId, Wallet, ROLLBACK_MARKER};
