pub mod payment_handler;
pub mod wallet_query;

pub use payment_handler::*;
pub use wallet_query::*;

use crate::models::api_response::ApiResponse;
use crate::models::LedgerError;

pub mod error_codes {
    pub const INVALID_AMOUNT: &str = "INVALID_AMOUNT";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const PAYMENT_NOT_VERIFIED: &str = "PAYMENT_NOT_VERIFIED";
    pub const INSUFFICIENT_BALANCE: &str = "INSUFFICIENT_BALANCE";
    pub const GATEWAY_ERROR: &str = "GATEWAY_ERROR";
    pub const STORE_ERROR: &str = "STORE_ERROR";
}

pub fn success_response<T>(data: T) -> ApiResponse<T> {
    ApiResponse::success(data)
}

pub fn error_response<T>(code: &str, msg: impl Into<String>) -> ApiResponse<T> {
    ApiResponse::error(code, msg)
}

/// Map a ledger error onto the response envelope, keeping its code
pub fn ledger_error_response<T>(err: &LedgerError) -> ApiResponse<T> {
    ApiResponse::error(err.error_code(), err.to_string())
}

/// Whether a response code denotes a server-side failure (5xx)
pub fn is_server_error(code: &str) -> bool {
    matches!(code, error_codes::STORE_ERROR | error_codes::GATEWAY_ERROR)
}
