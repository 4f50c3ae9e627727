pub mod api;
pub mod common_utils;
pub mod configure;
pub mod gateway;
pub mod logger;
pub mod mocks;
pub mod models;
pub mod store;
pub mod wallet_ledger;
