//! Payment gateway contract
//!
//! The gateway (Razorpay-like) is an external collaborator. The ledger
//! never talks to it; the payment handler verifies an intent here and
//! only credits the wallet on a true result. Retry policy, webhooks and
//! signature internals stay behind the implementation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
}

/// External payment intent as the gateway reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for the given amount
    async fn create_payment(&self, amount: Decimal, currency: &str)
        -> anyhow::Result<PaymentIntent>;

    /// Whether the payment completed on the gateway side
    async fn verify_payment(&self, payment_id: &str) -> anyhow::Result<bool>;
}
