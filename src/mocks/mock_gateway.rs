/// Mock payment gateway for testing and local runs
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::gateway::{PaymentGateway, PaymentIntent, PaymentStatus};

#[derive(Clone)]
pub struct MockPaymentGateway {
    intents: Arc<Mutex<HashMap<String, PaymentIntent>>>,
    counter: Arc<AtomicU64>,
    /// When set, verification of an unknown payment id succeeds. Lets
    /// the server run against externally-created ids in mock mode;
    /// tests keep it off and mark intents paid explicitly.
    auto_verify: bool,
}

impl MockPaymentGateway {
    pub fn new(auto_verify: bool) -> Self {
        Self {
            intents: Arc::new(Mutex::new(HashMap::new())),
            counter: Arc::new(AtomicU64::new(1)),
            auto_verify,
        }
    }

    /// Mark an intent as paid. Returns false if the id is unknown.
    pub fn mark_paid(&self, payment_id: &str) -> bool {
        let mut intents = self.intents.lock().unwrap();
        match intents.get_mut(payment_id) {
            Some(intent) => {
                intent.status = PaymentStatus::Paid;
                true
            }
            None => false,
        }
    }

    /// Mark an intent as failed. Returns false if the id is unknown.
    pub fn mark_failed(&self, payment_id: &str) -> bool {
        let mut intents = self.intents.lock().unwrap();
        match intents.get_mut(payment_id) {
            Some(intent) => {
                intent.status = PaymentStatus::Failed;
                true
            }
            None => false,
        }
    }

    pub fn intent(&self, payment_id: &str) -> Option<PaymentIntent> {
        self.intents.lock().unwrap().get(payment_id).cloned()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> anyhow::Result<PaymentIntent> {
        let id = format!("pay_{:08}", self.counter.fetch_add(1, Ordering::SeqCst));
        let intent = PaymentIntent {
            id: id.clone(),
            amount,
            currency: currency.to_string(),
            status: PaymentStatus::Created,
        };
        self.intents.lock().unwrap().insert(id, intent.clone());
        Ok(intent)
    }

    async fn verify_payment(&self, payment_id: &str) -> anyhow::Result<bool> {
        let intents = self.intents.lock().unwrap();
        Ok(intents
            .get(payment_id)
            .map(|intent| intent.status == PaymentStatus::Paid)
            .unwrap_or(self.auto_verify))
    }
}
