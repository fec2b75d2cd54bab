use std::collections::HashMap;

use async_trait::async_trait;
use cartwheel_core::{NewPaymentTransaction, PaymentTransaction};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::PaymentLedger;

#[derive(Debug, Default)]
struct Ledger {
    last_seq: i64,
    transactions: HashMap<String, PaymentTransaction>,
}

/// In-memory payment ledger.
#[derive(Debug, Default)]
pub struct MemoryPaymentLedger {
    inner: RwLock<Ledger>,
}

impl MemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentLedger for MemoryPaymentLedger {
    async fn record(&self, draft: NewPaymentTransaction) -> StoreResult<PaymentTransaction> {
        let mut inner = self.inner.write().await;
        inner.last_seq += 1;

        let id = PaymentTransaction::format_id(draft.created_at, inner.last_seq);
        let txn = draft.into_transaction(id);
        inner
            .transactions
            .insert(txn.transaction_id.clone(), txn.clone());

        debug!(transaction_id = %txn.transaction_id, approved = txn.approved, "Recorded payment");
        Ok(txn)
    }

    async fn get(&self, transaction_id: &str) -> StoreResult<PaymentTransaction> {
        let inner = self.inner.read().await;
        inner
            .transactions
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| StoreError::TransactionNotFound(transaction_id.to_string()))
    }
}
