use async_trait::async_trait;
use cartwheel_core::{NewPaymentTransaction, PaymentTransaction};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use super::Keys;
use crate::error::{StoreError, StoreResult};
use crate::repository::PaymentLedger;

/// Payment ledger stored as JSON documents, sequenced by `Payments:next_seq`.
#[derive(Clone)]
pub struct RedisPaymentLedger {
    conn: ConnectionManager,
    keys: Keys,
}

impl RedisPaymentLedger {
    pub(crate) fn new(conn: ConnectionManager, keys: Keys) -> Self {
        RedisPaymentLedger { conn, keys }
    }
}

#[async_trait]
impl PaymentLedger for RedisPaymentLedger {
    async fn record(&self, draft: NewPaymentTransaction) -> StoreResult<PaymentTransaction> {
        let mut conn = self.conn.clone();
        let seq: i64 = conn.incr(self.keys.payment_counter(), 1).await?;

        let id = PaymentTransaction::format_id(draft.created_at, seq);
        let txn = draft.into_transaction(id);
        let doc = serde_json::to_string(&txn)?;
        let _: () = conn.set(self.keys.payment(&txn.transaction_id), doc).await?;

        debug!(transaction_id = %txn.transaction_id, approved = txn.approved, "Recorded payment");
        Ok(txn)
    }

    async fn get(&self, transaction_id: &str) -> StoreResult<PaymentTransaction> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.keys.payment(transaction_id)).await?;
        let raw = raw.ok_or_else(|| StoreError::TransactionNotFound(transaction_id.to_string()))?;
        Ok(serde_json::from_str(&raw)?)
    }
}
