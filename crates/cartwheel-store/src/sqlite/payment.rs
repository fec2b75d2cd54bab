use async_trait::async_trait;
use cartwheel_core::{NewPaymentTransaction, PaymentTransaction};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::PaymentLedger;

/// Payment ledger backed by `payment_transactions`.
///
/// The row's AUTOINCREMENT `seq` is the sequence half of the transaction id,
/// so the row is inserted first and named second, inside one transaction.
#[derive(Debug, Clone)]
pub struct SqlitePaymentLedger {
    pool: SqlitePool,
}

impl SqlitePaymentLedger {
    pub fn new(pool: SqlitePool) -> Self {
        SqlitePaymentLedger { pool }
    }
}

#[async_trait]
impl PaymentLedger for SqlitePaymentLedger {
    async fn record(&self, draft: NewPaymentTransaction) -> StoreResult<PaymentTransaction> {
        let mut tx = self.pool.begin().await?;

        let seq = sqlx::query(
            r#"
            INSERT INTO payment_transactions (card_reference, cart_id, amount_cents, approved, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&draft.card_reference)
        .bind(draft.cart_id)
        .bind(draft.amount.cents())
        .bind(draft.approved)
        .bind(draft.created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let transaction_id = PaymentTransaction::format_id(draft.created_at, seq);

        sqlx::query("UPDATE payment_transactions SET transaction_id = ?1 WHERE seq = ?2")
            .bind(&transaction_id)
            .bind(seq)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(transaction_id = %transaction_id, approved = draft.approved, "Recorded payment");
        Ok(draft.into_transaction(transaction_id))
    }

    async fn get(&self, transaction_id: &str) -> StoreResult<PaymentTransaction> {
        sqlx::query_as::<_, PaymentTransaction>(
            r#"
            SELECT transaction_id, card_reference, cart_id, amount_cents, approved, created_at
            FROM payment_transactions
            WHERE transaction_id = ?1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::TransactionNotFound(transaction_id.to_string()))
    }
}
