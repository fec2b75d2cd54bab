//! # Payment Service
//!
//! Card authorization with an auditable record of every attempt.
//!
//! ## Authorization Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  authorize(card, cart, amount)                                          │
//! │       │                                                                 │
//! │       ├── card: 13-19 ASCII digits, cart >= 1  else InvalidPaymentData │
//! │       ▼                                                                 │
//! │  CardGateway::approve(card, amount)   (pluggable, may say no)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentLedger::record  ← approved AND declined attempts, card masked  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentTransaction { txn_<unix>_<seq>, approved, .. }                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use cartwheel_core::validation::{mask_card_number, validate_card_number, validate_positive_id};
use cartwheel_core::{CartId, Money, NewPaymentTransaction, PaymentTransaction};
use cartwheel_store::{CartStore, PaymentLedger};
use chrono::Utc;
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Card Gateway
// =============================================================================

/// The external capability that approves or declines a charge.
#[async_trait]
pub trait CardGateway: Send + Sync {
    /// Returns whether the charge is approved. `card_number` is already
    /// shape-validated.
    async fn approve(&self, card_number: &str, amount: Money) -> bool;
}

/// Stand-in gateway: declines every card whose number ends in `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockCardGateway;

#[async_trait]
impl CardGateway for MockCardGateway {
    async fn approve(&self, card_number: &str, _amount: Money) -> bool {
        !card_number.ends_with('0')
    }
}

// =============================================================================
// Payment Service
// =============================================================================

#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentLedger>,
    carts: Arc<dyn CartStore>,
    gateway: Arc<dyn CardGateway>,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentLedger>,
        carts: Arc<dyn CartStore>,
        gateway: Arc<dyn CardGateway>,
    ) -> Self {
        PaymentService {
            payments,
            carts,
            gateway,
        }
    }

    /// Checks card shape and cart id without side effects.
    pub fn validate(card_number: &str, cart_id: CartId) -> ServiceResult<()> {
        validate_card_number(card_number).map_err(ServiceError::invalid_payment)?;
        validate_positive_id("cart_id", cart_id).map_err(ServiceError::invalid_payment)?;
        Ok(())
    }

    /// Asks the gateway and records the attempt whatever the outcome.
    ///
    /// A decline is not an error here; callers inspect `approved`.
    pub async fn authorize(
        &self,
        card_number: &str,
        cart_id: CartId,
        amount: Money,
    ) -> ServiceResult<PaymentTransaction> {
        Self::validate(card_number, cart_id)?;

        let approved = self.gateway.approve(card_number, amount).await;

        let txn = self
            .payments
            .record(NewPaymentTransaction {
                card_reference: mask_card_number(card_number),
                cart_id,
                amount,
                approved,
                created_at: Utc::now(),
            })
            .await?;

        if approved {
            info!(transaction_id = %txn.transaction_id, cart_id, amount = %amount, "Payment approved");
        } else {
            warn!(transaction_id = %txn.transaction_id, cart_id, amount = %amount, "Payment declined");
        }
        Ok(txn)
    }

    /// Charges the flat per-line amount for an existing cart.
    ///
    /// Fails `PaymentDeclined` on a decline; the attempt stays retrievable
    /// through [`get_transaction`](Self::get_transaction).
    pub async fn process_payment(
        &self,
        card_number: &str,
        cart_id: CartId,
    ) -> ServiceResult<PaymentTransaction> {
        Self::validate(card_number, cart_id)?;

        let cart = self.carts.get_by_id(cart_id).await?;
        let txn = self
            .authorize(card_number, cart_id, cart.charge_amount())
            .await?;

        if !txn.approved {
            return Err(ServiceError::PaymentDeclined {
                transaction_id: txn.transaction_id,
            });
        }
        Ok(txn)
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> ServiceResult<PaymentTransaction> {
        if transaction_id.trim().is_empty() {
            return Err(ServiceError::InvalidPaymentData(
                "transaction_id is required".to_string(),
            ));
        }
        Ok(self.payments.get(transaction_id).await?)
    }
}
