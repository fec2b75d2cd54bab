//! # Cart Claims
//!
//! Per-cart coordination between item edits and checkout.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item   ── shared hold ──┐                                         │
//! │  add_item   ── shared hold ──┼──► RwLock<()> for cart N                │
//! │  checkout   ── exclusive ────┘     (waits for edits already running)   │
//! │                                                                         │
//! │  edit while a checkout holds or waits   → CheckoutInProgress           │
//! │  second checkout of the same cart       → CheckoutInProgress           │
//! │  edit after checkout deleted the cart   → CartNotFound (from store)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Claims are process-local. Entries are dropped once no claim refers to
//! them, so the map only holds carts with work in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use cartwheel_core::CartId;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Default)]
struct CartEntry {
    gate: Arc<RwLock<()>>,
    checking_out: bool,
}

/// Registry of carts with edits or a checkout in flight. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct CartClaims {
    entries: Arc<Mutex<HashMap<CartId, CartEntry>>>,
}

enum Hold {
    Edit(OwnedRwLockReadGuard<()>),
    Checkout(OwnedRwLockWriteGuard<()>),
}

/// A held claim on one cart. Released on drop.
pub(crate) struct CartClaim {
    claims: CartClaims,
    cart_id: CartId,
    checkout: bool,
    hold: Option<Hold>,
}

impl CartClaims {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CartId, CartEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Shared claim for an item edit. Fails at once if a checkout of the
    /// cart is running or queued.
    pub(crate) fn begin_edit(&self, cart_id: CartId) -> ServiceResult<CartClaim> {
        let gate = {
            let mut entries = self.entries();
            let entry = entries.entry(cart_id).or_default();
            if entry.checking_out {
                return Err(ServiceError::CheckoutInProgress(cart_id));
            }
            entry.gate.clone()
        };

        let mut claim = CartClaim {
            claims: self.clone(),
            cart_id,
            checkout: false,
            hold: None,
        };
        match gate.try_read_owned() {
            Ok(guard) => {
                claim.hold = Some(Hold::Edit(guard));
                Ok(claim)
            }
            Err(_) => Err(ServiceError::CheckoutInProgress(cart_id)),
        }
    }

    /// Exclusive claim for a checkout. Fails at once if another checkout
    /// holds the cart, otherwise waits for running edits to finish.
    pub(crate) async fn begin_checkout(&self, cart_id: CartId) -> ServiceResult<CartClaim> {
        let gate = {
            let mut entries = self.entries();
            let entry = entries.entry(cart_id).or_default();
            if entry.checking_out {
                return Err(ServiceError::CheckoutInProgress(cart_id));
            }
            entry.checking_out = true;
            entry.gate.clone()
        };

        // Built before the await so a cancelled checkout still clears the flag.
        let mut claim = CartClaim {
            claims: self.clone(),
            cart_id,
            checkout: true,
            hold: None,
        };
        claim.hold = Some(Hold::Checkout(gate.write_owned().await));
        Ok(claim)
    }

    /// Number of carts with an entry. Test hook for pruning.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.entries().len()
    }
}

impl Drop for CartClaim {
    fn drop(&mut self) {
        drop(self.hold.take());

        let mut entries = self.claims.entries();
        if let Some(entry) = entries.get_mut(&self.cart_id) {
            if self.checkout {
                entry.checking_out = false;
            }
            if !entry.checking_out && Arc::strong_count(&entry.gate) == 1 {
                entries.remove(&self.cart_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_edits_share_the_cart() {
        let claims = CartClaims::new();

        let first = claims.begin_edit(1).unwrap();
        let second = claims.begin_edit(1).unwrap();
        drop(first);
        drop(second);

        assert_eq!(claims.tracked(), 0);
    }

    #[tokio::test]
    async fn test_checkout_excludes_edits_and_checkouts() {
        let claims = CartClaims::new();
        let checkout = claims.begin_checkout(1).await.unwrap();

        assert!(matches!(
            claims.begin_edit(1),
            Err(ServiceError::CheckoutInProgress(1))
        ));
        assert!(matches!(
            claims.begin_checkout(1).await,
            Err(ServiceError::CheckoutInProgress(1))
        ));
        // Other carts are unaffected.
        assert!(claims.begin_edit(2).is_ok());

        drop(checkout);
        assert!(claims.begin_edit(1).is_ok());
        assert_eq!(claims.tracked(), 0);
    }

    #[tokio::test]
    async fn test_checkout_waits_for_running_edit() {
        let claims = CartClaims::new();
        let edit = claims.begin_edit(1).unwrap();

        let waiting = {
            let claims = claims.clone();
            tokio::spawn(async move { claims.begin_checkout(1).await.map(|_| ()) })
        };
        tokio::task::yield_now().await;

        // The queued checkout already blocks new edits.
        assert!(matches!(
            claims.begin_edit(1),
            Err(ServiceError::CheckoutInProgress(1))
        ));
        assert!(!waiting.is_finished());

        drop(edit);
        waiting.await.unwrap().unwrap();
        assert_eq!(claims.tracked(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_checkout_releases_cart() {
        let claims = CartClaims::new();
        let edit = claims.begin_edit(1).unwrap();

        let pending = {
            let claims = claims.clone();
            tokio::spawn(async move { claims.begin_checkout(1).await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());

        drop(edit);
        assert!(claims.begin_checkout(1).await.is_ok());
    }
}
