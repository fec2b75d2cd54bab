use std::sync::Arc;

use async_trait::async_trait;
use cartwheel_core::{Cart, CartId, CartItem, CustomerId};
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script, ScriptInvocation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Keys;
use crate::error::{StoreError, StoreResult};
use crate::repository::CartStore;

/// KEYS: header, items, lines. ARGV: product_id, quantity.
/// Returns 1 on success, -1 when the cart is missing, -2 on overflow.
const ADD_ITEM_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return -1
end
local res = redis.pcall('HINCRBY', KEYS[2], ARGV[1], ARGV[2])
if type(res) == 'table' and res.err then
    return -2
end
if redis.call('HGET', KEYS[2], ARGV[1]) == ARGV[2] then
    redis.call('RPUSH', KEYS[3], ARGV[1])
end
return 1
"#;

/// KEYS: header, items, lines.
/// Returns nil when missing, else [header, pid1, qty1, pid2, qty2, ...].
const SNAPSHOT_SCRIPT: &str = r#"
local header = redis.call('GET', KEYS[1])
if not header then
    return false
end
local out = { header }
for _, pid in ipairs(redis.call('LRANGE', KEYS[3], 0, -1)) do
    table.insert(out, pid)
    table.insert(out, redis.call('HGET', KEYS[2], pid))
end
return out
"#;

/// KEYS: header, items, lines. Returns 1 if deleted, 0 if missing.
const DELETE_SCRIPT: &str = r#"
if redis.call('DEL', KEYS[1]) == 0 then
    return 0
end
redis.call('DEL', KEYS[2], KEYS[3])
return 1
"#;

#[derive(Debug, Serialize, Deserialize)]
struct CartHeader {
    cart_id: CartId,
    customer_id: CustomerId,
    created_at: DateTime<Utc>,
}

/// Scripts hashed once per store; `invoke_async` then runs them by SHA.
struct CartScripts {
    add_item: Script,
    snapshot: Script,
    delete: Script,
}

impl CartScripts {
    fn new() -> Self {
        CartScripts {
            add_item: Script::new(ADD_ITEM_SCRIPT),
            snapshot: Script::new(SNAPSHOT_SCRIPT),
            delete: Script::new(DELETE_SCRIPT),
        }
    }
}


/// Cart store split over a header document, an items hash and a line list.
#[derive(Clone)]
pub struct RedisCartStore {
    conn: ConnectionManager,
    keys: Keys,
    scripts: Arc<CartScripts>,
}

impl RedisCartStore {
    pub(crate) fn new(conn: ConnectionManager, keys: Keys) -> Self {
        RedisCartStore {
            conn,
            keys,
            scripts: Arc::new(CartScripts::new()),
        }
    }

    fn script<'a>(&self, script: &'a Script, cart_id: CartId) -> ScriptInvocation<'a> {
        let mut invocation = script.key(self.keys.cart(cart_id));
        invocation
            .key(self.keys.cart_items(cart_id))
            .key(self.keys.cart_lines(cart_id));
        invocation
    }
}

fn parse_quantity(raw: &str) -> StoreResult<i64> {
    raw.parse()
        .map_err(|_| StoreError::Serialization(format!("bad cart quantity '{raw}'")))
}

#[async_trait]
impl CartStore for RedisCartStore {
    async fn create(&self, customer_id: CustomerId) -> StoreResult<Cart> {
        let mut conn = self.conn.clone();
        let cart_id: CartId = conn.incr(self.keys.cart_counter(), 1).await?;

        let cart = Cart::new(cart_id, customer_id);
        let header = serde_json::to_string(&CartHeader {
            cart_id,
            customer_id,
            created_at: cart.created_at,
        })?;
        let _: () = conn.set(self.keys.cart(cart_id), header).await?;

        debug!(cart_id, customer_id, "Created cart");
        Ok(cart)
    }

    async fn get_by_id(&self, cart_id: CartId) -> StoreResult<Cart> {
        let mut conn = self.conn.clone();
        let reply: Option<Vec<String>> = self
            .script(&self.scripts.snapshot, cart_id)
            .invoke_async(&mut conn)
            .await?;

        let reply = reply.ok_or(StoreError::CartNotFound(cart_id))?;
        let (header, lines) = reply
            .split_first()
            .ok_or_else(|| StoreError::Serialization("empty cart snapshot".to_string()))?;
        let header: CartHeader = serde_json::from_str(header)?;

        let items = lines
            .chunks(2)
            .map(|pair| match pair {
                [pid, qty] => Ok(CartItem::new(
                    pid.parse().map_err(|_| {
                        StoreError::Serialization(format!("bad cart product id '{pid}'"))
                    })?,
                    parse_quantity(qty)?,
                )),
                _ => Err(StoreError::Serialization("truncated cart snapshot".to_string())),
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Cart {
            cart_id: header.cart_id,
            customer_id: header.customer_id,
            items,
            created_at: header.created_at,
        })
    }

    async fn add_item(&self, cart_id: CartId, item: CartItem) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let status: i64 = self
            .script(&self.scripts.add_item, cart_id)
            .arg(item.product_id)
            .arg(item.quantity)
            .invoke_async(&mut conn)
            .await?;

        match status {
            1 => {
                debug!(
                    cart_id,
                    product_id = item.product_id,
                    quantity = item.quantity,
                    "Merged cart item"
                );
                Ok(())
            }
            -1 => Err(StoreError::CartNotFound(cart_id)),
            -2 => Err(StoreError::QuantityOverflow(item.product_id)),
            other => Err(StoreError::Redis(format!("unexpected add_item reply {other}"))),
        }
    }

    async fn delete(&self, cart_id: CartId) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .script(&self.scripts.delete, cart_id)
            .invoke_async(&mut conn)
            .await?;

        if deleted == 0 {
            return Err(StoreError::CartNotFound(cart_id));
        }

        debug!(cart_id, "Deleted cart");
        Ok(())
    }
}
