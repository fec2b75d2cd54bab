use std::sync::Arc;

use async_trait::async_trait;
use cartwheel_core::{InventoryRecord, ProductId};
use redis::aio::ConnectionManager;
use redis::Script;
use tracing::debug;

use super::Keys;
use crate::error::{StoreError, StoreResult};
use crate::repository::WarehouseLedger;

/// KEYS: inventory hash. ARGV: initial stock.
/// Materializes the default record if absent, returns [available, reserved].
const SNAPSHOT_SCRIPT: &str = r#"
redis.call('HSETNX', KEYS[1], 'available', ARGV[1])
redis.call('HSETNX', KEYS[1], 'reserved', 0)
return redis.call('HMGET', KEYS[1], 'available', 'reserved')
"#;

/// KEYS: inventory hash. ARGV: quantity, -quantity, initial stock.
/// Returns [1, available_after] or [0, available].
const RESERVE_SCRIPT: &str = r#"
redis.call('HSETNX', KEYS[1], 'available', ARGV[3])
redis.call('HSETNX', KEYS[1], 'reserved', 0)
local available = tonumber(redis.call('HGET', KEYS[1], 'available'))
if available < tonumber(ARGV[1]) then
    return { 0, available }
end
local after = redis.call('HINCRBY', KEYS[1], 'available', ARGV[2])
redis.call('HINCRBY', KEYS[1], 'reserved', ARGV[1])
return { 1, after }
"#;

/// KEYS: inventory hash. ARGV: quantity, -quantity, restock flag.
/// Returns [-1, 0] when missing, [0, reserved] when short, [1, reserved_after].
const DRAW_RESERVED_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return { -1, 0 }
end
local reserved = tonumber(redis.call('HGET', KEYS[1], 'reserved'))
if reserved < tonumber(ARGV[1]) then
    return { 0, reserved }
end
local after = redis.call('HINCRBY', KEYS[1], 'reserved', ARGV[2])
if ARGV[3] == '1' then
    redis.call('HINCRBY', KEYS[1], 'available', ARGV[1])
end
return { 1, after }
"#;

struct LedgerScripts {
    snapshot: Script,
    reserve: Script,
    draw_reserved: Script,
}

impl LedgerScripts {
    fn new() -> Self {
        LedgerScripts {
            snapshot: Script::new(SNAPSHOT_SCRIPT),
            reserve: Script::new(RESERVE_SCRIPT),
            draw_reserved: Script::new(DRAW_RESERVED_SCRIPT),
        }
    }
}


/// Warehouse ledger stored as one hash per product.
#[derive(Clone)]
pub struct RedisWarehouseLedger {
    conn: ConnectionManager,
    keys: Keys,
    initial_stock: i64,
    scripts: Arc<LedgerScripts>,
}

impl RedisWarehouseLedger {
    pub(crate) fn new(conn: ConnectionManager, keys: Keys, initial_stock: i64) -> Self {
        RedisWarehouseLedger {
            conn,
            keys,
            initial_stock,
            scripts: Arc::new(LedgerScripts::new()),
        }
    }

    async fn draw_reserved(
        &self,
        product_id: ProductId,
        quantity: i64,
        restock: bool,
    ) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let (status, reserved): (i64, i64) = self
            .scripts
            .draw_reserved
            .key(self.keys.inventory(product_id))
            .arg(quantity)
            .arg(-quantity)
            .arg(if restock { "1" } else { "0" })
            .invoke_async(&mut conn)
            .await?;

        match status {
            1 => Ok(()),
            0 => Err(StoreError::InsufficientReserved {
                product_id,
                reserved,
                requested: quantity,
            }),
            _ => Err(StoreError::ProductNotFound(product_id)),
        }
    }
}

#[async_trait]
impl WarehouseLedger for RedisWarehouseLedger {
    async fn get_inventory(&self, product_id: ProductId) -> StoreResult<InventoryRecord> {
        let mut conn = self.conn.clone();
        let (available_stock, reserved_stock): (i64, i64) = self
            .scripts
            .snapshot
            .key(self.keys.inventory(product_id))
            .arg(self.initial_stock)
            .invoke_async(&mut conn)
            .await?;

        Ok(InventoryRecord {
            product_id,
            available_stock,
            reserved_stock,
        })
    }

    async fn reserve(&self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let (status, available): (i64, i64) = self
            .scripts
            .reserve
            .key(self.keys.inventory(product_id))
            .arg(quantity)
            .arg(-quantity)
            .arg(self.initial_stock)
            .invoke_async(&mut conn)
            .await?;

        if status == 0 {
            return Err(StoreError::InsufficientInventory {
                product_id,
                available,
                requested: quantity,
            });
        }

        debug!(product_id, quantity, available, "Reserved stock");
        Ok(())
    }

    async fn ship(&self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        self.draw_reserved(product_id, quantity, false).await?;
        debug!(product_id, quantity, "Shipped stock");
        Ok(())
    }

    async fn release(&self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        self.draw_reserved(product_id, quantity, true).await?;
        debug!(product_id, quantity, "Released stock");
        Ok(())
    }
}
