pub mod connection_pool;
pub mod historical_price;
pub mod schema;
pub mod seed;

use crate::Result;
use crate::logging::*;
use historical_price::{MemoryPriceStore, PgPriceStore, PriceStore};
use pricebook_common::config;
use std::sync::Arc;

/// `PG_DSN` が設定されていれば PostgreSQL、なければメモリ上のストア
pub fn new_store() -> Result<Arc<dyn PriceStore>> {
    let log = DEFAULT.new(o!("function" => "persistence::new_store"));
    match config::get("PG_DSN") {
        Ok(dsn) => {
            let pool = connection_pool::build(&dsn)?;
            info!(log, "using postgres price store");
            Ok(Arc::new(PgPriceStore::new(pool)))
        }
        Err(_) => {
            warn!(log, "PG_DSN not configured, prices are kept in memory only");
            Ok(Arc::new(MemoryPriceStore::new()))
        }
    }
}
