use crate::Result;
pub use deadpool_diesel::postgres::Pool;
use deadpool_diesel::{Manager, ManagerConfig, RecyclingMethod};
use pricebook_common::config;

pub type Client = deadpool_diesel::postgres::Connection;

pub fn build(dsn: &str) -> Result<Pool> {
    let max_size: usize = config::get_or("PG_POOL_SIZE", 16);
    let mgr_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(dsn, deadpool_diesel::Runtime::Tokio1, mgr_config);
    Ok(Pool::builder(mgr).max_size(max_size).build()?)
}

pub async fn get(pool: &Pool) -> Result<Client> {
    Ok(pool.get().await?)
}
