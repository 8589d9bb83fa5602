use super::{HistoricalPrice, PriceStore, closest, last_write_per_key, window};
use crate::Result;
use crate::logging::*;
use crate::persistence::connection_pool::{self, Pool};
use crate::persistence::schema::historical_prices;
use anyhow::anyhow;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel::upsert::excluded;
use pricebook_common::types::{AssetId, Timestamp};

// データベース用モデル
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = historical_prices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct DbHistoricalPrice {
    pub from_asset: String,
    pub to_asset: String,
    pub source_type: String,
    pub timestamp: i64,
    pub price: BigDecimal,
}

impl DbHistoricalPrice {
    fn from_price(price: &HistoricalPrice) -> Result<Self> {
        Ok(Self {
            from_asset: price.from_asset.to_string(),
            to_asset: price.to_asset.to_string(),
            source_type: price.source.as_str().to_string(),
            timestamp: to_db_timestamp(price.timestamp)?,
            price: price.price.clone(),
        })
    }

    fn into_price(self) -> Result<HistoricalPrice> {
        Ok(HistoricalPrice {
            from_asset: self.from_asset.into(),
            to_asset: self.to_asset.into(),
            source: self.source_type.parse()?,
            timestamp: u64::try_from(self.timestamp)?,
            price: self.price,
        })
    }
}

/// 1 回の INSERT に載せる行数（1 行あたり 5 パラメータ、上限 65535）
const INSERT_CHUNK_ROWS: usize = 1000;

fn to_db_timestamp(timestamp: Timestamp) -> Result<i64> {
    i64::try_from(timestamp).map_err(|_| anyhow!("timestamp out of range: {}", timestamp))
}

/// PostgreSQL の `historical_prices` テーブルを使うストア
///
/// 同じ組への書き込みは `ON CONFLICT DO UPDATE` で後勝ち。
pub struct PgPriceStore {
    pool: Pool,
}

impl PgPriceStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceStore for PgPriceStore {
    async fn get_historical_price(
        &self,
        from_asset: &AssetId,
        to_asset: &AssetId,
        timestamp: Timestamp,
        max_seconds_distance: u64,
    ) -> Result<Option<HistoricalPrice>> {
        let (lower, upper) = window(timestamp, max_seconds_distance);
        let lower = i64::try_from(lower).unwrap_or(i64::MAX);
        let upper = i64::try_from(upper).unwrap_or(i64::MAX);
        let from_str = from_asset.to_string();
        let to_str = to_asset.to_string();

        let conn = connection_pool::get(&self.pool).await?;
        let rows = conn
            .interact(move |conn| {
                historical_prices::table
                    .filter(historical_prices::from_asset.eq(&from_str))
                    .filter(historical_prices::to_asset.eq(&to_str))
                    .filter(historical_prices::timestamp.ge(lower))
                    .filter(historical_prices::timestamp.le(upper))
                    .order_by(historical_prices::timestamp.asc())
                    .select(DbHistoricalPrice::as_select())
                    .load::<DbHistoricalPrice>(conn)
            })
            .await
            .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

        let prices = rows
            .into_iter()
            .map(DbHistoricalPrice::into_price)
            .collect::<Result<Vec<_>>>()?;
        Ok(closest(prices, timestamp, max_seconds_distance))
    }

    async fn add_historical_price(&self, price: HistoricalPrice) -> Result<()> {
        self.add_historical_prices(vec![price]).await
    }

    async fn add_historical_prices(&self, prices: Vec<HistoricalPrice>) -> Result<()> {
        let log = DEFAULT.new(o!(
            "function" => "PgPriceStore::add_historical_prices",
            "count" => prices.len(),
        ));
        if prices.is_empty() {
            return Ok(());
        }

        // 1 つの文で同じ行を二度更新できないので、先に後勝ちで畳む
        let rows = last_write_per_key(prices)
            .iter()
            .map(DbHistoricalPrice::from_price)
            .collect::<Result<Vec<_>>>()?;

        let conn = connection_pool::get(&self.pool).await?;
        let written = conn
            .interact(move |conn| {
                conn.transaction(|conn| {
                    let mut written = 0;
                    for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
                        written += diesel::insert_into(historical_prices::table)
                            .values(chunk)
                            .on_conflict((
                                historical_prices::from_asset,
                                historical_prices::to_asset,
                                historical_prices::timestamp,
                            ))
                            .do_update()
                            .set((
                                historical_prices::price.eq(excluded(historical_prices::price)),
                                historical_prices::source_type
                                    .eq(excluded(historical_prices::source_type)),
                            ))
                            .execute(conn)?;
                    }
                    Ok::<_, diesel::result::Error>(written)
                })
            })
            .await
            .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

        trace!(log, "finish"; "written" => written);
        Ok(())
    }

    async fn delete_historical_price(
        &self,
        from_asset: &AssetId,
        to_asset: &AssetId,
        timestamp: Timestamp,
    ) -> Result<bool> {
        let from_str = from_asset.to_string();
        let to_str = to_asset.to_string();
        let timestamp = to_db_timestamp(timestamp)?;

        let conn = connection_pool::get(&self.pool).await?;
        let deleted = conn
            .interact(move |conn| {
                diesel::delete(
                    historical_prices::table
                        .filter(historical_prices::from_asset.eq(&from_str))
                        .filter(historical_prices::to_asset.eq(&to_str))
                        .filter(historical_prices::timestamp.eq(timestamp)),
                )
                .execute(conn)
            })
            .await
            .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

        Ok(deleted > 0)
    }
}
