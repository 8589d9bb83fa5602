mod memory;
mod postgres;

pub use memory::MemoryPriceStore;
pub use postgres::PgPriceStore;

use crate::Result;
use anyhow::anyhow;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use pricebook_common::types::{AssetId, Timestamp};
use std::collections::HashMap;
use std::str::FromStr;

/// 価格の出どころ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceSource {
    /// API から手動で設定されたもの
    Manual,
    /// それ以外の経路で取り込まれたもの
    Imported,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::Manual => "manual",
            PriceSource::Imported => "imported",
        }
    }
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "manual" => Ok(PriceSource::Manual),
            "imported" => Ok(PriceSource::Imported),
            other => Err(anyhow!("unknown price source: {}", other)),
        }
    }
}

/// (from_asset, to_asset, timestamp) → price の記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalPrice {
    pub from_asset: AssetId,
    pub to_asset: AssetId,
    pub source: PriceSource,
    pub timestamp: Timestamp,
    pub price: BigDecimal,
}

impl HistoricalPrice {
    pub fn manual(
        from_asset: AssetId,
        to_asset: AssetId,
        timestamp: Timestamp,
        price: BigDecimal,
    ) -> Self {
        Self {
            from_asset,
            to_asset,
            source: PriceSource::Manual,
            timestamp,
            price,
        }
    }

    pub fn imported(
        from_asset: AssetId,
        to_asset: AssetId,
        timestamp: Timestamp,
        price: BigDecimal,
    ) -> Self {
        Self {
            source: PriceSource::Imported,
            ..Self::manual(from_asset, to_asset, timestamp, price)
        }
    }
}

/// 価格記録の保存先
///
/// 同じ (from_asset, to_asset, timestamp) への書き込みは後勝ち。
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// `timestamp` から `max_seconds_distance` 秒以内で最も近い記録
    async fn get_historical_price(
        &self,
        from_asset: &AssetId,
        to_asset: &AssetId,
        timestamp: Timestamp,
        max_seconds_distance: u64,
    ) -> Result<Option<HistoricalPrice>>;

    /// 同じ組があれば上書き
    async fn add_historical_price(&self, price: HistoricalPrice) -> Result<()>;

    async fn add_historical_prices(&self, prices: Vec<HistoricalPrice>) -> Result<()> {
        for price in prices {
            self.add_historical_price(price).await?;
        }
        Ok(())
    }

    /// 削除できたら true
    async fn delete_historical_price(
        &self,
        from_asset: &AssetId,
        to_asset: &AssetId,
        timestamp: Timestamp,
    ) -> Result<bool>;
}

/// 許容範囲 [timestamp - d, timestamp + d]（両端を含む）
pub(crate) fn window(timestamp: Timestamp, max_seconds_distance: u64) -> (Timestamp, Timestamp) {
    (
        timestamp.saturating_sub(max_seconds_distance),
        timestamp.saturating_add(max_seconds_distance),
    )
}

/// 許容範囲内で最も近い記録を選ぶ。距離が同じなら早い方。
pub(crate) fn closest<I>(
    candidates: I,
    timestamp: Timestamp,
    max_seconds_distance: u64,
) -> Option<HistoricalPrice>
where
    I: IntoIterator<Item = HistoricalPrice>,
{
    candidates
        .into_iter()
        .filter(|p| p.timestamp.abs_diff(timestamp) <= max_seconds_distance)
        .min_by_key(|p| (p.timestamp.abs_diff(timestamp), p.timestamp))
}

/// 同じ (from_asset, to_asset, timestamp) が複数あれば最後のものだけ残す
///
/// 残る順序は各組の最初の出現位置。
pub(crate) fn last_write_per_key(prices: Vec<HistoricalPrice>) -> Vec<HistoricalPrice> {
    let mut index: HashMap<(AssetId, AssetId, Timestamp), usize> = HashMap::new();
    let mut unique: Vec<HistoricalPrice> = Vec::with_capacity(prices.len());
    for price in prices {
        let key = (
            price.from_asset.clone(),
            price.to_asset.clone(),
            price.timestamp,
        );
        match index.get(&key) {
            Some(&i) => unique[i] = price,
            None => {
                index.insert(key, unique.len());
                unique.push(price);
            }
        }
    }
    unique
}
