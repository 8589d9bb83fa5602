use super::{HistoricalPrice, PriceSource, PriceStore, closest, window};
use crate::Result;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use pricebook_common::types::{AssetId, Timestamp};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

type Pair = (AssetId, AssetId);

/// プロセス内だけで保持するストア
///
/// 書き込みは単一の書き込みロックの下で行うため、同じ組への同時書き込みは
/// ロックを取った順に後勝ちになる。
#[derive(Debug, Default)]
pub struct MemoryPriceStore {
    prices: RwLock<HashMap<Pair, BTreeMap<Timestamp, (BigDecimal, PriceSource)>>>,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.prices.read().await.values().map(BTreeMap::len).sum()
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn get_historical_price(
        &self,
        from_asset: &AssetId,
        to_asset: &AssetId,
        timestamp: Timestamp,
        max_seconds_distance: u64,
    ) -> Result<Option<HistoricalPrice>> {
        let prices = self.prices.read().await;
        let Some(series) = prices.get(&(from_asset.clone(), to_asset.clone())) else {
            return Ok(None);
        };
        let (lower, upper) = window(timestamp, max_seconds_distance);
        let candidates = series
            .range(lower..=upper)
            .map(|(ts, (price, source))| HistoricalPrice {
                from_asset: from_asset.clone(),
                to_asset: to_asset.clone(),
                source: *source,
                timestamp: *ts,
                price: price.clone(),
            });
        Ok(closest(candidates, timestamp, max_seconds_distance))
    }

    async fn add_historical_price(&self, price: HistoricalPrice) -> Result<()> {
        let mut prices = self.prices.write().await;
        prices
            .entry((price.from_asset, price.to_asset))
            .or_default()
            .insert(price.timestamp, (price.price, price.source));
        Ok(())
    }

    async fn delete_historical_price(
        &self,
        from_asset: &AssetId,
        to_asset: &AssetId,
        timestamp: Timestamp,
    ) -> Result<bool> {
        let mut prices = self.prices.write().await;
        let pair = (from_asset.clone(), to_asset.clone());
        let Some(series) = prices.get_mut(&pair) else {
            return Ok(false);
        };
        let removed = series.remove(&timestamp).is_some();
        if series.is_empty() {
            prices.remove(&pair);
        }
        Ok(removed)
    }
}
