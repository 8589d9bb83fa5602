//! 資産間の過去価格の照会と設定

pub mod errors;

pub use errors::Error;

use crate::assets::AssetRegistry;
use crate::logging::*;
use crate::persistence::historical_price::{HistoricalPrice, PriceStore};
use bigdecimal::{BigDecimal, One};
use futures::future::try_join_all;
use num_traits::Signed;
use pricebook_common::config;
use pricebook_common::prices::{
    AssetPrices, DeleteHistoricalPriceRequest, HistoricalAssetsPriceResponse,
    SetHistoricalPriceRequest,
};
use pricebook_common::types::{AssetId, Timestamp};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

type Result<T> = std::result::Result<T, Error>;

const DEFAULT_MAX_SECONDS_DISTANCE: u64 = 3600;

pub struct PriceHistorian {
    registry: Arc<AssetRegistry>,
    store: Arc<dyn PriceStore>,
    max_seconds_distance: u64,
}

impl PriceHistorian {
    pub fn new(
        registry: Arc<AssetRegistry>,
        store: Arc<dyn PriceStore>,
        max_seconds_distance: u64,
    ) -> Self {
        Self {
            registry,
            store,
            max_seconds_distance,
        }
    }

    /// 許容距離は `PRICE_MAX_SECONDS_DISTANCE` から
    pub fn from_config(registry: Arc<AssetRegistry>, store: Arc<dyn PriceStore>) -> Self {
        let distance = config::get_or("PRICE_MAX_SECONDS_DISTANCE", DEFAULT_MAX_SECONDS_DISTANCE);
        Self::new(registry, store, distance)
    }

    pub fn registry(&self) -> &Arc<AssetRegistry> {
        &self.registry
    }

    pub fn max_seconds_distance(&self) -> u64 {
        self.max_seconds_distance
    }

    async fn ensure_known<'a, I>(&self, assets: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a AssetId>,
    {
        match self.registry.first_unknown(assets).await {
            Some(unknown) => Err(Error::UnknownAsset(unknown.clone())),
            None => Ok(()),
        }
    }

    /// 価格を引く前の検査。失敗したら何も照会しない。
    pub async fn validate_query(
        &self,
        assets_timestamp: &[(AssetId, Timestamp)],
        target_asset: &AssetId,
    ) -> Result<()> {
        if assets_timestamp.is_empty() {
            return Err(Error::EmptyQuery);
        }
        for (_, timestamp) in assets_timestamp {
            check_timestamp(*timestamp)?;
        }
        self.ensure_known(assets_timestamp.iter().map(|(asset, _)| asset))
            .await?;
        self.ensure_known([target_asset]).await
    }

    /// 単一の価格。同じ資産同士は常に 1。
    pub async fn query_historical_price(
        &self,
        from_asset: &AssetId,
        to_asset: &AssetId,
        timestamp: Timestamp,
    ) -> Result<Option<BigDecimal>> {
        if from_asset == to_asset {
            return Ok(Some(BigDecimal::one()));
        }
        let found = self
            .store
            .get_historical_price(from_asset, to_asset, timestamp, self.max_seconds_distance)
            .await?;
        Ok(found.map(|p| p.price))
    }

    /// 複数の (資産, 時刻) をまとめて `target_asset` 建てで引く
    ///
    /// 見つからなかった時刻は結果から省かれる。要求された資産のキーは常に残る。
    pub async fn query_historical_assets_price(
        &self,
        assets_timestamp: &[(AssetId, Timestamp)],
        target_asset: &AssetId,
    ) -> Result<HistoricalAssetsPriceResponse> {
        let log = DEFAULT.new(o!(
            "function" => "query_historical_assets_price",
            "target_asset" => target_asset.to_string(),
            "pairs" => assets_timestamp.len(),
        ));
        self.validate_query(assets_timestamp, target_asset).await?;

        let unique: BTreeSet<&(AssetId, Timestamp)> = assets_timestamp.iter().collect();
        let lookups = unique.into_iter().map(|(asset, timestamp)| async move {
            let price = self
                .query_historical_price(asset, target_asset, *timestamp)
                .await?;
            Ok::<_, Error>((asset, *timestamp, price))
        });
        let found = try_join_all(lookups).await?;

        let mut assets = AssetPrices::new();
        for (asset, _) in assets_timestamp {
            assets.entry(asset.clone()).or_default();
        }
        let mut missing = 0;
        for (asset, timestamp, price) in found {
            match price {
                Some(price) => {
                    assets
                        .entry(asset.clone())
                        .or_default()
                        .insert(timestamp.to_string(), format_price(&price));
                }
                None => {
                    missing += 1;
                    debug!(log, "no price found";
                        "asset" => asset.to_string(),
                        "timestamp" => timestamp,
                    );
                }
            }
        }
        info!(log, "finish"; "assets" => assets.len(), "missing" => missing);

        Ok(HistoricalAssetsPriceResponse {
            assets,
            target_asset: target_asset.clone(),
        })
    }

    /// 書き込む前の検査。問題がなければ保存する記録を返す。
    pub async fn validate_set(&self, request: &SetHistoricalPriceRequest) -> Result<HistoricalPrice> {
        self.ensure_known([&request.from_asset, &request.to_asset])
            .await?;
        check_timestamp(request.timestamp)?;
        let price = parse_price(&request.price)?;
        Ok(HistoricalPrice::manual(
            request.from_asset.clone(),
            request.to_asset.clone(),
            request.timestamp,
            price,
        ))
    }

    /// 手動価格の作成または上書き
    pub async fn set_historical_price(&self, request: &SetHistoricalPriceRequest) -> Result<()> {
        let log = DEFAULT.new(o!(
            "function" => "set_historical_price",
            "from_asset" => request.from_asset.to_string(),
            "to_asset" => request.to_asset.to_string(),
            "timestamp" => request.timestamp,
        ));
        let price = self.validate_set(request).await?;
        info!(log, "storing manual price"; "price" => %price.price);
        self.store.add_historical_price(price).await?;
        Ok(())
    }

    pub async fn delete_historical_price(&self, request: &DeleteHistoricalPriceRequest) -> Result<()> {
        let log = DEFAULT.new(o!(
            "function" => "delete_historical_price",
            "from_asset" => request.from_asset.to_string(),
            "to_asset" => request.to_asset.to_string(),
            "timestamp" => request.timestamp,
        ));
        self.ensure_known([&request.from_asset, &request.to_asset])
            .await?;
        check_timestamp(request.timestamp)?;
        let deleted = self
            .store
            .delete_historical_price(&request.from_asset, &request.to_asset, request.timestamp)
            .await?;
        if !deleted {
            warn!(log, "nothing to delete");
            return Err(Error::DeleteFailed {
                from_asset: request.from_asset.clone(),
                to_asset: request.to_asset.clone(),
                timestamp: request.timestamp,
            });
        }
        info!(log, "deleted");
        Ok(())
    }
}

/// 保存先が符号付き 64bit なので、それを超える時刻は受け付けない
pub fn check_timestamp(timestamp: Timestamp) -> Result<()> {
    if i64::try_from(timestamp).is_err() {
        return Err(Error::InvalidTimestamp(timestamp));
    }
    Ok(())
}

/// 非負の十進数文字列
pub fn parse_price(s: &str) -> Result<BigDecimal> {
    let price = BigDecimal::from_str(s.trim())
        .map_err(|e| Error::InvalidPrice(s.to_string(), e.to_string()))?;
    if price.is_negative() {
        return Err(Error::InvalidPrice(
            s.to_string(),
            "price must not be negative".to_string(),
        ));
    }
    Ok(price)
}

/// 末尾の 0 を落とした十進表記（"1.20" → "1.2", "30000" → "30000"）
pub fn format_price(price: &BigDecimal) -> String {
    let (_, scale) = price.as_bigint_and_exponent();
    let price = if scale < 0 {
        price.with_scale(0)
    } else {
        price.clone()
    };
    let s = price.to_string();
    if s.contains('.') && !s.contains(['e', 'E']) {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
