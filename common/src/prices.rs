use crate::types::{AssetId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `POST /historical_assets_price`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoricalAssetsPriceRequest {
    pub assets_timestamp: Vec<(AssetId, Timestamp)>,
    pub target_asset: AssetId,
    #[serde(default)]
    pub async_query: bool,
}

/// asset → (タイムスタンプ文字列 → 価格文字列)
pub type AssetPrices = BTreeMap<AssetId, BTreeMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoricalAssetsPriceResponse {
    pub assets: AssetPrices,
    pub target_asset: AssetId,
}

impl HistoricalAssetsPriceResponse {
    pub fn price_of(&self, asset: &str, timestamp: Timestamp) -> Option<&str> {
        self.assets
            .get(asset)
            .and_then(|prices| prices.get(&timestamp.to_string()))
            .map(String::as_str)
    }
}

/// `PUT /historical_assets_price`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SetHistoricalPriceRequest {
    pub from_asset: AssetId,
    pub to_asset: AssetId,
    pub timestamp: Timestamp,
    pub price: String,
    #[serde(default)]
    pub async_query: bool,
}

/// `DELETE /historical_assets_price`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeleteHistoricalPriceRequest {
    pub from_asset: AssetId,
    pub to_asset: AssetId,
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests;
