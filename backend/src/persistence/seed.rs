//! 起動時に JSON ファイルから価格を流し込む

use super::historical_price::{HistoricalPrice, PriceStore};
use crate::Result;
use crate::assets::AssetRegistry;
use crate::logging::*;
use crate::price::{check_timestamp, parse_price};
use anyhow::bail;
use pricebook_common::config;
use pricebook_common::types::{AssetId, Timestamp};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SeedPrice {
    from_asset: AssetId,
    to_asset: AssetId,
    timestamp: Timestamp,
    price: String,
}

/// JSON 配列を読んで imported の記録にする
pub fn parse(text: &str) -> Result<Vec<HistoricalPrice>> {
    let records: Vec<SeedPrice> = serde_json::from_str(text)?;
    records
        .into_iter()
        .map(|r| {
            check_timestamp(r.timestamp)?;
            let price = parse_price(&r.price)?;
            Ok(HistoricalPrice::imported(
                r.from_asset,
                r.to_asset,
                r.timestamp,
                price,
            ))
        })
        .collect()
}

/// 未登録の資産を含む記録は照会できないので、読み込み自体を失敗させる
pub async fn ensure_known_assets(
    prices: &[HistoricalPrice],
    registry: &AssetRegistry,
) -> Result<()> {
    let assets = prices.iter().flat_map(|p| [&p.from_asset, &p.to_asset]);
    if let Some(unknown) = registry.first_unknown(assets).await {
        bail!("Seed price refers to unknown asset {}", unknown);
    }
    Ok(())
}

/// `PRICES_SEED_FILE` があれば読み込み、書き込んだ件数を返す
pub async fn load_from_config(store: &dyn PriceStore, registry: &AssetRegistry) -> Result<usize> {
    let log = DEFAULT.new(o!("function" => "seed::load_from_config"));
    let Ok(path) = config::get("PRICES_SEED_FILE") else {
        debug!(log, "no seed file configured");
        return Ok(0);
    };
    let text = tokio::fs::read_to_string(&path).await?;
    let prices = parse(&text)?;
    ensure_known_assets(&prices, registry).await?;
    let count = prices.len();
    store.add_historical_prices(prices).await?;
    info!(log, "seeded prices"; "path" => &path, "count" => count);
    Ok(count)
}
