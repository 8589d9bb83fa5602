//! 価格を扱える資産の登録簿
//!
//! 未登録の資産を含むリクエストは、価格の読み書きより前に拒否される。

use crate::logging::*;
use pricebook_common::config;
use pricebook_common::types::AssetId;
use std::collections::BTreeSet;
use tokio::sync::RwLock;

/// 起動時から既知とみなす法定通貨・暗号資産
const BUILTIN_ASSETS: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "CNY", "KRW", "BTC", "ETH", "XRP", "LTC",
    "BCH", "DAI", "USDC", "USDT",
];

#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: RwLock<BTreeSet<AssetId>>,
}

impl AssetRegistry {
    pub fn new<I, A>(assets: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AssetId>,
    {
        Self {
            assets: RwLock::new(assets.into_iter().map(Into::into).collect()),
        }
    }

    pub fn with_builtin() -> Self {
        Self::new(BUILTIN_ASSETS.iter().copied())
    }

    /// 組み込みの資産に `EXTRA_ASSETS`（カンマ区切り）を加える
    pub fn from_config() -> Self {
        let log = DEFAULT.new(o!("function" => "AssetRegistry::from_config"));
        let extra: Vec<String> = config::get("EXTRA_ASSETS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        info!(log, "loading assets";
            "builtin" => BUILTIN_ASSETS.len(),
            "extra" => extra.len(),
        );
        let mut registry = Self::with_builtin();
        registry
            .assets
            .get_mut()
            .extend(extra.into_iter().map(AssetId::from));
        registry
    }

    pub async fn is_known(&self, asset: &AssetId) -> bool {
        self.assets.read().await.contains(asset)
    }

    /// 与えられた中で最初に見つかった未登録の資産
    pub async fn first_unknown<'a, I>(&self, assets: I) -> Option<&'a AssetId>
    where
        I: IntoIterator<Item = &'a AssetId>,
    {
        let known = self.assets.read().await;
        assets.into_iter().find(|asset| !known.contains(*asset))
    }

    /// 新規登録なら true
    pub async fn register(&self, asset: AssetId) -> bool {
        let log = DEFAULT.new(o!(
            "function" => "AssetRegistry::register",
            "asset" => asset.to_string(),
        ));
        let inserted = self.assets.write().await.insert(asset);
        debug!(log, "registered"; "inserted" => inserted);
        inserted
    }

    pub async fn list(&self) -> Vec<AssetId> {
        self.assets.read().await.iter().cloned().collect()
    }
}
