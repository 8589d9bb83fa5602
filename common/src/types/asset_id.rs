use std::borrow::Borrow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 通貨やトークンを表す不透明な識別子
///
/// ティッカー (`BTC`) でもチェーン付きのトークンアドレス
/// (`_ceth_0x...`) でも構わない。中身の解釈はしない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AssetId(pub Box<str>);

impl AssetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AssetId(s.to_string().into_boxed_str()))
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        AssetId(value.into())
    }
}

impl From<String> for AssetId {
    fn from(value: String) -> Self {
        AssetId(value.into_boxed_str())
    }
}

impl Borrow<str> for AssetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests;
