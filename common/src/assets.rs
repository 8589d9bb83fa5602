use crate::types::AssetId;
use serde::{Deserialize, Serialize};

/// `POST /assets`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegisterAssetRequest {
    pub identifier: AssetId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetsResponse {
    pub assets: Vec<AssetId>,
}
