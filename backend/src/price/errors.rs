use pricebook_common::types::{AssetId, Timestamp};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown asset {0} provided")]
    UnknownAsset(AssetId),
    #[error("Invalid price {0:?}: {1}")]
    InvalidPrice(String, String),
    #[error("Invalid timestamp {0}: must not exceed {max}", max = i64::MAX)]
    InvalidTimestamp(Timestamp),
    #[error("No assets given for the historical price query")]
    EmptyQuery,
    #[error("Failed to delete manual price of {from_asset} in {to_asset} at {timestamp}")]
    DeleteFailed {
        from_asset: AssetId,
        to_asset: AssetId,
        timestamp: Timestamp,
    },
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Error {
        Error::Storage(format!("{e:#}"))
    }
}
