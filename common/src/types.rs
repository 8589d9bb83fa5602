pub mod asset_id;

pub use self::asset_id::AssetId;

/// UNIX 秒
pub type Timestamp = u64;
