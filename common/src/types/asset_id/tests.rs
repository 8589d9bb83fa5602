use super::*;

#[test]
fn test_asset_id_is_transparent_string() {
    let id: AssetId = "_ceth_0xD71eCFF9342A5Ced620049e616c5035F1dB98620".into();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"_ceth_0xD71eCFF9342A5Ced620049e616c5035F1dB98620\"");

    let back: AssetId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn test_asset_id_display_and_parse() {
    let id: AssetId = "BTC".parse().unwrap();
    assert_eq!(id.to_string(), "BTC");
    assert_eq!(id.as_str(), "BTC");
}

#[test]
fn test_asset_id_tuple_from_json_array() {
    // [asset, timestamp] の配列形式でリクエストに現れる
    let pair: (AssetId, u64) = serde_json::from_str(r#"["GBP", 1548007935]"#).unwrap();
    assert_eq!(pair.0, AssetId::from("GBP"));
    assert_eq!(pair.1, 1548007935);

    let negative: Result<(AssetId, u64), _> = serde_json::from_str(r#"["GBP", -1]"#);
    assert!(negative.is_err());
}
