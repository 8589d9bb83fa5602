use super::*;

#[test]
fn test_request_async_query_defaults_to_false() {
    let request: HistoricalAssetsPriceRequest = serde_json::from_str(
        r#"{"assets_timestamp": [["BTC", 1579543935]], "target_asset": "USD"}"#,
    )
    .unwrap();
    assert!(!request.async_query);
    assert_eq!(
        request.assets_timestamp,
        vec![(AssetId::from("BTC"), 1579543935)]
    );
}

#[test]
fn test_set_request_keeps_price_as_text() {
    let request: SetHistoricalPriceRequest = serde_json::from_str(
        r#"{"from_asset": "EUR", "to_asset": "USD", "timestamp": 1611166335, "price": "1.20", "async_query": true}"#,
    )
    .unwrap();
    assert_eq!(request.price, "1.20");
    assert!(request.async_query);
}

#[test]
fn test_response_shape() {
    let mut assets = AssetPrices::new();
    assets
        .entry("XRP".into())
        .or_default()
        .insert("1611166335".to_string(), "0".to_string());
    let response = HistoricalAssetsPriceResponse {
        assets,
        target_asset: "USD".into(),
    };

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "assets": {"XRP": {"1611166335": "0"}},
            "target_asset": "USD",
        })
    );
    assert_eq!(response.price_of("XRP", 1611166335), Some("0"));
    assert_eq!(response.price_of("XRP", 1), None);
    assert_eq!(response.price_of("BTC", 1611166335), None);
}
