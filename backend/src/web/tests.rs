use super::*;
use crate::assets::AssetRegistry;
use crate::persistence::historical_price::{HistoricalPrice, MemoryPriceStore, PriceStore};
use assertables::*;
use bigdecimal::BigDecimal;
use pricebook_common::api::backend::BackendClient;
use pricebook_common::api::{ApiClientConfig, ApiError as ClientError};
use pricebook_common::api::traits::ApiClient;
use pricebook_common::tasks::{TaskList, TaskStatus};
use pricebook_common::types::AssetId;
use std::str::FromStr;
use std::time::Duration;

const SEUR: &str = "_ceth_0xD71eCFF9342A5Ced620049e616c5035F1dB98620";

struct TestServer {
    client: BackendClient,
    base_url: String,
    store: Arc<MemoryPriceStore>,
    state: Arc<AppState>,
}

async fn fixture_store() -> Arc<MemoryPriceStore> {
    let store = Arc::new(MemoryPriceStore::new());
    let quotes = [
        ("BTC", 1579543935, "30000"),
        ("BTC", 1611166335, "35000"),
        ("USD", 1579543935, "1"),
        ("GBP", 1548007935, "1.25"),
        ("GBP", 1611166335, "1.27"),
        ("XRP", 1611166335, "0"),
    ];
    let prices = quotes
        .iter()
        .map(|(asset, ts, price)| {
            HistoricalPrice::imported(
                (*asset).into(),
                "USD".into(),
                *ts,
                BigDecimal::from_str(price).unwrap(),
            )
        })
        .collect();
    store.add_historical_prices(prices).await.unwrap();
    store
}

async fn start_server() -> TestServer {
    let store = fixture_store().await;
    let registry = Arc::new(AssetRegistry::new(["BTC", "USD", "GBP", "XRP", "EUR", SEUR]));
    let historian = Arc::new(PriceHistorian::new(registry, store.clone(), 3600));
    let state = Arc::new(AppState {
        historian,
        tasks: Arc::new(TaskManager::new()),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, state.clone()));

    let base_url = format!("http://{addr}");
    let config = ApiClientConfig::new(base_url.clone())
        .with_poll_interval(Duration::from_millis(10))
        .with_task_timeout(Duration::from_secs(5));
    TestServer {
        client: BackendClient::new_with_config(config),
        base_url,
        store,
        state,
    }
}

fn fixture_query() -> Vec<(AssetId, u64)> {
    vec![
        ("BTC".into(), 1579543935),
        ("BTC".into(), 1611166335),
        ("USD".into(), 1579543935),
        ("GBP".into(), 1548007935),
        ("GBP".into(), 1611166335),
        ("XRP".into(), 1611166335),
    ]
}

#[tokio::test]
async fn test_healthcheck() {
    let server = start_server().await;
    server.client.health_check().await.unwrap();
}

#[tokio::test]
async fn test_query_fixture_sync() {
    let server = start_server().await;
    let result = server
        .client
        .get_historical_assets_price(fixture_query(), "USD".into(), false)
        .await
        .unwrap();

    assert_eq!(result.target_asset, AssetId::from("USD"));
    assert_eq!(result.assets.len(), 4);
    assert_eq!(result.price_of("BTC", 1579543935), Some("30000"));
    assert_eq!(result.price_of("BTC", 1611166335), Some("35000"));
    assert_eq!(result.price_of("USD", 1579543935), Some("1"));
    assert_eq!(result.price_of("GBP", 1548007935), Some("1.25"));
    assert_eq!(result.price_of("GBP", 1611166335), Some("1.27"));
    assert_eq!(result.price_of("XRP", 1611166335), Some("0"));
}

#[tokio::test]
async fn test_query_sync_and_async_are_identical() {
    let server = start_server().await;
    let sync = server
        .client
        .get_historical_assets_price(fixture_query(), "USD".into(), false)
        .await
        .unwrap();
    let async_result = server
        .client
        .get_historical_assets_price(fixture_query(), "USD".into(), true)
        .await
        .unwrap();
    assert_eq!(sync, async_result);
}

#[tokio::test]
async fn test_async_query_returns_task_id() {
    let server = start_server().await;
    let body = serde_json::json!({
        "assets_timestamp": [["BTC", 1579543935]],
        "target_asset": "USD",
        "async_query": true,
    });
    let response: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/historical_assets_price", server.base_url))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["message"], "");
    let task_id = response["result"]["task_id"].as_u64().unwrap();

    let outcome = server.client.wait_for_task(task_id).await.unwrap();
    assert!(outcome.is_success());
    let outcome = outcome.result.unwrap();
    assert_eq!(outcome["assets"]["BTC"]["1579543935"], "30000");

    // 受け渡し済みの結果は消えている
    let again = server.client.query_task(task_id).await.unwrap();
    assert_eq!(again.status, TaskStatus::NotFound);
}

#[tokio::test]
async fn test_set_then_query() {
    let server = start_server().await;
    for async_query in [false, true] {
        let timestamp = if async_query { 1611166335 } else { 1579543935 };
        let done = server
            .client
            .set_historical_price(SEUR.into(), "USD".into(), timestamp, "1.2", async_query)
            .await
            .unwrap();
        assert!(done);

        let result = server
            .client
            .get_historical_assets_price(vec![(SEUR.into(), timestamp)], "USD".into(), false)
            .await
            .unwrap();
        assert_eq!(result.price_of(SEUR, timestamp), Some("1.2"));
    }
}

#[tokio::test]
async fn test_set_unknown_asset_is_rejected() {
    let server = start_server().await;
    let before = server.store.len().await;

    for async_query in [false, true] {
        let err = server
            .client
            .set_historical_price("NOPE".into(), "USD".into(), 1579543935, "2", async_query)
            .await
            .unwrap_err();
        match err {
            ClientError::Client(status, message) => {
                assert_eq!(status, 400);
                assert_contains!(message, "Unknown asset");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(server.store.len().await, before);
    // 非同期でも検査で弾かれたものはタスクにならない
    assert_eq!(server.client.list_tasks().await.unwrap(), TaskList::default());
}

#[tokio::test]
async fn test_query_unknown_asset_is_rejected() {
    let server = start_server().await;
    let err = server
        .client
        .get_historical_assets_price(vec![("BTC".into(), 1579543935)], "NOPE".into(), false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_contains!(err.to_string(), "Unknown asset NOPE provided");
}

#[tokio::test]
async fn test_invalid_price_is_rejected() {
    let server = start_server().await;
    let err = server
        .client
        .set_historical_price("BTC".into(), "USD".into(), 1579543935, "-1", false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = start_server().await;
    let response = reqwest::Client::new()
        .post(format!("{}/historical_assets_price", server.base_url))
        .header("content-type", "application/json")
        .body("{\"assets_timestamp\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["result"].is_null());
    assert_ne!(body["message"], "");
}

#[tokio::test]
async fn test_delete_price() {
    let server = start_server().await;
    let deleted = server
        .client
        .delete_historical_price("GBP".into(), "USD".into(), 1548007935)
        .await
        .unwrap();
    assert!(deleted);

    let err = server
        .client
        .delete_historical_price("GBP".into(), "USD".into(), 1548007935)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn test_unknown_task() {
    let server = start_server().await;
    let result = server.client.query_task(9999).await.unwrap();
    assert_eq!(result.status, TaskStatus::NotFound);

    let err = server.client.cancel_task(9999).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_cancel_pending_task() {
    let server = start_server().await;
    let task_id = server
        .state
        .tasks
        .spawn("sleep", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            into_outcome(Ok::<_, ApiError>(true))
        })
        .await;

    let listed = server.client.list_tasks().await.unwrap();
    assert_eq!(listed.pending, vec![task_id]);

    assert!(server.client.cancel_task(task_id).await.unwrap());
    let result = server.client.query_task(task_id).await.unwrap();
    assert_eq!(result.status, TaskStatus::NotFound);
}

#[tokio::test]
async fn test_assets() {
    let server = start_server().await;
    let assets = server.client.list_assets().await.unwrap();
    assert_contains!(assets, &AssetId::from("BTC"));
    assert_not_contains!(assets, &AssetId::from("DOGE"));

    assert!(server.client.register_asset("DOGE".into()).await.unwrap());
    assert!(!server.client.register_asset("DOGE".into()).await.unwrap());

    let done = server
        .client
        .set_historical_price("DOGE".into(), "USD".into(), 1611166335, "0.01", false)
        .await
        .unwrap();
    assert!(done);
}

#[tokio::test]
async fn test_timestamp_beyond_storage_is_bad_request() {
    let server = start_server().await;
    let too_late = i64::MAX as u64 + 1;
    for async_query in [false, true] {
        let err = server
            .client
            .set_historical_price("BTC".into(), "USD".into(), too_late, "1", async_query)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_contains!(err.to_string(), "Invalid timestamp");
    }
    let err = server
        .client
        .get_historical_assets_price(vec![("BTC".into(), too_late)], "USD".into(), false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}
