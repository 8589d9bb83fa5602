use super::error::{ApiError, ApiJson};
use super::{AppState, respond};
use crate::logging::*;
use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::post;
use pricebook_common::ApiResponse;
use pricebook_common::prices::{
    DeleteHistoricalPriceRequest, HistoricalAssetsPriceRequest, SetHistoricalPriceRequest,
};
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route(
        "/historical_assets_price",
        post(query_historical_assets_price)
            .put(set_historical_price)
            .delete(delete_historical_price),
    )
}

async fn query_historical_assets_price(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<HistoricalAssetsPriceRequest>,
) -> std::result::Result<Response, ApiError> {
    let log = DEFAULT.new(o!(
        "function" => "web::query_historical_assets_price",
        "target_asset" => request.target_asset.to_string(),
        "async_query" => request.async_query,
    ));
    debug!(log, "start"; "pairs" => request.assets_timestamp.len());

    let async_query = request.async_query;
    let historian = state.historian.clone();
    historian
        .validate_query(&request.assets_timestamp, &request.target_asset)
        .await?;
    let job = async move {
        historian
            .query_historical_assets_price(&request.assets_timestamp, &request.target_asset)
            .await
            .map_err(ApiError::from)
    };
    respond(&state, "query_historical_assets_price", async_query, job).await
}

async fn set_historical_price(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SetHistoricalPriceRequest>,
) -> std::result::Result<Response, ApiError> {
    let log = DEFAULT.new(o!(
        "function" => "web::set_historical_price",
        "from_asset" => request.from_asset.to_string(),
        "to_asset" => request.to_asset.to_string(),
        "async_query" => request.async_query,
    ));
    debug!(log, "start"; "timestamp" => request.timestamp);

    let historian = state.historian.clone();
    historian.validate_set(&request).await?;
    let async_query = request.async_query;
    let job = async move {
        historian
            .set_historical_price(&request)
            .await
            .map(|_| true)
            .map_err(ApiError::from)
    };
    respond(&state, "set_historical_price", async_query, job).await
}

async fn delete_historical_price(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<DeleteHistoricalPriceRequest>,
) -> std::result::Result<axum::Json<ApiResponse<bool>>, ApiError> {
    state.historian.delete_historical_price(&request).await?;
    Ok(axum::Json(ApiResponse::success(true)))
}
