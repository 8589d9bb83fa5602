use super::AppState;
use super::error::{ApiError, ApiJson};
use crate::logging::*;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use pricebook_common::ApiResponse;
use pricebook_common::assets::{AssetsResponse, RegisterAssetRequest};
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/assets", get(list_assets).post(register_asset))
}

async fn list_assets(State(state): State<Arc<AppState>>) -> Json<ApiResponse<AssetsResponse>> {
    let assets = state.historian.registry().list().await;
    Json(ApiResponse::success(AssetsResponse { assets }))
}

/// 既に登録済みなら false
async fn register_asset(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterAssetRequest>,
) -> std::result::Result<Json<ApiResponse<bool>>, ApiError> {
    let log = DEFAULT.new(o!(
        "function" => "web::register_asset",
        "asset" => request.identifier.to_string(),
    ));
    if request.identifier.as_str().trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Asset identifier must not be empty".to_string(),
        ));
    }
    let registry = state.historian.registry();
    if registry.is_known(&request.identifier).await {
        debug!(log, "already known");
        return Ok(Json(ApiResponse::success(false)));
    }
    let inserted = registry.register(request.identifier).await;
    info!(log, "asset registered"; "inserted" => inserted);
    Ok(Json(ApiResponse::success(inserted)))
}
