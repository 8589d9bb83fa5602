mod assets;
mod basic;
pub mod error;
mod prices;
mod tasks;

use crate::Result;
use crate::logging::*;
use crate::price::PriceHistorian;
use crate::tasks::TaskManager;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use error::{ApiError, into_outcome};
use pricebook_common::tasks::AsyncTask;
use pricebook_common::{ApiResponse, config};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub struct AppState {
    pub historian: Arc<PriceHistorian>,
    pub tasks: Arc<TaskManager>,
}

pub async fn run(state: Arc<AppState>) -> Result<()> {
    let log = DEFAULT.new(o!("function" => "web::run"));
    let bind = config::get("SERVER_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = TcpListener::bind(&bind).await?;
    info!(log, "listening"; "addr" => &bind);
    serve(listener, state).await
}

pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    add_routes(
        Router::new(),
        &[
            basic::add_route,
            prices::add_route,
            tasks::add_route,
            assets::add_route,
        ],
    )
    .with_state(state)
    .layer(cors)
}

fn add_routes<T>(app: Router<T>, funcs: &[fn(Router<T>) -> Router<T>]) -> Router<T> {
    let mut app = app;
    for func in funcs {
        app = func(app);
    }
    app
}

/// `async_query` ならタスクとして起動して ID を返し、そうでなければその場で待つ
///
/// どちらの場合も結果の形は同じで、非同期側はタスクの outcome に入る。
async fn respond<T, F>(
    state: &AppState,
    name: &'static str,
    async_query: bool,
    job: F,
) -> std::result::Result<Response, ApiError>
where
    T: Serialize + Send + 'static,
    F: Future<Output = std::result::Result<T, ApiError>> + Send + 'static,
{
    if async_query {
        let task_id = state
            .tasks
            .spawn(name, async move { into_outcome(job.await) })
            .await;
        return Ok(Json(ApiResponse::success(AsyncTask { task_id })).into_response());
    }
    let result = job.await?;
    Ok(Json(ApiResponse::success(result)).into_response())
}

#[cfg(test)]
mod tests;
