use super::AppState;
use super::error::ApiError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pricebook_common::ApiResponse;
use pricebook_common::tasks::{TaskId, TaskList, TaskStatus};
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/tasks", get(list_tasks))
        .route("/tasks/{task_id}", get(query_task).delete(cancel_task))
}

async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<ApiResponse<TaskList>> {
    Json(ApiResponse::success(state.tasks.list().await))
}

/// 完了済みの結果はこの呼び出しで受け渡され、以後は not-found になる
async fn query_task(State(state): State<Arc<AppState>>, Path(task_id): Path<TaskId>) -> Response {
    let result = state.tasks.query(task_id).await;
    if result.status == TaskStatus::NotFound {
        let body = ApiResponse {
            result: Some(result),
            message: format!("No task with id {task_id} found"),
        };
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    }
    Json(ApiResponse::success(result)).into_response()
}

async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<TaskId>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    if state.tasks.cancel(task_id).await {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::NotFound(format!("No task with id {task_id} found")))
    }
}
