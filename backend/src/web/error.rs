use crate::price;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pricebook_common::ApiResponse;
use pricebook_common::tasks::TaskOutcome;
use serde::Serialize;
use thiserror::Error;

/// HTTP へ返すエラー。本文は常に結果封筒。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<price::Error> for ApiError {
    fn from(e: price::Error) -> ApiError {
        use price::Error::*;
        match e {
            UnknownAsset(_) | InvalidPrice(..) | InvalidTimestamp(_) | EmptyQuery => {
                ApiError::BadRequest(e.to_string())
            }
            DeleteFailed { .. } => ApiError::Conflict(e.to_string()),
            Storage(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiResponse::<serde_json::Value>::error(self.to_string());
        (status, Json(body)).into_response()
    }
}

/// 同期呼び出しで返したはずの内容をタスク結果として保持する
pub fn into_outcome<T>(result: Result<T, ApiError>) -> TaskOutcome
where
    T: Serialize,
{
    let ok = result.and_then(|value| {
        serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
    });
    match ok {
        Ok(value) => TaskOutcome {
            result: Some(value),
            message: String::new(),
            status_code: StatusCode::OK.as_u16(),
        },
        Err(e) => TaskOutcome {
            result: None,
            message: e.to_string(),
            status_code: e.status_code().as_u16(),
        },
    }
}

/// 不正な JSON を 422 ではなく 400 + 封筒で返す `Json`
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}
