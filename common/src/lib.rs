pub mod api;
pub mod assets;
pub mod config;
pub mod prices;
pub mod tasks;
pub mod types;

use serde::{Deserialize, Serialize};

type Result<T> = anyhow::Result<T>;

/// 全エンドポイント共通のレスポンス封筒
///
/// 成功時は `result` に値が入り `message` は空、失敗時は `result` が null で
/// `message` にエラー内容が入る。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(result: T) -> Self {
        Self {
            result: Some(result),
            message: String::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: None,
            message: message.into(),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, String> {
        match self.result {
            Some(value) => Ok(value),
            None => Err(self.message),
        }
    }
}
