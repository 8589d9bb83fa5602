use crate::ApiResponse;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub type TaskId = u64;

/// `async_query: true` のときに即座に返るタスクハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct AsyncTask {
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
    NotFound,
}

/// 完了したタスクの結果
///
/// 同期呼び出しで返ったはずの封筒と HTTP ステータスをそのまま保持する。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskOutcome {
    pub result: Option<serde_json::Value>,
    pub message: String,
    pub status_code: u16,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }

    /// 同期呼び出しと同じ形の封筒に戻す
    pub fn into_response<T>(self) -> serde_json::Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let result = self.result.map(serde_json::from_value).transpose()?;
        Ok(ApiResponse {
            result,
            message: self.message,
        })
    }
}

/// `GET /tasks/{task_id}`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskResult {
    pub status: TaskStatus,
    pub outcome: Option<TaskOutcome>,
}

/// `GET /tasks`
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct TaskList {
    pub pending: Vec<TaskId>,
    pub completed: Vec<TaskId>,
}

#[cfg(test)]
mod tests;
