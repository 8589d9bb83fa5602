pub mod backend;
pub mod traits;

use crate::config;
use humantime::parse_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// 統一されたAPIエラー型
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Client error ({0}): {1}")]
    Client(u16, String),
    #[error("Timeout error: {0}")]
    Timeout(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// HTTP ステータスに応じて Client / Server を振り分ける
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if (400..500).contains(&status) {
            ApiError::Client(status, message.into())
        } else {
            ApiError::Server(message.into())
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Client(status, _) => Some(*status),
            _ => None,
        }
    }
}

/// 統一されたAPIクライアント設定
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// 非同期タスクの状態を問い合わせる間隔
    pub poll_interval: Duration,
    /// 非同期タスクの完了を待つ上限
    pub task_timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            task_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiClientConfig {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            ..Default::default()
        }
    }

    /// `BACKEND_URL` / `TASK_POLL_INTERVAL` / `TASK_TIMEOUT` から構築
    pub fn from_config() -> Self {
        let defaults = Self::default();
        let duration_of = |name: &str, default: Duration| {
            config::get(name)
                .ok()
                .and_then(|v| parse_duration(&v).ok())
                .unwrap_or(default)
        };
        Self {
            base_url: config::get("BACKEND_URL").unwrap_or(defaults.base_url),
            timeout: defaults.timeout,
            poll_interval: duration_of("TASK_POLL_INTERVAL", defaults.poll_interval),
            task_timeout: duration_of("TASK_TIMEOUT", defaults.task_timeout),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_task_timeout(mut self, task_timeout: Duration) -> Self {
        self.task_timeout = task_timeout;
        self
    }
}
