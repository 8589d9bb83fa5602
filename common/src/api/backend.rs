use super::traits::ApiClient;
use super::{ApiClientConfig, ApiError};
use crate::{
    ApiResponse,
    assets::{AssetsResponse, RegisterAssetRequest},
    prices::{
        DeleteHistoricalPriceRequest, HistoricalAssetsPriceRequest, HistoricalAssetsPriceResponse,
        SetHistoricalPriceRequest,
    },
    tasks::{AsyncTask, TaskId, TaskList, TaskOutcome, TaskResult, TaskStatus},
    types::{AssetId, Timestamp},
};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

const HISTORICAL_ASSETS_PRICE: &str = "/historical_assets_price";

pub struct BackendClient {
    client: Client,
    config: ApiClientConfig,
}

impl BackendClient {
    /// 設定ファイル・環境変数から構築
    pub fn new() -> Self {
        Self::new_with_config(ApiClientConfig::from_config())
    }

    /// URLを指定するコンストラクタ
    pub fn new_with_url(base_url: String) -> Self {
        Self::new_with_config(ApiClientConfig::new(base_url))
    }

    /// 設定を指定するコンストラクタ
    pub fn new_with_config(config: ApiClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

impl Default for BackendClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiClient for BackendClient {
    type Config = ApiClientConfig;

    fn new(config: Self::Config) -> Self {
        Self::new_with_config(config)
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .get(format!("{}/healthcheck", self.base_url()))
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::Server(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }

    async fn request<T, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<T>,
    ) -> Result<ApiResponse<R>, ApiError>
    where
        T: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let url = format!("{}{}", self.base_url(), path);
        let mut request = self.client.request(method, &url);

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            // エラー時もサーバは封筒を返すので message を取り出す
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&error_text)
                .map(|r| r.message)
                .unwrap_or(error_text);
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

impl BackendClient {
    /// 同期・非同期どちらのモードでも同じ形の結果を返す
    async fn dispatch<T, R>(
        &self,
        method: Method,
        path: &str,
        body: T,
        async_query: bool,
    ) -> Result<R, ApiError>
    where
        T: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        if !async_query {
            let response: ApiResponse<R> = self.request(method, path, Some(body)).await?;
            return response.into_result().map_err(ApiError::Server);
        }

        let response: ApiResponse<AsyncTask> = self.request(method, path, Some(body)).await?;
        let task = response.into_result().map_err(ApiError::Server)?;
        let outcome = self.wait_for_task(task.task_id).await?;
        if !outcome.is_success() {
            return Err(ApiError::from_status(outcome.status_code, outcome.message));
        }
        outcome
            .into_response::<R>()
            .map_err(|e| ApiError::Parse(e.to_string()))?
            .into_result()
            .map_err(ApiError::Server)
    }

    pub async fn get_historical_assets_price(
        &self,
        assets_timestamp: Vec<(AssetId, Timestamp)>,
        target_asset: AssetId,
        async_query: bool,
    ) -> Result<HistoricalAssetsPriceResponse, ApiError> {
        let request = HistoricalAssetsPriceRequest {
            assets_timestamp,
            target_asset,
            async_query,
        };
        self.dispatch(Method::POST, HISTORICAL_ASSETS_PRICE, request, async_query)
            .await
    }

    pub async fn set_historical_price(
        &self,
        from_asset: AssetId,
        to_asset: AssetId,
        timestamp: Timestamp,
        price: &str,
        async_query: bool,
    ) -> Result<bool, ApiError> {
        let request = SetHistoricalPriceRequest {
            from_asset,
            to_asset,
            timestamp,
            price: price.to_string(),
            async_query,
        };
        self.dispatch(Method::PUT, HISTORICAL_ASSETS_PRICE, request, async_query)
            .await
    }

    pub async fn delete_historical_price(
        &self,
        from_asset: AssetId,
        to_asset: AssetId,
        timestamp: Timestamp,
    ) -> Result<bool, ApiError> {
        let request = DeleteHistoricalPriceRequest {
            from_asset,
            to_asset,
            timestamp,
        };
        self.dispatch(Method::DELETE, HISTORICAL_ASSETS_PRICE, request, false)
            .await
    }

    pub async fn list_assets(&self) -> Result<Vec<AssetId>, ApiError> {
        let response: ApiResponse<AssetsResponse> =
            self.request::<(), _>(Method::GET, "/assets", None).await?;
        Ok(response.into_result().map_err(ApiError::Server)?.assets)
    }

    pub async fn register_asset(&self, identifier: AssetId) -> Result<bool, ApiError> {
        let request = RegisterAssetRequest { identifier };
        self.dispatch(Method::POST, "/assets", request, false).await
    }

    pub async fn list_tasks(&self) -> Result<TaskList, ApiError> {
        let response: ApiResponse<TaskList> =
            self.request::<(), _>(Method::GET, "/tasks", None).await?;
        response.into_result().map_err(ApiError::Server)
    }

    /// 未知のタスクは `TaskStatus::NotFound` として返す
    pub async fn query_task(&self, task_id: TaskId) -> Result<TaskResult, ApiError> {
        let path = format!("/tasks/{task_id}");
        match self.request::<(), TaskResult>(Method::GET, &path, None).await {
            Ok(response) => response.into_result().map_err(ApiError::Server),
            Err(ApiError::Client(status, _)) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(TaskResult {
                    status: TaskStatus::NotFound,
                    outcome: None,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn cancel_task(&self, task_id: TaskId) -> Result<bool, ApiError> {
        let path = format!("/tasks/{task_id}");
        let response: ApiResponse<bool> = self.request::<(), _>(Method::DELETE, &path, None).await?;
        response.into_result().map_err(ApiError::Server)
    }

    /// タスクが完了するまでポーリングする
    pub async fn wait_for_task(&self, task_id: TaskId) -> Result<TaskOutcome, ApiError> {
        let deadline = tokio::time::Instant::now() + self.config.task_timeout;
        loop {
            let task = self.query_task(task_id).await?;
            match task.status {
                TaskStatus::Pending => {}
                TaskStatus::Completed | TaskStatus::Failed => {
                    return task.outcome.ok_or_else(|| {
                        ApiError::Parse(format!("task {task_id} finished without outcome"))
                    });
                }
                TaskStatus::NotFound => {
                    return Err(ApiError::Client(
                        StatusCode::NOT_FOUND.as_u16(),
                        format!("No task with id {task_id} found"),
                    ));
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ApiError::Timeout(format!(
                    "task {task_id} did not finish within {:?}",
                    self.config.task_timeout
                )));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
