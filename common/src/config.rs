use crate::Result;
use anyhow::anyhow;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

// TOML configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub prices: PricesConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize)]
pub struct PricesConfig {
    /// 要求タイムスタンプと保存済み価格との許容距離（秒）
    #[serde(default = "default_max_seconds_distance")]
    pub max_seconds_distance: u64,
    /// 起動時に読み込む価格の JSON ファイル
    #[serde(default)]
    pub seed_file: String,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// 空ならメモリ上のストアを使う
    #[serde(default)]
    pub pg_dsn: String,
    #[serde(default = "default_pg_pool_size")]
    pub pg_pool_size: u32,
}

#[derive(Debug, Deserialize, Default)]
pub struct AssetsConfig {
    #[serde(default)]
    pub extra: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_task_poll_interval")]
    pub task_poll_interval: String,
    #[serde(default = "default_task_timeout")]
    pub task_timeout: String,
}

#[derive(Debug, Deserialize)]
pub struct TasksConfig {
    /// 取りに来られなかった非同期タスクの結果を保持する期間
    #[serde(default = "default_task_result_ttl")]
    pub result_ttl: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_rust_log_format")]
    pub rust_log_format: String,
}

// Default value functions
fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_max_seconds_distance() -> u64 {
    3600
}
fn default_pg_pool_size() -> u32 {
    16
}
fn default_backend_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_task_poll_interval() -> String {
    "100ms".to_string()
}
fn default_task_timeout() -> String {
    "30s".to_string()
}
fn default_task_result_ttl() -> String {
    "1h".to_string()
}
fn default_rust_log_format() -> String {
    "json".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            max_seconds_distance: default_max_seconds_distance(),
            seed_file: String::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            pg_dsn: String::new(),
            pg_pool_size: default_pg_pool_size(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            task_poll_interval: default_task_poll_interval(),
            task_timeout: default_task_timeout(),
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            result_ttl: default_task_result_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log_format: default_rust_log_format(),
        }
    }
}

static CONFIG: Lazy<Config> = Lazy::new(|| {
    load_config().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config files: {}. Using defaults.",
            e
        );
        Config::default()
    })
});

static CONFIG_STORE: Lazy<Arc<Mutex<HashMap<String, String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(HashMap::new())));

pub fn get(name: &str) -> Result<String> {
    // Priority 1: CONFIG_STORE (runtime overrides)
    if let Some(value) = get_from_store(name) {
        if value.is_empty() {
            return Err(anyhow!("{} is empty", name));
        }
        return Ok(value);
    }

    // Priority 2: Environment variables
    if let Ok(val) = std::env::var(name)
        && !val.is_empty()
    {
        return Ok(val);
    }

    // Priority 3: TOML config
    let toml_value = match name {
        "SERVER_BIND" => Some(CONFIG.server.bind.clone()),
        "PRICE_MAX_SECONDS_DISTANCE" => Some(CONFIG.prices.max_seconds_distance.to_string()),
        "PRICES_SEED_FILE" => Some(CONFIG.prices.seed_file.clone()),
        "PG_DSN" => Some(CONFIG.database.pg_dsn.clone()),
        "PG_POOL_SIZE" => Some(CONFIG.database.pg_pool_size.to_string()),
        "EXTRA_ASSETS" => Some(CONFIG.assets.extra.join(",")),
        "BACKEND_URL" => Some(CONFIG.client.backend_url.clone()),
        "TASK_POLL_INTERVAL" => Some(CONFIG.client.task_poll_interval.clone()),
        "TASK_TIMEOUT" => Some(CONFIG.client.task_timeout.clone()),
        "TASK_RESULT_TTL" => Some(CONFIG.tasks.result_ttl.clone()),
        "RUST_LOG_FORMAT" => Some(CONFIG.logging.rust_log_format.clone()),
        _ => None,
    };

    if let Some(value) = toml_value
        && !value.is_empty()
    {
        return Ok(value);
    }

    Err(anyhow!("Configuration key not found: {}", name))
}

/// 数値として読めない場合はデフォルト値
pub fn get_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    get(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[allow(dead_code)] // This function is not used in the code, but it is needed for tests
pub fn set(name: &str, value: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.insert(name.to_string(), value.to_string());
    }
}

#[allow(dead_code)]
pub fn unset(name: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.remove(name);
    }
}

fn get_from_store(name: &str) -> Option<String> {
    if let Ok(store) = CONFIG_STORE.lock() {
        store.get(name).cloned()
    } else {
        None
    }
}

/// Load configuration from TOML files with priority:
/// 1. config/config.local.toml (git-ignored, for local overrides)
/// 2. config/config.toml (git-managed template)
/// 3. Default values
fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let base_path = "config/config.toml";
    if Path::new(base_path).exists() {
        let content = fs::read_to_string(base_path)?;
        config = toml::from_str(&content)?;
    }

    let local_path = "config/config.local.toml";
    if Path::new(local_path).exists() {
        let content = fs::read_to_string(local_path)?;
        let local_config: Config = toml::from_str(&content)?;
        merge_config(&mut config, local_config);
    }

    Ok(config)
}

/// Merge local config into base config (local values override base values)
fn merge_config(base: &mut Config, local: Config) {
    // Server
    if local.server.bind != default_bind() {
        base.server.bind = local.server.bind;
    }

    // Prices
    if local.prices.max_seconds_distance != default_max_seconds_distance() {
        base.prices.max_seconds_distance = local.prices.max_seconds_distance;
    }
    if !local.prices.seed_file.is_empty() {
        base.prices.seed_file = local.prices.seed_file;
    }

    // Database
    if !local.database.pg_dsn.is_empty() {
        base.database.pg_dsn = local.database.pg_dsn;
    }
    if local.database.pg_pool_size != default_pg_pool_size() {
        base.database.pg_pool_size = local.database.pg_pool_size;
    }

    // Assets (追加分は足し合わせる)
    for asset in local.assets.extra {
        if !base.assets.extra.contains(&asset) {
            base.assets.extra.push(asset);
        }
    }

    // Client
    if local.client.backend_url != default_backend_url() {
        base.client.backend_url = local.client.backend_url;
    }
    if local.client.task_poll_interval != default_task_poll_interval() {
        base.client.task_poll_interval = local.client.task_poll_interval;
    }
    if local.client.task_timeout != default_task_timeout() {
        base.client.task_timeout = local.client.task_timeout;
    }

    // Tasks
    if local.tasks.result_ttl != default_task_result_ttl() {
        base.tasks.result_ttl = local.tasks.result_ttl;
    }

    // Logging
    if local.logging.rust_log_format != default_rust_log_format() {
        base.logging.rust_log_format = local.logging.rust_log_format;
    }
}
