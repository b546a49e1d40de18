//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，第三方数据源的 API Key 可由环境变量覆盖

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 外部 API 请求配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 价格缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 数据有效期（秒），过期后下一次读取时整体重新生成
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// 历史价格保留天数
    #[serde(default = "default_history_days")]
    pub history_days: usize,
}

/// 查询缺省值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// 未知城市时使用的城市
    #[serde(default = "default_city")]
    pub city: String,
    /// 未知省份时使用的省份
    #[serde(default = "default_province")]
    pub province: String,
}

/// 第三方数据源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// 天行数据
    Tianapi,
    /// 聚合数据
    Juhe,
}

impl ProviderKind {
    /// 覆盖 API Key 的环境变量名
    pub fn key_env(self) -> &'static str {
        match self {
            ProviderKind::Tianapi => "TIANAPI_KEY",
            ProviderKind::Juhe => "JUHE_KEY",
        }
    }
}

/// 第三方数据源配置，按数组顺序依次尝试
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// API Key（为空则跳过该数据源）
    #[serde(default)]
    pub api_key: String,
    /// 覆盖默认接口地址
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// API 配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
    /// 查询缺省值
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// 数据源链
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_timeout() -> u64 { 10 }
fn default_connect_timeout() -> u64 { 5 }
fn default_log_level() -> String { "info".to_string() }
fn default_refresh_interval() -> u64 { 3600 }
fn default_history_days() -> usize { 90 }
fn default_city() -> String { "北京".to_string() }
fn default_province() -> String { "北京市".to_string() }
fn default_enabled() -> bool { true }

fn default_providers() -> Vec<ProviderConfig> {
    [ProviderKind::Tianapi, ProviderKind::Juhe]
        .into_iter()
        .map(|kind| ProviderConfig {
            kind,
            api_key: String::new(),
            base_url: None,
            enabled: true,
        })
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            history_days: default_history_days(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            city: default_city(),
            province: default_province(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            log: LogConfig::default(),
            cache: CacheConfig::default(),
            defaults: DefaultsConfig::default(),
            providers: default_providers(),
        }
    }
}

/// 配置来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Default,
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置
    ///
    /// 指定了路径时必须加载成功；否则依次尝试 `config.json`、`config/config.json`，
    /// 都不存在时使用默认值。日志系统尚未初始化，调用方根据返回的来源自行打印。
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)
                .map_err(|e| anyhow::anyhow!("加载配置文件 {} 失败: {}", path.display(), e))?;
            return Ok((config, ConfigSource::File(path.to_path_buf())));
        }

        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                let config = Self::from_file(path)
                    .map_err(|e| anyhow::anyhow!("加载配置文件 {} 失败: {}", path, e))?;
                return Ok((config, ConfigSource::File(PathBuf::from(path))));
            }
        }

        Ok((Self::default(), ConfigSource::Default))
    }

    /// 用环境变量覆盖数据源 API Key
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| env::var(name).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for provider in &mut self.providers {
            if let Some(key) = lookup(provider.kind.key_env()).filter(|k| !k.trim().is_empty()) {
                provider.api_key = key.trim().to_string();
            }
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
