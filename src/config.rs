use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 配置加载或校验失败
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件无法读取
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// TOML 格式错误
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("agent.timeout_secs must be greater than 0")]
    ZeroTimeout,

    #[error("server.path must start with '/' and not be the root: {0}")]
    InvalidPath(String),
}

/// MCP 传输方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// 标准输入输出（默认）
    #[default]
    Stdio,
    /// streamable HTTP
    Http,
}

/// 服务配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// 自动化代理连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_url")]
    pub url: String,

    /// 单次请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// MCP 服务端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub transport: Transport,

    /// HTTP 模式下的监听地址
    #[serde(default = "default_bind")]
    pub bind: String,

    /// HTTP 模式下 MCP 端点的路径
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_agent_url() -> String {
    "http://127.0.0.1:9501".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_path() -> String {
    "/mcp".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            url: default_agent_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            bind: default_bind(),
            path: default_path(),
        }
    }
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// 从 TOML 文件加载配置；校验在命令行覆盖之后进行
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if !self.server.path.starts_with('/') || self.server.path.len() < 2 {
            return Err(ConfigError::InvalidPath(self.server.path.clone()));
        }
        Ok(())
    }
}
