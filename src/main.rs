mod bridge;
mod client;
mod config;
mod error;
#[cfg(test)]
mod fake;
mod friends;
mod history;
mod message;
mod messaging;
mod server;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{ServiceExt, transport::stdio};
use tracing_subscriber::EnvFilter;

use bridge::BridgeClient;
use config::{Config, ServerConfig, Transport};
use server::WeixinBotServer;
use session::Session;

#[derive(Parser, Debug)]
#[command(name = "weixin-bot-mcp")]
#[command(about = "MCP server for WeChat desktop automation")]
#[command(version)]
struct Cli {
    /// MCP 传输方式
    #[arg(short, long, env = "WEIXIN_MCP_TRANSPORT", value_enum)]
    transport: Option<Transport>,

    /// HTTP 模式下的监听地址
    #[arg(short, long, env = "WEIXIN_MCP_BIND")]
    bind: Option<String>,

    /// 自动化代理地址
    #[arg(long, env = "WEIXIN_AGENT_URL")]
    agent_url: Option<String>,

    /// 代理请求超时（秒）
    #[arg(long, env = "WEIXIN_AGENT_TIMEOUT")]
    timeout_secs: Option<u64>,

    /// 配置文件路径（可选）
    #[arg(short, long, env = "WEIXIN_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// 输出 debug 日志
    #[arg(short, long, env = "WEIXIN_MCP_VERBOSE")]
    verbose: bool,
}

impl Cli {
    /// 命令行参数覆盖配置文件
    fn resolve_config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(transport) = self.transport {
            config.server.transport = transport;
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(url) = &self.agent_url {
            config.agent.url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.agent.timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 日志输出到 stderr，避免干扰 stdout 上的 MCP 协议通信
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = cli.resolve_config()?;

    tracing::info!("Starting Weixin Bot MCP Server...");
    tracing::info!("Automation agent: {}", config.agent.url);

    // 进程内唯一的自动化会话，所有工具调用共享
    let client = BridgeClient::new(config.agent.url.clone(), config.agent.timeout())?;
    let session = Arc::new(Session::new(Arc::new(client)));
    let server = WeixinBotServer::new(session);

    match config.server.transport {
        Transport::Stdio => serve_stdio(server).await?,
        Transport::Http => serve_http(server, &config.server).await?,
    }

    tracing::info!("Weixin Bot MCP Server stopped.");
    Ok(())
}

async fn serve_stdio(server: WeixinBotServer) -> Result<(), Box<dyn std::error::Error>> {
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Failed to start MCP server: {}", e);
    })?;

    // 阻塞等待服务结束
    service.waiting().await?;
    Ok(())
}

async fn serve_http(
    server: WeixinBotServer,
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service(&config.path, service);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind {}: {}", config.bind, e))?;
    tracing::info!("Listening on http://{}{}", config.bind, config.path);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn cli_overrides_defaults() {
        let cli = Cli::parse_from([
            "weixin-bot-mcp",
            "--transport",
            "http",
            "--agent-url",
            "http://192.168.1.20:9501",
            "--timeout-secs",
            "5",
        ]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.server.transport, Transport::Http);
        assert_eq!(config.agent.url, "http://192.168.1.20:9501");
        assert_eq!(config.agent.timeout_secs, 5);
        assert_eq!(config.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn cli_flag_replaces_invalid_file_value() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent]\ntimeout_secs = 0").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::parse_from(["weixin-bot-mcp", "--config", &path, "--timeout-secs", "5"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.agent.timeout_secs, 5);
    }

    #[test]
    fn invalid_file_value_without_override_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent]\ntimeout_secs = 0").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::parse_from(["weixin-bot-mcp", "--config", &path]);
        assert!(cli.resolve_config().is_err());
    }

    #[test]
    fn cli_rejects_zero_timeout() {
        let cli = Cli::parse_from(["weixin-bot-mcp", "--timeout-secs", "0"]);
        assert!(cli.resolve_config().is_err());
    }
}
