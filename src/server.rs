use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::service::RequestContext;
use rmcp::{
    ErrorData as McpError, Peer, RoleServer, ServerHandler,
    handler::server::tool::ToolRouter,
    model::*,
    schemars, tool, tool_handler, tool_router,
};
use serde_json::json;

use crate::client::MediaOptions;
use crate::error::AppError;
use crate::history::{self, DEFAULT_MIN_COUNT, HistoryRequest};
use crate::session::{Diagnostics, ProgressSink, Session};
use crate::{friends, messaging};

fn default_min_count() -> usize {
    DEFAULT_MIN_COUNT
}

fn default_clear() -> bool {
    true
}

/// get_history_messages 的参数
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct HistoryParams {
    #[schemars(description = "联系人或群名称")]
    pub target: String,
    #[serde(default = "default_min_count")]
    #[schemars(description = "希望至少获取的消息条数（默认 10，尽力而为）")]
    pub min_count: usize,
    #[serde(default)]
    #[schemars(description = "最多额外加载更早消息的次数（默认 0，不额外加载）")]
    pub max_attempts: usize,
    #[serde(default)]
    #[schemars(description = "是否精确匹配名称")]
    pub exact_match: bool,
    #[serde(default)]
    #[schemars(description = "是否保存聊天图片")]
    pub savepic: bool,
    #[serde(default)]
    #[schemars(description = "是否保存聊天视频")]
    pub savevideo: bool,
    #[serde(default)]
    #[schemars(description = "是否保存聊天文件")]
    pub savefile: bool,
    #[serde(default)]
    #[schemars(description = "是否将语音转为文字")]
    pub savevoice: bool,
    #[serde(default)]
    #[schemars(description = "是否解析链接卡片")]
    pub parseurl: bool,
}

impl From<HistoryParams> for HistoryRequest {
    fn from(p: HistoryParams) -> Self {
        HistoryRequest {
            min_count: p.min_count,
            max_attempts: p.max_attempts,
            exact_match: p.exact_match,
            media: MediaOptions {
                savepic: p.savepic,
                savevideo: p.savevideo,
                savefile: p.savefile,
                savevoice: p.savevoice,
                parseurl: p.parseurl,
            },
            ..HistoryRequest::new(p.target)
        }
    }
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct FriendsParams {
    #[serde(default)]
    #[schemars(description = "按标签过滤，命中任一标签即返回；为空则返回全部好友")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SendTextParams {
    #[schemars(description = "要发送的文本")]
    pub msg: String,
    #[serde(default)]
    #[schemars(description = "联系人或群名称，缺省时发送到当前聊天")]
    pub target: Option<String>,
    #[serde(default = "default_clear")]
    #[schemars(description = "发送前是否清空输入框（默认 true）")]
    pub clear: bool,
    #[serde(default)]
    #[schemars(description = "是否精确匹配名称")]
    pub exact_match: bool,
}

/// 单个路径或路径列表
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum FilePaths {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl FilePaths {
    pub fn into_vec(self) -> Vec<PathBuf> {
        match self {
            FilePaths::One(path) => vec![path],
            FilePaths::Many(paths) => paths,
        }
    }
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SendFilesParams {
    #[schemars(description = "文件路径，单个或列表")]
    pub filepath: FilePaths,
    #[serde(default)]
    #[schemars(description = "联系人或群名称，缺省时发送到当前聊天")]
    pub target: Option<String>,
    #[serde(default)]
    #[schemars(description = "是否精确匹配名称")]
    pub exact_match: bool,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SwitchChatParams {
    #[schemars(description = "联系人或群名称")]
    pub target: String,
    #[serde(default)]
    #[schemars(description = "是否精确匹配名称")]
    pub exact_match: bool,
}

/// 把进度信息作为 MCP 日志通知发给客户端
struct PeerSink {
    peer: Peer<RoleServer>,
}

impl PeerSink {
    async fn notify(&self, level: LoggingLevel, message: &str) {
        let param = LoggingMessageNotificationParam {
            level,
            logger: Some("weixin-bot".into()),
            data: serde_json::Value::String(message.to_string()),
        };
        if let Err(e) = self.peer.notify_logging_message(param).await {
            tracing::debug!("Failed to forward log notification: {}", e);
        }
    }
}

#[async_trait]
impl ProgressSink for PeerSink {
    async fn info(&self, message: &str) {
        self.notify(LoggingLevel::Info, message).await;
    }

    async fn error(&self, message: &str) {
        self.notify(LoggingLevel::Error, message).await;
    }
}

/// 带类型标签的工具错误结果
fn error_result(e: &AppError) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::json(json!({
        "success": false,
        "kind": e.kind(),
        "error": e.to_string(),
    }))?]))
}

fn text_result(result: Result<String, AppError>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(status) => Ok(CallToolResult::success(vec![Content::text(status)])),
        Err(e) => error_result(&e),
    }
}

fn json_result<T: serde::Serialize>(result: Result<T, AppError>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => Ok(CallToolResult::success(vec![Content::json(value)?])),
        Err(e) => error_result(&e),
    }
}

/// MCP 服务器结构体
#[derive(Clone)]
pub struct WeixinBotServer {
    session: Arc<Session>,
    tool_router: ToolRouter<Self>,
}

impl WeixinBotServer {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            tool_router: Self::tool_router(),
        }
    }
}

/// 工具方法定义
#[tool_router]
impl WeixinBotServer {
    #[tool(description = "获取指定联系人或群的聊天记录。消息不足 min_count 时最多再加载 max_attempts 次更早的消息（尽力而为，不保证达到 min_count）。返回列表，每项包含 type（sys/time/self/friend）、content、sender，时间消息另含 time。")]
    async fn get_history_messages(
        &self,
        Parameters(params): Parameters<HistoryParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let sink = PeerSink { peer: context.peer };
        let req = HistoryRequest::from(params);
        let result = history::load_history(&self.session, &req, Diagnostics::new(Some(&sink))).await;
        json_result(result)
    }

    #[tool(description = "获取微信好友列表（nickname、remark、tags），可按标签过滤，命中任一标签即返回。")]
    async fn get_friends(
        &self,
        Parameters(params): Parameters<FriendsParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let sink = PeerSink { peer: context.peer };
        let result = friends::list_friends(
            &self.session,
            params.tags.as_deref(),
            Diagnostics::new(Some(&sink)),
        )
        .await;
        json_result(result)
    }

    #[tool(description = "向联系人或群发送文本消息。未指定 target 时发送到当前聊天。")]
    async fn send_text(
        &self,
        Parameters(params): Parameters<SendTextParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let sink = PeerSink { peer: context.peer };
        let result = messaging::send_text(
            &self.session,
            &params.msg,
            params.target.as_deref(),
            params.clear,
            params.exact_match,
            Diagnostics::new(Some(&sink)),
        )
        .await;
        text_result(result)
    }

    #[tool(description = "向联系人或群发送文件、图片或视频，filepath 可以是单个路径或路径列表。未指定 target 时发送到当前聊天。")]
    async fn send_files(
        &self,
        Parameters(params): Parameters<SendFilesParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let sink = PeerSink { peer: context.peer };
        let paths = params.filepath.into_vec();
        let result = messaging::send_files(
            &self.session,
            &paths,
            params.target.as_deref(),
            params.exact_match,
            Diagnostics::new(Some(&sink)),
        )
        .await;
        text_result(result)
    }

    #[tool(description = "切换到指定联系人或群的聊天窗口，返回实际匹配到的名称。")]
    async fn switch_chat(
        &self,
        Parameters(params): Parameters<SwitchChatParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let sink = PeerSink { peer: context.peer };
        let result = messaging::switch_chat(
            &self.session,
            &params.target,
            params.exact_match,
            Diagnostics::new(Some(&sink)),
        )
        .await;
        text_result(result)
    }
}

/// 实现 MCP 协议处理器
#[tool_handler]
impl ServerHandler for WeixinBotServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "微信机器人 MCP 服务。send_text 发送文本，send_files 发送文件/图片，\
                 get_friends 获取好友并按标签过滤，get_history_messages 获取聊天记录\
                 （可自动加载更多），switch_chat 切换聊天窗口。"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_logging()
                .build(),
            ..Default::default()
        }
    }
}
