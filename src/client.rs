use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::message::RawMessage;

/// 拉取消息时是否落盘/解析各类媒体
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaOptions {
    pub savepic: bool,
    pub savevideo: bool,
    pub savefile: bool,
    pub savevoice: bool,
    pub parseurl: bool,
}

/// 好友信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub nickname: String,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 微信桌面客户端的自动化接口
///
/// 所有方法都作用于客户端当前状态（当前聊天窗口等），调用方需保证串行调用。
#[async_trait]
pub trait WeChatClient: Send + Sync {
    /// 切换到指定会话，返回解析后的完整名称
    async fn chat_with(&self, who: &str, exact: bool) -> Result<String, ClientError>;

    /// 获取当前聊天窗口已渲染的全部消息
    async fn get_all_messages(&self, options: MediaOptions) -> Result<Vec<RawMessage>, ClientError>;

    /// 向上加载更早的消息，没有更多消息时返回 `false`
    async fn load_more_messages(&self) -> Result<bool, ClientError>;

    async fn get_all_friends(&self) -> Result<Vec<Friend>, ClientError>;

    /// `who` 为空时发送到当前聊天
    async fn send_text(
        &self,
        msg: &str,
        who: Option<&str>,
        clear: bool,
        exact: bool,
    ) -> Result<(), ClientError>;

    /// 返回客户端是否报告发送成功
    async fn send_files(
        &self,
        paths: &[PathBuf],
        who: Option<&str>,
        exact: bool,
    ) -> Result<bool, ClientError>;
}
