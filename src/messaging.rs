use std::path::PathBuf;

use crate::error::{AppError, AppResult};
use crate::session::{Diagnostics, Session};

const CURRENT_CHAT: &str = "current chat";

fn target_label(target: Option<&str>) -> &str {
    target.unwrap_or(CURRENT_CHAT)
}

/// 发送文本消息；未指定目标时发送到当前聊天
pub async fn send_text(
    session: &Session,
    msg: &str,
    target: Option<&str>,
    clear: bool,
    exact_match: bool,
    diag: Diagnostics<'_>,
) -> AppResult<String> {
    let label = target_label(target);
    diag.info(&format!("Sending message to {}", label)).await;

    let sent = {
        let client = session.acquire().await;
        client.send_text(msg, target, clear, exact_match).await
    };

    match sent {
        Ok(()) => Ok(format!("Message sent successfully to {}", label)),
        Err(e) => {
            let err = AppError::sending(e);
            diag.error(&format!("Failed to send message: {}", err)).await;
            Err(err)
        }
    }
}

/// 发送一个或多个文件；客户端报告失败时返回 `Send` 错误
pub async fn send_files(
    session: &Session,
    paths: &[PathBuf],
    target: Option<&str>,
    exact_match: bool,
    diag: Diagnostics<'_>,
) -> AppResult<String> {
    let label = target_label(target);
    diag.info(&format!("Sending files to {}", label)).await;

    let result = if paths.is_empty() {
        Err(AppError::Send("No files given".into()))
    } else {
        let client = session.acquire().await;
        match client.send_files(paths, target, exact_match).await {
            Ok(true) => Ok(format!("Files sent successfully to {}", label)),
            Ok(false) => Err(AppError::Send("Failed to send files".into())),
            Err(e) => Err(AppError::sending(e)),
        }
    };

    if let Err(e) = &result {
        diag.error(&format!("Failed to send files: {}", e)).await;
    }
    result
}

/// 切换当前聊天，返回值中带有解析后的完整名称
pub async fn switch_chat(
    session: &Session,
    target: &str,
    exact_match: bool,
    diag: Diagnostics<'_>,
) -> AppResult<String> {
    diag.info(&format!("Switching to chat with {}", target)).await;

    let resolved = {
        let client = session.acquire().await;
        client.chat_with(target, exact_match).await
    };

    match resolved {
        Ok(name) => Ok(format!("Switched to chat with {}", name)),
        Err(e) => {
            let err = AppError::resolving(e);
            diag.error(&format!("Failed to switch chat: {}", err)).await;
            Err(err)
        }
    }
}
