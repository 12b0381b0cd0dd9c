use crate::client::MediaOptions;
use crate::error::{AppError, AppResult};
use crate::message::{Message, MessageRecord, RawMessage};
use crate::session::{Diagnostics, Session};

pub const DEFAULT_MIN_COUNT: usize = 10;
pub const DEFAULT_MAX_ATTEMPTS: usize = 0;

/// 历史消息请求
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub target: String,
    pub min_count: usize,
    pub max_attempts: usize,
    pub exact_match: bool,
    pub media: MediaOptions,
}

impl HistoryRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            min_count: DEFAULT_MIN_COUNT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            exact_match: false,
            media: MediaOptions::default(),
        }
    }
}

/// 获取指定会话的聊天记录
///
/// 切换到目标会话后拉取当前窗口的消息；数量不足 `min_count` 时最多再加载
/// `max_attempts` 次更早的消息，客户端报告没有更多消息时立即停止。
/// 结果数量不保证达到 `min_count`。切换后的会话不会恢复。
pub async fn load_history(
    session: &Session,
    req: &HistoryRequest,
    diag: Diagnostics<'_>,
) -> AppResult<Vec<MessageRecord>> {
    diag.info(&format!("Getting messages from {}", req.target)).await;

    match load(session, req, diag).await {
        Ok(records) => {
            diag.info(&format!("Retrieved {} messages from {}", records.len(), req.target))
                .await;
            Ok(records)
        }
        Err(e) => {
            diag.error(&format!("Failed to get messages: {}", e)).await;
            Err(e)
        }
    }
}

async fn load(
    session: &Session,
    req: &HistoryRequest,
    diag: Diagnostics<'_>,
) -> AppResult<Vec<MessageRecord>> {
    let client = session.acquire().await;

    client
        .chat_with(&req.target, req.exact_match)
        .await
        .map_err(AppError::resolving)?;

    let mut messages = client
        .get_all_messages(req.media)
        .await
        .map_err(AppError::loading)?;

    let mut attempts = 0;
    while messages.len() < req.min_count && attempts < req.max_attempts {
        diag.info(&format!(
            "Loading more messages (attempt {}/{})",
            attempts + 1,
            req.max_attempts
        ))
        .await;

        let loaded = client.load_more_messages().await.map_err(AppError::loading)?;
        if !loaded {
            tracing::debug!("No more history for {}", req.target);
            break;
        }

        messages = client
            .get_all_messages(req.media)
            .await
            .map_err(AppError::loading)?;
        attempts += 1;
    }

    normalize(messages)
}

fn normalize(messages: Vec<RawMessage>) -> AppResult<Vec<MessageRecord>> {
    messages
        .into_iter()
        .map(|raw| {
            Message::ingest(raw)
                .map(Message::into_record)
                .map_err(AppError::loading)
        })
        .collect()
}
