use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// 自动化代理返回的原始消息，字段均为宽松类型
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

/// 附件/卡片类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    File,
    Voice,
    Link,
}

/// 已落盘的附件、转写后的语音或解析后的链接卡片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaReference {
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// 消息内容：纯文本或结构化引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Media(MediaReference),
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

/// 聊天记录中的一条消息
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// 系统提示
    System { content: MessageContent },
    /// 时间分隔
    Time { content: MessageContent, time: String },
    /// 自己发送的消息
    Own { content: MessageContent, sender: String },
    /// 对方发送的消息
    Friend { content: MessageContent, sender: String },
}

/// 返回给调用方的扁平记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRecord {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub content: MessageContent,
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::System { .. } => "sys",
            Message::Time { .. } => "time",
            Message::Own { .. } => "self",
            Message::Friend { .. } => "friend",
        }
    }

    /// 校验原始消息并转换为封闭类型
    pub fn ingest(raw: RawMessage) -> Result<Self, ClientError> {
        let kind = raw
            .kind
            .ok_or_else(|| ClientError::Malformed("message without type".into()))?;
        let content = ingest_content(raw.content)?;

        match kind.as_str() {
            "sys" => Ok(Message::System { content }),
            "time" => {
                let time = raw.time.ok_or_else(|| {
                    ClientError::Malformed("time message without timestamp".into())
                })?;
                Ok(Message::Time { content, time })
            }
            "self" => Ok(Message::Own {
                content,
                sender: raw.sender.unwrap_or_else(|| "self".to_string()),
            }),
            "friend" => {
                let sender = raw.sender.ok_or_else(|| {
                    ClientError::Malformed("friend message without sender".into())
                })?;
                Ok(Message::Friend { content, sender })
            }
            // 撤回提示等其他通知类消息按系统消息处理
            other => {
                tracing::debug!("Treating message type '{}' as system notice", other);
                Ok(Message::System { content })
            }
        }
    }

    /// 扁平化；只有时间消息携带 `time` 字段
    pub fn into_record(self) -> MessageRecord {
        let kind = self.kind();
        match self {
            Message::System { content } => MessageRecord { kind, content, sender: None, time: None },
            Message::Time { content, time } => MessageRecord {
                kind,
                content,
                sender: None,
                time: Some(time),
            },
            Message::Own { content, sender } | Message::Friend { content, sender } => {
                MessageRecord { kind, content, sender: Some(sender), time: None }
            }
        }
    }
}

fn ingest_content(value: Value) -> Result<MessageContent, ClientError> {
    match value {
        Value::Null => Ok(MessageContent::Text(String::new())),
        Value::String(s) => Ok(MessageContent::Text(s)),
        obj @ Value::Object(_) => serde_json::from_value::<MediaReference>(obj)
            .map(MessageContent::Media)
            .map_err(|e| ClientError::Malformed(format!("bad media reference: {}", e))),
        other => Err(ClientError::Malformed(format!("unsupported content: {}", other))),
    }
}
