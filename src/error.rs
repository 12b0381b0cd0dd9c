use thiserror::Error;

/// 自动化客户端层的错误
#[derive(Error, Debug)]
pub enum ClientError {
    /// 会话（联系人/群）未找到
    #[error("Chat not found: {0}")]
    NotFound(String),

    /// 与自动化代理通信失败
    #[error("Request error: {0}")]
    Request(String),

    /// 自动化代理报告操作失败
    #[error("Agent error: {0}")]
    Agent(String),

    /// 代理返回的数据无法解析
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// 代理不可用（健康检查失败）
    #[error("Automation agent unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Malformed(e.to_string())
        } else {
            ClientError::Request(e.to_string())
        }
    }
}

/// 工具调用边界上的错误，按类型区分
#[derive(Error, Debug)]
pub enum AppError {
    /// 目标会话在指定匹配方式下不存在
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// 获取或加载聊天记录失败
    #[error("Load error: {0}")]
    Load(String),

    /// 消息或文件发送失败
    #[error("Send error: {0}")]
    Send(String),

    /// 其他来自自动化层的错误
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl AppError {
    /// 错误类型标签，写入工具错误结果的 `kind` 字段
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Resolution(_) => "resolution",
            AppError::Load(_) => "load",
            AppError::Send(_) => "send",
            AppError::Client(_) => "client",
        }
    }

    /// 会话切换阶段的错误：未找到映射为 Resolution，其余原样透传
    pub fn resolving(e: ClientError) -> Self {
        match e {
            ClientError::NotFound(who) => AppError::Resolution(format!("No chat matches '{}'", who)),
            other => AppError::Client(other),
        }
    }

    /// 获取/加载阶段的错误
    pub fn loading(e: ClientError) -> Self {
        AppError::Load(e.to_string())
    }

    /// 发送阶段的错误
    pub fn sending(e: ClientError) -> Self {
        match e {
            ClientError::NotFound(_) => AppError::resolving(e),
            ClientError::Agent(msg) => AppError::Send(msg),
            other => AppError::Client(other),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
