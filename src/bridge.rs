use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::OnceCell;

use crate::client::{Friend, MediaOptions, WeChatClient};
use crate::error::ClientError;
use crate::message::RawMessage;

/// 自动化代理的统一响应格式
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Deserialize)]
struct ChatName {
    name: String,
}

#[derive(Deserialize)]
struct Loaded {
    loaded: bool,
}

#[derive(Deserialize)]
struct SendOutcome {
    success: bool,
}

#[derive(Serialize)]
struct SendTextBody<'a> {
    msg: &'a str,
    who: Option<&'a str>,
    clear: bool,
    exact: bool,
}

#[derive(Serialize)]
struct SendFilesBody<'a> {
    filepath: &'a [PathBuf],
    who: Option<&'a str>,
    exact: bool,
}

/// 通过 HTTP 驱动本地微信自动化代理的客户端
///
/// 代理负责真正操作桌面客户端（窗口定位、消息渲染、发送等）。
/// 首次调用时检查代理是否在线，之后复用同一个连接池。
pub struct BridgeClient {
    http: Client,
    base_url: String,
    ready: OnceCell<()>,
}

impl BridgeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ready: OnceCell::new(),
        })
    }

    /// 确保代理在线（懒检查，只成功一次）
    async fn ensure_ready(&self) -> Result<(), ClientError> {
        self.ready
            .get_or_try_init(|| async {
                let url = format!("{}/health", self.base_url);
                let response = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| ClientError::Unavailable(format!("{}: {}", url, e)))?;

                if !response.status().is_success() {
                    return Err(ClientError::Unavailable(format!(
                        "{} returned {}",
                        url,
                        response.status()
                    )));
                }

                tracing::info!("Automation agent is reachable at {}", self.base_url);
                Ok::<(), ClientError>(())
            })
            .await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.ensure_ready().await?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.ensure_ready().await?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);
        let response = self.http.post(&url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// 解析响应信封；`not_found` 或 404 视为会话未找到
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let text = response.text().await?;

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                ClientError::Malformed(format!("{} ({})", e, text))
            } else {
                ClientError::Agent(format!("HTTP {}: {}", status, text))
            }
        })?;

        if envelope.ok && status.is_success() {
            // 无 data 的成功响应按 null 解析，供 `()` 等类型使用
            return match envelope.data {
                Some(data) => Ok(data),
                None => serde_json::from_value(serde_json::Value::Null)
                    .map_err(|_| ClientError::Malformed("missing data".into())),
            };
        }

        let message = envelope
            .error
            .unwrap_or_else(|| format!("HTTP {}", status));
        if status == StatusCode::NOT_FOUND || envelope.code.as_deref() == Some("not_found") {
            Err(ClientError::NotFound(message))
        } else {
            Err(ClientError::Agent(message))
        }
    }
}

#[async_trait]
impl WeChatClient for BridgeClient {
    async fn chat_with(&self, who: &str, exact: bool) -> Result<String, ClientError> {
        let chat: ChatName = self
            .post("/chat/switch", &json!({ "who": who, "exact": exact }))
            .await?;
        Ok(chat.name)
    }

    async fn get_all_messages(&self, options: MediaOptions) -> Result<Vec<RawMessage>, ClientError> {
        self.post("/chat/messages", &options).await
    }

    async fn load_more_messages(&self) -> Result<bool, ClientError> {
        let loaded: Loaded = self.post("/chat/load_more", &json!({})).await?;
        Ok(loaded.loaded)
    }

    async fn get_all_friends(&self) -> Result<Vec<Friend>, ClientError> {
        self.get("/friends").await
    }

    async fn send_text(
        &self,
        msg: &str,
        who: Option<&str>,
        clear: bool,
        exact: bool,
    ) -> Result<(), ClientError> {
        let body = SendTextBody { msg, who, clear, exact };
        self.post::<_, ()>("/chat/send_text", &body).await
    }

    async fn send_files(
        &self,
        paths: &[PathBuf],
        who: Option<&str>,
        exact: bool,
    ) -> Result<bool, ClientError> {
        let body = SendFilesBody {
            filepath: paths,
            who,
            exact,
        };
        let outcome: SendOutcome = self.post("/chat/send_files", &body).await?;
        Ok(outcome.success)
    }
}
