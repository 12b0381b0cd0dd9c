use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use crate::client::WeChatClient;

/// 工具调用过程中的进度/诊断输出
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn info(&self, message: &str);
    async fn error(&self, message: &str);
}

/// 进程级共享的自动化会话
///
/// 持有唯一的客户端句柄。每次操作通过 [`Session::acquire`] 独占客户端直到返回，
/// 保证多步操作（如加载历史消息）不会与其他调用交错。
pub struct Session {
    client: Arc<dyn WeChatClient>,
    gate: Mutex<()>,
}

impl Session {
    pub fn new(client: Arc<dyn WeChatClient>) -> Self {
        Self {
            client,
            gate: Mutex::new(()),
        }
    }

    /// 等待并独占客户端
    pub async fn acquire(&self) -> SessionGuard<'_> {
        let gate = self.gate.lock().await;
        SessionGuard {
            _gate: gate,
            client: self.client.as_ref(),
        }
    }
}

pub struct SessionGuard<'a> {
    _gate: MutexGuard<'a, ()>,
    client: &'a (dyn WeChatClient + 'static),
}

impl Deref for SessionGuard<'_> {
    type Target = dyn WeChatClient + 'static;

    fn deref(&self) -> &Self::Target {
        self.client
    }
}

/// 同时写入 tracing 日志与可选的进度输出
#[derive(Clone, Copy, Default)]
pub struct Diagnostics<'a> {
    sink: Option<&'a dyn ProgressSink>,
}

impl<'a> Diagnostics<'a> {
    pub fn new(sink: Option<&'a dyn ProgressSink>) -> Self {
        Self { sink }
    }

    pub async fn info(&self, message: &str) {
        tracing::info!("{}", message);
        if let Some(sink) = self.sink {
            sink.info(message).await;
        }
    }

    pub async fn error(&self, message: &str) {
        tracing::error!("{}", message);
        if let Some(sink) = self.sink {
            sink.error(message).await;
        }
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::fake::FakeClient;

    #[tokio::test]
    async fn acquire_serializes_callers() {
        let session = Arc::new(Session::new(Arc::new(FakeClient::default())));

        let first = session.acquire().await;
        let contender = {
            let session = session.clone();
            tokio::spawn(async move {
                let _guard = session.acquire().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(first);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn diagnostics_forward_to_sink() {
        let sink = testing::RecordingSink::default();
        let diag = Diagnostics::new(Some(&sink));
        diag.info("hello").await;
        diag.error("boom").await;

        assert_eq!(*sink.infos.lock().unwrap(), vec!["hello".to_string()]);
        assert_eq!(*sink.errors.lock().unwrap(), vec!["boom".to_string()]);

        // 无 sink 时只写日志
        Diagnostics::default().info("quiet").await;
    }
}
