//! 内存中的假客户端，用于测试各操作

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::client::{Friend, MediaOptions, WeChatClient};
use crate::error::ClientError;
use crate::message::RawMessage;

pub struct FakeState {
    pub contacts: Vec<String>,
    pub active: Option<String>,
    /// 当前窗口已渲染的消息
    pub rendered: Vec<RawMessage>,
    /// 每次 load_more 依次插入到窗口顶部的批次
    pub older: Vec<Vec<RawMessage>>,
    pub friends: Vec<Friend>,
    pub files_succeed: bool,
    /// 从第 N 次（从 1 开始）拉取起返回错误
    pub fail_fetch_from: Option<usize>,
    pub fail_friends: bool,
    pub fail_load: bool,
    pub fail_send: bool,

    pub switches: Vec<(String, bool)>,
    pub fetches: usize,
    /// 每次成功拉取返回的消息条数
    pub fetch_sizes: Vec<usize>,
    pub loads: usize,
    pub fetch_options: Vec<MediaOptions>,
    pub sent_texts: Vec<(String, Option<String>, bool, bool)>,
    pub sent_files: Vec<(Vec<PathBuf>, Option<String>, bool)>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            contacts: Vec::new(),
            active: None,
            rendered: Vec::new(),
            older: Vec::new(),
            friends: Vec::new(),
            files_succeed: true,
            fail_fetch_from: None,
            fail_friends: false,
            fail_load: false,
            fail_send: false,
            switches: Vec::new(),
            fetches: 0,
            fetch_sizes: Vec::new(),
            loads: 0,
            fetch_options: Vec::new(),
            sent_texts: Vec::new(),
            sent_files: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct FakeClient {
    pub state: Mutex<FakeState>,
}

impl FakeClient {
    pub fn with_contacts(names: &[&str]) -> Self {
        let client = Self::default();
        client.state.lock().unwrap().contacts = names.iter().map(|s| s.to_string()).collect();
        client
    }

    /// 初始窗口 `initial` 条消息，之后每次加载依次多出 `batches` 中的条数
    pub fn with_history(self, initial: usize, batches: &[usize]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.rendered = friend_messages("initial", initial);
            state.older = batches
                .iter()
                .enumerate()
                .map(|(i, n)| friend_messages(&format!("batch{}", i), *n))
                .collect();
        }
        self
    }

    pub fn with_friends(self, friends: Vec<Friend>) -> Self {
        self.state.lock().unwrap().friends = friends;
        self
    }

    pub fn set(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    pub fn loads(&self) -> usize {
        self.state.lock().unwrap().loads
    }

    fn resolve(state: &FakeState, who: &str, exact: bool) -> Result<String, ClientError> {
        let found = if exact {
            state.contacts.iter().find(|name| name.as_str() == who)
        } else {
            state
                .contacts
                .iter()
                .find(|name| name.as_str() == who)
                .or_else(|| state.contacts.iter().find(|name| name.contains(who)))
        };
        found.cloned().ok_or_else(|| ClientError::NotFound(who.to_string()))
    }
}

pub fn friend_messages(prefix: &str, n: usize) -> Vec<RawMessage> {
    (0..n)
        .map(|i| RawMessage {
            kind: Some("friend".into()),
            content: json!(format!("{} #{}", prefix, i)),
            sender: Some("Alice".into()),
            time: None,
        })
        .collect()
}

pub fn friend(nickname: &str, tags: &[&str]) -> Friend {
    Friend {
        nickname: nickname.to_string(),
        remark: None,
        tags: tags.iter().map(|s| s.to_string()).collect(),
    }
}

#[async_trait]
impl WeChatClient for FakeClient {
    async fn chat_with(&self, who: &str, exact: bool) -> Result<String, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.switches.push((who.to_string(), exact));
        let name = Self::resolve(&state, who, exact)?;
        state.active = Some(name.clone());
        Ok(name)
    }

    async fn get_all_messages(&self, options: MediaOptions) -> Result<Vec<RawMessage>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.fetches += 1;
        state.fetch_options.push(options);
        let fetches = state.fetches;
        if state.fail_fetch_from.is_some_and(|n| fetches >= n) {
            return Err(ClientError::Agent("window not rendered".into()));
        }
        let len = state.rendered.len();
        state.fetch_sizes.push(len);
        Ok(state.rendered.clone())
    }

    async fn load_more_messages(&self) -> Result<bool, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.loads += 1;
        if state.fail_load {
            return Err(ClientError::Request("agent timed out".into()));
        }
        if state.older.is_empty() {
            return Ok(false);
        }
        let mut batch = state.older.remove(0);
        batch.append(&mut state.rendered);
        state.rendered = batch;
        Ok(true)
    }

    async fn get_all_friends(&self) -> Result<Vec<Friend>, ClientError> {
        let state = self.state.lock().unwrap();
        if state.fail_friends {
            return Err(ClientError::Agent("contact list not loaded".into()));
        }
        Ok(state.friends.clone())
    }

    async fn send_text(
        &self,
        msg: &str,
        who: Option<&str>,
        clear: bool,
        exact: bool,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        if let Some(who) = who {
            let name = Self::resolve(&state, who, exact)?;
            state.active = Some(name);
        }
        if state.fail_send {
            return Err(ClientError::Agent("input box not found".into()));
        }
        state
            .sent_texts
            .push((msg.to_string(), who.map(str::to_string), clear, exact));
        Ok(())
    }

    async fn send_files(
        &self,
        paths: &[PathBuf],
        who: Option<&str>,
        exact: bool,
    ) -> Result<bool, ClientError> {
        let mut state = self.state.lock().unwrap();
        if let Some(who) = who {
            let name = Self::resolve(&state, who, exact)?;
            state.active = Some(name);
        }
        state
            .sent_files
            .push((paths.to_vec(), who.map(str::to_string), exact));
        Ok(state.files_succeed)
    }
}
