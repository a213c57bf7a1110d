//! 测试替身
//!
//! 不发起任何网络请求；记录每次调用的参数，便于断言调用顺序和内容。

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::clients::traits::{ChatBackend, SearchProvider, SheetStore};
use crate::error::{ApiError, AppResult, LlmError};
use crate::models::Table;

/// 构造一条 `organic_results` 元素
pub fn organic_result(position: u32, title: &str, snippet: &str, link: &str) -> Value {
    json!({
        "position": position,
        "title": title,
        "snippet": snippet,
        "link": link,
    })
}

/// 构造 SerpAPI 风格的响应体
pub fn organic_payload(results: Vec<Value>) -> Value {
    json!({ "organic_results": results })
}

/// 按查询文本返回预设响应的搜索服务商
#[derive(Default)]
pub struct MockSearchProvider {
    responses: HashMap<String, Value>,
    default_response: Option<Value>,
    failing: bool,
    queries: Mutex<Vec<String>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次调用都返回传输层错误
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_response(mut self, query: impl Into<String>, payload: Value) -> Self {
        self.responses.insert(query.into(), payload);
        self
    }

    /// 未命中预设查询时的响应（不设置则返回空的 organic_results）
    pub fn with_default(mut self, payload: Value) -> Self {
        self.default_response = Some(payload);
        self
    }

    /// 按调用顺序记录的查询文本
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn fetch(&self, query: &str) -> AppResult<Value> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        if self.failing {
            return Err(ApiError::BadResponse {
                endpoint: "mock://search".to_string(),
                status: 503,
                body: None,
            }
            .into());
        }
        Ok(self
            .responses
            .get(query)
            .or(self.default_response.as_ref())
            .cloned()
            .unwrap_or_else(|| organic_payload(Vec::new())))
    }
}

/// 一次对话调用的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCall {
    pub system_message: String,
    pub user_message: String,
}

/// 按脚本回复的对话服务商
///
/// 脚本中的 `None` 表示该次调用失败；脚本用完后使用 `fallback`，
/// 没有 `fallback` 则一直失败。
#[derive(Default)]
pub struct MockChatBackend {
    script: Mutex<VecDeque<Option<String>>>,
    fallback: Option<String>,
    calls: Mutex<Vec<ChatCall>>,
}

impl MockChatBackend {
    /// 每次都返回同一个回复
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::default()
        }
    }

    /// 每次都失败
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn scripted(script: Vec<Option<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn complete(&self, system_message: &str, user_message: &str) -> AppResult<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ChatCall {
                system_message: system_message.to_string(),
                user_message: user_message.to_string(),
            });
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let reply = match scripted {
            Some(step) => step,
            None => self.fallback.clone(),
        };

        reply.ok_or_else(|| {
            LlmError::EmptyResponse {
                model: "mock".to_string(),
            }
            .into()
        })
    }
}

/// 内存中的表格存储
#[derive(Default)]
pub struct MemorySheetStore {
    sheets: Mutex<HashMap<(String, String), Table>>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, sheet_id: &str, range: &str, table: Table) -> Self {
        if let Ok(mut sheets) = self.sheets.lock() {
            sheets.insert((sheet_id.to_string(), range.to_string()), table);
        }
        self
    }

    pub fn table(&self, sheet_id: &str, range: &str) -> Option<Table> {
        self.sheets
            .lock()
            .ok()
            .and_then(|s| s.get(&(sheet_id.to_string(), range.to_string())).cloned())
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn read_table(&self, sheet_id: &str, range: &str) -> AppResult<Table> {
        Ok(self.table(sheet_id, range).unwrap_or_default())
    }

    async fn write_table(&self, sheet_id: &str, range: &str, table: &Table) -> AppResult<()> {
        if let Ok(mut sheets) = self.sheets.lock() {
            sheets.insert((sheet_id.to_string(), range.to_string()), table.clone());
        }
        Ok(())
    }
}
