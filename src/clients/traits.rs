//! 外部服务的抽象接口
//!
//! 业务能力层只依赖这些 trait，具体实现（SerpAPI / OpenAI 兼容接口 / Google Sheets）
//! 与测试替身都在 `clients` 下。

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppResult;
use crate::models::Table;

/// 搜索服务商：执行一次查询，返回原始 JSON
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn fetch(&self, query: &str) -> AppResult<Value>;
}

/// 对话补全服务商：系统消息 + 用户消息 → 回复文本（已去除首尾空白）
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, system_message: &str, user_message: &str) -> AppResult<String>;
}

/// 在线表格读写
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// 读取区域，首行作为表头
    async fn read_table(&self, sheet_id: &str, range: &str) -> AppResult<Table>;

    /// 将表头和数据行写入区域，覆盖原有单元格
    async fn write_table(&self, sheet_id: &str, range: &str, table: &Table) -> AppResult<()>;
}
