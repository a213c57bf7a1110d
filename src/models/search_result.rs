use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 单条网页搜索结果
///
/// 顺序即搜索引擎返回的相关度排序；`position` 缺失时为 0。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub position: u32,
}

impl SearchResult {
    /// 从 `organic_results` 的单个元素宽松地解析，缺失字段取空值
    pub fn from_value(item: &Value) -> Self {
        let text = |key: &str| {
            item.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        Self {
            title: text("title"),
            snippet: text("snippet"),
            link: text("link"),
            position: item
                .get("position")
                .and_then(|v| v.as_u64())
                .and_then(|p| u32::try_from(p).ok())
                .unwrap_or(0),
        }
    }

    /// 渲染为提示词中的三行文本
    pub fn render(&self) -> String {
        format!(
            "Title: {}\nSnippet: {}\nURL: {}",
            self.title, self.snippet, self.link
        )
    }
}
