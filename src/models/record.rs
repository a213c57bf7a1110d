use serde::Serialize;

/// 单个字段提取失败（重试耗尽）时写入单元格的值
pub const EXTRACTION_ERROR: &str = "Error in processing";

/// 模型在搜索结果中找不到信息时应回答的值
pub const INFORMATION_NOT_FOUND: &str = "Information not found";

/// 一个实体的提取结果：提示词原文 → 提取文本
///
/// 保持插入顺序；重复的键原位覆盖旧值（列位置不变，值取最后一次）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    fields: Vec<(String, String)>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖，返回被覆盖的旧值
    pub fn insert(&mut self, prompt: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let prompt = prompt.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| *key == prompt) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.fields.push((prompt, value));
                None
            }
        }
    }

    pub fn get(&self, prompt: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == prompt)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// 输出行：实体 + 每个提示词一列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub entity: String,
    pub fields: ExtractionResult,
    /// 实体级失败原因；为 None 表示正常处理
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutputRecord {
    pub fn new(entity: impl Into<String>, fields: ExtractionResult) -> Self {
        Self {
            entity: entity.into(),
            fields,
            error: None,
        }
    }

    /// 实体整体失败时的占位行：每个提示词都填错误标记
    pub fn failed(entity: impl Into<String>, prompts: &[String], reason: impl Into<String>) -> Self {
        let mut fields = ExtractionResult::new();
        for prompt in prompts {
            fields.insert(prompt.as_str(), EXTRACTION_ERROR);
        }
        Self {
            entity: entity.into(),
            fields,
            error: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// 取某个提示词对应的单元格，缺失时为空串
    pub fn value_for(&self, prompt: &str) -> &str {
        self.fields.get(prompt).unwrap_or("")
    }
}
