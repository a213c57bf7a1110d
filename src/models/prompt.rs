//! 提示词模板相关的纯函数
//!
//! 模板中的占位符（默认 `{company}`）按原文替换为实体名称。
//! 不含占位符的模板不会自动补上实体，只在校验阶段给出警告。

use regex::Regex;
use std::sync::OnceLock;

/// 校验提示词时发现的问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptWarning {
    /// 模板不含占位符，所有实体都会发出同一个查询
    MissingPlaceholder { prompt: String },
    /// 模板含有无法识别的 `{xxx}` 占位符
    UnknownPlaceholder { prompt: String, token: String },
    /// 与之前的提示词完全相同，会被合并
    Duplicate { prompt: String },
    /// 空白提示词，会被丢弃
    Blank,
}

impl std::fmt::Display for PromptWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptWarning::MissingPlaceholder { prompt } => {
                write!(f, "提示词不含占位符，所有实体将使用相同查询: {}", prompt)
            }
            PromptWarning::UnknownPlaceholder { prompt, token } => {
                write!(f, "提示词含有未知占位符 {}: {}", token, prompt)
            }
            PromptWarning::Duplicate { prompt } => write!(f, "重复的提示词已合并: {}", prompt),
            PromptWarning::Blank => write!(f, "已忽略空白提示词"),
        }
    }
}

/// 将模板中的所有占位符替换为实体名称
pub fn render_query(template: &str, entity: &str, placeholder: &str) -> String {
    template.replace(placeholder, entity)
}

pub fn has_placeholder(template: &str, placeholder: &str) -> bool {
    template.contains(placeholder)
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[A-Za-z_][A-Za-z0-9_]*\}").expect("占位符正则无效"))
}

/// 整理提示词列表：去掉空白项，合并重复项（保留首次出现的位置），并收集警告
pub fn normalize_prompts(prompts: &[String], placeholder: &str) -> (Vec<String>, Vec<PromptWarning>) {
    let mut kept: Vec<String> = Vec::new();
    let mut warnings = Vec::new();

    for prompt in prompts {
        if prompt.trim().is_empty() {
            warnings.push(PromptWarning::Blank);
            continue;
        }
        if kept.contains(prompt) {
            warnings.push(PromptWarning::Duplicate {
                prompt: prompt.clone(),
            });
            continue;
        }
        if !has_placeholder(prompt, placeholder) {
            warnings.push(PromptWarning::MissingPlaceholder {
                prompt: prompt.clone(),
            });
        }
        for token in token_regex().find_iter(prompt) {
            if token.as_str() != placeholder {
                warnings.push(PromptWarning::UnknownPlaceholder {
                    prompt: prompt.clone(),
                    token: token.as_str().to_string(),
                });
            }
        }
        kept.push(prompt.clone());
    }

    (kept, warnings)
}
