//! 信息提取服务 - 业务能力层
//!
//! 只负责"从搜索结果中提取指定信息"的能力，不关心批量流程
//!
//! ## 重试策略
//! - 调用失败（网络、服务商错误、响应为空）按指数退避重试，最多 `max_retries` 次
//! - 重试耗尽后返回 `EXTRACTION_ERROR`，不向上抛错，不影响其他字段和实体
//! - 两次尝试之间至少间隔限流时长；无论成败，结束后都等待限流间隔再释放许可

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::clients::ChatBackend;
use crate::infrastructure::{BackoffPolicy, RateLimiter, Sleeper};
use crate::models::{ExtractionResult, SearchResult, EXTRACTION_ERROR, INFORMATION_NOT_FOUND};

/// 系统消息
pub fn system_instruction() -> String {
    format!(
        "You are an AI assistant specialized in extracting specific information from web search results. \
         Extract only the information that is asked for and keep the answer concise. \
         If multiple items are requested, separate them with semicolons. \
         If the information is not present in the search results, respond with \"{}\".",
        INFORMATION_NOT_FOUND
    )
}

/// 把搜索结果渲染为提示词上下文：每条三行，条目之间空一行
pub fn render_context(search_results: &[SearchResult]) -> String {
    search_results
        .iter()
        .map(SearchResult::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 构建用户消息
pub fn build_user_message(entity: &str, prompt: &str, search_results: &[SearchResult]) -> String {
    format!(
        "From these search results about {entity}, extract the information requested by: {prompt}\n\n\
         Search Results:\n{context}\n\n\
         Provide only the extracted information without explanation.\n\
         If the information is not found, respond with \"{not_found}\".\n\
         For multiple fields, separate them with semicolons.",
        entity = entity,
        prompt = prompt,
        context = render_context(search_results),
        not_found = INFORMATION_NOT_FOUND,
    )
}

/// 信息提取服务
pub struct ExtractionService {
    backend: Arc<dyn ChatBackend>,
    limiter: Arc<RateLimiter>,
    backoff: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
    system_message: String,
}

impl ExtractionService {
    /// 创建新的提取服务
    ///
    /// `sleeper` 用于重试之间的退避等待；限流等待由 `limiter` 负责。
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        limiter: Arc<RateLimiter>,
        backoff: BackoffPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            backend,
            limiter,
            backoff,
            sleeper,
            system_message: system_instruction(),
        }
    }

    /// 提取单个字段
    ///
    /// # 返回
    /// 模型的回复；重试耗尽时返回 `EXTRACTION_ERROR`
    pub async fn process_field(
        &self,
        entity: &str,
        prompt: &str,
        search_results: &[SearchResult],
    ) -> String {
        let user_message = build_user_message(entity, prompt, search_results);
        let max_attempts = self.backoff.max_attempts();

        let permit = self.limiter.acquire().await;
        let mut extracted = None;

        for attempt in 0..max_attempts {
            match self
                .backend
                .complete(&self.system_message, &user_message)
                .await
            {
                Ok(content) => {
                    debug!("[{}] 提取成功 (第 {} 次尝试)", entity, attempt + 1);
                    extracted = Some(content);
                    break;
                }
                Err(e) if attempt + 1 < max_attempts => {
                    let delay = self.backoff.delay_for(attempt).max(self.limiter.delay());
                    warn!(
                        "[{}] LLM 调用失败 (尝试 {}/{}), {} ms 后重试: {}",
                        entity,
                        attempt + 1,
                        max_attempts,
                        delay.as_millis(),
                        e
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        "[{}] ❌ LLM 调用在 {} 次尝试后仍失败: {}",
                        entity, max_attempts, e
                    );
                }
            }
        }

        permit.cool_down().await;
        extracted.unwrap_or_else(|| EXTRACTION_ERROR.to_string())
    }

    /// 依次提取多个字段，以提示词原文为键
    ///
    /// 完全相同的提示词会覆盖前一个的结果（列位置保持不变）。
    pub async fn process_multiple_fields(
        &self,
        entity: &str,
        prompts: &[String],
        search_results: &[SearchResult],
    ) -> ExtractionResult {
        let mut results = ExtractionResult::new();
        for prompt in prompts {
            let value = self.process_field(entity, prompt, search_results).await;
            if results.insert(prompt.as_str(), value).is_some() {
                warn!("[{}] 提示词重复，结果已被覆盖: {}", entity, prompt);
            }
        }
        results
    }
}
