//! 实体处理流程 - 流程层
//!
//! 核心职责：定义"一个实体"的完整处理流程
//!
//! 流程顺序：
//! 1. 每个提示词各搜索一次，结果按提示词顺序合并为一个列表
//! 2. 用合并后的全部结果，对每个提示词分别提取
//! 3. 组装输出行
//!
//! 每个提示词的提取都能看到所有提示词的搜索结果（上下文更宽，代价是噪声）。

use tracing::{debug, info};

use crate::error::{AppResult, BusinessError};
use crate::models::{OutputRecord, SearchResult};
use crate::services::{ExtractionService, SearchService};
use crate::utils::logging::truncate_text;
use crate::workflow::entity_ctx::EntityCtx;

/// 实体处理流程
///
/// - 编排"搜索 → 合并 → 提取 → 组装"
/// - 不持有任何网络资源，只依赖业务能力（services）
/// - 不处理多个实体
pub struct EntityFlow {
    search: SearchService,
    extraction: ExtractionService,
}

impl EntityFlow {
    pub fn new(search: SearchService, extraction: ExtractionService) -> Self {
        Self { search, extraction }
    }

    /// 处理单个实体
    ///
    /// 实体名称为空时返回错误，由上层转换为错误行。
    pub async fn run(&self, ctx: &EntityCtx, prompts: &[String]) -> AppResult<OutputRecord> {
        let entity = ctx.entity.as_str();
        if entity.trim().is_empty() {
            return Err(BusinessError::EmptyEntity {
                index: ctx.index + 1,
            }
            .into());
        }

        info!("{} 🔍 开始搜索 ({} 个提示词)", ctx, prompts.len());

        let mut combined: Vec<SearchResult> = Vec::new();
        for prompt in prompts {
            let results = self.search.search(entity, prompt).await;
            debug!(
                "{} 提示词 '{}' 返回 {} 条结果",
                ctx,
                truncate_text(prompt, 40),
                results.len()
            );
            combined.extend(results);
        }

        info!("{} 🤖 基于 {} 条结果提取信息", ctx, combined.len());

        let fields = self
            .extraction
            .process_multiple_fields(entity, prompts, &combined)
            .await;

        for (prompt, value) in fields.iter() {
            debug!(
                "{} {} → {}",
                ctx,
                truncate_text(prompt, 40),
                truncate_text(value, 80)
            );
        }

        Ok(OutputRecord::new(entity, fields))
    }
}
