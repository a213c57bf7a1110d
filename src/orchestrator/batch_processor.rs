//! 批量实体处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **实体提取**：从输入表的目标列取出实体列表
//! 2. **提示词整理**：去掉空白项、合并重复项
//! 3. **逐个处理**：委托 `EntityFlow` 处理单个实体
//! 4. **失败隔离**：单个实体出错时生成错误行，批次继续
//! 5. **进度回报**：每完成一个实体回报 `(index+1)/total`
//!
//! ## 并发
//!
//! 默认严格串行。`max_concurrent` 大于 1 时用有序缓冲流同时处理多个实体，
//! 输出顺序仍与输入一致；每个外部服务的限流器在所有任务间共享。

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::error::{AppResult, BusinessError};
use crate::models::{normalize_prompts, OutputRecord, Table};
use crate::utils::logging::log_progress;
use crate::workflow::{EntityCtx, EntityFlow};

/// 进度回调，参数为已完成比例（0.0 ~ 1.0）
pub type ProgressFn<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// 批量处理器
pub struct BatchProcessor {
    flow: EntityFlow,
    max_concurrent: usize,
    placeholder: String,
}

impl BatchProcessor {
    pub fn new(flow: EntityFlow, max_concurrent: usize, placeholder: impl Into<String>) -> Self {
        Self {
            flow,
            max_concurrent: max_concurrent.max(1),
            placeholder: placeholder.into(),
        }
    }

    /// 处理单个实体（不做失败隔离）
    pub async fn process_entity(&self, entity: &str, prompts: &[String]) -> AppResult<OutputRecord> {
        self.flow.run(&EntityCtx::new(0, 1, entity), prompts).await
    }

    /// 处理一张表中目标列的所有实体
    ///
    /// # 返回
    /// 每个实体一行，顺序与输入一致；只有目标列不存在或没有有效提示词时返回错误
    pub async fn process_batch(
        &self,
        table: &Table,
        target_column: &str,
        prompts: &[String],
        on_progress: Option<ProgressFn<'_>>,
    ) -> AppResult<Vec<OutputRecord>> {
        let entities = table.column_values(target_column)?;
        let prompts = self.prepare_prompts(prompts)?;
        Ok(self.process_entities(&entities, &prompts, on_progress).await)
    }

    /// 整理提示词并输出警告；没有有效提示词时报错
    pub fn prepare_prompts(&self, prompts: &[String]) -> AppResult<Vec<String>> {
        let (prompts, warnings) = normalize_prompts(prompts, &self.placeholder);
        for warning in &warnings {
            warn!("⚠️ {}", warning);
        }
        if prompts.is_empty() {
            return Err(BusinessError::NoPrompts.into());
        }
        Ok(prompts)
    }

    /// 处理实体列表（提示词需已整理）
    pub async fn process_entities(
        &self,
        entities: &[String],
        prompts: &[String],
        on_progress: Option<ProgressFn<'_>>,
    ) -> Vec<OutputRecord> {
        let total = entities.len();
        let mut records = Vec::with_capacity(total);

        let mut pending = stream::iter(entities.iter().enumerate())
            .map(|(index, entity)| self.process_isolated(EntityCtx::new(index, total, entity.as_str()), prompts))
            .buffered(self.max_concurrent);

        while let Some(record) = pending.next().await {
            records.push(record);
            log_progress(records.len(), total);
            if let Some(report) = on_progress {
                report(records.len() as f64 / total as f64);
            }
        }

        records
    }

    /// 处理单个实体，出错时转换为错误行
    async fn process_isolated(&self, ctx: EntityCtx, prompts: &[String]) -> OutputRecord {
        match self.flow.run(&ctx, prompts).await {
            Ok(record) => {
                info!("{} ✓ 处理完成", ctx);
                record
            }
            Err(e) => {
                error!("{} ❌ 处理失败，写入错误行: {}", ctx, e);
                OutputRecord::failed(ctx.entity.clone(), prompts, e.to_string())
            }
        }
    }
}

/// 批次统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

impl BatchStats {
    pub fn from_records(records: &[OutputRecord]) -> Self {
        let failed = records.iter().filter(|r| r.is_failed()).count();
        Self {
            success: records.len() - failed,
            failed,
            total: records.len(),
        }
    }
}
