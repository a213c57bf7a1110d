//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：根据配置创建 HTTP 客户端、限流器和各项服务
//! 2. **加载输入**：从任务文件、示例数据或在线表格得到输入表
//! 3. **批量处理**：委托 `BatchProcessor`
//! 4. **导出结果**：写 CSV，按需写回在线表格
//! 5. **全局统计**：汇总成功 / 失败数量

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::{build_http_client, GoogleSheetsClient, LlmClient, SerpClient, SheetStore};
use crate::config::Config;
use crate::infrastructure::{BackoffPolicy, RateLimiter, Sleeper, TokioSleeper};
use crate::models::{Job, JobSource, OutputRecord, Table};
use crate::orchestrator::batch_processor::{BatchProcessor, BatchStats};
use crate::services::{CsvExporter, ExtractionService, SearchService};
use crate::utils::logging::{log_entities_loaded, log_startup, print_final_stats};
use crate::workflow::EntityFlow;

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub records: Vec<OutputRecord>,
    pub table: Table,
    pub stats: BatchStats,
    /// 导出失败的原因；为空表示所有导出目标都已写入
    pub export_errors: Vec<String>,
}

/// 应用主结构
pub struct App {
    config: Config,
    processor: BatchProcessor,
    sheets: Option<Arc<dyn SheetStore>>,
}

impl App {
    /// 初始化应用（真实的外部服务）
    pub fn initialize(config: Config) -> Result<Self> {
        let http = build_http_client(config.http_timeout).context("无法创建 HTTP 客户端")?;
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);

        let search = SearchService::new(
            Arc::new(SerpClient::new(&config, http.clone())),
            Arc::new(RateLimiter::new("search", config.rate_limit_delay, sleeper.clone())),
            config.prompt_placeholder.clone(),
        );
        let extraction = ExtractionService::new(
            Arc::new(LlmClient::new(&config)),
            Arc::new(RateLimiter::new("llm", config.rate_limit_delay, sleeper.clone())),
            BackoffPolicy::new(config.max_retries, config.backoff_base),
            sleeper,
        );
        let processor = BatchProcessor::new(
            EntityFlow::new(search, extraction),
            config.max_concurrent_entities,
            config.prompt_placeholder.clone(),
        );

        let sheets = GoogleSheetsClient::from_config(&config, http)
            .map(|client| Arc::new(client) as Arc<dyn SheetStore>);

        Ok(Self {
            config,
            processor,
            sheets,
        })
    }

    /// 使用自定义组件创建（测试或嵌入场景）
    pub fn with_components(
        config: Config,
        processor: BatchProcessor,
        sheets: Option<Arc<dyn SheetStore>>,
    ) -> Self {
        Self {
            config,
            processor,
            sheets,
        }
    }

    pub fn processor(&self) -> &BatchProcessor {
        &self.processor
    }

    /// 运行一个任务
    pub async fn run(&self, job: &Job) -> Result<RunSummary> {
        log_startup(&self.config);

        let table = self.resolve_input(job).await?;
        let prompts = self.processor.prepare_prompts(&job.prompts)?;
        log_entities_loaded(table.len(), prompts.len());

        if table.is_empty() {
            warn!("⚠️ 输入表没有任何数据行");
        }

        let entities = table.column_values(&job.target_column)?;
        let records = self.processor.process_entities(&entities, &prompts, None).await;

        let stats = BatchStats::from_records(&records);
        let result_table = Table::from_records(&records, &prompts);

        // 导出失败只记录，已完成的结果仍交给调用方
        let mut export_errors = Vec::new();

        let csv_path = job.export.csv_path();
        if let Err(e) = CsvExporter::new(csv_path).write(&result_table).await {
            error!("❌ 导出 CSV 失败: {}", e);
            export_errors.push(format!("CSV {}: {}", csv_path, e));
        }

        if let Some(sheet_id) = &job.export.sheet_id {
            if let Err(e) = self
                .export_to_sheet(sheet_id, job.export.range(), &result_table)
                .await
            {
                error!("❌ 写回表格失败: {:#}", e);
                export_errors.push(format!("{:#}", e));
            }
        }

        print_final_stats(stats.success, stats.failed, stats.total, csv_path);

        Ok(RunSummary {
            records,
            table: result_table,
            stats,
            export_errors,
        })
    }

    /// 加载输入表并按 `batch_size` 截取
    pub async fn resolve_input(&self, job: &Job) -> Result<Table> {
        info!("\n📁 正在加载输入数据...");
        let table = match &job.source {
            JobSource::Sheet { sheet_id, range } => {
                let sheets = self.require_sheets()?;
                sheets
                    .read_table(sheet_id, range)
                    .await
                    .with_context(|| format!("无法读取表格 {} ({})", sheet_id, range))?
            }
            local => local
                .local_table()
                .context("任务数据源不是本地表格")?,
        };

        Ok(match job.batch_size {
            Some(limit) => table.head(limit),
            None => table,
        })
    }

    async fn export_to_sheet(&self, sheet_id: &str, range: &str, table: &Table) -> Result<()> {
        let sheets = self.require_sheets()?;
        info!("📤 正在写回表格 {} ({})", sheet_id, range);
        sheets
            .write_table(sheet_id, range, table)
            .await
            .with_context(|| format!("无法写入表格 {} ({})", sheet_id, range))
    }

    fn require_sheets(&self) -> Result<&Arc<dyn SheetStore>> {
        self.sheets
            .as_ref()
            .context("未配置 GOOGLE_SHEETS_ACCESS_TOKEN，无法访问在线表格")
    }
}
