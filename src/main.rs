use anyhow::{Context, Result};
use clap::Parser;
use entity_extractor::{load_job, logger, App, Config};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "entity_extractor")]
#[command(about = "为表格中的每个实体搜索网页并用 LLM 提取指定信息")]
struct Cli {
    /// 任务文件（TOML）
    #[arg(long)]
    job: PathBuf,

    /// 覆盖任务中的 CSV 导出路径
    #[arg(long)]
    output: Option<PathBuf>,

    /// 只处理前 N 个实体
    #[arg(long)]
    limit: Option<usize>,

    /// 只校验任务并列出实体，不调用外部服务
    #[arg(long)]
    dry_run: bool,

    /// 输出 debug 日志
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置（缺少密钥时直接退出）
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logger::init(cli.verbose);
            error!("❌ 配置错误，未开始处理: {}", e);
            return Err(e.into());
        }
    };

    // 初始化日志
    logger::init(cli.verbose || config.verbose_logging);

    let mut job = load_job(&cli.job)
        .await
        .with_context(|| format!("无法加载任务文件: {}", cli.job.display()))?;
    if let Some(output) = cli.output {
        job.export.csv_path = Some(output.to_string_lossy().to_string());
    }
    if let Some(limit) = cli.limit {
        job.batch_size = Some(limit);
    }

    // 初始化并运行应用
    let app = App::initialize(config)?;

    if cli.dry_run {
        let table = app.resolve_input(&job).await?;
        let prompts = app.processor().prepare_prompts(&job.prompts)?;
        let entities = table.column_values(&job.target_column)?;
        info!("✓ 任务校验通过: {} 个实体, {} 个提示词", entities.len(), prompts.len());
        for (i, entity) in entities.iter().enumerate() {
            info!("  {}. {}", i + 1, entity);
        }
        return Ok(());
    }

    let summary = app.run(&job).await?;
    if !summary.export_errors.is_empty() {
        anyhow::bail!("结果导出失败: {}", summary.export_errors.join("; "));
    }

    Ok(())
}
