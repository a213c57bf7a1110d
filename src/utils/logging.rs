/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use crate::config::Config;
use tracing::info;

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 程序配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!(
        "🤖 模型: {} (temperature={}, max_tokens={})",
        config.llm_model_name, config.llm_temperature, config.llm_max_tokens
    );
    info!(
        "🔍 搜索: 每次 {} 条, 地区 {}",
        config.search_results_per_query, config.search_region
    );
    info!(
        "⏱️ 限流间隔: {} ms, 最大重试: {}, 并发实体数: {}",
        config.rate_limit_delay.as_millis(),
        config.max_retries,
        config.max_concurrent_entities
    );
    info!("{}", "=".repeat(60));
}

/// 记录实体加载信息
///
/// # 参数
/// - `total`: 实体总数
/// - `prompts`: 提示词数量
pub fn log_entities_loaded(total: usize, prompts: usize) {
    info!("✓ 找到 {} 个待处理的实体", total);
    info!("📋 每个实体将执行 {} 次搜索和 {} 次提取\n", prompts, prompts);
}

/// 记录进度
pub fn log_progress(done: usize, total: usize) {
    let percent = if total == 0 {
        100.0
    } else {
        done as f64 * 100.0 / total as f64
    };
    info!("📊 进度: {}/{} ({:.0}%)", done, total, percent);
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `output_path`: 导出文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, output_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
