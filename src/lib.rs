//! # Entity Extractor
//!
//! 为表格中的每个实体（如公司名称）执行网页搜索，并用 LLM 从搜索结果中提取指定信息，
//! 最终生成一张"实体 + 每个提示词一列"的结果表
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有调用节奏这一稀缺资源，只暴露能力
//! - `RateLimiter` - 每个外部服务一个，固定间隔限流
//! - `BackoffPolicy` / `Sleeper` - 指数退避与可替换的睡眠
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 与外部服务的单次交互，不含重试
//! - `SerpClient` / `LlmClient` / `GoogleSheetsClient`
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个实体的单次操作
//! - `SearchService` - 搜索能力（失败降级为空结果）
//! - `ExtractionService` - 提取能力（重试 + 错误标记）
//! - `CsvExporter` - 导出能力
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一个实体"的完整处理流程
//! - `EntityCtx` - 上下文封装（序号 + 实体名称）
//! - `EntityFlow` - 流程编排（search × N → 合并 → extract × N → 组装）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量实体处理器，保持顺序、隔离失败
//! - `orchestrator/app` - 装配、加载输入、导出
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{load_job, ExtractionResult, Job, OutputRecord, SearchResult, Table};
pub use orchestrator::{App, BatchProcessor, BatchStats, RunSummary};
pub use workflow::{EntityCtx, EntityFlow};
