//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ### `app` - 应用入口
//! - 根据配置装配客户端、限流器和服务
//! - 加载输入表、导出结果、输出全局统计
//!
//! ### `batch_processor` - 批量实体处理器
//! - 遍历目标列的所有实体，保持输入顺序
//! - 单个实体失败时生成错误行，批次继续
//! - 回报进度
//!
//! ## 层次关系
//!
//! ```text
//! app (任务 / 输入表 / 导出)
//!     ↓
//! batch_processor (处理 Vec<实体>)
//!     ↓
//! workflow::EntityFlow (处理单个实体)
//!     ↓
//! services (能力层：search / extraction / export)
//!     ↓
//! clients + infrastructure (外部服务 / 限流)
//! ```

pub mod app;
pub mod batch_processor;

// 重新导出主要类型
pub use app::{App, RunSummary};
pub use batch_processor::{BatchProcessor, BatchStats, ProgressFn};
