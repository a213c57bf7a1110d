use crate::models::table::Table;
use serde::{Deserialize, Serialize};

/// 默认的导出文件名
pub const DEFAULT_CSV_PATH: &str = "extracted_results.csv";

/// 写回表格时的默认区域
pub const DEFAULT_EXPORT_RANGE: &str = "Results!A1";

/// 一次运行的任务描述（从 TOML 文件加载）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 实体名称所在的列
    pub target_column: String,
    pub prompts: Vec<String>,
    /// 只处理前 N 行
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    pub source: JobSource,
    #[serde(default)]
    pub export: ExportTarget,
}

/// 输入数据来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobSource {
    /// 直接写在任务文件中的表格
    Inline {
        header: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<String>>,
    },
    /// 从在线表格读取
    Sheet { sheet_id: String, range: String },
    /// 内置示例数据
    Sample,
}

impl JobSource {
    /// 不需要外部服务即可得到的表格
    pub fn local_table(&self) -> Option<Table> {
        match self {
            JobSource::Inline { header, rows } => Some(Table::new(header.clone(), rows.clone())),
            JobSource::Sample => Some(Table::sample()),
            JobSource::Sheet { .. } => None,
        }
    }
}

/// 结果导出目标
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

impl ExportTarget {
    pub fn csv_path(&self) -> &str {
        self.csv_path.as_deref().unwrap_or(DEFAULT_CSV_PATH)
    }

    pub fn range(&self) -> &str {
        self.range.as_deref().unwrap_or(DEFAULT_EXPORT_RANGE)
    }
}
