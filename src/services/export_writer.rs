//! 结果导出服务 - 业务能力层
//!
//! 只负责"把结果表写成 CSV 文件"能力

use crate::error::{AppResult, FileError};
use crate::models::Table;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// CSV 导出服务
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入 CSV（覆盖已有文件，必要时创建上级目录）
    pub async fn write(&self, table: &Table) -> AppResult<()> {
        let path = self.path.display().to_string();
        debug!("导出 {} 行到 {}", table.len(), path);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| FileError::WriteFailed {
                    path: path.clone(),
                    source,
                })?;
        }

        fs::write(&self.path, table.to_csv())
            .await
            .map_err(|source| FileError::WriteFailed {
                path: path.clone(),
                source,
            })?;

        info!("📥 结果已导出: {}", path);
        Ok(())
    }
}
