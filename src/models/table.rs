use crate::error::BusinessError;
use crate::models::record::OutputRecord;
use serde::{Deserialize, Serialize};

/// 输出表中实体列的列名
pub const ENTITY_COLUMN: &str = "entity";

/// 二维表：首行表头 + 数据行
///
/// 输入数据源、表格服务和导出共用这一结构。行的长度可以与表头不一致，
/// 缺少的单元格按空串处理。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// 内置示例数据
    pub fn sample() -> Self {
        let row = |name: &str| vec![name.to_string(), "Technology".to_string()];
        Self {
            header: vec!["company_name".to_string(), "industry".to_string()],
            rows: vec![row("Apple"), row("Microsoft"), row("Google")],
        }
    }

    /// 从 values 网格构建（首行为表头）
    pub fn from_values(mut values: Vec<Vec<String>>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let header = values.remove(0);
        Self {
            header,
            rows: values,
        }
    }

    /// 转为 values 网格（首行为表头）
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    /// 由输出行构建结果表：实体列 + 每个提示词一列
    pub fn from_records(records: &[OutputRecord], prompts: &[String]) -> Self {
        let header = std::iter::once(ENTITY_COLUMN.to_string())
            .chain(prompts.iter().cloned())
            .collect();
        let rows = records
            .iter()
            .map(|record| {
                std::iter::once(record.entity.clone())
                    .chain(prompts.iter().map(|p| record.value_for(p).to_string()))
                    .collect()
            })
            .collect();
        Self { header, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 只保留前 n 行
    pub fn head(&self, n: usize) -> Self {
        Self {
            header: self.header.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn column_index(&self, column: &str) -> Result<usize, BusinessError> {
        self.header
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| BusinessError::ColumnNotFound {
                column: column.to_string(),
                available: self.header.clone(),
            })
    }

    /// 取某一列的所有值（按行顺序）
    pub fn column_values(&self, column: &str) -> Result<Vec<String>, BusinessError> {
        let index = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect())
    }

    /// 渲染为 CSV 文本（逗号分隔，带表头，必要时加引号）
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in std::iter::once(&self.header).chain(self.rows.iter()) {
            let line: Vec<String> = row.iter().map(|cell| escape_csv_field(cell)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ExtractionResult;

    #[test]
    fn test_column_values_pads_short_rows() {
        let table = Table::new(
            vec!["company_name".to_string(), "industry".to_string()],
            vec![
                vec!["Acme".to_string(), "Tools".to_string()],
                vec![],
                vec!["Globex".to_string()],
            ],
        );

        assert_eq!(
            table.column_values("company_name").unwrap(),
            vec!["Acme".to_string(), String::new(), "Globex".to_string()]
        );
        assert_eq!(
            table.column_values("industry").unwrap(),
            vec!["Tools".to_string(), String::new(), String::new()]
        );
    }

    #[test]
    fn test_missing_column() {
        let err = Table::sample().column_values("name").unwrap_err();
        assert!(matches!(err, BusinessError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_from_values_splits_header() {
        let table = Table::from_values(vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string(), "2".to_string()],
        ]);

        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.to_values().len(), 2);
        assert!(Table::from_values(Vec::new()).is_empty());
    }

    #[test]
    fn test_head() {
        assert_eq!(Table::sample().head(2).len(), 2);
        assert_eq!(Table::sample().head(10).len(), 3);
    }

    #[test]
    fn test_records_to_csv() {
        let prompt = "What is {company}'s main product?".to_string();
        let mut fields = ExtractionResult::new();
        fields.insert(prompt.as_str(), "Widgets, gadgets; \"premium\" line");
        let records = vec![OutputRecord::new("Acme", fields)];

        let csv = Table::from_records(&records, &[prompt]).to_csv();

        assert_eq!(
            csv,
            "entity,What is {company}'s main product?\n\
             Acme,\"Widgets, gadgets; \"\"premium\"\" line\"\n"
        );
    }
}
