use crate::error::{AppError, AppResult, FileError};
use crate::models::job::Job;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载任务
pub async fn load_job(toml_file_path: &Path) -> AppResult<Job> {
    let path = toml_file_path.display().to_string();

    if !fs::try_exists(toml_file_path).await.unwrap_or(false) {
        return Err(FileError::NotFound { path }.into());
    }

    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|source| AppError::file_read_failed(path.clone(), source))?;

    let job = parse_job(&content, &path)?;
    tracing::info!(
        "已加载任务: {} 个提示词, 目标列 '{}'",
        job.prompts.len(),
        job.target_column
    );

    Ok(job)
}

/// 解析任务文本，`path` 只用于错误信息
pub fn parse_job(content: &str, path: &str) -> AppResult<Job> {
    let job: Job = toml::from_str(content).map_err(|source| FileError::TomlParseFailed {
        path: path.to_string(),
        source,
    })?;
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::job::JobSource;

    #[test]
    fn test_parse_inline_job() {
        let job = parse_job(
            r#"
target_column = "company_name"
prompts = ["What is the main product or service of {company}?"]
batch_size = 2

[source]
kind = "inline"
header = ["company_name", "industry"]
rows = [["Acme", "Tools"], ["Globex", "Energy"]]

[export]
csv_path = "out.csv"
"#,
            "job.toml",
        )
        .unwrap();

        assert_eq!(job.target_column, "company_name");
        assert_eq!(job.batch_size, Some(2));
        assert_eq!(job.export.csv_path(), "out.csv");
        assert_eq!(job.export.range(), "Results!A1");
        let table = job.source.local_table().unwrap();
        assert_eq!(table.column_values("company_name").unwrap(), vec!["Acme", "Globex"]);
    }

    #[test]
    fn test_parse_sheet_and_sample_sources() {
        let job = parse_job(
            r#"
target_column = "name"
prompts = ["CEO of {company}"]
source = { kind = "sheet", sheet_id = "abc", range = "Sheet1!A1:D10" }
"#,
            "job.toml",
        )
        .unwrap();
        assert_eq!(
            job.source,
            JobSource::Sheet {
                sheet_id: "abc".to_string(),
                range: "Sheet1!A1:D10".to_string()
            }
        );
        assert!(job.source.local_table().is_none());
        assert_eq!(job.export.csv_path(), "extracted_results.csv");

        let job = parse_job(
            "target_column = \"company_name\"\nprompts = []\nsource = { kind = \"sample\" }\n",
            "job.toml",
        )
        .unwrap();
        assert_eq!(job.source.local_table().unwrap().len(), 3);
    }

    #[test]
    fn test_parse_error_carries_path() {
        let err = parse_job("prompts = 3", "broken.toml").unwrap_err();
        assert!(matches!(err, AppError::File(FileError::TomlParseFailed { .. })));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = load_job(Path::new("/definitely/not/here.toml")).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }
}
