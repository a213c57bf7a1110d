/// Google Sheets v4 REST 客户端
///
/// 使用预先获取的 OAuth 访问令牌；令牌的获取流程不在本程序范围内
use crate::clients::traits::SheetStore;
use crate::config::Config;
use crate::config::SHEETS_API_BASE_URL_VAR;
use crate::error::{ApiError, AppError, AppResult, ConfigError};
use crate::models::Table;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use tracing::{debug, info};

/// 表格客户端
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GoogleSheetsClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// 配置中有访问令牌时才创建
    pub fn from_config(config: &Config, http: reqwest::Client) -> Option<Self> {
        config
            .google_sheets_access_token
            .as_ref()
            .map(|token| Self::new(config.sheets_api_base_url.clone(), token.clone(), http))
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}`，区域名按路径段编码
    fn values_url(&self, sheet_id: &str, range: &str) -> AppResult<Url> {
        let mut url = parse_base_url(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| invalid_base_url("不能作为路径前缀"))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", sheet_id, "values", range]);
        Ok(url)
    }

    async fn check_status(endpoint: &str, response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.ok();
        Err(ApiError::BadResponse {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

/// 解析表格服务的基础地址
pub fn parse_base_url(base_url: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(base_url).map_err(|e| invalid_base_url(&e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid_base_url("不能作为路径前缀"));
    }
    Ok(url)
}

fn invalid_base_url(reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var_name: SHEETS_API_BASE_URL_VAR.to_string(),
        reason: reason.to_string(),
    }
}

/// 将 values 响应转换为表格；单元格可能是字符串、数字或布尔值
pub fn parse_values(payload: &Value) -> Table {
    let values = payload
        .get("values")
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|cells| cells.iter().map(cell_to_string).collect())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default();
    Table::from_values(values)
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsClient {
    async fn read_table(&self, sheet_id: &str, range: &str) -> AppResult<Table> {
        let url = self.values_url(sheet_id, range)?;
        let endpoint = url.to_string();
        debug!("读取表格: {}", endpoint);

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;
        let response = Self::check_status(&endpoint, response).await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        let table = parse_values(&payload);
        info!("✓ 已读取表格 {} 行", table.len());
        Ok(table)
    }

    async fn write_table(&self, sheet_id: &str, range: &str, table: &Table) -> AppResult<()> {
        let mut url = self.values_url(sheet_id, range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let endpoint = url.to_string();

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": table.to_values(),
        });

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;
        Self::check_status(&endpoint, response).await?;

        info!("✓ 结果已写入表格 {} ({})", sheet_id, range);
        Ok(())
    }
}
