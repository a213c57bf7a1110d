/// SerpAPI 客户端
///
/// 只负责发出一次 HTTP 查询并返回原始 JSON，不做重试和结果解析
use crate::clients::traits::SearchProvider;
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// SerpAPI 客户端
pub struct SerpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    engine: String,
    results_per_query: u32,
    region: String,
}

impl SerpClient {
    /// 创建新的搜索客户端
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.serpapi_base_url.clone(),
            api_key: config.serpapi_api_key.clone(),
            engine: config.search_engine.clone(),
            results_per_query: config.search_results_per_query,
            region: config.search_region.clone(),
        }
    }

    /// 查询参数（不含密钥，便于日志输出）
    ///
    /// 密钥只出现在请求 URL 中，所以传输错误都要先去掉 URL 再向上返回
    fn query_params(&self, query: &str) -> Vec<(&'static str, String)> {
        vec![
            ("engine", self.engine.clone()),
            ("q", query.to_string()),
            ("num", self.results_per_query.to_string()),
            ("gl", self.region.clone()),
        ]
    }

    /// 执行搜索
    ///
    /// 非 2xx 响应和非 JSON 响应体都视为错误
    pub async fn search_raw(&self, query: &str) -> AppResult<Value> {
        let mut params = self.query_params(query);
        debug!("SerpAPI 查询参数: {:?}", params);
        params.push(("api_key", self.api_key.clone()));

        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&self.base_url, e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            return Err(ApiError::BadResponse {
                endpoint: self.base_url.clone(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::api_request_failed(&self.base_url, e.without_url()))?;
        let payload: Value = serde_json::from_slice(&bytes)?;

        Ok(payload)
    }
}

#[async_trait]
impl SearchProvider for SerpClient {
    async fn fetch(&self, query: &str) -> AppResult<Value> {
        self.search_raw(query).await
    }
}
