/// 网页搜索服务
///
/// 负责把提示词模板变成查询、调用搜索服务商、解析结果，并执行固定间隔限流。
/// 任何失败都降级为空结果，调用方把空结果当作"没有搜到"而不是中止信号。
use crate::clients::SearchProvider;
use crate::error::{ApiError, AppResult};
use crate::infrastructure::RateLimiter;
use crate::models::{render_query, SearchResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// 搜索服务
pub struct SearchService {
    provider: Arc<dyn SearchProvider>,
    limiter: Arc<RateLimiter>,
    placeholder: String,
}

impl SearchService {
    /// 创建新的搜索服务
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        limiter: Arc<RateLimiter>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            limiter,
            placeholder: placeholder.into(),
        }
    }

    /// 用实体名称替换模板中的占位符
    pub fn build_query(&self, entity: &str, template: &str) -> String {
        render_query(template, entity, &self.placeholder)
    }

    /// 为一个实体执行一次搜索
    ///
    /// # 返回
    /// 按相关度排序的结果；出错时返回空列表。无论成败，调用后都会等待限流间隔。
    pub async fn search(&self, entity: &str, template: &str) -> Vec<SearchResult> {
        let query = self.build_query(entity, template);
        debug!("搜索查询: {}", query);

        let permit = self.limiter.acquire().await;
        let outcome = match self.provider.fetch(&query).await {
            Ok(payload) => parse_organic_results(&payload),
            Err(e) => Err(e),
        };
        permit.cool_down().await;

        match outcome {
            Ok(results) => {
                debug!("[{}] 搜索到 {} 条结果", entity, results.len());
                results
            }
            Err(e) => {
                warn!("[{}] ⚠️ 搜索失败，按无结果处理: {}", entity, e);
                Vec::new()
            }
        }
    }
}

/// 解析 SerpAPI 响应
///
/// 响应中带 `error` 字段视为失败；没有 `organic_results` 视为零结果；
/// 单条结果缺失的字段取空值，不影响其他结果。
pub fn parse_organic_results(payload: &Value) -> AppResult<Vec<SearchResult>> {
    if let Some(error) = payload.get("error") {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ApiError::ProviderError {
            endpoint: "search".to_string(),
            message,
        }
        .into());
    }

    let results = payload
        .get("organic_results")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().map(SearchResult::from_value).collect())
        .unwrap_or_default();

    Ok(results)
}
