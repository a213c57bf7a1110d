pub mod llm_client;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod serp_client;
pub mod sheets_client;
pub mod traits;

pub use llm_client::LlmClient;
pub use serp_client::SerpClient;
pub use sheets_client::GoogleSheetsClient;
pub use traits::{ChatBackend, SearchProvider, SheetStore};

/// 构建共享的 HTTP 客户端（可选超时）
pub fn build_http_client(timeout: Option<std::time::Duration>) -> crate::error::AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| crate::error::AppError::api_request_failed("http-client", e))
}
