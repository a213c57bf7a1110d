use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

/// 表格服务基础地址的环境变量名
pub const SHEETS_API_BASE_URL_VAR: &str = "SHEETS_API_BASE_URL";

/// 程序配置
///
/// 启动时构建一次，之后以引用方式注入各个组件；业务逻辑内部不再读取环境变量。
#[derive(Clone, Debug)]
pub struct Config {
    // --- 搜索配置 ---
    pub serpapi_api_key: String,
    pub serpapi_base_url: String,
    pub search_engine: String,
    /// 每次查询请求的结果数量
    pub search_results_per_query: u32,
    /// 搜索地区代码（gl）
    pub search_region: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- 限流与重试 ---
    /// 每次外部调用之后的固定间隔
    pub rate_limit_delay: Duration,
    /// 提取调用的最大尝试次数
    pub max_retries: usize,
    /// 指数退避的起始时长
    pub backoff_base: Duration,
    // --- 编排 ---
    /// 同时处理的实体数量（1 表示严格串行）
    pub max_concurrent_entities: usize,
    /// 提示词中代表实体的占位符
    pub prompt_placeholder: String,
    /// HTTP 请求超时（未设置则不限制）
    pub http_timeout: Option<Duration>,
    // --- 表格服务 ---
    pub sheets_api_base_url: String,
    pub google_sheets_access_token: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Config {
    /// 使用两个必需的 API 密钥和默认参数创建配置
    pub fn new(serpapi_api_key: impl Into<String>, llm_api_key: impl Into<String>) -> Self {
        Self {
            serpapi_api_key: serpapi_api_key.into(),
            serpapi_base_url: "https://serpapi.com/search".to_string(),
            search_engine: "google".to_string(),
            search_results_per_query: 5,
            search_region: "us".to_string(),
            llm_api_key: llm_api_key.into(),
            llm_api_base_url: "https://api.groq.com/openai/v1".to_string(),
            llm_model_name: "mixtral-8x7b-32768".to_string(),
            llm_temperature: 0.1,
            llm_max_tokens: 150,
            rate_limit_delay: Duration::from_secs(1),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            max_concurrent_entities: 1,
            prompt_placeholder: "{company}".to_string(),
            http_timeout: None,
            sheets_api_base_url: "https://sheets.googleapis.com".to_string(),
            google_sheets_access_token: None,
            verbose_logging: false,
        }
    }

    /// 从环境变量加载配置（如存在 .env 文件会先加载）
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 通过任意查找函数加载配置
    ///
    /// 缺少 API 密钥、数字无法解析、重试次数或并发数为 0 都会直接返回错误。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let serpapi_api_key = required(&lookup, "SERPAPI_API_KEY")?;
        let llm_api_key = required(&lookup, "GROQ_API_KEY")?;
        let default = Self::new(serpapi_api_key, llm_api_key);

        let config = Self {
            serpapi_base_url: lookup("SERPAPI_BASE_URL").unwrap_or(default.serpapi_base_url),
            search_engine: lookup("SEARCH_ENGINE").unwrap_or(default.search_engine),
            search_results_per_query: parsed(&lookup, "SEARCH_RESULTS_PER_QUERY", "u32")?
                .unwrap_or(default.search_results_per_query),
            search_region: lookup("SEARCH_REGION").unwrap_or(default.search_region),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL").unwrap_or(default.llm_model_name),
            llm_temperature: parsed(&lookup, "LLM_TEMPERATURE", "f32")?
                .unwrap_or(default.llm_temperature),
            llm_max_tokens: parsed(&lookup, "LLM_MAX_TOKENS", "u32")?
                .unwrap_or(default.llm_max_tokens),
            rate_limit_delay: parsed(&lookup, "RATE_LIMIT_DELAY_MS", "u64")?
                .map(Duration::from_millis)
                .unwrap_or(default.rate_limit_delay),
            max_retries: parsed(&lookup, "MAX_RETRIES", "usize")?.unwrap_or(default.max_retries),
            backoff_base: parsed(&lookup, "BACKOFF_BASE_MS", "u64")?
                .map(Duration::from_millis)
                .unwrap_or(default.backoff_base),
            max_concurrent_entities: parsed(&lookup, "MAX_CONCURRENT_ENTITIES", "usize")?
                .unwrap_or(default.max_concurrent_entities),
            prompt_placeholder: lookup("PROMPT_PLACEHOLDER")
                .unwrap_or(default.prompt_placeholder),
            http_timeout: parsed(&lookup, "HTTP_TIMEOUT_SECS", "u64")?.map(Duration::from_secs),
            sheets_api_base_url: lookup(SHEETS_API_BASE_URL_VAR)
                .unwrap_or(default.sheets_api_base_url),
            google_sheets_access_token: lookup("GOOGLE_SHEETS_ACCESS_TOKEN")
                .filter(|v| !v.trim().is_empty()),
            verbose_logging: parsed(&lookup, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
            ..default
        };

        config.validate()?;
        Ok(config)
    }

    /// 检查取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "MAX_RETRIES".to_string(),
                reason: "至少需要尝试 1 次".to_string(),
            });
        }
        if self.max_concurrent_entities == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "MAX_CONCURRENT_ENTITIES".to_string(),
                reason: "并发数必须大于 0".to_string(),
            });
        }
        if self.prompt_placeholder.is_empty() {
            return Err(ConfigError::InvalidValue {
                var_name: "PROMPT_PLACEHOLDER".to_string(),
                reason: "占位符不能为空".to_string(),
            });
        }
        crate::clients::sheets_client::parse_base_url(&self.sheets_api_base_url)?;
        Ok(())
    }
}

fn required<F>(lookup: &F, var_name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::EnvVarNotFound {
            var_name: var_name.to_string(),
        })
}

fn parsed<F, T>(lookup: &F, var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}
