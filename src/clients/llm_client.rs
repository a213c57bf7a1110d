/// LLM API 客户端
///
/// 封装与 OpenAI 兼容接口（默认 Groq）的单次对话补全调用，不含重试
use crate::clients::traits::ChatBackend;
use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    /// 构建请求：系统消息 + 用户消息，带温度和输出长度上限
    fn build_request(
        &self,
        system_message: &str,
        user_message: &str,
    ) -> AppResult<CreateChatCompletionRequest> {
        let build_failed = |source: OpenAIError| AppError::Llm(LlmError::RequestBuildFailed { source });

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(build_failed)?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(build_failed)?;

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(build_failed)
    }

    /// 发送聊天请求，返回去除首尾空白的回复
    pub async fn chat(&self, system_message: &str, user_message: &str) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let request = self.build_request(system_message, user_message)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let choice = response.choices.first().ok_or_else(|| LlmError::EmptyResponse {
            model: self.model_name.clone(),
        })?;

        let content = choice
            .message
            .content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.to_string())
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(&self, system_message: &str, user_message: &str) -> AppResult<String> {
        self.chat(system_message, user_message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_client() -> LlmClient {
        let mut config = Config::new("serp", "test-key");
        config.llm_temperature = 0.2;
        config.llm_max_tokens = 64;
        LlmClient::new(&config)
    }

    #[test]
    fn test_request_carries_sampling_settings() {
        let client = create_test_client();

        let request = client.build_request("system", "user").unwrap();

        assert_eq!(request.model, "mixtral-8x7b-32768");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.temperature, Some(0.2));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
    }

    /// 需要真实的 GROQ_API_KEY
    #[tokio::test]
    #[ignore]
    async fn test_live_chat() {
        let _ = tracing_subscriber::fmt::try_init();
        let config = Config::from_env().expect("缺少配置");
        let client = LlmClient::new(&config);

        let reply = client
            .chat("Answer with one word.", "What color is the sky on a clear day?")
            .await
            .expect("LLM 调用失败");

        println!("LLM 响应: {}", reply);
        assert!(!reply.is_empty());
    }
}
