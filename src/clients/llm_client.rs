//! LLM 客户端 - 外部依赖层
//!
//! 只负责"发一段对话，拿回一段文本"，不关心题目和提交格式
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（自定义 base url 和模型）
//! - 超时由 `tokio::time::timeout` 控制

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GenerationError;

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    timeout: Duration,
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
            timeout: config.llm_timeout(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 通用的对话调用
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 去掉首尾空白的响应文本；空响应视为错误
    pub async fn chat(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, GenerationError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| self.build_failed(e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| self.build_failed(e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| self.build_failed(e))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                warn!("LLM API 调用超时 ({}s)", self.timeout.as_secs());
                GenerationError::Timeout {
                    model: self.model_name.clone(),
                    secs: self.timeout.as_secs(),
                }
            })?
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                GenerationError::ApiCallFailed {
                    model: self.model_name.clone(),
                    source: Box::new(e),
                }
            })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(GenerationError::EmptyContent {
                model: self.model_name.clone(),
            });
        }

        Ok(content)
    }

    fn build_failed(&self, e: async_openai::error::OpenAIError) -> GenerationError {
        GenerationError::RequestBuildFailed {
            model: self.model_name.clone(),
            source: Box::new(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_takes_model_from_config() {
        let config = Config {
            llm_model_name: "test-model".to_string(),
            ..Config::default()
        };
        let client = LlmClient::new(&config);
        assert_eq!(client.model_name(), "test-model");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_api_error() {
        let config = Config {
            llm_api_key: "sk-test".to_string(),
            llm_api_base_url: "http://127.0.0.1:9/v1".to_string(),
            llm_timeout_secs: 5,
            ..Config::default()
        };
        let err = LlmClient::new(&config).chat("hi", None).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::ApiCallFailed { .. } | GenerationError::Timeout { .. }
        ));
    }

    #[tokio::test]
    #[ignore] // 需要真实的 API key
    async fn live_chat_round_trip() {
        let config = Config::from_env().expect("config");
        let client = LlmClient::new(&config);
        let reply = client
            .chat("Reply with the single word: pong", Some("You are terse."))
            .await
            .expect("llm reply");
        assert!(!reply.is_empty());
    }
}
