//! 答案提交服务 - 业务能力层
//!
//! POST 提交数据并解读服务器的响应，单次尝试。

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, SubmitError};
use crate::models::AnswerPayload;
use crate::services::page_parser::resolve_url;
use crate::utils::truncate_text;

/// 响应中可能携带下一题地址的字段，按优先级排列
const NEXT_URL_KEYS: &[&str] = &["url", "next_url", "next"];

/// 答案提交能力
#[async_trait]
pub trait AnswerSubmitter: Send + Sync {
    /// 提交答案，返回服务器响应（总是 JSON 对象）
    ///
    /// 非 JSON 的响应体包装成 `{"raw": "<text>"}`
    async fn submit(&self, url: &str, payload: &AnswerPayload) -> AppResult<JsonValue>;
}

/// 基于 reqwest 的提交实现
#[derive(Clone)]
pub struct HttpAnswerSubmitter {
    client: Client,
}

impl HttpAnswerSubmitter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnswerSubmitter for HttpAnswerSubmitter {
    async fn submit(&self, url: &str, payload: &AnswerPayload) -> AppResult<JsonValue> {
        debug!("POST {} {}", url, payload.redacted());

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::submit_failed(url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::submit_failed(url, e))?;

        if !status.is_success() {
            return Err(SubmitError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body: truncate_text(&body, 500),
            }
            .into());
        }

        let parsed = match serde_json::from_str::<JsonValue>(&body) {
            Ok(value @ JsonValue::Object(_)) => value,
            Ok(_) => {
                return Err(SubmitError::UnexpectedShape {
                    url: url.to_string(),
                    body: truncate_text(&body, 500),
                }
                .into())
            }
            Err(_) => {
                debug!("提交响应不是 JSON，按原文保存");
                json!({ "raw": body })
            }
        };

        if parsed.get("correct") == Some(&JsonValue::Bool(false)) {
            let reason = parsed
                .get("reason")
                .and_then(JsonValue::as_str)
                .unwrap_or("(no reason given)");
            warn!("⚠️ 服务器判定答案错误: {}", reason);
        }

        Ok(parsed)
    }
}

/// 从提交响应中读取下一题地址
///
/// 依次查看 `url`、`next_url`、`next`，只接受非空字符串，
/// 相对地址按提交地址解析
pub fn next_url_from_response(response: &JsonValue, submit_url: &str) -> Option<String> {
    NEXT_URL_KEYS
        .iter()
        .filter_map(|key| response.get(*key).and_then(JsonValue::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .and_then(|value| resolve_url(submit_url, value))
}
