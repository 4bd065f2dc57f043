//! 入站请求模型

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;

/// 原始请求体
///
/// 所有字段都是可选的，缺失字段在校验阶段报告，而不是由反序列化失败报告
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawQuizRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// 校验通过的请求
///
/// 三个字段均非空，密钥与配置一致，url 为 http(s) 绝对地址
#[derive(Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub email: String,
    pub secret: String,
    pub url: String,
}

impl std::fmt::Debug for QuizRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizRequest")
            .field("email", &self.email)
            .field("secret", &"***")
            .field("url", &self.url)
            .finish()
    }
}

impl RawQuizRequest {
    /// 校验请求
    ///
    /// 顺序：字段存在性 → 密钥 → URL 格式
    pub fn validate(self, expected_secret: &str) -> Result<QuizRequest, ValidationError> {
        let email = required(self.email, "email")?;
        let secret = required(self.secret, "secret")?;
        let url = required(self.url, "url")?;

        if secret != expected_secret {
            return Err(ValidationError::SecretMismatch);
        }

        match Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {}
            _ => return Err(ValidationError::InvalidUrl(url)),
        }

        Ok(QuizRequest { email, secret, url })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField(field))
}
