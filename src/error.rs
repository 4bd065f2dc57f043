//! 错误类型
//!
//! 按来源分层：请求校验 / 页面抓取 / 答案生成 / 答案提交 / 配置。
//! 所有在 RequestHandler 之下产生的错误最终都会转换为
//! `{"status": "error", ...}` 响应体，不会以 HTTP 故障的形式泄露出去。

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 请求校验错误
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 页面抓取错误
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// 页面上找不到提交地址
    #[error("no submit target found on {url}")]
    NoSubmitTarget { url: String },

    /// LLM 生成答案失败
    #[error("answer generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// 提交答案失败
    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),

    /// 超出步数上限
    #[error("step budget of {max_steps} exceeded, next url was {last_url}")]
    StepBudgetExceeded { max_steps: usize, last_url: String },

    /// 配置错误
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 其他内部错误（任务 panic、整体超时等）
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 错误分类，写入响应体的 `error_kind` 字段
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Fetch(_) => "fetch",
            AppError::NoSubmitTarget { .. } => "no_submit_target",
            AppError::Generation(_) => "generation",
            AppError::Submit(_) => "submit",
            AppError::StepBudgetExceeded { .. } => "step_budget_exceeded",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

/// 请求校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 请求体不是合法 JSON
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// 必填字段缺失或为空
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// 密钥不匹配
    #[error("secret mismatch")]
    SecretMismatch,

    /// 起始 URL 不是 http(s) 绝对地址
    #[error("invalid quiz url: {0}")]
    InvalidUrl(String),
}

/// 页面抓取错误
#[derive(Debug, Error)]
pub enum FetchError {
    /// 网络请求失败（超时、连接失败等）
    #[error("request to {url} failed: {source}")]
    RequestFailed { url: String, source: BoxError },

    /// 返回了非 2xx 状态码
    #[error("{url} returned HTTP {status}")]
    BadStatus { url: String, status: u16 },

    /// 读取响应体失败
    #[error("failed to read body of {url}: {source}")]
    BodyReadFailed { url: String, source: BoxError },
}

/// LLM 生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 构建请求失败
    #[error("failed to build request for model {model}: {source}")]
    RequestBuildFailed { model: String, source: BoxError },

    /// API 调用失败
    #[error("LLM API call failed (model: {model}): {source}")]
    ApiCallFailed { model: String, source: BoxError },

    /// 调用超时
    #[error("LLM call timed out after {secs}s (model: {model})")]
    Timeout { model: String, secs: u64 },

    /// 返回内容为空
    #[error("LLM returned empty content (model: {model})")]
    EmptyContent { model: String },
}

/// 提交错误
#[derive(Debug, Error)]
pub enum SubmitError {
    /// 网络请求失败
    #[error("POST {url} failed: {source}")]
    RequestFailed { url: String, source: BoxError },

    /// 返回了非 2xx 状态码
    #[error("POST {url} returned HTTP {status}: {body}")]
    BadStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// 返回了 JSON，但不是对象
    #[error("unexpected response shape from {url}: {body}")]
    UnexpectedShape { url: String, body: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("env var {var_name} = '{value}' cannot be parsed as {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: &'static str,
    },

    /// 必填项为空
    #[error("required setting {0} is empty")]
    MissingSetting(&'static str),

    /// 取值不合法
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    /// 配置文件读取/解析失败
    #[error("failed to load config file {path}: {source}")]
    FileLoadFailed { path: String, source: BoxError },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建页面请求失败错误
    pub fn fetch_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Fetch(FetchError::RequestFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建提交请求失败错误
    pub fn submit_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Submit(SubmitError::RequestFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
