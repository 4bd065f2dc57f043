//! 单步结果与最终结果

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::AppError;

/// 单步执行记录，原样出现在响应体的 `results` 数组中
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StepRecord {
    pub quiz_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<JsonValue>,
    /// 已遮盖密钥的提交数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_payload: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_response: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    pub fn new(quiz_url: impl Into<String>) -> Self {
        Self {
            quiz_url: quiz_url.into(),
            ..Default::default()
        }
    }
}

/// 单步执行结果
///
/// 所有失败路径都汇聚成同一个形状，QuizRunner 只看
/// `succeeded` / `next_url` 决定是否继续
#[derive(Debug)]
pub struct StepResult {
    pub succeeded: bool,
    pub next_url: Option<String>,
    pub message: Option<String>,
    /// 失败原因（仅在 `succeeded == false` 时存在）
    pub error: Option<AppError>,
    pub record: StepRecord,
}

impl StepResult {
    /// 提交成功，服务器给出了下一题（`next_url` 为 None 表示结束）
    pub fn submitted(record: StepRecord) -> Self {
        Self {
            succeeded: true,
            next_url: record.next_url.clone(),
            message: None,
            error: None,
            record,
        }
    }

    /// 本步失败
    pub fn failed(mut record: StepRecord, error: AppError) -> Self {
        let message = error.to_string();
        record.error = Some(message.clone());
        Self {
            succeeded: false,
            next_url: None,
            message: Some(message),
            error: Some(error),
            record,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !self.succeeded || self.next_url.is_none()
    }
}

/// 一次完整求解的汇总
#[derive(Debug)]
pub struct RunSummary {
    pub start_url: String,
    pub records: Vec<StepRecord>,
    /// 为 None 表示正常结束
    pub failure: Option<AppError>,
}

impl RunSummary {
    pub fn steps_taken(&self) -> usize {
        self.records.len()
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// 结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Error,
}

/// 返回给调用方的最终结果，构建后不再修改
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuizOutcome {
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    pub steps_taken: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<StepRecord>,
}

impl QuizOutcome {
    /// 还没开始执行就失败（校验错误等）
    pub fn rejected(error: &AppError) -> Self {
        Self {
            status: OutcomeStatus::Error,
            email: None,
            message: Some(error.to_string()),
            error_kind: Some(error.kind().to_string()),
            start_url: None,
            steps_taken: 0,
            results: Vec::new(),
        }
    }

    /// 根据执行汇总构建
    pub fn from_summary(email: &str, summary: RunSummary) -> Self {
        let steps_taken = summary.steps_taken();
        let (status, message, error_kind) = match &summary.failure {
            None => (OutcomeStatus::Ok, None, None),
            Some(e) => (
                OutcomeStatus::Error,
                Some(e.to_string()),
                Some(e.kind().to_string()),
            ),
        };
        Self {
            status,
            email: Some(email.to_string()),
            message,
            error_kind,
            start_url: Some(summary.start_url),
            steps_taken,
            results: summary.records,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OutcomeStatus::Ok
    }
}
