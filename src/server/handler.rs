//! 请求处理器
//!
//! 校验请求，启动一条题目链，并保证无论发生什么都只返回一个 `QuizOutcome`。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::{AppError, ValidationError};
use crate::models::{QuizOutcome, RawQuizRequest, RunSummary};
use crate::orchestrator::QuizRunner;
use crate::utils::logging::{log_run_complete, log_run_start};
use crate::workflow::QuizCtx;

/// 请求处理器
///
/// - 密钥不匹配时不发起任何网络请求
/// - 求解在独立任务中执行，任务 panic 转换为 `internal` 错误
/// - 可选的整体超时
pub struct RequestHandler {
    runner: Arc<QuizRunner>,
    expected_secret: String,
    expected_email: Option<String>,
    run_timeout: Option<Duration>,
    next_run_id: AtomicU64,
}

impl RequestHandler {
    pub fn new(runner: Arc<QuizRunner>, expected_secret: impl Into<String>) -> Self {
        Self {
            runner,
            expected_secret: expected_secret.into(),
            expected_email: None,
            run_timeout: None,
            next_run_id: AtomicU64::new(1),
        }
    }

    /// 配置中的邮箱，仅用于比对告警
    pub fn with_expected_email(mut self, email: Option<String>) -> Self {
        self.expected_email = email;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// 请求体无法解析时的结果
    pub fn reject_malformed(&self, reason: impl Into<String>) -> QuizOutcome {
        let error = AppError::from(ValidationError::MalformedBody(reason.into()));
        warn!("⚠️ 拒绝请求: {}", error);
        QuizOutcome::rejected(&error)
    }

    /// 处理一次求解请求
    pub async fn handle(&self, raw: RawQuizRequest) -> QuizOutcome {
        let request = match raw.validate(&self.expected_secret) {
            Ok(r) => r,
            Err(e) => {
                let error = AppError::from(e);
                warn!("⚠️ 拒绝请求: {}", error);
                return QuizOutcome::rejected(&error);
            }
        };

        if let Some(expected) = &self.expected_email {
            if !expected.eq_ignore_ascii_case(&request.email) {
                warn!("⚠️ 请求邮箱 {} 与配置的 {} 不一致", request.email, expected);
            }
        }

        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        log_run_start(run_id, &request.email, &request.url, self.runner.max_steps());

        let ctx = QuizCtx::new(run_id, request.email.clone(), request.secret);
        let runner = self.runner.clone();
        let start_url = request.url.clone();
        let mut task = tokio::spawn(async move { runner.run(&ctx, &start_url).await });

        let joined = match self.run_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    error!("[run {}] ⏱️ 整体超时 ({}s)", run_id, limit.as_secs());
                    let summary = aborted_summary(
                        &request.url,
                        format!("run timed out after {}s", limit.as_secs()),
                    );
                    return finish(run_id, &request.email, summary);
                }
            },
            None => task.await,
        };

        let summary = match joined {
            Ok(summary) => summary,
            Err(e) => {
                error!("[run {}] 💥 求解任务异常退出: {}", run_id, e);
                aborted_summary(&request.url, format!("quiz run aborted: {}", e))
            }
        };

        finish(run_id, &request.email, summary)
    }
}

fn aborted_summary(start_url: &str, reason: String) -> RunSummary {
    RunSummary {
        start_url: start_url.to_string(),
        records: Vec::new(),
        failure: Some(AppError::Internal(reason)),
    }
}

fn finish(run_id: u64, email: &str, summary: RunSummary) -> QuizOutcome {
    let error = summary.failure.as_ref().map(|e| e.to_string());
    log_run_complete(run_id, summary.steps_taken(), error.as_deref());
    QuizOutcome::from_summary(email, summary)
}
