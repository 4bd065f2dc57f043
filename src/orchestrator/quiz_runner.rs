//! 链式求解器 - 编排层
//!
//! ## 职责
//!
//! 从起始地址开始反复执行单步流程，直到：
//! 1. 服务器不再给出下一题（成功）
//! 2. 某一步失败（失败，后续步骤不再执行）
//! 3. 步数用完但仍有下一题（失败，`StepBudgetExceeded`）
//!
//! 每次请求的状态都在 `run` 的局部变量里，不同请求之间互不影响。

use std::sync::Arc;

use tracing::{error, info};

use crate::error::AppError;
use crate::models::RunSummary;
use crate::workflow::{QuizCtx, QuizStepExecutor};

/// 链式求解器
pub struct QuizRunner {
    executor: Arc<QuizStepExecutor>,
    max_steps: usize,
}

impl QuizRunner {
    pub fn new(executor: Arc<QuizStepExecutor>, max_steps: usize) -> Self {
        Self {
            executor,
            max_steps: max_steps.max(1),
        }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// 执行整条链
    ///
    /// # 参数
    /// - `ctx`: 本次请求的上下文（step_index 由这里维护）
    /// - `start_url`: 第一题地址
    ///
    /// # 返回
    /// 执行汇总，`records` 与实际执行的步数一一对应
    pub async fn run(&self, ctx: &QuizCtx, start_url: &str) -> RunSummary {
        let mut records = Vec::new();
        let mut current_url = start_url.to_string();

        for step_index in 1..=self.max_steps {
            let step_ctx = ctx.at_step(step_index);
            let result = self.executor.run(&step_ctx, &current_url).await;
            let terminal = result.is_terminal();
            records.push(result.record);

            if terminal {
                let failure = if result.succeeded {
                    info!("{} 🎉 链条完成，共 {} 步", step_ctx, step_index);
                    None
                } else {
                    let failure = result.error.unwrap_or_else(|| {
                        AppError::Internal(
                            result.message.unwrap_or_else(|| "step failed".to_string()),
                        )
                    });
                    error!("{} ✗ 链条中止: {}", step_ctx, failure);
                    Some(failure)
                };
                return RunSummary {
                    start_url: start_url.to_string(),
                    records,
                    failure,
                };
            }

            if let Some(next) = result.next_url {
                current_url = next;
            }
        }

        error!(
            "[run {}] ✗ 已执行 {} 步，仍有下一题: {}",
            ctx.run_id, self.max_steps, current_url
        );
        RunSummary {
            start_url: start_url.to_string(),
            records,
            failure: Some(AppError::StepBudgetExceeded {
                max_steps: self.max_steps,
                last_url: current_url,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PatternSubmitTarget;
    use crate::testing::{quiz_page, ChainSubmitter, FixedGenerator, MapFetcher};
    use serde_json::json;

    fn url(n: usize) -> String {
        format!("https://quiz.test/q{}", n)
    }

    /// q1 -> q2 -> ... -> q{len}，最后一题没有下一题
    fn chain(len: usize) -> (MapFetcher, ChainSubmitter) {
        let mut fetcher = MapFetcher::default();
        let mut submitter = ChainSubmitter::default();
        for n in 1..=len {
            fetcher = fetcher.with_page(&url(n), &quiz_page(&format!("Q{}", n)));
            if n < len {
                submitter = submitter.with_next(&url(n), &url(n + 1));
            }
        }
        (fetcher, submitter)
    }

    struct Harness {
        fetcher: Arc<MapFetcher>,
        generator: Arc<FixedGenerator>,
        submitter: Arc<ChainSubmitter>,
    }

    impl Harness {
        fn new((fetcher, submitter): (MapFetcher, ChainSubmitter)) -> Self {
            Self {
                fetcher: Arc::new(fetcher),
                generator: Arc::new(FixedGenerator::new(json!("ok"))),
                submitter: Arc::new(submitter),
            }
        }

        fn runner(&self, max_steps: usize) -> QuizRunner {
            let executor = QuizStepExecutor::new(
                self.fetcher.clone(),
                Arc::new(PatternSubmitTarget::new()),
                self.generator.clone(),
                self.submitter.clone(),
            );
            QuizRunner::new(Arc::new(executor), max_steps)
        }
    }

    fn ctx() -> QuizCtx {
        QuizCtx::new(1, "a@b.com", "S1")
    }

    #[tokio::test]
    async fn chain_of_three_takes_three_steps() {
        let h = Harness::new(chain(3));

        let summary = h.runner(25).run(&ctx(), &url(1)).await;

        assert!(summary.is_success());
        assert_eq!(summary.steps_taken(), 3);
        assert_eq!(h.fetcher.page_calls(), 3);
        assert_eq!(h.generator.calls(), 3);
        assert_eq!(h.submitter.submitted_quiz_urls(), vec![url(1), url(2), url(3)]);
        assert_eq!(summary.records[2].next_url, None);
    }

    #[tokio::test]
    async fn step_budget_caps_the_chain() {
        let h = Harness::new(chain(10));

        let summary = h.runner(4).run(&ctx(), &url(1)).await;

        assert_eq!(summary.steps_taken(), 4);
        assert_eq!(h.submitter.calls(), 4);
        match summary.failure {
            Some(AppError::StepBudgetExceeded { max_steps, last_url }) => {
                assert_eq!(max_steps, 4);
                assert_eq!(last_url, url(5));
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[tokio::test]
    async fn chain_that_ends_exactly_at_budget_succeeds() {
        let h = Harness::new(chain(4));

        let summary = h.runner(4).run(&ctx(), &url(1)).await;

        assert!(summary.is_success());
        assert_eq!(summary.steps_taken(), 4);
    }

    #[tokio::test]
    async fn failure_stops_the_chain() {
        // q2 页面不存在
        let (_, submitter) = chain(3);
        let fetcher = MapFetcher::default()
            .with_page(&url(1), &quiz_page("Q1"))
            .with_page(&url(3), &quiz_page("Q3"));
        let h = Harness::new((fetcher, submitter));

        let summary = h.runner(25).run(&ctx(), &url(1)).await;

        assert_eq!(summary.steps_taken(), 2);
        assert_eq!(summary.failure.as_ref().map(AppError::kind), Some("fetch"));
        assert!(summary.records[1].error.is_some());
        assert_eq!(h.submitter.calls(), 1);
        assert_eq!(h.fetcher.page_calls(), 2);
    }

    #[tokio::test]
    async fn runs_do_not_share_state() {
        let h = Harness::new(chain(2));
        let runner = h.runner(25);

        let first = runner.run(&ctx(), &url(1)).await;
        let second = runner.run(&QuizCtx::new(2, "c@d.com", "S1"), &url(2)).await;

        assert_eq!(first.steps_taken(), 2);
        assert_eq!(second.steps_taken(), 1);
        assert_eq!(second.start_url, url(2));
    }

    #[test]
    fn zero_budget_is_raised_to_one() {
        let h = Harness::new(chain(1));
        assert_eq!(h.runner(0).max_steps(), 1);
    }
}
