//! 单步求解流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 抓取页面
//! 2. 找到提交地址（找不到就不调用 LLM）
//! 3. 提取说明、模板，下载数据文件
//! 4. LLM 生成答案
//! 5. 提交，读取下一题地址

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::{StepRecord, StepResult};
use crate::services::{
    extract_quiz_instructions, extract_submission_template, next_url_from_response,
    pick_data_file_links, AnswerGenerator, AnswerSubmitter, DataFileLoader, GenerationRequest,
    PageFetcher, SubmitTargetStrategy,
};
use crate::utils::truncate_text;
use crate::workflow::quiz_ctx::QuizCtx;

/// 单步执行器
///
/// - 只处理一个题目地址
/// - 不关心步数上限和链条
/// - 所有失败都收敛成 `StepResult::failed`，不向上抛错
pub struct QuizStepExecutor {
    fetcher: Arc<dyn PageFetcher>,
    target_strategy: Arc<dyn SubmitTargetStrategy>,
    generator: Arc<dyn AnswerGenerator>,
    submitter: Arc<dyn AnswerSubmitter>,
    data_files: Option<DataFileLoader>,
}

impl QuizStepExecutor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        target_strategy: Arc<dyn SubmitTargetStrategy>,
        generator: Arc<dyn AnswerGenerator>,
        submitter: Arc<dyn AnswerSubmitter>,
    ) -> Self {
        Self {
            fetcher,
            target_strategy,
            generator,
            submitter,
            data_files: None,
        }
    }

    /// 启用数据文件下载
    pub fn with_data_files(mut self, loader: DataFileLoader) -> Self {
        self.data_files = Some(loader);
        self
    }

    /// 执行一步
    ///
    /// # 返回
    /// 成功时 `next_url` 为服务器给出的下一题（None 表示链条结束）
    pub async fn run(&self, ctx: &QuizCtx, quiz_url: &str) -> StepResult {
        let mut record = StepRecord::new(quiz_url);

        // ========== 1. 抓取页面 ==========
        info!("{} 🌐 抓取题目页面 {}", ctx, quiz_url);
        let snapshot = match self.fetcher.fetch_page(quiz_url).await {
            Ok(s) => s,
            Err(e) => return self.fail(ctx, record, e),
        };
        debug!(
            "{} 页面文本 {} 字符，链接 {} 个",
            ctx,
            snapshot.text.chars().count(),
            snapshot.links.len()
        );

        // ========== 2. 提交地址 ==========
        let Some(target) = self.target_strategy.find(&snapshot) else {
            let e = AppError::NoSubmitTarget {
                url: quiz_url.to_string(),
            };
            return self.fail(ctx, record, e);
        };
        info!("{} ✓ 提交地址: {}", ctx, target.url);
        record.submit_url = Some(target.url.clone());

        // ========== 3. 说明 / 模板 / 数据文件 ==========
        let instructions = extract_quiz_instructions(&snapshot.text);
        let template = extract_submission_template(&snapshot.text);
        if template.is_some() {
            debug!("{} 找到提交模板", ctx);
        }

        let data_files = match &self.data_files {
            Some(loader) => {
                let links = pick_data_file_links(&snapshot.links);
                if !links.is_empty() {
                    info!("{} 📄 下载 {} 个数据文件", ctx, links.len());
                }
                loader.load_all(&links).await
            }
            None => Vec::new(),
        };

        // ========== 4. 生成答案 ==========
        info!("{} 🤖 请求 LLM 生成答案...", ctx);
        let request = GenerationRequest {
            quiz_url,
            email: &ctx.email,
            secret: &ctx.secret,
            snapshot: &snapshot,
            instructions: &instructions,
            template: template.as_ref(),
            data_files: &data_files,
        };
        let payload = match self.generator.generate(&request).await {
            Ok(p) => p,
            Err(e) => return self.fail(ctx, record, e),
        };
        record.answer = payload.answer().cloned();
        record.submit_payload = Some(payload.redacted());
        info!(
            "{} ✓ 答案: {}",
            ctx,
            truncate_text(
                &payload.answer().map(|a| a.to_string()).unwrap_or_default(),
                200
            )
        );

        // ========== 5. 提交 ==========
        let response = match self.submitter.submit(&target.url, &payload).await {
            Ok(r) => r,
            Err(e) => return self.fail(ctx, record, e),
        };
        let next_url = next_url_from_response(&response, &target.url);
        record.submit_response = Some(response);
        record.next_url = next_url;

        match &record.next_url {
            Some(next) => info!("{} ✓ 已提交，下一题: {}", ctx, next),
            None => info!("{} ✓ 已提交，没有下一题", ctx),
        }

        StepResult::submitted(record)
    }

    fn fail(&self, ctx: &QuizCtx, record: StepRecord, error: AppError) -> StepResult {
        warn!("{} ✗ 本步失败 ({}): {}", ctx, error.kind(), error);
        StepResult::failed(record, error)
    }
}
