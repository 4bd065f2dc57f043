//! # LLM Quiz Solver
//!
//! 一个 HTTP 服务：收到求解请求后，自动完成"抓取题目 → LLM 作答 → 提交 → 下一题"的链条
//!
//! ## 架构设计
//!
//! 本系统采用分层架构，只允许向下依赖：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `build_http_client` - 共享的 HTTP 客户端
//! - `HeadlessBrowser` - 可选的无头浏览器（`headless` 特性）
//!
//! ### ② 业务能力层（Services / Clients）
//! - `services/` - 描述"我能做什么"，只处理单个题目页面
//! - `PageFetcher` - 抓取页面和数据文件
//! - `SubmitTargetStrategy` - 识别提交地址
//! - `AnswerGenerator` - 生成提交数据
//! - `AnswerSubmitter` - 提交答案
//! - `clients/LlmClient` - OpenAI 兼容的对话接口
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuizCtx` - 上下文封装（run_id + step_index）
//! - `QuizStepExecutor` - fetch → target → generate → submit
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/quiz_runner` - 逐题推进，控制步数上限
//!
//! ### ⑤ 入口层（Server）
//! - `server/handler` - 校验请求，隔离故障
//! - `server/routes` - axum 路由
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod server;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{QuizOutcome, RawQuizRequest};
pub use orchestrator::QuizRunner;
pub use server::{router, AppState, RequestHandler};
pub use workflow::{QuizCtx, QuizStepExecutor};
