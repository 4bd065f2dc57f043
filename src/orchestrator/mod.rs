//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责链式调度：一次请求对应一条题目链，逐题推进直到结束或用完步数。
//!
//! ## 层次关系
//!
//! ```text
//! server::RequestHandler (校验请求、隔离故障)
//!     ↓
//! quiz_runner (处理一条题目链)
//!     ↓
//! workflow::QuizStepExecutor (处理单个题目地址)
//!     ↓
//! services (能力层：fetch / parse / llm / submit)
//!     ↓
//! infrastructure (基础设施：HTTP 客户端、无头浏览器)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：只做循环和步数控制，不做具体业务判断
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **请求隔离**：每次请求的状态只存在于一次 `run` 调用中

pub mod quiz_runner;

pub use quiz_runner::QuizRunner;
