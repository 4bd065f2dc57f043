pub mod quiz_ctx;
pub mod quiz_step;

pub use quiz_ctx::QuizCtx;
pub use quiz_step::QuizStepExecutor;
