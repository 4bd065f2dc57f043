//! 求解上下文
//!
//! 封装"我正在处理哪一次请求的第几步"这一信息

use std::fmt::{self, Display};

/// 求解上下文
///
/// 包含处理单个步骤所需的身份信息，整个链条共用同一组 email / secret
#[derive(Clone)]
pub struct QuizCtx {
    /// 请求编号（仅用于日志）
    pub run_id: u64,

    pub email: String,

    pub secret: String,

    /// 当前步骤（从1开始，0 表示尚未开始）
    pub step_index: usize,
}

impl QuizCtx {
    /// 创建新的求解上下文
    pub fn new(run_id: u64, email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            run_id,
            email: email.into(),
            secret: secret.into(),
            step_index: 0,
        }
    }

    /// 进入第 `step_index` 步
    pub fn at_step(&self, step_index: usize) -> Self {
        Self {
            step_index,
            ..self.clone()
        }
    }
}

impl Display for QuizCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[run {} step {}]", self.run_id, self.step_index)
    }
}

impl fmt::Debug for QuizCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizCtx")
            .field("run_id", &self.run_id)
            .field("email", &self.email)
            .field("secret", &"***")
            .field("step_index", &self.step_index)
            .finish()
    }
}
