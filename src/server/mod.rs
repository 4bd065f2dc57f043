//! HTTP 入口层
//!
//! - `handler` 校验请求、隔离故障，产出最终结果
//! - `routes` 把结果包装成 HTTP 响应

pub mod handler;
pub mod routes;

pub use handler::RequestHandler;
pub use routes::{router, AppState};
