//! 共享 HTTP 客户端
//!
//! 抓取页面、下载数据文件、提交答案共用同一个连接池。
//! 超时在客户端层面设置，保证慢速下游不会让步数上限失去意义。

use std::time::Duration;

use reqwest::Client;

const USER_AGENT: &str = concat!("llm-quiz-solver/", env!("CARGO_PKG_VERSION"));

/// 构建带超时的 HTTP 客户端
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .pool_idle_timeout(Duration::from_secs(90))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
}
