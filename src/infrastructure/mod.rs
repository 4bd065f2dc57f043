//! 基础设施层
//!
//! 持有稀缺资源（HTTP 连接池、可选的无头浏览器），只暴露能力，不认识题目。

#[cfg(feature = "headless")]
pub mod headless;
pub mod http;

#[cfg(feature = "headless")]
pub use headless::HeadlessBrowser;
pub use http::build_http_client;
