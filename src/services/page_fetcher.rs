//! 页面抓取服务 - 业务能力层
//!
//! 只负责"给一个 URL，拿回页面内容"，单次尝试，超时由 HTTP 客户端控制

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{AppError, AppResult, FetchError};
use crate::models::{FetchedFile, PageSnapshot};
use crate::services::page_parser::parse_page;

/// 页面抓取能力
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 抓取并解析题目页面
    async fn fetch_page(&self, url: &str) -> AppResult<PageSnapshot>;

    /// 下载页面引用的数据文件
    async fn fetch_file(&self, url: &str) -> AppResult<FetchedFile>;
}

/// 基于 reqwest 的抓取实现
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> AppResult<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch_failed(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }

        Ok(response)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> AppResult<PageSnapshot> {
        debug!("GET {}", url);

        let response = self.get(url).await?;
        // 重定向之后，相对链接要按实际返回页面的地址解析
        let final_url = response.url().to_string();
        if final_url != url {
            debug!("重定向到 {}", final_url);
        }
        let html = response
            .text()
            .await
            .map_err(|e| body_read_failed(url, e))?;

        debug!("页面长度: {} 字节", html.len());

        Ok(parse_page(&final_url, &html))
    }

    async fn fetch_file(&self, url: &str) -> AppResult<FetchedFile> {
        debug!("GET (file) {}", url);

        let response = self.get(url).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| body_read_failed(url, e))?;

        Ok(FetchedFile {
            url: url.to_string(),
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

fn body_read_failed(url: &str, e: reqwest::Error) -> AppError {
    AppError::Fetch(FetchError::BodyReadFailed {
        url: url.to_string(),
        source: Box::new(e),
    })
}

/// 通过无头浏览器渲染页面，数据文件仍然走 HTTP
#[cfg(feature = "headless")]
pub struct HeadlessPageFetcher {
    browser: crate::infrastructure::HeadlessBrowser,
    http: HttpPageFetcher,
}

#[cfg(feature = "headless")]
impl HeadlessPageFetcher {
    pub fn new(browser: crate::infrastructure::HeadlessBrowser, http: HttpPageFetcher) -> Self {
        Self { browser, http }
    }
}

#[cfg(feature = "headless")]
#[async_trait]
impl PageFetcher for HeadlessPageFetcher {
    async fn fetch_page(&self, url: &str) -> AppResult<PageSnapshot> {
        debug!("渲染 {}", url);
        let (final_url, html) = self.browser.render(url).await?;
        Ok(parse_page(&final_url, &html))
    }

    async fn fetch_file(&self, url: &str) -> AppResult<FetchedFile> {
        self.http.fetch_file(url).await
    }
}
