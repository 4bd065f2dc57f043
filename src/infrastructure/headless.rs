//! 无头浏览器 - 基础设施层
//!
//! 持有唯一的 Browser 资源，只暴露"渲染页面并返回 HTML"的能力

use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult, FetchError};

/// 无头浏览器
pub struct HeadlessBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
    timeout: Duration,
}

impl HeadlessBrowser {
    /// 启动无头浏览器
    pub async fn launch(timeout: Duration) -> AppResult<Self> {
        info!("🚀 启动无头浏览器...");

        let config = BrowserConfig::builder()
            .new_headless_mode()
            .args(vec![
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
            ])
            .build()
            .map_err(|e| {
                error!("配置无头浏览器失败: {}", e);
                AppError::Internal(format!("headless browser config failed: {}", e))
            })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动无头浏览器失败: {}", e);
            AppError::Internal(format!("headless browser launch failed: {}", e))
        })?;

        // 在后台处理浏览器事件
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        debug!("无头浏览器启动成功");

        Ok(Self {
            browser,
            handler_task,
            timeout,
        })
    }

    /// 打开页面，等待导航完成后返回（最终地址, 渲染后的 HTML）
    pub async fn render(&self, url: &str) -> AppResult<(String, String)> {
        let work = async {
            let page = self
                .browser
                .new_page(url)
                .await
                .map_err(|e| AppError::fetch_failed(url, e))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| AppError::fetch_failed(url, e))?;
            let html = page
                .content()
                .await
                .map_err(|e| AppError::fetch_failed(url, e))?;
            let final_url = page
                .url()
                .await
                .ok()
                .flatten()
                .unwrap_or_else(|| url.to_string());
            if let Err(e) = page.close().await {
                debug!("关闭页面失败: {}", e);
            }
            Ok::<_, AppError>((final_url, html))
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(elapsed) => Err(AppError::Fetch(FetchError::RequestFailed {
                url: url.to_string(),
                source: Box::new(elapsed),
            })),
        }
    }
}

impl Drop for HeadlessBrowser {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
