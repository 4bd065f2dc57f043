//! 应用生命周期
//!
//! 根据配置组装各层组件，绑定端口，收到 Ctrl-C 后优雅退出

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::infrastructure::build_http_client;
use crate::orchestrator::QuizRunner;
use crate::server::{router, AppState, RequestHandler};
use crate::services::{
    DataFileLoader, HttpAnswerSubmitter, HttpPageFetcher, LlmAnswerGenerator, PageFetcher,
    PatternSubmitTarget,
};
use crate::utils::logging::log_startup;
use crate::workflow::QuizStepExecutor;

/// 应用主结构
pub struct App {
    config: Config,
    state: Arc<AppState>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let http = build_http_client(config.http_timeout()).context("创建 HTTP 客户端失败")?;

        let fetcher = build_fetcher(&config, HttpPageFetcher::new(http.clone())).await?;

        let llm = Arc::new(LlmClient::new(&config));
        let generator = LlmAnswerGenerator::new(llm, config.max_page_chars);

        let mut executor = QuizStepExecutor::new(
            fetcher.clone(),
            Arc::new(PatternSubmitTarget::new().with_origin_fallback(config.submit_origin_fallback)),
            Arc::new(generator),
            Arc::new(HttpAnswerSubmitter::new(http)),
        );
        if config.fetch_data_files {
            executor = executor.with_data_files(DataFileLoader::new(fetcher, config.max_file_chars));
        }

        let runner = QuizRunner::new(Arc::new(executor), config.max_steps);
        let handler = RequestHandler::new(Arc::new(runner), config.student_secret.clone())
            .with_expected_email(config.student_email.clone())
            .with_run_timeout(config.run_timeout());

        Ok(Self {
            config,
            state: Arc::new(AppState { handler }),
        })
    }

    /// 运行 HTTP 服务，直到收到退出信号
    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("无法监听 {}", addr))?;

        log_startup(&self.config);
        info!("✓ 服务已启动: http://{}", listener.local_addr()?);

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        info!("👋 服务已停止");
        Ok(())
    }
}

#[cfg(feature = "headless")]
async fn build_fetcher(config: &Config, http: HttpPageFetcher) -> Result<Arc<dyn PageFetcher>> {
    use crate::infrastructure::HeadlessBrowser;
    use crate::services::HeadlessPageFetcher;

    if !config.headless_browser {
        return Ok(Arc::new(http));
    }
    info!("🧭 启动无头浏览器...");
    let browser = HeadlessBrowser::launch(config.http_timeout())
        .await
        .context("无头浏览器启动失败")?;
    Ok(Arc::new(HeadlessPageFetcher::new(browser, http)))
}

#[cfg(not(feature = "headless"))]
async fn build_fetcher(config: &Config, http: HttpPageFetcher) -> Result<Arc<dyn PageFetcher>> {
    if config.headless_browser {
        warn!("⚠️ HEADLESS_BROWSER=true 但未启用 headless 特性，使用 HTTP 抓取");
    }
    Ok(Arc::new(http))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ 无法监听 Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到退出信号，正在关闭...");
}
