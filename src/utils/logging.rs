/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化全局日志
///
/// `RUST_LOG` 优先；否则根据 `verbose` 选择 `debug` 或 `info`。
/// 重复调用不会 panic（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},hyper=warn,reqwest=warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - LLM 测验求解服务 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 监听地址: {}:{}", config.bind_addr, config.port);
    info!("🤖 模型: {} @ {}", config.llm_model_name, config.llm_api_base_url);
    info!("📊 步数上限: {}", config.max_steps);
    if config.llm_api_key.trim().is_empty() {
        warn!("⚠️ LLM_API_KEY 未设置，LLM 调用将会失败");
    }
    info!("{}", "=".repeat(60));
}

/// 记录一次求解开始
pub fn log_run_start(run_id: u64, email: &str, start_url: &str, max_steps: usize) {
    info!("\n{}", "─".repeat(60));
    info!("[run {}] 📥 收到请求: {} -> {}", run_id, email, start_url);
    info!("[run {}] 📋 步数上限: {}", run_id, max_steps);
}

/// 记录一次求解结束
pub fn log_run_complete(run_id: u64, steps_taken: usize, error: Option<&str>) {
    match error {
        None => info!("[run {}] ✅ 求解完成，共 {} 步", run_id, steps_taken),
        Some(e) => info!("[run {}] ❌ 求解失败（已执行 {} 步）: {}", run_id, steps_taken, e),
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
