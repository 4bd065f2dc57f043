//! 程序配置
//!
//! 启动时加载一次：先读取可选的 TOML 文件（`QUIZ_CONFIG_FILE`），
//! 再用环境变量覆盖。之后只读，通过引用或 `Arc` 显式传入各组件。

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 监听地址
    pub bind_addr: String,
    /// 监听端口
    pub port: u16,
    /// 期望的请求密钥
    pub student_secret: String,
    /// 期望的邮箱（可选，不一致时只记录警告）
    pub student_email: Option<String>,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_timeout_secs: u64,
    // --- 抓取 / 提交配置 ---
    /// 单次 HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    /// 每次请求最多执行的题目步数
    pub max_steps: usize,
    /// 整个请求的总超时（秒），未设置则不限制
    pub run_timeout_secs: Option<u64>,
    /// 发给 LLM 的页面文本最大字符数
    pub max_page_chars: usize,
    /// 每个数据文件保留的最大字符数
    pub max_file_chars: usize,
    /// 是否下载页面上引用的数据文件
    pub fetch_data_files: bool,
    /// 找不到提交地址时是否回退到 `<origin>/submit`
    pub submit_origin_fallback: bool,
    /// 是否使用无头浏览器抓取页面（需要 `headless` feature）
    pub headless_browser: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8000,
            student_secret: String::new(),
            student_email: None,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_timeout_secs: 180,
            http_timeout_secs: 60,
            max_steps: 25,
            run_timeout_secs: None,
            max_page_chars: 8000,
            max_file_chars: 8000,
            fetch_data_files: true,
            submit_origin_fallback: false,
            headless_browser: false,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：TOML 文件（如果 `QUIZ_CONFIG_FILE` 指定）+ 环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("QUIZ_CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 只从环境变量读取（以默认值为基础）
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileLoadFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::FileLoadFailed { source, .. } => ConfigError::FileLoadFailed {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// 解析 TOML 文本
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::FileLoadFailed {
            path: String::new(),
            source: Box::new(e),
        })
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// 用任意键值来源覆盖当前配置，空字符串视为未设置
    pub fn with_overrides<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let llm_api_key = get("LLM_API_KEY")
            .or_else(|| get("OPENAI_API_KEY"))
            .unwrap_or(self.llm_api_key);

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(self.bind_addr),
            port: parse_var(&get, "PORT", "u16")?.unwrap_or(self.port),
            student_secret: get("STUDENT_SECRET").unwrap_or(self.student_secret),
            student_email: get("STUDENT_EMAIL").or(self.student_email),
            llm_api_key,
            llm_api_base_url: get("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: get("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_timeout_secs: parse_var(&get, "LLM_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.llm_timeout_secs),
            http_timeout_secs: parse_var(&get, "HTTP_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.http_timeout_secs),
            max_steps: parse_var(&get, "MAX_QUIZ_STEPS", "usize")?.unwrap_or(self.max_steps),
            run_timeout_secs: parse_var(&get, "RUN_TIMEOUT_SECS", "u64")?
                .or(self.run_timeout_secs),
            max_page_chars: parse_var(&get, "MAX_PAGE_CHARS", "usize")?
                .unwrap_or(self.max_page_chars),
            max_file_chars: parse_var(&get, "MAX_FILE_CHARS", "usize")?
                .unwrap_or(self.max_file_chars),
            fetch_data_files: parse_var(&get, "FETCH_DATA_FILES", "bool")?
                .unwrap_or(self.fetch_data_files),
            submit_origin_fallback: parse_var(&get, "SUBMIT_ORIGIN_FALLBACK", "bool")?
                .unwrap_or(self.submit_origin_fallback),
            headless_browser: parse_var(&get, "HEADLESS_BROWSER", "bool")?
                .unwrap_or(self.headless_browser),
            verbose_logging: parse_var(&get, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
        })
    }

    /// 启动前校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.student_secret.trim().is_empty() {
            return Err(ConfigError::MissingSetting("STUDENT_SECRET"));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "MAX_QUIZ_STEPS",
                reason: "step budget must be at least 1".to_string(),
            });
        }
        self.socket_addr()?;
        Ok(())
    }

    /// 监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        // IPv6 地址可以带方括号，也可以不带
        let host = self.bind_addr.trim();
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let ip: IpAddr = host.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidSetting {
                name: "BIND_ADDR",
                reason: format!("'{}': {}", self.bind_addr, e),
            }
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_var<T, G>(get: &G, name: &str, expected_type: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: raw,
                expected_type,
            }),
    }
}
