//! 页面相关模型

use serde::Serialize;

/// 一次抓取得到的页面快照
///
/// 每次抓取都重新生成，不做缓存，用完即丢弃
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    /// 抓取的页面地址（解析相对链接时作为基准）
    pub url: String,
    /// 原始 HTML
    pub raw_html: String,
    /// 可见文本（包括解码后的 atob 块）
    pub text: String,
    /// 页面上的链接，按首次出现顺序去重
    pub links: Vec<String>,
}

/// 提交地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTarget {
    pub url: String,
}

impl SubmitTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// 下载得到的原始文件
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// 交给 LLM 的数据文件摘要
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DataFile {
    pub url: String,
    pub content_type: String,
    pub text_snippet: String,
}
