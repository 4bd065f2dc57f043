//! 数据文件服务 - 业务能力层
//!
//! 挑出页面引用的数据文件，下载并转成 LLM 可读的文本摘要。
//! 单个文件下载失败只记录在摘要里，不会让这一步失败。

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::models::{DataFile, FetchedFile};
use crate::services::page_fetcher::PageFetcher;
use crate::utils::truncate_text;

const DATA_EXTENSIONS: &[&str] = &[".csv", ".json", ".txt", ".tsv", ".pdf"];

/// 挑出看起来是数据文件的链接（按路径扩展名判断，忽略查询参数）
pub fn pick_data_file_links(links: &[String]) -> Vec<String> {
    let mut chosen: Vec<String> = Vec::new();
    for link in links {
        let path = Url::parse(link)
            .map(|u| u.path().to_lowercase())
            .unwrap_or_else(|_| link.to_lowercase());
        if DATA_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) && !chosen.contains(link) {
            chosen.push(link.clone());
        }
    }
    chosen
}

/// 数据文件加载器
pub struct DataFileLoader {
    fetcher: Arc<dyn PageFetcher>,
    max_chars: usize,
}

impl DataFileLoader {
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_chars: usize) -> Self {
        Self { fetcher, max_chars }
    }

    /// 依次下载所有文件
    pub async fn load_all(&self, urls: &[String]) -> Vec<DataFile> {
        let mut files = Vec::with_capacity(urls.len());
        for url in urls {
            files.push(self.load(url).await);
        }
        files
    }

    async fn load(&self, url: &str) -> DataFile {
        match self.fetcher.fetch_file(url).await {
            Ok(file) => {
                let content_type = file
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                let text = summarize(&file);
                debug!("数据文件 {} ({}): {} 字符", url, content_type, text.len());
                DataFile {
                    url: url.to_string(),
                    content_type,
                    text_snippet: truncate_text(&text, self.max_chars),
                }
            }
            Err(e) => {
                warn!("⚠️ 数据文件下载失败 {}: {}", url, e);
                DataFile {
                    url: url.to_string(),
                    content_type: "error".to_string(),
                    text_snippet: format!("Error downloading file: {}", e),
                }
            }
        }
    }
}

/// 按类型把文件内容转成文本
pub fn summarize(file: &FetchedFile) -> String {
    let content_type = file.content_type.as_deref().unwrap_or("").to_lowercase();
    let path = Url::parse(&file.url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_else(|_| file.url.to_lowercase());
    let is = |mime: &str, ext: &str| content_type.contains(mime) || path.ends_with(ext);

    if is("application/json", ".json") {
        return match serde_json::from_slice::<serde_json::Value>(&file.bytes) {
            Ok(value) => serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| String::from_utf8_lossy(&file.bytes).into_owned()),
            Err(_) => String::from_utf8_lossy(&file.bytes).into_owned(),
        };
    }
    if is("pdf", ".pdf") {
        return format!(
            "[PDF file; text extraction not supported; length={} bytes]",
            file.bytes.len()
        );
    }
    if is("text/", ".csv") || path.ends_with(".tsv") || path.ends_with(".txt") {
        return String::from_utf8_lossy(&file.bytes).into_owned();
    }

    match std::str::from_utf8(&file.bytes) {
        Ok(text) => text.to_string(),
        Err(_) => format!(
            "[Binary file of type {}; length={}]",
            if content_type.is_empty() { "unknown" } else { content_type.as_str() },
            file.bytes.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult, FetchError};
    use crate::models::PageSnapshot;
    use async_trait::async_trait;

    fn file(url: &str, content_type: Option<&str>, bytes: &[u8]) -> FetchedFile {
        FetchedFile {
            url: url.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn picks_by_extension_ignoring_query() {
        let links = vec![
            "https://q.example.com/data.CSV?sig=1".to_string(),
            "https://q.example.com/page".to_string(),
            "https://q.example.com/notes.txt".to_string(),
            "https://q.example.com/report.pdf".to_string(),
            "https://q.example.com/data.CSV?sig=1".to_string(),
        ];
        assert_eq!(
            pick_data_file_links(&links),
            vec![
                "https://q.example.com/data.CSV?sig=1".to_string(),
                "https://q.example.com/notes.txt".to_string(),
                "https://q.example.com/report.pdf".to_string(),
            ]
        );
    }

    #[test]
    fn json_is_pretty_printed() {
        let text = summarize(&file("https://q/x.json", None, br#"{"a":1}"#));
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn csv_is_passed_through() {
        let text = summarize(&file("https://q/x", Some("text/csv"), b"a,b\n1,2"));
        assert_eq!(text, "a,b\n1,2");
    }

    #[test]
    fn pdf_and_binary_are_described() {
        assert!(summarize(&file("https://q/x.pdf", None, b"%PDF-1.4")).starts_with("[PDF file"));
        let binary = summarize(&file(
            "https://q/blob",
            Some("application/octet-stream"),
            &[0xff, 0xfe, 0x00],
        ));
        assert!(binary.contains("application/octet-stream"));
        assert!(binary.contains("length=3"));
    }

    struct FlakyFetcher;

    #[async_trait]
    impl PageFetcher for FlakyFetcher {
        async fn fetch_page(&self, url: &str) -> AppResult<PageSnapshot> {
            Err(AppError::Fetch(FetchError::BadStatus {
                url: url.to_string(),
                status: 404,
            }))
        }

        async fn fetch_file(&self, url: &str) -> AppResult<FetchedFile> {
            if url.ends_with("bad.csv") {
                Err(AppError::Fetch(FetchError::BadStatus {
                    url: url.to_string(),
                    status: 500,
                }))
            } else {
                Ok(file(url, Some("text/plain"), "0123456789".as_bytes()))
            }
        }
    }

    #[tokio::test]
    async fn failures_are_recorded_and_text_truncated() {
        let loader = DataFileLoader::new(Arc::new(FlakyFetcher), 4);
        let files = loader
            .load_all(&[
                "https://q/good.txt".to_string(),
                "https://q/bad.csv".to_string(),
            ])
            .await;

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].text_snippet, "0123...");
        assert_eq!(files[1].content_type, "error");
        assert!(files[1].text_snippet.contains("500"));
    }
}
