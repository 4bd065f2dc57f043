//! 单元测试用的内存替身

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::error::{AppError, AppResult, FetchError};
use crate::models::{AnswerPayload, FetchedFile, PageSnapshot};
use crate::services::page_parser::parse_page;
use crate::services::{AnswerGenerator, AnswerSubmitter, GenerationRequest, PageFetcher};

/// 按 URL 返回固定 HTML 的抓取器，未登记的 URL 返回 404
#[derive(Default)]
pub struct MapFetcher {
    pages: HashMap<String, String>,
    files: HashMap<String, String>,
    pub page_calls: AtomicUsize,
    pub file_calls: AtomicUsize,
}

impl MapFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_file(mut self, url: &str, text: &str) -> Self {
        self.files.insert(url.to_string(), text.to_string());
        self
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

fn not_found(url: &str) -> AppError {
    AppError::Fetch(FetchError::BadStatus {
        url: url.to_string(),
        status: 404,
    })
}

#[async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch_page(&self, url: &str) -> AppResult<PageSnapshot> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let html = self.pages.get(url).ok_or_else(|| not_found(url))?;
        Ok(parse_page(url, html))
    }

    async fn fetch_file(&self, url: &str) -> AppResult<FetchedFile> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        let text = self.files.get(url).ok_or_else(|| not_found(url))?;
        Ok(FetchedFile {
            url: url.to_string(),
            content_type: Some("text/plain".to_string()),
            bytes: text.as_bytes().to_vec(),
        })
    }
}

/// 总是回答同一个值的生成器，记录每次看到的数据文件数量
pub struct FixedGenerator {
    answer: JsonValue,
    pub calls: AtomicUsize,
    pub seen_files: Mutex<Vec<usize>>,
}

impl FixedGenerator {
    pub fn new(answer: JsonValue) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
            seen_files: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerGenerator for FixedGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> AppResult<AnswerPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_files
            .lock()
            .unwrap()
            .push(request.data_files.len());
        Ok(AnswerPayload::compose(
            request.template,
            request.email,
            request.secret,
            request.quiz_url,
            self.answer.clone(),
        ))
    }
}

/// 按题目地址查表给出下一题的提交器
///
/// 表中没有的题目返回 `{"correct": true}`（链条结束）
#[derive(Default)]
pub struct ChainSubmitter {
    next: HashMap<String, String>,
    /// 按顺序记录 (提交地址, 提交数据)
    pub submissions: Mutex<Vec<(String, JsonValue)>>,
}

impl ChainSubmitter {
    pub fn with_next(mut self, quiz_url: &str, next_url: &str) -> Self {
        self.next.insert(quiz_url.to_string(), next_url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn submitted_quiz_urls(&self) -> Vec<String> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| payload["url"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl AnswerSubmitter for ChainSubmitter {
    async fn submit(&self, url: &str, payload: &AnswerPayload) -> AppResult<JsonValue> {
        let body = JsonValue::Object(payload.as_map().clone());
        let quiz_url = body["url"].as_str().unwrap_or_default().to_string();
        self.submissions
            .lock()
            .unwrap()
            .push((url.to_string(), body));

        Ok(match self.next.get(&quiz_url) {
            Some(next) => json!({"correct": true, "url": next}),
            None => json!({"correct": true}),
        })
    }
}

/// 一个能找到提交地址的最小题目页面
pub fn quiz_page(question: &str) -> String {
    format!(
        "<html><body><p>{}</p><p>Post your answer to https://quiz.test/submit</p></body></html>",
        question
    )
}
