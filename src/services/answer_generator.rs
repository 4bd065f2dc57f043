//! 答案生成服务 - 业务能力层
//!
//! 把题目页面、说明、数据文件交给 LLM，得到 answer 字段的值，
//! 再按页面模板组装成完整的提交数据。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::clients::LlmClient;
use crate::error::{AppResult, GenerationError};
use crate::models::{AnswerPayload, DataFile, PageSnapshot};
use crate::utils::truncate_text;

/// 每个数据文件在提示词中的预览长度
const FILE_PREVIEW_CHARS: usize = 4000;

/// 单行代码块中会被当作语言标记去掉的词
const FENCE_LANGUAGES: &[&str] = &[
    "json",
    "js",
    "javascript",
    "python",
    "py",
    "text",
    "txt",
    "plaintext",
];

const TRUNCATED_MARK: &str = "\n...[truncated]...";

const SYSTEM_PROMPT: &str = r#"You are an expert data-science quiz solver.
You are given:
- A QUIZ PAGE TEXT with instructions and examples.
- Zero or more DATA FILES (CSV/JSON/TXT/PDF extracted as text).

Your task: compute the exact value for the field named "answer" in a JSON payload
we will send back to the quiz server.

IMPORTANT RULES:
- READ the instructions carefully.
- Use only the information provided in the quiz text and data files.
- If the answer is numeric, return just the number (no quotes).
- If the answer is a boolean, return true or false (lowercase).
- If the answer is a string, return the string without any extra commentary.
- If the answer must be a JSON object or array, return valid JSON.
- DO NOT include any explanation or extra text, only the final answer."#;

/// 一次生成所需的全部输入
pub struct GenerationRequest<'a> {
    pub quiz_url: &'a str,
    pub email: &'a str,
    pub secret: &'a str,
    pub snapshot: &'a PageSnapshot,
    pub instructions: &'a str,
    pub template: Option<&'a Map<String, JsonValue>>,
    pub data_files: &'a [DataFile],
}

/// 答案生成能力
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// 生成要提交的完整数据（必须是 JSON 对象）
    async fn generate(&self, request: &GenerationRequest<'_>) -> AppResult<AnswerPayload>;
}

/// 基于 LLM 的答案生成
pub struct LlmAnswerGenerator {
    llm: Arc<LlmClient>,
    max_page_chars: usize,
}

impl LlmAnswerGenerator {
    pub fn new(llm: Arc<LlmClient>, max_page_chars: usize) -> Self {
        Self {
            llm,
            max_page_chars,
        }
    }

    /// 构建用户提示词
    ///
    /// 页面文本截断到 `max_page_chars`，每个文件预览截断到 4000 字符
    pub fn build_user_prompt(&self, request: &GenerationRequest<'_>) -> String {
        let files_summary = if request.data_files.is_empty() {
            "No extra files.".to_string()
        } else {
            request
                .data_files
                .iter()
                .enumerate()
                .map(|(idx, file)| {
                    format!(
                        "File {} ({}):\nContent type: {}\nPreview:\n{}\n",
                        idx + 1,
                        file.url,
                        file.content_type,
                        clip(&file.text_snippet, FILE_PREVIEW_CHARS)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        format!(
            "QUIZ URL:\n{}\n\nQUIZ PAGE TEXT:\n{}\n\nQUIZ INSTRUCTIONS / QUESTION:\n{}\n\n\
             DATA FILES (if any, extracted as text):\n{}\n\n\
             Now compute the required \"answer\" value.\nOutput ONLY the final answer, nothing else.",
            request.quiz_url,
            clip(&request.snapshot.text, self.max_page_chars),
            request.instructions,
            files_summary
        )
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> AppResult<AnswerPayload> {
        let prompt = self.build_user_prompt(request);
        let raw = self.llm.chat(&prompt, Some(SYSTEM_PROMPT)).await?;
        debug!("LLM 原始输出: {}", truncate_text(&raw, 200));

        let answer = parse_answer(&raw).ok_or_else(|| GenerationError::EmptyContent {
            model: self.llm.model_name().to_string(),
        })?;

        Ok(AnswerPayload::compose(
            request.template,
            request.email,
            request.secret,
            request.quiz_url,
            answer,
        ))
    }
}

/// 解析 LLM 输出的答案
///
/// 依次尝试：JSON → 布尔（不区分大小写）→ 整数/浮点数 → 原样字符串。
/// 去掉代码块标记后为空时返回 None。
pub fn parse_answer(raw: &str) -> Option<JsonValue> {
    let text = strip_code_fence(raw.trim());
    if text.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<JsonValue>(text) {
        return Some(value);
    }

    match text.to_lowercase().as_str() {
        "true" => return Some(JsonValue::Bool(true)),
        "false" => return Some(JsonValue::Bool(false)),
        _ => {}
    }

    if let Ok(n) = text.parse::<i64>() {
        return Some(JsonValue::from(n));
    }
    if let Ok(f) = text.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Some(JsonValue::Number(n));
        }
    }

    Some(JsonValue::String(text.to_string()))
}

/// 去掉 ```json ... ``` 这类 Markdown 代码块包裹
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    match rest.find('\n') {
        // 第一行剩余部分是语言标记
        Some(pos) => rest[pos + 1..].trim_end().trim_end_matches("```").trim(),
        // 单行代码块：```json {"a": 1}```
        None => {
            let body = rest.trim_end().trim_end_matches("```").trim();
            match body.split_once(char::is_whitespace) {
                Some((tag, tail)) if FENCE_LANGUAGES.contains(&tag.to_lowercase().as_str()) => {
                    tail.trim()
                }
                _ => body,
            }
        }
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars).collect();
    clipped.push_str(TRUNCATED_MARK);
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    #[test]
    fn parse_answer_prefers_json() {
        assert_eq!(parse_answer("12345"), Some(json!(12345)));
        assert_eq!(parse_answer("3.5"), Some(json!(3.5)));
        assert_eq!(parse_answer(r#"{"a": [1, 2]}"#), Some(json!({"a": [1, 2]})));
        assert_eq!(parse_answer(r#""quoted""#), Some(json!("quoted")));
    }

    #[test]
    fn parse_answer_handles_case_insensitive_booleans() {
        assert_eq!(parse_answer("True"), Some(json!(true)));
        assert_eq!(parse_answer("FALSE"), Some(json!(false)));
    }

    #[test]
    fn parse_answer_falls_back_to_string() {
        assert_eq!(parse_answer("  Paris \n"), Some(json!("Paris")));
        assert_eq!(parse_answer("1e"), Some(json!("1e")));
    }

    #[test]
    fn parse_answer_strips_code_fences() {
        assert_eq!(
            parse_answer("```json\n{\"answer\": 42}\n```"),
            Some(json!({"answer": 42}))
        );
        assert_eq!(parse_answer("```\n7\n```"), Some(json!(7)));
    }

    #[test]
    fn single_line_fence_drops_language_tag() {
        assert_eq!(parse_answer(r#"```json {"a":1}```"#), Some(json!({"a": 1})));
        assert_eq!(parse_answer("```JSON [1, 2]```"), Some(json!([1, 2])));
        assert_eq!(parse_answer("```42```"), Some(json!(42)));
        assert_eq!(parse_answer("```New York```"), Some(json!("New York")));
    }

    #[test]
    fn empty_output_yields_none() {
        assert_eq!(parse_answer("   "), None);
        assert_eq!(parse_answer("```\n```"), None);
    }

    #[test]
    fn clip_marks_truncation() {
        assert_eq!(clip("abc", 5), "abc");
        assert_eq!(clip("abcdef", 3), "abc\n...[truncated]...");
    }

    #[test]
    fn user_prompt_contains_all_sections() {
        let generator = LlmAnswerGenerator::new(Arc::new(LlmClient::new(&Config::default())), 10);
        let snapshot = PageSnapshot {
            url: "https://q.example.com/quiz-1".to_string(),
            text: "What is the sum of the value column?".to_string(),
            ..PageSnapshot::default()
        };
        let files = vec![DataFile {
            url: "https://q.example.com/data.csv".to_string(),
            content_type: "text/csv".to_string(),
            text_snippet: "value\n1\n2".to_string(),
        }];
        let request = GenerationRequest {
            quiz_url: "https://q.example.com/quiz-1",
            email: "a@b.com",
            secret: "S1",
            snapshot: &snapshot,
            instructions: "Sum it.",
            template: None,
            data_files: &files,
        };

        let prompt = generator.build_user_prompt(&request);

        assert!(prompt.starts_with("QUIZ URL:\nhttps://q.example.com/quiz-1"));
        assert!(prompt.contains("What is th\n...[truncated]..."));
        assert!(prompt.contains("File 1 (https://q.example.com/data.csv):\nContent type: text/csv"));
        assert!(prompt.contains("Sum it."));
        assert!(!prompt.contains("S1"));
    }

    #[test]
    fn prompt_without_files_says_so() {
        let generator = LlmAnswerGenerator::new(Arc::new(LlmClient::new(&Config::default())), 100);
        let snapshot = PageSnapshot::default();
        let request = GenerationRequest {
            quiz_url: "https://q.example.com/quiz-1",
            email: "a@b.com",
            secret: "S1",
            snapshot: &snapshot,
            instructions: "",
            template: None,
            data_files: &[],
        };
        assert!(generator.build_user_prompt(&request).contains("No extra files."));
    }
}
