//! 题目说明与提交模板提取 - 业务能力层

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

static TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\{[^{}]*"email"[^{}]*"secret"[^{}]*\}"#).expect("static regex")
});

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("static regex"));

/// 题目说明
///
/// 目前直接使用整页文本，足够 LLM 理解题意
pub fn extract_quiz_instructions(page_text: &str) -> String {
    page_text.trim().to_string()
}

/// 从页面文本中提取提交数据模板
///
/// 页面通常会给出这样的示例：
///
/// ```text
/// {
///   "email": "your email",
///   "secret": "your secret",
///   "url": "https://example.com/quiz-834",
///   "answer": 12345  // the correct answer
/// }
/// ```
///
/// 去掉 `//` 注释和多余的逗号后按 JSON 解析，解析失败返回 None
pub fn extract_submission_template(page_text: &str) -> Option<Map<String, JsonValue>> {
    let raw_block = TEMPLATE_RE.find(page_text)?.as_str();

    let cleaned: Vec<String> = raw_block
        .lines()
        .map(strip_line_comment)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();
    let cleaned = TRAILING_COMMA_RE.replace_all(&cleaned.join("\n"), "$1").into_owned();

    match serde_json::from_str::<JsonValue>(&cleaned) {
        Ok(JsonValue::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            debug!("提交模板解析失败: {}", e);
            None
        }
    }
}

/// 去掉字符串之外的 `//` 行注释
fn strip_line_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    let mut prev_slash = false;

    for (i, c) in line.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                prev_slash = false;
            }
            '/' if prev_slash => return &line[..i - 1],
            '/' => prev_slash = true,
            _ => prev_slash = false,
        }
    }
    line
}
