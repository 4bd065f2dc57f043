//! 提交地址识别 - 业务能力层
//!
//! 不同题目页面给出提交地址的方式不一样，所以识别逻辑是一个可替换的策略。

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::models::{PageSnapshot, SubmitTarget};
use crate::services::page_parser::resolve_url;

static POST_ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)post\s+your\s+answer\s+to\s+(https?://[^\s"'<>]+)"#).expect("static regex")
});

static ABSOLUTE_SUBMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>]*submit[^\s"'<>]*"#).expect("static regex")
});

static RELATIVE_SUBMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)/submit[^\s"'<>]*"#).expect("static regex"));

const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

/// 提交地址识别策略
pub trait SubmitTargetStrategy: Send + Sync {
    /// 从页面快照中找出提交地址，找不到返回 None
    fn find(&self, page: &PageSnapshot) -> Option<SubmitTarget>;
}

/// 基于文本模式的默认策略
///
/// 按顺序尝试：
/// 1. "Post your answer to <绝对地址>"
/// 2. 任意包含 `submit` 的绝对地址
/// 3. 任意 `/submit...` 相对路径（相对页面地址解析）
/// 4. 已收集链接中包含 `submit` 的第一个
/// 5. （可选）`<scheme>://<host>/submit`
#[derive(Debug, Clone, Default)]
pub struct PatternSubmitTarget {
    origin_fallback: bool,
}

impl PatternSubmitTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部规则都失败时，是否回退到页面源站的 `/submit`
    pub fn with_origin_fallback(mut self, enabled: bool) -> Self {
        self.origin_fallback = enabled;
        self
    }

    fn origin_submit(page_url: &str) -> Option<String> {
        let parsed = Url::parse(page_url).ok()?;
        parsed.host_str()?;
        parsed.join("/submit").ok().map(|u| u.to_string())
    }
}

impl SubmitTargetStrategy for PatternSubmitTarget {
    fn find(&self, page: &PageSnapshot) -> Option<SubmitTarget> {
        let blob = format!("{}\n{}", page.text, page.raw_html);

        if let Some(caps) = POST_ANSWER_RE.captures(&blob) {
            let url = clean(&caps[1]);
            debug!("提交地址（明确说明）: {}", url);
            return Some(SubmitTarget::new(url));
        }

        if let Some(m) = ABSOLUTE_SUBMIT_RE.find(&blob) {
            let url = clean(m.as_str());
            debug!("提交地址（绝对地址）: {}", url);
            return Some(SubmitTarget::new(url));
        }

        if let Some(m) = RELATIVE_SUBMIT_RE.find(&blob) {
            if let Some(url) = resolve_url(&page.url, &clean(m.as_str())) {
                debug!("提交地址（相对路径）: {}", url);
                return Some(SubmitTarget::new(url));
            }
        }

        if let Some(link) = page
            .links
            .iter()
            .find(|link| link.to_lowercase().contains("submit"))
        {
            debug!("提交地址（页面链接）: {}", link);
            return Some(SubmitTarget::new(link.clone()));
        }

        if self.origin_fallback {
            if let Some(url) = Self::origin_submit(&page.url) {
                debug!("提交地址（源站回退）: {}", url);
                return Some(SubmitTarget::new(url));
            }
        }

        None
    }
}

fn clean(raw: &str) -> String {
    raw.trim().trim_end_matches(TRAILING_PUNCT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str, html: &str, links: &[&str]) -> PageSnapshot {
        PageSnapshot {
            url: "https://quiz.example.com/quiz-1".to_string(),
            raw_html: html.to_string(),
            text: text.to_string(),
            links: links.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn find(p: &PageSnapshot) -> Option<String> {
        PatternSubmitTarget::new().find(p).map(|t| t.url)
    }

    #[test]
    fn explicit_instruction_wins() {
        let p = page(
            "See https://quiz.example.com/submit-old. Post your answer to https://grader.example.com/answers.",
            "",
            &[],
        );
        assert_eq!(find(&p).as_deref(), Some("https://grader.example.com/answers"));
    }

    #[test]
    fn absolute_url_containing_submit() {
        let p = page("Send it to https://quiz.example.com/api/submit?x=1 now", "", &[]);
        assert_eq!(find(&p).as_deref(), Some("https://quiz.example.com/api/submit?x=1"));
    }

    #[test]
    fn relative_submit_path_is_resolved() {
        let p = page("Post your answer to /submit with this payload", "", &[]);
        assert_eq!(find(&p).as_deref(), Some("https://quiz.example.com/submit"));
    }

    #[test]
    fn link_fallback() {
        let p = page(
            "Answer below",
            "",
            &["https://quiz.example.com/data.csv", "https://quiz.example.com/SUBMIT"],
        );
        assert_eq!(find(&p).as_deref(), Some("https://quiz.example.com/SUBMIT"));
    }

    #[test]
    fn nothing_found_without_fallback() {
        let p = page("Just a question", "<p>Just a question</p>", &[]);
        assert_eq!(find(&p), None);
    }

    #[test]
    fn origin_fallback_when_enabled() {
        let p = page("Just a question", "", &[]);
        let target = PatternSubmitTarget::new().with_origin_fallback(true).find(&p);
        assert_eq!(
            target,
            Some(SubmitTarget::new("https://quiz.example.com/submit"))
        );
    }
}
