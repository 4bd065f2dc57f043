//! 页面解析 - 业务能力层
//!
//! 把原始 HTML 变成 PageSnapshot：可见文本、atob 编码块、链接

use std::collections::HashSet;
use std::sync::LazyLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;
use url::Url;

use crate::models::PageSnapshot;

static ATOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"atob\(\s*`([^`]+)`\s*\)").expect("static regex"));

static INLINE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("static regex"));

/// 不输出文本的元素
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// 前面插入换行的块级元素
const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "li", "ul", "ol", "pre", "tr", "table", "section", "article", "h1",
    "h2", "h3", "h4", "h5", "h6", "hr", "blockquote", "form",
];

/// URL 末尾常见的句子标点
const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

/// 解析页面
///
/// # 参数
/// - `url`: 页面地址，用于把相对链接解析为绝对地址
/// - `html`: 原始 HTML
pub fn parse_page(url: &str, html: &str) -> PageSnapshot {
    let document = Html::parse_document(html);

    let mut text = extract_text(&document);
    let mut links = LinkSet::new(url);
    collect_hrefs(&document, &mut links);

    // atob(`...`) 中的题目内容
    let decoded = decode_atob_blocks(html);
    if !decoded.is_empty() {
        debug!("解码了 {} 个 atob 块", decoded.len());
    }
    for block in &decoded {
        let fragment = Html::parse_fragment(block);
        let block_text = extract_text(&fragment);
        if !block_text.is_empty() {
            text.push_str("\n\n");
            text.push_str(&block_text);
        }
        collect_hrefs(&fragment, &mut links);
    }

    // 以纯文本形式出现的 URL
    for m in INLINE_URL_RE.find_iter(&text) {
        links.push(trim_trailing_punct(m.as_str()));
    }

    PageSnapshot {
        url: url.to_string(),
        raw_html: html.to_string(),
        text,
        links: links.into_vec(),
    }
}

/// 提取可见文本
fn extract_text(document: &Html) -> String {
    let mut out = String::new();
    collect_text(document.root_element(), &mut out);
    normalize_lines(&out)
}

/// 块级元素的开始和结束处都断行，避免相邻块的文字粘连
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIP_TAGS.contains(&name) {
        return;
    }
    let block = BLOCK_TAGS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        } else if let Node::Text(t) = child.value() {
            out.push_str(t);
        }
    }
    if block {
        out.push('\n');
    }
}

/// 每行去掉首尾空白，连续空行合并为一行
fn normalize_lines(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim) {
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

fn collect_hrefs(document: &Html, links: &mut LinkSet) {
    let selector = Selector::parse("a[href]").expect("static selector");
    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            links.push(href.trim());
        }
    }
}

/// 解码页面脚本中的 atob(`...`) 块，无效的 base64 直接忽略
pub fn decode_atob_blocks(html: &str) -> Vec<String> {
    ATOB_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let b64: String = caps[1].split_whitespace().collect();
            match STANDARD.decode(b64.as_bytes()) {
                Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => {
                    debug!("忽略无效的 base64 块: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn trim_trailing_punct(url: &str) -> &str {
    url.trim_end_matches(TRAILING_PUNCT)
}

/// 把 href 解析为绝对地址，跳过 javascript: / mailto: / tel: / 锚点
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    resolved.set_fragment(None);

    Some(resolved.to_string())
}

/// 按首次出现顺序去重的链接集合
struct LinkSet {
    base: String,
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl LinkSet {
    fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            seen: HashSet::new(),
            ordered: Vec::new(),
        }
    }

    fn push(&mut self, href: &str) {
        if let Some(absolute) = resolve_url(&self.base, href) {
            if self.seen.insert(absolute.clone()) {
                self.ordered.push(absolute);
            }
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}
