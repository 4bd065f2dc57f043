//! 提交数据

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

const MASK: &str = "***";

/// 要 POST 给题目服务器的数据
///
/// 结构由题目页面的说明决定，这里只保证它是一个 JSON 对象
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnswerPayload(Map<String, JsonValue>);

impl AnswerPayload {
    /// 组装提交数据
    ///
    /// 以页面模板为基础（如果有），覆盖 email / secret / url / answer 四个字段
    pub fn compose(
        template: Option<&Map<String, JsonValue>>,
        email: &str,
        secret: &str,
        quiz_url: &str,
        answer: JsonValue,
    ) -> Self {
        let mut map = template.cloned().unwrap_or_default();
        map.insert("email".to_string(), JsonValue::from(email));
        map.insert("secret".to_string(), JsonValue::from(secret));
        map.insert("url".to_string(), JsonValue::from(quiz_url));
        map.insert("answer".to_string(), answer);
        Self(map)
    }

    pub fn answer(&self) -> Option<&JsonValue> {
        self.0.get("answer")
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    /// 用于日志和返回结果的副本，密钥被遮盖
    pub fn redacted(&self) -> JsonValue {
        let mut map = self.0.clone();
        if map.contains_key("secret") {
            map.insert("secret".to_string(), JsonValue::from(MASK));
        }
        JsonValue::Object(map)
    }
}
